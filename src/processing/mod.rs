pub mod csv_writer;
pub mod metrics;
pub mod summary;
