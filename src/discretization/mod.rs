pub mod cloud;
pub mod generator;
pub mod geometry;
pub mod mesh;
pub mod neighbors;

pub use cloud::{Node, NodeKind, NodeSet};
pub use geometry::{Cloud, Geometry, Triangulation};
pub use mesh::StructuredMesh;
pub use neighbors::NeighborTable;
