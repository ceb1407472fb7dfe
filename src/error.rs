use thiserror::Error;

/// Root error type for every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum GfdError {
    /// Invalid solver configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Neighbour table violates its contract (range, padding, empty interior rows).
    #[error("malformed neighbor table at node {node}: {reason}")]
    NeighborTable { node: usize, reason: String },

    /// Boundary flag other than exactly 0 or 1.
    #[error("invalid boundary flag {flag} at node {node} (expected 0 or 1)")]
    BoundaryFlag { node: usize, flag: f64 },

    /// Triangle list references nodes that do not exist or uses negative indices.
    #[error("invalid triangle {triangle}: {reason}")]
    Triangle { triangle: usize, reason: String },

    /// Input arrays with incompatible shapes.
    #[error("shape mismatch: {0}")]
    Shape(String),

    /// A stencil was requested for a node without neighbours.
    #[error("cannot derive a stencil from zero neighbors")]
    EmptyStencil,

    /// Linear algebra backend rejected its inputs.
    #[error("numerical error: {0}")]
    Numerical(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GfdResult<T> = Result<T, GfdError>;
