//! Diffusion-specific layer over the generic GFD machinery.

pub mod bc;
pub mod diffusion;
pub mod exact;

pub use bc::BoundaryFn;
pub use diffusion::{
    derive_weights, diffusion_operator, solve_cloud, solve_mesh, CloudSolution, MeshSolution,
    NeighborSource,
};
