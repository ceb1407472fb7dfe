//! Generalized Finite Difference (GFD) solver for `u_t = nu (u_xx + u_yy)`
//! on structured meshes, point clouds and triangulations.
//!
//! Every interior node gets a local stencil fitted to second order by an SVD
//! least-squares solve over its neighbours. The stencils are then either
//! scattered into a dense evolution operator (explicit or lambda-blended
//! implicit) or applied directly as per-node neighbour sums.
//!
//! ```no_run
//! use gfd_diffusion::config::SolverConfig;
//! use gfd_diffusion::discretization::generator::{regular_mesh, UNIT_SQUARE};
//! use gfd_diffusion::physics::{exact::decaying_cosine, solve_mesh};
//!
//! let mesh = regular_mesh(41, UNIT_SQUARE)?;
//! let run = solve_mesh(mesh.x(), mesh.y(), &decaying_cosine, &SolverConfig::default())?;
//! println!("{}", run.approx_at(20, 20, 999));
//! # Ok::<(), gfd_diffusion::error::GfdError>(())
//! ```

pub mod config;
pub mod discretization;
pub mod error;
pub mod numerics;
pub mod physics;
pub mod processing;

pub use config::SolverConfig;
pub use error::{GfdError, GfdResult};
