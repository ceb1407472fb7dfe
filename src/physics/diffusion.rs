use nalgebra::DMatrix;
use tracing::info;

use super::bc::{at_diffusivity, BoundaryFn};
use crate::config::SolverConfig;
use crate::discretization::geometry::{Cloud, Geometry, Triangulation};
use crate::discretization::mesh::StructuredMesh;
use crate::discretization::neighbors::{normalize_triangles, NeighborTable};
use crate::discretization::NodeSet;
use crate::error::GfdResult;
use crate::numerics::stencil::DifferentialOperator;
use crate::numerics::transient::{Solution, TransientSolver};
use crate::numerics::UpdateForm;

pub use crate::numerics::stencil::derive_weights;

/// Step operator of `u_t = nu (u_xx + u_yy)`: `L = [0, 0, 2 nu dt, 0, 2 nu dt]`.
pub fn diffusion_operator(diffusivity: f64, dt: f64) -> DifferentialOperator {
    DifferentialOperator::laplacian(diffusivity * dt)
}

/// Run the solver on any geometry with the diffusion step operator.
pub fn solve_geometry<G, B>(
    geometry: &G,
    boundary: &B,
    solver: &TransientSolver,
    diffusivity: f64,
) -> GfdResult<Solution>
where
    G: Geometry,
    B: BoundaryFn + ?Sized,
{
    solver.solve(
        geometry,
        |dt| diffusion_operator(diffusivity, dt),
        at_diffusivity(boundary, diffusivity),
    )
}

/// Fields of a mesh run, addressable by `(row, col, step)`.
#[derive(Clone, Debug)]
pub struct MeshSolution {
    pub mesh: StructuredMesh,
    pub solution: Solution,
}

impl MeshSolution {
    pub fn approx_at(&self, row: usize, col: usize, step: usize) -> f64 {
        self.solution.approx.at(self.mesh.index(row, col), step)
    }

    pub fn exact_at(&self, row: usize, col: usize, step: usize) -> f64 {
        self.solution.exact.at(self.mesh.index(row, col), step)
    }

    /// `rows x cols` snapshot of the approximation.
    pub fn approx_grid(&self, step: usize) -> DMatrix<f64> {
        DMatrix::from_fn(self.mesh.rows(), self.mesh.cols(), |r, c| {
            self.approx_at(r, c, step)
        })
    }

    pub fn exact_grid(&self, step: usize) -> DMatrix<f64> {
        DMatrix::from_fn(self.mesh.rows(), self.mesh.cols(), |r, c| {
            self.exact_at(r, c, step)
        })
    }
}

/// Diffusion on a logically rectangular mesh.
///
/// The explicit scheme always uses the per-node ring update; the implicit
/// scheme assembles the dense evolution operator.
pub fn solve_mesh<B>(
    x: &DMatrix<f64>,
    y: &DMatrix<f64>,
    boundary: &B,
    config: &SolverConfig,
) -> GfdResult<MeshSolution>
where
    B: BoundaryFn + ?Sized,
{
    config.validate()?;
    let mesh = StructuredMesh::new(x.clone(), y.clone())?;
    let mut solver = TransientSolver::from_config(config);
    solver.form = if config.scheme.is_implicit() {
        UpdateForm::Matrix
    } else {
        UpdateForm::Direct
    };
    info!(rows = mesh.rows(), cols = mesh.cols(), "mesh geometry");
    let solution = solve_geometry(&mesh, boundary, &solver, config.diffusivity)?;
    Ok(MeshSolution { mesh, solution })
}

/// Where the neighbour table of a cloud run comes from.
#[derive(Clone, Debug)]
pub enum NeighborSource {
    /// Caller-supplied table, validated before use.
    Table(NeighborTable),
    /// `max_neighbors` nearest nodes.
    Search,
    /// Adjacency of 0-based triangles.
    Triangles(Vec<[usize; 3]>),
}

impl NeighborSource {
    /// Triangles as stored on disk, 0- or 1-based.
    pub fn from_raw_triangles(raw: &[[i64; 3]]) -> GfdResult<Self> {
        Ok(NeighborSource::Triangles(normalize_triangles(raw)?))
    }

    fn label(&self) -> &'static str {
        match self {
            NeighborSource::Table(_) => "table",
            NeighborSource::Search => "search",
            NeighborSource::Triangles(_) => "triangles",
        }
    }
}

/// Fields of a cloud or triangulation run plus the neighbour table used.
#[derive(Clone, Debug)]
pub struct CloudSolution {
    pub solution: Solution,
    pub neighbors: NeighborTable,
}

/// Diffusion on an unstructured node set or a triangulation.
pub fn solve_cloud<B>(
    nodes: &NodeSet,
    boundary: &B,
    source: NeighborSource,
    config: &SolverConfig,
) -> GfdResult<CloudSolution>
where
    B: BoundaryFn + ?Sized,
{
    config.validate()?;
    let k = config.max_neighbors;
    let label = source.label();
    let cloud = match source {
        NeighborSource::Table(table) => Cloud::with_table(nodes.clone(), table)?,
        NeighborSource::Search => Cloud::from_search(nodes.clone(), k, config.parallel)?,
        NeighborSource::Triangles(triangles) => {
            Triangulation::new(nodes.clone(), triangles, k, config.parallel)?.into_cloud()
        }
    };
    info!(
        nodes = nodes.len(),
        interior = nodes.interior_count(),
        neighbors = label,
        width = cloud.max_neighbors(),
        "cloud geometry"
    );

    let solver = TransientSolver::from_config(config);
    let solution = solve_geometry(&cloud, boundary, &solver, config.diffusivity)?;
    let (_, neighbors) = cloud.into_parts();
    Ok(CloudSolution {
        solution,
        neighbors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::generator::{
        jittered_cloud, lattice_triangles, regular_mesh, UNIT_SQUARE,
    };
    use crate::error::GfdError;
    use crate::numerics::Scheme;
    use crate::physics::bc::Constant;
    use crate::physics::exact::decaying_cosine;

    #[test]
    fn diffusion_operator_layout() {
        let op = diffusion_operator(0.2, 0.01);
        let c = op.coefficients;
        assert_eq!([c[0], c[1], c[3]], [0.0; 3]);
        assert!((c[2] - 0.004).abs() < 1e-15);
        assert_eq!(c[2], c[4]);
    }

    #[test]
    fn constant_field_stays_constant() {
        let nodes = jittered_cloud(7, UNIT_SQUARE, 0.2, 5).unwrap();
        let config = SolverConfig::default()
            .with_steps(20)
            .with_scheme(Scheme::implicit());
        let out = solve_cloud(&nodes, &Constant(3.0), NeighborSource::Search, &config).unwrap();
        let last = out.solution.approx.last();
        assert!(last.iter().all(|v| (v - 3.0).abs() < 1e-9));
    }

    #[test]
    fn mesh_solution_indexing() {
        let mesh = regular_mesh(6, UNIT_SQUARE).unwrap();
        let config = SolverConfig::default().with_steps(30);
        let out = solve_mesh(mesh.x(), mesh.y(), &decaying_cosine, &config).unwrap();
        let (r, c) = (0, 3);
        let p = mesh.position_at(r, c);
        assert_eq!(out.approx_at(r, c, 29), decaying_cosine(p.x, p.y, 1.0, 0.2));
        assert_eq!(out.approx_grid(0), out.exact_grid(0));
    }

    #[test]
    fn triangles_are_normalized_and_used() {
        let nodes = jittered_cloud(5, UNIT_SQUARE, 0.1, 2).unwrap();
        let raw: Vec<[i64; 3]> = lattice_triangles(5)
            .iter()
            .map(|t| [t[0] as i64 + 1, t[1] as i64 + 1, t[2] as i64 + 1])
            .collect();
        let source = NeighborSource::from_raw_triangles(&raw).unwrap();
        let config = SolverConfig::default().with_steps(10);
        let out = solve_cloud(&nodes, &decaying_cosine, source, &config).unwrap();
        assert_eq!(out.neighbors.len(), 25);
        // centre node touches its six triangle neighbours
        assert_eq!(out.neighbors.count(12), 6);
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let nodes = jittered_cloud(5, UNIT_SQUARE, 0.1, 2).unwrap();
        let config = SolverConfig::default().with_steps(1);
        let r = solve_cloud(&nodes, &decaying_cosine, NeighborSource::Search, &config);
        assert!(matches!(r, Err(GfdError::Config(_))));
    }
}
