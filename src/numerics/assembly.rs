//! Turns a geometry into stencils, and stencils into evolution operators.

use nalgebra::{DMatrix, DVector, DVectorView, SVD};
use rayon::prelude::*;
use tracing::{debug, warn};

use super::stencil::{derive_weights, DifferentialOperator, StencilWeights};
use super::Scheme;
use crate::discretization::geometry::Geometry;
use crate::error::{GfdError, GfdResult};

/// Stencil of one node together with the neighbour indices its weights refer to.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeStencil {
    pub neighbors: Vec<usize>,
    pub weights: StencilWeights,
}

impl NodeStencil {
    fn boundary() -> Self {
        Self {
            neighbors: Vec::new(),
            weights: StencilWeights::zero(0),
        }
    }

    pub fn is_boundary(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Stencil increment `w_0 u_i + sum_j w_j u_{nb_j}` read from `field`.
    #[inline]
    pub fn increment(&self, node: usize, field: &[f64]) -> f64 {
        self.weights
            .apply(field[node], self.neighbors.iter().map(|&j| field[j]))
    }
}

/// Summary of stencil quality over all interior nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StencilDiagnostics {
    pub interior: usize,
    pub degenerate: usize,
    pub min_rank: usize,
    pub worst_condition: f64,
    /// Most negative central weight; below -2 the explicit update amplifies.
    pub min_center_weight: f64,
}

/// Per-node stencils of a whole geometry (the direct neighbour-sum form).
#[derive(Clone, Debug)]
pub struct WeightTable {
    stencils: Vec<NodeStencil>,
}

impl WeightTable {
    pub fn len(&self) -> usize {
        self.stencils.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stencils.is_empty()
    }

    pub fn get(&self, node: usize) -> &NodeStencil {
        &self.stencils[node]
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeStencil> {
        self.stencils.iter()
    }

    pub fn diagnostics(&self) -> StencilDiagnostics {
        let mut diag = StencilDiagnostics {
            interior: 0,
            degenerate: 0,
            min_rank: usize::MAX,
            worst_condition: 1.0,
            min_center_weight: 0.0,
        };
        for s in self.stencils.iter().filter(|s| !s.is_boundary()) {
            diag.interior += 1;
            if s.weights.is_degenerate() {
                diag.degenerate += 1;
            }
            diag.min_rank = diag.min_rank.min(s.weights.rank);
            diag.worst_condition = diag.worst_condition.max(s.weights.condition);
            diag.min_center_weight = diag.min_center_weight.min(s.weights.center());
        }
        if diag.interior == 0 {
            diag.min_rank = 0;
        }
        diag
    }

    /// Scatter the stencils into the dense global operator `K`.
    /// Boundary rows stay zero.
    pub fn to_matrix(&self) -> DMatrix<f64> {
        let n = self.stencils.len();
        let mut k = DMatrix::zeros(n, n);
        for (i, s) in self.stencils.iter().enumerate() {
            if s.is_boundary() {
                continue;
            }
            k[(i, i)] += s.weights.center();
            for (&j, &w) in s.neighbors.iter().zip(s.weights.neighbors()) {
                k[(i, j)] += w;
            }
        }
        k
    }

    /// Write `u + K u` for interior nodes into `next`; boundary slots are left untouched.
    pub fn advance(&self, prev: &[f64], next: &mut [f64], parallel: bool) {
        let update = |(i, slot): (usize, &mut f64)| {
            let s = &self.stencils[i];
            if !s.is_boundary() {
                *slot = prev[i] + s.increment(i, prev);
            }
        };
        if parallel {
            next.par_iter_mut().enumerate().for_each(update);
        } else {
            next.iter_mut().enumerate().for_each(update);
        }
    }
}

fn node_stencil<G: Geometry>(
    geometry: &G,
    node: usize,
    operator: &DifferentialOperator,
    rcond: f64,
    neighbors: &mut Vec<usize>,
) -> GfdResult<NodeStencil> {
    if geometry.is_boundary(node) {
        return Ok(NodeStencil::boundary());
    }
    geometry.neighbors_into(node, neighbors);
    if neighbors.is_empty() {
        return Err(GfdError::NeighborTable {
            node,
            reason: "interior node has no neighbors".to_string(),
        });
    }
    let positions: Vec<_> = neighbors.iter().map(|&j| geometry.position(j)).collect();
    let weights = derive_weights(geometry.position(node), &positions, operator, rcond)?;
    if weights.is_degenerate() {
        debug!(
            node,
            rank = weights.rank,
            condition = weights.condition,
            "degenerate stencil"
        );
    }
    Ok(NodeStencil {
        neighbors: neighbors.clone(),
        weights,
    })
}

/// Derive the stencil of every node. Boundary nodes receive empty, all-zero stencils.
pub fn assemble_weights<G: Geometry>(
    geometry: &G,
    operator: &DifferentialOperator,
    rcond: f64,
    parallel: bool,
) -> GfdResult<WeightTable> {
    let n = geometry.node_count();
    let stencils = if parallel {
        (0..n)
            .into_par_iter()
            .map_init(
                || Vec::with_capacity(geometry.max_neighbors()),
                |buf, i| node_stencil(geometry, i, operator, rcond, buf),
            )
            .collect::<GfdResult<Vec<_>>>()?
    } else {
        let mut buf = Vec::with_capacity(geometry.max_neighbors());
        (0..n)
            .map(|i| node_stencil(geometry, i, operator, rcond, &mut buf))
            .collect::<GfdResult<Vec<_>>>()?
    };

    let table = WeightTable { stencils };
    let diag = table.diagnostics();
    if diag.degenerate > 0 {
        warn!(
            degenerate = diag.degenerate,
            interior = diag.interior,
            min_rank = diag.min_rank,
            "rank-deficient stencils; accuracy degrades at these nodes"
        );
    }
    Ok(table)
}

/// Dense one-step evolution operator `K2`, built once and only read afterwards.
#[derive(Clone, Debug)]
pub struct EvolutionOperator {
    matrix: DMatrix<f64>,
}

impl EvolutionOperator {
    /// `K2 = I + K` for the explicit scheme, or
    /// `K2 = (I - (1 - lambda) K)^+ (I + lambda K)` for the implicit one.
    ///
    /// The implicit inverse is an SVD pseudoinverse with relative cutoff
    /// `rcond`, so a singular left-hand side yields a least-squares
    /// approximation rather than an error.
    pub fn build(k: &DMatrix<f64>, scheme: Scheme, rcond: f64) -> GfdResult<Self> {
        let n = k.nrows();
        let identity = DMatrix::<f64>::identity(n, n);
        let matrix = match scheme {
            Scheme::Explicit => identity + k,
            Scheme::Implicit { lambda } => {
                let lhs = &identity - k * (1.0 - lambda);
                let rhs = identity + k * lambda;
                let svd = SVD::new(lhs, true, true);
                let cutoff = rcond * svd.singular_values.max();
                let rank = svd.singular_values.iter().filter(|&&s| s > cutoff).count();
                if rank < n {
                    warn!(rank, size = n, "implicit operator is singular; using pseudoinverse");
                }
                svd.solve(&rhs, cutoff)
                    .map_err(|e| GfdError::Numerical(e.to_string()))?
            }
        };
        Ok(Self { matrix })
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn size(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn apply(&self, u: &DVectorView<'_, f64>) -> DVector<f64> {
        &self.matrix * u
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RCOND;
    use crate::discretization::generator::{jittered_cloud, regular_mesh, UNIT_SQUARE};
    use crate::discretization::geometry::Cloud;

    fn cloud() -> Cloud {
        Cloud::from_search(jittered_cloud(7, UNIT_SQUARE, 0.2, 3).unwrap(), 8, true).unwrap()
    }

    #[test]
    fn boundary_rows_are_zero_and_interior_rows_sum_to_zero() {
        let geom = cloud();
        let table =
            assemble_weights(&geom, &DifferentialOperator::laplacian(0.01), DEFAULT_RCOND, true)
                .unwrap();
        let k = table.to_matrix();
        for i in 0..geom.node_count() {
            let row_sum: f64 = k.row(i).iter().sum();
            if geom.is_boundary(i) {
                assert!(k.row(i).iter().all(|&v| v == 0.0));
            } else {
                assert!(row_sum.abs() < 1e-12, "row {i} sums to {row_sum}");
            }
        }
    }

    #[test]
    fn serial_and_parallel_assembly_agree() {
        let geom = cloud();
        let op = DifferentialOperator::laplacian(0.01);
        let a = assemble_weights(&geom, &op, DEFAULT_RCOND, true).unwrap();
        let b = assemble_weights(&geom, &op, DEFAULT_RCOND, false).unwrap();
        assert_eq!(a.to_matrix(), b.to_matrix());
    }

    #[test]
    fn mesh_table_has_nine_entries_per_interior_node() {
        let mesh = regular_mesh(5, UNIT_SQUARE).unwrap();
        let table =
            assemble_weights(&mesh, &DifferentialOperator::laplacian(1.0), DEFAULT_RCOND, false)
                .unwrap();
        let interior: Vec<_> = table.iter().filter(|s| !s.is_boundary()).collect();
        assert_eq!(interior.len(), 9);
        assert!(interior.iter().all(|s| s.weights.len() == 9));
        let diag = table.diagnostics();
        assert_eq!(diag.degenerate, 0);
        assert_eq!(diag.min_rank, 5);
    }

    #[test]
    fn explicit_operator_matches_direct_advance() {
        let geom = cloud();
        let table =
            assemble_weights(&geom, &DifferentialOperator::laplacian(0.002), DEFAULT_RCOND, true)
                .unwrap();
        let op = EvolutionOperator::build(&table.to_matrix(), Scheme::Explicit, DEFAULT_RCOND)
            .unwrap();

        let u = DVector::from_fn(geom.node_count(), |i, _| (i as f64 * 0.37).sin());
        let via_matrix = op.apply(&u.column(0));
        let mut via_table = u.clone();
        table.advance(u.as_slice(), via_table.as_mut_slice(), false);

        for i in geom.interior_nodes() {
            assert!((via_matrix[i] - via_table[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn implicit_operator_with_lambda_one_is_explicit() {
        let geom = cloud();
        let table =
            assemble_weights(&geom, &DifferentialOperator::laplacian(0.002), DEFAULT_RCOND, true)
                .unwrap();
        let k = table.to_matrix();
        let explicit = EvolutionOperator::build(&k, Scheme::Explicit, DEFAULT_RCOND).unwrap();
        let blended =
            EvolutionOperator::build(&k, Scheme::Implicit { lambda: 1.0 }, DEFAULT_RCOND).unwrap();
        let diff = (explicit.matrix() - blended.matrix()).amax();
        assert!(diff < 1e-10, "max difference {diff}");
    }

    #[test]
    fn implicit_operator_survives_singular_left_hand_side() {
        // I - K is singular when K = I
        let k = DMatrix::<f64>::identity(4, 4);
        let op = EvolutionOperator::build(&k, Scheme::Implicit { lambda: 0.0 }, DEFAULT_RCOND)
            .unwrap();
        assert!(op.matrix().iter().all(|v| v.is_finite()));
        assert_eq!(op.size(), 4);
    }
}
