//! Local GFD stencils.
//!
//! For a node with neighbour offsets `(dx_j, dy_j)` the weights `w_j` solve
//!
//! ```text
//! | dx_1     ...  dx_k    |         | L_x  |
//! | dy_1     ...  dy_k    |   w   = | L_y  |
//! | dx_1^2   ...  dx_k^2  |         | L_xx |
//! | dx_1dy_1 ...  dx_kdy_k|         | L_xy |
//! | dy_1^2   ...  dy_k^2  |         | L_yy |
//! ```
//!
//! in the least-squares / minimum-norm sense. The central weight is `-sum(w)`
//! so every stencil annihilates constants. With Taylor expansion the stencil
//! then approximates `L_x u_x + L_y u_y + L_xx u_xx / 2 + L_xy u_xy + L_yy u_yy / 2`.

use glam::DVec2;
use nalgebra::{DMatrix, DVector, SVD};

use crate::error::{GfdError, GfdResult};

/// Number of Taylor terms fitted by a stencil.
pub const TAYLOR_TERMS: usize = 5;

/// Coefficients of the target operator over `(dx, dy, dxx, dxy, dyy)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifferentialOperator {
    pub coefficients: [f64; TAYLOR_TERMS],
}

impl DifferentialOperator {
    pub fn new(coefficients: [f64; TAYLOR_TERMS]) -> Self {
        Self { coefficients }
    }

    /// `scale * (u_xx + u_yy)`.
    pub fn laplacian(scale: f64) -> Self {
        Self::new([0.0, 0.0, 2.0 * scale, 0.0, 2.0 * scale])
    }

    /// Value the stencil should reproduce given exact derivatives
    /// `[u_x, u_y, u_xx, u_xy, u_yy]`.
    pub fn apply_to_derivatives(&self, d: [f64; TAYLOR_TERMS]) -> f64 {
        let c = &self.coefficients;
        c[0] * d[0] + c[1] * d[1] + 0.5 * c[2] * d[2] + c[3] * d[3] + 0.5 * c[4] * d[4]
    }

    fn as_vector(&self) -> DVector<f64> {
        DVector::from_column_slice(&self.coefficients)
    }
}

/// Weights of one node: `[center, neighbor_1, ..., neighbor_k]`.
#[derive(Clone, Debug, PartialEq)]
pub struct StencilWeights {
    pub weights: Vec<f64>,
    /// Numerical rank of the local system (5 when well posed).
    pub rank: usize,
    /// Ratio of the largest to the smallest retained singular value.
    pub condition: f64,
}

impl StencilWeights {
    /// All-zero stencil used for boundary nodes.
    pub fn zero(neighbor_count: usize) -> Self {
        Self {
            weights: vec![0.0; neighbor_count + 1],
            rank: 0,
            condition: 1.0,
        }
    }

    pub fn center(&self) -> f64 {
        self.weights[0]
    }

    pub fn neighbors(&self) -> &[f64] {
        &self.weights[1..]
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Fewer than five independent Taylor terms could be fitted.
    pub fn is_degenerate(&self) -> bool {
        self.rank < TAYLOR_TERMS
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// `w_0 u_center + sum_j w_j u_j`.
    #[inline]
    pub fn apply(&self, center_value: f64, neighbor_values: impl Iterator<Item = f64>) -> f64 {
        self.neighbors()
            .iter()
            .zip(neighbor_values)
            .fold(self.center() * center_value, |acc, (w, u)| acc + w * u)
    }
}

/// Derive the GFD weights of a node from its neighbours' coordinates.
///
/// Rank-deficient configurations (fewer than five neighbours, collinear or
/// duplicated points) do not fail: the SVD returns the minimum-norm
/// least-squares weights and [`StencilWeights::rank`] reports the deficiency.
/// Singular values below `rcond * sigma_max` are discarded.
pub fn derive_weights(
    center: DVec2,
    neighbors: &[DVec2],
    operator: &DifferentialOperator,
    rcond: f64,
) -> GfdResult<StencilWeights> {
    if neighbors.is_empty() {
        return Err(GfdError::EmptyStencil);
    }

    let offsets: Vec<DVec2> = neighbors.iter().map(|&p| p - center).collect();
    let system = DMatrix::from_fn(TAYLOR_TERMS, offsets.len(), |row, j| {
        let d = offsets[j];
        match row {
            0 => d.x,
            1 => d.y,
            2 => d.x * d.x,
            3 => d.x * d.y,
            _ => d.y * d.y,
        }
    });

    let svd = SVD::new(system, true, true);
    let sigma_max = svd.singular_values.max();
    let cutoff = rcond * sigma_max;
    let retained: Vec<f64> = svd
        .singular_values
        .iter()
        .copied()
        .filter(|&s| s > cutoff)
        .collect();
    let rank = retained.len();
    let condition = match retained.iter().copied().reduce(f64::min) {
        Some(sigma_min) => sigma_max / sigma_min,
        None => f64::INFINITY,
    };

    let w = svd
        .solve(&operator.as_vector(), cutoff)
        .map_err(|e| GfdError::Numerical(e.to_string()))?;

    let mut weights = Vec::with_capacity(w.len() + 1);
    weights.push(-w.sum());
    weights.extend(w.iter());

    Ok(StencilWeights {
        weights,
        rank,
        condition,
    })
}
