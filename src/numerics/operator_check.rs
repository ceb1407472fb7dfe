//! Truncation-error checks of assembled stencils against exact derivatives.
//!
//! Fields are written once over hyper-dual numbers; `eps1`, `eps2` and
//! `eps1eps2` then carry the first and mixed second derivatives, so no
//! hand-coded derivative formulas are needed.

use glam::DVec2;
use num_dual::{DualNum, HyperDual64};

use super::assembly::WeightTable;
use super::stencil::{DifferentialOperator, TAYLOR_TERMS};
use crate::discretization::geometry::Geometry;

/// Exact `[u_x, u_y, u_xx, u_xy, u_yy]` of `field` at `p`.
pub fn taylor_derivatives<F>(field: &F, p: DVec2) -> [f64; TAYLOR_TERMS]
where
    F: Fn(HyperDual64, HyperDual64) -> HyperDual64,
{
    let mixed = field(
        HyperDual64::new(p.x, 1.0, 0.0, 0.0),
        HyperDual64::new(p.y, 0.0, 1.0, 0.0),
    );
    let xx = field(
        HyperDual64::new(p.x, 1.0, 1.0, 0.0),
        HyperDual64::from_re(p.y),
    );
    let yy = field(
        HyperDual64::from_re(p.x),
        HyperDual64::new(p.y, 1.0, 1.0, 0.0),
    );
    [mixed.eps1, mixed.eps2, xx.eps1eps2, mixed.eps1eps2, yy.eps1eps2]
}

/// Plain value of a hyper-dual field.
pub fn value_at<F>(field: &F, p: DVec2) -> f64
where
    F: Fn(HyperDual64, HyperDual64) -> HyperDual64,
{
    field(HyperDual64::from_re(p.x), HyperDual64::from_re(p.y)).re
}

/// Largest interior `|stencil(u) - L(u)|` and the node where it occurs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TruncationReport {
    pub max_error: f64,
    pub worst_node: Option<usize>,
}

/// Apply every interior stencil of `table` to `field` sampled on `geometry`
/// and compare with `operator` evaluated on the exact derivatives.
pub fn truncation_error<G, F>(
    geometry: &G,
    table: &WeightTable,
    operator: &DifferentialOperator,
    field: F,
) -> TruncationReport
where
    G: Geometry,
    F: Fn(HyperDual64, HyperDual64) -> HyperDual64,
{
    let samples: Vec<f64> = (0..geometry.node_count())
        .map(|i| value_at(&field, geometry.position(i)))
        .collect();

    let mut report = TruncationReport {
        max_error: 0.0,
        worst_node: None,
    };
    for (i, stencil) in table.iter().enumerate() {
        if stencil.is_boundary() {
            continue;
        }
        let approx = stencil.increment(i, &samples);
        let exact = operator.apply_to_derivatives(taylor_derivatives(&field, geometry.position(i)));
        let err = (approx - exact).abs();
        if report.worst_node.is_none() || err > report.max_error {
            report = TruncationReport {
                max_error: err,
                worst_node: Some(i),
            };
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_RCOND;
    use crate::discretization::generator::{curvilinear_mesh, regular_mesh, UNIT_SQUARE};
    use crate::numerics::assembly::assemble_weights;

    fn bump(x: HyperDual64, y: HyperDual64) -> HyperDual64 {
        (x * 1.3).sin() * (y * 0.7).cos() + x * y * y
    }

    #[test]
    fn hyper_dual_derivatives_match_closed_form() {
        let p = DVec2::new(0.4, -0.3);
        let d = taylor_derivatives(&bump, p);
        let (sx, cx) = (1.3 * p.x).sin_cos();
        let (sy, cy) = (0.7 * p.y).sin_cos();
        let expected = [
            1.3 * cx * cy + p.y * p.y,
            -0.7 * sx * sy + 2.0 * p.x * p.y,
            -1.69 * sx * cy,
            -1.3 * 0.7 * cx * sy + 2.0 * p.y,
            -0.49 * sx * cy + 2.0 * p.x,
        ];
        for (a, b) in d.iter().zip(expected) {
            assert!((a - b).abs() < 1e-12, "{a} vs {b}");
        }
    }

    #[test]
    fn laplacian_truncation_error_shrinks_quadratically() {
        let op = DifferentialOperator::laplacian(1.0);
        let error = |n| {
            let mesh = regular_mesh(n, UNIT_SQUARE).unwrap();
            let table = assemble_weights(&mesh, &op, DEFAULT_RCOND, false).unwrap();
            truncation_error(&mesh, &table, &op, bump).max_error
        };
        let coarse = error(11);
        let fine = error(21);
        assert!(coarse / fine > 3.0, "ratio {}", coarse / fine);
    }

    #[test]
    fn curvilinear_mesh_is_consistent() {
        let op = DifferentialOperator::laplacian(1.0);
        let mesh = curvilinear_mesh(21, UNIT_SQUARE, 0.2).unwrap();
        let table = assemble_weights(&mesh, &op, DEFAULT_RCOND, false).unwrap();
        let report = truncation_error(&mesh, &table, &op, bump);
        assert!(report.worst_node.is_some());
        assert!(report.max_error < 0.5, "max error {}", report.max_error);
    }
}
