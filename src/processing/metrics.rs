use crate::numerics::transient::FieldHistory;

/// Per-step quadratic mean error `sqrt(mean_i (u_ap - u_ex)^2)` over all nodes.
pub fn quadratic_mean_error(approx: &FieldHistory, exact: &FieldHistory) -> Vec<f64> {
    let n = approx.node_count().max(1) as f64;
    (0..approx.steps())
        .map(|k| {
            let sq: f64 = approx
                .step(k)
                .iter()
                .zip(exact.step(k).iter())
                .map(|(a, e)| (a - e).powi(2))
                .sum();
            (sq / n).sqrt()
        })
        .collect()
}

/// `max_i |u_ap[i, step] - u_ex[i, step]|`
pub fn max_abs_error(approx: &FieldHistory, exact: &FieldHistory, step: usize) -> f64 {
    approx
        .step(step)
        .iter()
        .zip(exact.step(step).iter())
        .map(|(a, e)| (a - e).abs())
        .fold(0.0, f64::max)
}

pub fn max_abs_error_history(approx: &FieldHistory, exact: &FieldHistory) -> Vec<f64> {
    (0..approx.steps())
        .map(|k| max_abs_error(approx, exact, k))
        .collect()
}

/// Largest and mean absolute difference between two runs at one step.
pub fn compare_steps(a: &FieldHistory, b: &FieldHistory, step: usize) -> (f64, f64) {
    let diffs: Vec<f64> = a
        .step(step)
        .iter()
        .zip(b.step(step).iter())
        .map(|(x, y)| (x - y).abs())
        .collect();
    let max = diffs.iter().copied().fold(0.0, f64::max);
    let mean = diffs.iter().sum::<f64>() / diffs.len().max(1) as f64;
    (max, mean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::generator::{regular_mesh, UNIT_SQUARE};
    use crate::numerics::stencil::DifferentialOperator;
    use crate::numerics::transient::TransientSolver;
    use glam::DVec2;

    #[test]
    fn errors_vanish_at_the_initial_step() {
        let mesh = regular_mesh(5, UNIT_SQUARE).unwrap();
        let solver = TransientSolver {
            steps: 10,
            ..TransientSolver::default()
        };
        let s = solver
            .solve(&mesh, DifferentialOperator::laplacian, |p: DVec2, t| {
                p.x * p.y + t
            })
            .unwrap();

        let qme = quadratic_mean_error(&s.approx, &s.exact);
        let maxes = max_abs_error_history(&s.approx, &s.exact);
        assert_eq!(qme.len(), 10);
        assert_eq!(qme[0], 0.0);
        assert_eq!(maxes[0], 0.0);
        for (q, m) in qme.iter().zip(&maxes) {
            assert!(q <= m);
        }
        let (max, mean) = compare_steps(&s.approx, &s.approx, 9);
        assert_eq!((max, mean), (0.0, 0.0));
    }
}
