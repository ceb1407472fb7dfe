//! Closed-form solutions of `u_t = nu (u_xx + u_yy)` used as boundary data
//! and references. Generic over [`DualNum`] so the same expression gives
//! plain values and exact derivatives.

use std::f64::consts::PI;

use num_dual::{DualNum, HyperDual64};

/// `exp(-2 pi^2 nu t) cos(pi x) cos(pi y)`
pub fn decaying_cosine_field<D: DualNum<f64>>(x: D, y: D, t: f64, diffusivity: f64) -> D {
    let decay = (-2.0 * PI * PI * diffusivity * t).exp();
    (x * D::from(PI)).cos() * (y * D::from(PI)).cos() * D::from(decay)
}

/// `exp(-2 pi^2 nu t) sin(pi x) sin(pi y)`; vanishes on the edges of `[-1, 1]^2`.
pub fn decaying_sine_field<D: DualNum<f64>>(x: D, y: D, t: f64, diffusivity: f64) -> D {
    let decay = (-2.0 * PI * PI * diffusivity * t).exp();
    (x * D::from(PI)).sin() * (y * D::from(PI)).sin() * D::from(decay)
}

pub fn decaying_cosine(x: f64, y: f64, t: f64, diffusivity: f64) -> f64 {
    decaying_cosine_field(x, y, t, diffusivity)
}

pub fn decaying_sine(x: f64, y: f64, t: f64, diffusivity: f64) -> f64 {
    decaying_sine_field(x, y, t, diffusivity)
}

/// Snapshot of [`decaying_cosine_field`] at fixed `t`, in the form the
/// truncation checks take.
pub fn decaying_cosine_snapshot(
    t: f64,
    diffusivity: f64,
) -> impl Fn(HyperDual64, HyperDual64) -> HyperDual64 {
    move |x, y| decaying_cosine_field(x, y, t, diffusivity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::operator_check::taylor_derivatives;
    use glam::DVec2;

    #[test]
    fn satisfies_the_heat_equation() {
        let (nu, t) = (0.2, 0.3);
        let p = DVec2::new(0.17, -0.42);
        let d = taylor_derivatives(&decaying_cosine_snapshot(t, nu), p);
        let laplacian = d[2] + d[4];
        let dt = 1e-6;
        let u_t = (decaying_cosine(p.x, p.y, t + dt, nu) - decaying_cosine(p.x, p.y, t - dt, nu))
            / (2.0 * dt);
        assert!((u_t - nu * laplacian).abs() < 1e-6, "{u_t} vs {}", nu * laplacian);
    }

    #[test]
    fn sine_mode_vanishes_on_square_edges() {
        for s in [-1.0, -0.3, 0.5, 1.0] {
            assert!(decaying_sine(1.0, s, 0.1, 0.2).abs() < 1e-15);
            assert!(decaying_sine(s, -1.0, 0.1, 0.2).abs() < 1e-15);
        }
    }
}
