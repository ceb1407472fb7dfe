pub mod assembly;
pub mod operator_check;
pub mod stencil;
pub mod timing;
pub mod transient;

use serde::{Deserialize, Serialize};

use crate::error::{GfdError, GfdResult};

/// Default blending parameter of the implicit scheme (Crank-Nicolson-like).
pub const DEFAULT_LAMBDA: f64 = 0.5;

/// Time discretization used to march the field.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scheme {
    /// `K2 = I + K`
    Explicit,
    /// `K2 = (I - (1 - lambda) K)^+ (I + lambda K)`.
    /// `lambda` weights the previous-step half of the blend.
    Implicit {
        #[serde(default = "default_lambda")]
        lambda: f64,
    },
}

fn default_lambda() -> f64 {
    DEFAULT_LAMBDA
}

impl Default for Scheme {
    fn default() -> Self {
        Scheme::Explicit
    }
}

impl Scheme {
    pub fn implicit() -> Self {
        Scheme::Implicit {
            lambda: DEFAULT_LAMBDA,
        }
    }

    pub fn is_implicit(&self) -> bool {
        matches!(self, Scheme::Implicit { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Scheme::Explicit => "explicit",
            Scheme::Implicit { .. } => "implicit",
        }
    }
}

/// How the assembled stencils are applied each step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateForm {
    /// Dense global evolution operator, one mat-vec per step.
    #[default]
    Matrix,
    /// Per-node neighbour sums from the weight table. Explicit only.
    Direct,
}

/// Uniform time levels over `[0, 1]`.
#[derive(Clone, Debug)]
pub struct TimeGrid {
    pub times: Vec<f64>,
    pub dt: f64,
}

impl TimeGrid {
    /// `steps` equally spaced levels including both end points.
    pub fn unit(steps: usize) -> GfdResult<Self> {
        if steps < 2 {
            return Err(GfdError::Config(format!(
                "at least 2 time levels are required, got {steps}"
            )));
        }
        let last = (steps - 1) as f64;
        let times: Vec<f64> = (0..steps).map(|k| k as f64 / last).collect();
        let dt = times[1] - times[0];
        Ok(Self { times, dt })
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_grid_spans_zero_to_one() {
        let grid = TimeGrid::unit(5).unwrap();
        assert_eq!(grid.times, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(grid.dt, 0.25);
    }

    #[test]
    fn unit_grid_rejects_single_level() {
        assert!(matches!(TimeGrid::unit(1), Err(GfdError::Config(_))));
    }

    #[test]
    fn scheme_json_defaults_lambda() {
        let scheme: Scheme = serde_json::from_str(r#"{"kind":"implicit"}"#).unwrap();
        assert_eq!(scheme, Scheme::implicit());
        let scheme: Scheme = serde_json::from_str(r#"{"kind":"explicit"}"#).unwrap();
        assert_eq!(scheme, Scheme::Explicit);
    }
}
