use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GfdError, GfdResult};
use crate::numerics::{Scheme, UpdateForm};

/// Default maximum number of neighbours per node.
pub const DEFAULT_MAX_NEIGHBORS: usize = 8;

/// Default relative singular-value cutoff for the SVD solves.
pub const DEFAULT_RCOND: f64 = 1e-12;

/// Run parameters shared by every geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Diffusion coefficient ν.
    pub diffusivity: f64,

    /// Number of time levels over `[0, 1]`, including `t = 0`.
    pub steps: usize,

    /// Width of the neighbour table (`nvec`).
    pub max_neighbors: usize,

    pub scheme: Scheme,

    pub form: UpdateForm,

    /// Singular values below `rcond * sigma_max` are treated as zero.
    pub rcond: f64,

    /// Use rayon for per-node work.
    pub parallel: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            diffusivity: 0.2,
            steps: 1000,
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
            scheme: Scheme::Explicit,
            form: UpdateForm::Matrix,
            rcond: DEFAULT_RCOND,
            parallel: true,
        }
    }
}

impl SolverConfig {
    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_diffusivity(mut self, diffusivity: f64) -> Self {
        self.diffusivity = diffusivity;
        self
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_form(mut self, form: UpdateForm) -> Self {
        self.form = form;
        self
    }

    pub fn validate(&self) -> GfdResult<()> {
        if !(self.diffusivity.is_finite() && self.diffusivity > 0.0) {
            return Err(GfdError::Config(format!(
                "diffusivity must be finite and > 0, got {}",
                self.diffusivity
            )));
        }
        if self.steps < 2 {
            return Err(GfdError::Config(format!(
                "steps must be >= 2, got {}",
                self.steps
            )));
        }
        if self.max_neighbors == 0 {
            return Err(GfdError::Config(
                "max_neighbors must be >= 1".to_string(),
            ));
        }
        if !(self.rcond >= 0.0 && self.rcond.is_finite()) {
            return Err(GfdError::Config(format!(
                "rcond must be finite and >= 0, got {}",
                self.rcond
            )));
        }
        if let Scheme::Implicit { lambda } = self.scheme {
            if !(0.0..=1.0).contains(&lambda) {
                return Err(GfdError::Config(format!(
                    "lambda must be in [0, 1], got {lambda}"
                )));
            }
            if self.form == UpdateForm::Direct {
                return Err(GfdError::Config(
                    "the direct neighbor-sum form only supports the explicit scheme".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Load from a JSON string. Missing fields take their defaults.
    pub fn from_json(json: &str) -> GfdResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> GfdResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        SolverConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_direct_implicit_combination() {
        let config = SolverConfig::default()
            .with_scheme(Scheme::implicit())
            .with_form(UpdateForm::Direct);
        assert!(matches!(config.validate(), Err(GfdError::Config(_))));
    }

    #[test]
    fn rejects_lambda_outside_unit_interval() {
        let config = SolverConfig::default().with_scheme(Scheme::Implicit { lambda: 1.5 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_diffusivity() {
        assert!(SolverConfig::default().with_diffusivity(0.0).validate().is_err());
        assert!(SolverConfig::default().with_diffusivity(f64::NAN).validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = SolverConfig::from_json(
            r#"{"steps": 50, "scheme": {"kind": "implicit", "lambda": 0.25}}"#,
        )
        .unwrap();
        assert_eq!(config.steps, 50);
        assert_eq!(config.scheme, Scheme::Implicit { lambda: 0.25 });
        assert_eq!(config.max_neighbors, DEFAULT_MAX_NEIGHBORS);
        assert_eq!(config.form, UpdateForm::Matrix);
    }

    #[test]
    fn invalid_json_config_is_rejected() {
        assert!(SolverConfig::from_json(r#"{"steps": 1}"#).is_err());
        assert!(matches!(
            SolverConfig::from_json("{not json"),
            Err(GfdError::Json(_))
        ));
    }
}
