use std::time::Instant;

use glam::DVec2;
use nalgebra::{DMatrix, DVectorView};
use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

use super::assembly::{assemble_weights, EvolutionOperator, StencilDiagnostics, WeightTable};
use super::stencil::DifferentialOperator;
use super::timing::{
    finalize_and_print, record_assembly, record_operator, record_step, reset_timing,
};
use super::{Scheme, TimeGrid, UpdateForm};
use crate::config::SolverConfig;
use crate::discretization::geometry::Geometry;
use crate::error::{GfdError, GfdResult};

/// Node values over all time levels, stored `nodes x steps`.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldHistory {
    values: DMatrix<f64>,
}

impl FieldHistory {
    pub fn zeros(nodes: usize, steps: usize) -> Self {
        Self {
            values: DMatrix::zeros(nodes, steps),
        }
    }

    pub fn node_count(&self) -> usize {
        self.values.nrows()
    }

    pub fn steps(&self) -> usize {
        self.values.ncols()
    }

    pub fn at(&self, node: usize, step: usize) -> f64 {
        self.values[(node, step)]
    }

    pub fn step(&self, step: usize) -> DVectorView<'_, f64> {
        self.values.column(step)
    }

    pub fn last(&self) -> DVectorView<'_, f64> {
        self.values.column(self.steps() - 1)
    }

    pub fn node_series(&self, node: usize) -> Vec<f64> {
        self.values.row(node).iter().copied().collect()
    }

    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn into_matrix(self) -> DMatrix<f64> {
        self.values
    }

    /// Level `step - 1` and a mutable view of level `step`.
    fn split_at_step(&mut self, step: usize) -> (&[f64], &mut [f64]) {
        let n = self.values.nrows();
        let (head, tail) = self.values.as_mut_slice().split_at_mut(step * n);
        (&head[(step - 1) * n..], &mut tail[..n])
    }
}

/// Result of one run.
#[derive(Clone, Debug)]
pub struct Solution {
    pub times: Vec<f64>,
    pub approx: FieldHistory,
    pub exact: FieldHistory,
    pub diagnostics: StencilDiagnostics,
    pub scheme: Scheme,
    pub form: UpdateForm,
}

impl Solution {
    pub fn node_count(&self) -> usize {
        self.approx.node_count()
    }

    pub fn steps(&self) -> usize {
        self.times.len()
    }
}

/// Marches `du/dt = L u` over `t in [0, 1]` with GFD stencils.
#[derive(Clone, Debug)]
pub struct TransientSolver {
    pub steps: usize,
    pub scheme: Scheme,
    pub form: UpdateForm,
    pub rcond: f64,
    pub parallel: bool,
}

impl Default for TransientSolver {
    fn default() -> Self {
        Self::from_config(&SolverConfig::default())
    }
}

impl TransientSolver {
    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            steps: config.steps,
            scheme: config.scheme,
            form: config.form,
            rcond: config.rcond,
            parallel: config.parallel,
        }
    }

    pub fn time_grid(&self) -> GfdResult<TimeGrid> {
        TimeGrid::unit(self.steps)
    }

    /// Run the solver.
    ///
    /// `increment` maps `dt` to the operator whose stencils give the change
    /// of `u` over one step. `boundary(p, t)` supplies the initial field, the
    /// Dirichlet values and the reference solution stored in
    /// [`Solution::exact`]. Boundary entries of the approximation are copied
    /// from it verbatim and never touched by the update.
    pub fn solve<G, I, B>(&self, geometry: &G, increment: I, boundary: B) -> GfdResult<Solution>
    where
        G: Geometry,
        I: FnOnce(f64) -> DifferentialOperator,
        B: Fn(DVec2, f64) -> f64 + Sync,
    {
        if self.form == UpdateForm::Direct && self.scheme.is_implicit() {
            return Err(GfdError::Config(
                "the direct neighbor-sum form only supports the explicit scheme".to_string(),
            ));
        }
        let start = Instant::now();
        reset_timing();

        let grid = self.time_grid()?;
        let n = geometry.node_count();
        if n == 0 {
            return Err(GfdError::Shape("geometry has no nodes".to_string()));
        }
        let operator = increment(grid.dt);
        info!(
            nodes = n,
            steps = grid.len(),
            dt = grid.dt,
            scheme = self.scheme.label(),
            form = ?self.form,
            "starting GFD time integration"
        );

        let table = record_assembly(|| {
            assemble_weights(geometry, &operator, self.rcond, self.parallel)
        })?;
        let diagnostics = table.diagnostics();
        debug!(?diagnostics, "stencils assembled");
        if !self.scheme.is_implicit() && diagnostics.min_center_weight < -2.0 {
            warn!(
                min_center_weight = diagnostics.min_center_weight,
                "explicit update amplifies at some nodes; reduce dt or refine"
            );
        }

        let positions: Vec<DVec2> = (0..n).map(|i| geometry.position(i)).collect();
        let exact = self.reference(&positions, &grid, &boundary);
        let mut approx = FieldHistory::zeros(n, grid.len());
        approx.values.set_column(0, &exact.step(0));
        for node in geometry.boundary_nodes() {
            approx.values.set_row(node, &exact.values.row(node));
        }

        match self.form {
            UpdateForm::Matrix => {
                let op = record_operator(|| {
                    EvolutionOperator::build(&table.to_matrix(), self.scheme, self.rcond)
                })?;
                let interior = geometry.interior_nodes();
                self.march(&grid, |k| {
                    let next = op.apply(&approx.step(k - 1));
                    for &i in &interior {
                        approx.values[(i, k)] = next[i];
                    }
                });
            }
            UpdateForm::Direct => {
                self.march(&grid, |k| {
                    let (prev, next) = approx.split_at_step(k);
                    table.advance(prev, next, self.parallel);
                });
            }
        }

        let elapsed = start.elapsed();
        info!(elapsed_ms = elapsed.as_millis() as u64, "time integration finished");
        finalize_and_print(elapsed);

        Ok(Solution {
            times: grid.times,
            approx,
            exact,
            diagnostics,
            scheme: self.scheme,
            form: self.form,
        })
    }

    /// Stencils `solve` would assemble for the given step operator.
    pub fn stencils<G: Geometry>(
        &self,
        geometry: &G,
        operator: &DifferentialOperator,
    ) -> GfdResult<WeightTable> {
        assemble_weights(geometry, operator, self.rcond, self.parallel)
    }

    fn march(&self, grid: &TimeGrid, mut advance: impl FnMut(usize)) {
        let report_every = (grid.len() / 10).max(1);
        for k in 1..grid.len() {
            record_step(|| advance(k));
            if k % report_every == 0 {
                debug!(step = k, t = grid.times[k], "advanced");
            } else {
                trace!(step = k, t = grid.times[k], "advanced");
            }
        }
    }

    fn reference<B>(&self, positions: &[DVec2], grid: &TimeGrid, boundary: &B) -> FieldHistory
    where
        B: Fn(DVec2, f64) -> f64 + Sync,
    {
        let n = positions.len();
        let mut history = FieldHistory::zeros(n, grid.len());
        let fill = |(k, column): (usize, &mut [f64])| {
            let t = grid.times[k];
            for (slot, &p) in column.iter_mut().zip(positions) {
                *slot = boundary(p, t);
            }
        };
        let data = history.values.as_mut_slice();
        if self.parallel {
            data.par_chunks_mut(n).enumerate().for_each(fill);
        } else {
            data.chunks_mut(n).enumerate().for_each(fill);
        }
        history
    }
}
