use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use glam::DVec2;

use super::metrics::{compare_steps, max_abs_error_history, quadratic_mean_error};
use crate::config::SolverConfig;
use crate::numerics::assembly::StencilDiagnostics;
use crate::numerics::transient::{FieldHistory, Solution};
use crate::numerics::{Scheme, UpdateForm};

pub struct RunSummary {
    pub label: String,

    // Geometry
    pub num_nodes: usize,
    pub num_interior: usize,
    pub extent: (DVec2, DVec2),
    pub neighbor_width: Option<usize>,

    // Run parameters
    pub diffusivity: f64,
    pub steps: usize,
    pub dt: f64,
    pub scheme: String,
    pub form: String,

    // Stencils
    pub stencils: StencilDiagnostics,

    // Accuracy
    pub final_max_error: f64,
    pub peak_max_error: f64,
    pub final_qme: f64,
    pub peak_qme: f64,

    // Optional comparison with a second run
    pub max_solution_diff: Option<f64>,
    pub mean_solution_diff: Option<f64>,
}

impl RunSummary {
    pub fn from_solution(
        label: impl Into<String>,
        positions: &[DVec2],
        solution: &Solution,
        config: &SolverConfig,
    ) -> Self {
        let lo = positions
            .iter()
            .copied()
            .fold(DVec2::splat(f64::INFINITY), DVec2::min);
        let hi = positions
            .iter()
            .copied()
            .fold(DVec2::splat(f64::NEG_INFINITY), DVec2::max);

        let max_hist = max_abs_error_history(&solution.approx, &solution.exact);
        let qme = quadratic_mean_error(&solution.approx, &solution.exact);
        let last = |v: &[f64]| v.last().copied().unwrap_or(0.0);
        let peak = |v: &[f64]| v.iter().copied().fold(0.0, f64::max);
        let dt = match solution.times.as_slice() {
            [t0, t1, ..] => t1 - t0,
            _ => 0.0,
        };

        Self {
            label: label.into(),
            num_nodes: solution.node_count(),
            num_interior: solution.diagnostics.interior,
            extent: (lo, hi),
            neighbor_width: None,
            diffusivity: config.diffusivity,
            steps: solution.steps(),
            dt,
            scheme: match solution.scheme {
                Scheme::Explicit => "explicit".to_string(),
                Scheme::Implicit { lambda } => format!("implicit (lambda = {lambda})"),
            },
            form: match solution.form {
                UpdateForm::Matrix => "matrix".to_string(),
                UpdateForm::Direct => "direct".to_string(),
            },
            stencils: solution.diagnostics,
            final_max_error: last(&max_hist[..]),
            peak_max_error: peak(&max_hist[..]),
            final_qme: last(&qme[..]),
            peak_qme: peak(&qme[..]),
            max_solution_diff: None,
            mean_solution_diff: None,
        }
    }

    pub fn with_neighbor_width(mut self, width: usize) -> Self {
        self.neighbor_width = Some(width);
        self
    }

    /// Record how far another run's final field is from this one.
    pub fn add_comparison(&mut self, ours: &FieldHistory, other: &FieldHistory) {
        let (max, mean) = compare_steps(ours, other, ours.steps() - 1);
        self.max_solution_diff = Some(max);
        self.mean_solution_diff = Some(mean);
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;

        writeln!(file, "{}", "=".repeat(60))?;
        writeln!(file, "GFD DIFFUSION RUN SUMMARY: {}", self.label)?;
        writeln!(file, "{}", "=".repeat(60))?;
        writeln!(file)?;

        writeln!(file, "GEOMETRY")?;
        writeln!(file, "{}", "-".repeat(60))?;
        writeln!(file, "Number of nodes:     {}", self.num_nodes)?;
        writeln!(file, "Interior nodes:      {}", self.num_interior)?;
        writeln!(
            file,
            "Extent:              ({:.4}, {:.4}) to ({:.4}, {:.4})",
            self.extent.0.x, self.extent.0.y, self.extent.1.x, self.extent.1.y
        )?;
        if let Some(width) = self.neighbor_width {
            writeln!(file, "Neighbor width:      {}", width)?;
        }
        writeln!(file)?;

        writeln!(file, "RUN PARAMETERS")?;
        writeln!(file, "{}", "-".repeat(60))?;
        writeln!(file, "Diffusivity:         {:.6e}", self.diffusivity)?;
        writeln!(file, "Time levels:         {}", self.steps)?;
        writeln!(file, "dt:                  {:.6e}", self.dt)?;
        writeln!(file, "Scheme:              {}", self.scheme)?;
        writeln!(file, "Update form:         {}", self.form)?;
        writeln!(file)?;

        writeln!(file, "STENCILS")?;
        writeln!(file, "{}", "-".repeat(60))?;
        writeln!(file, "Degenerate:          {}", self.stencils.degenerate)?;
        writeln!(file, "Min rank:            {}", self.stencils.min_rank)?;
        writeln!(
            file,
            "Worst condition:     {:.6e}",
            self.stencils.worst_condition
        )?;
        writeln!(
            file,
            "Min center weight:   {:.6e}",
            self.stencils.min_center_weight
        )?;
        writeln!(file)?;

        writeln!(file, "ACCURACY")?;
        writeln!(file, "{}", "-".repeat(60))?;
        writeln!(file, "Final max error:     {:.6e}", self.final_max_error)?;
        writeln!(file, "Peak max error:      {:.6e}", self.peak_max_error)?;
        writeln!(file, "Final QME:           {:.6e}", self.final_qme)?;
        writeln!(file, "Peak QME:            {:.6e}", self.peak_qme)?;
        writeln!(file)?;

        if let (Some(max_diff), Some(mean_diff)) = (self.max_solution_diff, self.mean_solution_diff)
        {
            writeln!(file, "RUN COMPARISON")?;
            writeln!(file, "{}", "-".repeat(60))?;
            writeln!(file, "Max difference:      {:.6e}", max_diff)?;
            writeln!(file, "Mean difference:     {:.6e}", mean_diff)?;
            writeln!(file)?;
        }

        writeln!(file, "{}", "=".repeat(60))?;

        Ok(())
    }

    pub fn print_to_console(&self) {
        println!("\n{}", "=".repeat(60));
        println!("RUN SUMMARY: {}", self.label);
        println!("{}", "=".repeat(60));
        println!(
            "Nodes:         {} ({} interior)",
            self.num_nodes, self.num_interior
        );
        println!(
            "Scheme:        {} / {}, {} levels",
            self.scheme, self.form, self.steps
        );
        if self.stencils.degenerate > 0 {
            println!(
                "Stencils:      {} degenerate (min rank {})",
                self.stencils.degenerate, self.stencils.min_rank
            );
        }
        println!("Max error:     {:.3e} (final)", self.final_max_error);
        println!("QME:           {:.3e} (final)", self.final_qme);
        if let Some(max_diff) = self.max_solution_diff {
            println!("Max diff:      {:.3e}", max_diff);
        }
        println!("{}\n", "=".repeat(60));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::generator::{regular_mesh, UNIT_SQUARE};
    use crate::discretization::geometry::Geometry;
    use crate::physics::diffusion::solve_mesh;
    use crate::physics::exact::decaying_cosine;
    use std::fs;

    #[test]
    fn summary_reports_run() {
        let mesh = regular_mesh(7, UNIT_SQUARE).unwrap();
        let config = SolverConfig::default().with_steps(40);
        let out = solve_mesh(mesh.x(), mesh.y(), &decaying_cosine, &config).unwrap();
        let positions: Vec<DVec2> = (0..mesh.node_count()).map(|i| mesh.position(i)).collect();

        let mut summary = RunSummary::from_solution("mesh_7", &positions, &out.solution, &config);
        summary.add_comparison(&out.solution.approx, &out.solution.exact);
        assert_eq!(summary.num_nodes, 49);
        assert_eq!(summary.num_interior, 25);
        assert_eq!(summary.extent.0, DVec2::new(-1.0, -1.0));
        assert!(summary.final_max_error <= summary.peak_max_error);
        assert_eq!(summary.max_solution_diff, Some(summary.final_max_error));
        assert_eq!(summary.form, "direct");

        let path = std::env::temp_dir().join("gfd_test_summary.txt");
        summary.write_to_file(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("GFD DIFFUSION RUN SUMMARY: mesh_7"));
        assert!(text.contains("RUN COMPARISON"));
        fs::remove_file(&path).ok();
    }
}
