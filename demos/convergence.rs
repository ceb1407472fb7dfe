use std::fs;

use gfd_diffusion::config::SolverConfig;
use gfd_diffusion::discretization::generator::{UNIT_SQUARE, curvilinear_mesh};
use gfd_diffusion::numerics::operator_check::truncation_error;
use gfd_diffusion::numerics::stencil::DifferentialOperator;
use gfd_diffusion::numerics::transient::TransientSolver;
use gfd_diffusion::physics::exact::{decaying_cosine, decaying_cosine_snapshot};
use gfd_diffusion::physics::solve_mesh;
use gfd_diffusion::processing::csv_writer;
use gfd_diffusion::processing::metrics::max_abs_error;

fn main() {
    fs::create_dir_all("output/convergence").expect("Failed to create convergence output directory");

    let sizes = [11, 21, 41, 81];
    let amplitudes = [0.0, 0.3];
    let config = SolverConfig::default().with_steps(800);
    let laplacian = DifferentialOperator::laplacian(1.0);
    let solver = TransientSolver::from_config(&config);

    println!("Mesh Refinement Study");
    println!("=====================");
    println!("Diffusivity: {:.3}", config.diffusivity);
    println!("Time levels: {}", config.steps);
    println!();

    for &amplitude in &amplitudes {
        println!("Curvilinear amplitude {amplitude:.2}");
        let mut spacing = Vec::new();
        let mut truncation = Vec::new();
        let mut final_error = Vec::new();

        for &n in &sizes {
            let mesh = curvilinear_mesh(n, UNIT_SQUARE, amplitude).expect("Failed to build mesh");

            let table = solver
                .stencils(&mesh, &laplacian)
                .expect("Failed to assemble stencils");
            let report = truncation_error(&mesh, &table, &laplacian, decaying_cosine_snapshot(0.0, 0.2));

            let run = solve_mesh(mesh.x(), mesh.y(), &decaying_cosine, &config)
                .expect("Failed to solve mesh run");
            let last = run.solution.steps() - 1;
            let err = max_abs_error(&run.solution.approx, &run.solution.exact, last);

            println!(
                "  n = {:>3}: laplacian error {:.3e}, final max error {:.3e}",
                n, report.max_error, err
            );
            spacing.push(2.0 / (n - 1) as f64);
            truncation.push(report.max_error);
            final_error.push(err);
        }

        for i in 1..sizes.len() {
            let order = (final_error[i - 1] / final_error[i]).log2();
            println!("  order {} -> {}: {:.2}", sizes[i - 1], sizes[i], order);
        }
        println!();

        csv_writer::write_csv(
            format!("output/convergence/amplitude_{amplitude:.2}.csv"),
            &["h", "laplacian_error", "final_max_error"],
            &[spacing, truncation, final_error],
        )
        .expect("Failed to write convergence table");
    }
}
