use std::fs;

use glam::DVec2;
use gfd_diffusion::config::SolverConfig;
use gfd_diffusion::discretization::generator::{UNIT_SQUARE, jittered_cloud, lattice_triangles};
use gfd_diffusion::numerics::{Scheme, UpdateForm};
use gfd_diffusion::physics::exact::decaying_cosine;
use gfd_diffusion::physics::{NeighborSource, solve_cloud};
use gfd_diffusion::processing::csv_writer;
use gfd_diffusion::processing::metrics::quadratic_mean_error;
use gfd_diffusion::processing::summary::RunSummary;

fn main() {
    fs::create_dir_all("output/schemes").expect("Failed to create schemes output directory");

    let n = 21;
    let nodes = jittered_cloud(n, UNIT_SQUARE, 0.25, 7).expect("Failed to generate cloud");
    let positions: Vec<DVec2> = nodes.positions().collect();
    let base = SolverConfig::default().with_steps(500);

    let runs = [
        ("explicit_matrix", base.clone()),
        ("explicit_direct", base.clone().with_form(UpdateForm::Direct)),
        ("implicit_half", base.clone().with_scheme(Scheme::implicit())),
        (
            "implicit_full",
            base.clone().with_scheme(Scheme::Implicit { lambda: 0.0 }),
        ),
    ];

    println!("Scheme Comparison on a {n}x{n} jittered cloud");
    println!("=============================================");

    let reference = solve_cloud(
        &nodes,
        &decaying_cosine,
        NeighborSource::Triangles(lattice_triangles(n)),
        &base,
    )
    .expect("Failed to solve triangulation reference");

    for (label, config) in runs {
        let run = solve_cloud(&nodes, &decaying_cosine, NeighborSource::Search, &config)
            .expect("Failed to solve cloud run");
        let qme = quadratic_mean_error(&run.solution.approx, &run.solution.exact);
        csv_writer::write_error_history(
            format!("output/schemes/{label}_qme.csv"),
            &run.solution.times,
            &qme,
        )
        .expect("Failed to write error history");

        let mut summary = RunSummary::from_solution(label, &positions, &run.solution, &config)
            .with_neighbor_width(run.neighbors.width());
        summary.add_comparison(&run.solution.approx, &reference.solution.approx);
        summary
            .write_to_file(format!("output/schemes/{label}_summary.txt"))
            .expect("Failed to write summary");
        summary.print_to_console();
    }
}
