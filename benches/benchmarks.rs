use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use gfd_diffusion::config::{DEFAULT_MAX_NEIGHBORS, DEFAULT_RCOND, SolverConfig};
use gfd_diffusion::discretization::generator::{UNIT_SQUARE, jittered_cloud, regular_mesh};
use gfd_diffusion::discretization::geometry::Cloud;
use gfd_diffusion::numerics::assembly::{EvolutionOperator, assemble_weights};
use gfd_diffusion::numerics::{Scheme, UpdateForm};
use gfd_diffusion::physics::diffusion::diffusion_operator;
use gfd_diffusion::physics::exact::decaying_cosine;
use gfd_diffusion::physics::{NeighborSource, solve_cloud, solve_mesh};

fn problem_sizes() -> Vec<usize> {
    vec![21, 41]
}

fn operator_sizes() -> Vec<usize> {
    vec![11, 21]
}

fn bench_cloud_weights(c: &mut Criterion) {
    let mut group = c.benchmark_group("cloud_weights");
    let op = diffusion_operator(0.2, 1e-3);
    for &n in &problem_sizes() {
        let nodes = jittered_cloud(n, UNIT_SQUARE, 0.25, 7).unwrap();
        let cloud = Cloud::from_search(nodes, DEFAULT_MAX_NEIGHBORS, true).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &_| {
            b.iter(|| {
                let table = assemble_weights(&cloud, &op, DEFAULT_RCOND, true).unwrap();
                std::hint::black_box(table);
            });
        });
    }
    group.finish();
}

fn bench_neighbor_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighbor_search");
    for &n in &problem_sizes() {
        let nodes = jittered_cloud(n, UNIT_SQUARE, 0.25, 7).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &_| {
            b.iter_batched(
                || nodes.clone(),
                |nodes| {
                    let cloud = Cloud::from_search(nodes, DEFAULT_MAX_NEIGHBORS, true).unwrap();
                    std::hint::black_box(cloud);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_implicit_operator(c: &mut Criterion) {
    let mut group = c.benchmark_group("implicit_operator");
    group.sample_size(10);
    let op = diffusion_operator(0.2, 1e-3);
    for &n in &operator_sizes() {
        let nodes = jittered_cloud(n, UNIT_SQUARE, 0.25, 7).unwrap();
        let cloud = Cloud::from_search(nodes, DEFAULT_MAX_NEIGHBORS, true).unwrap();
        let k = assemble_weights(&cloud, &op, DEFAULT_RCOND, true)
            .unwrap()
            .to_matrix();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &_| {
            b.iter(|| {
                let evo = EvolutionOperator::build(&k, Scheme::implicit(), DEFAULT_RCOND).unwrap();
                std::hint::black_box(evo);
            });
        });
    }
    group.finish();
}

fn bench_mesh_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("mesh_run");
    group.sample_size(10);
    let config = SolverConfig::default().with_steps(200);
    for &n in &problem_sizes() {
        let mesh = regular_mesh(n, UNIT_SQUARE).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &_| {
            b.iter(|| {
                let run = solve_mesh(mesh.x(), mesh.y(), &decaying_cosine, &config).unwrap();
                std::hint::black_box(run);
            });
        });
    }
    group.finish();
}

fn bench_cloud_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("cloud_run");
    group.sample_size(10);
    for form in [UpdateForm::Matrix, UpdateForm::Direct] {
        let config = SolverConfig::default().with_steps(200).with_form(form);
        for &n in &operator_sizes() {
            let nodes = jittered_cloud(n, UNIT_SQUARE, 0.25, 7).unwrap();
            let id = BenchmarkId::new(format!("{form:?}"), n);
            group.bench_with_input(id, &n, |b, &_| {
                b.iter(|| {
                    let run =
                        solve_cloud(&nodes, &decaying_cosine, NeighborSource::Search, &config)
                            .unwrap();
                    std::hint::black_box(run);
                });
            });
        }
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_cloud_weights,
    bench_neighbor_search,
    bench_implicit_operator,
    bench_mesh_run,
    bench_cloud_run
);
criterion_main!(benches);
