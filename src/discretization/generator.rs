use std::f64::consts::PI;

use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::cloud::{Node, NodeSet};
use super::mesh::StructuredMesh;
use crate::error::{GfdError, GfdResult};

/// `[x_min, x_max, y_min, y_max]`
pub type Domain = [f64; 4];

/// The `[-1, 1] x [-1, 1]` square used by the reference problems.
pub const UNIT_SQUARE: Domain = [-1.0, 1.0, -1.0, 1.0];

fn lattice_coord(domain: &Domain, n: usize, i: usize, j: usize) -> (f64, f64) {
    let s = i as f64 / (n - 1) as f64;
    let t = j as f64 / (n - 1) as f64;
    (
        domain[0] + s * (domain[1] - domain[0]),
        domain[2] + t * (domain[3] - domain[2]),
    )
}

fn check_points_per_side(n: usize) -> GfdResult<()> {
    if n < 3 {
        return Err(GfdError::Shape(format!(
            "at least 3 points per side are required, got {n}"
        )));
    }
    Ok(())
}

/// Regular `n x n` mesh. Row index runs along x, column index along y.
pub fn regular_mesh(n: usize, domain: Domain) -> GfdResult<StructuredMesh> {
    curvilinear_mesh(n, domain, 0.0)
}

/// `n x n` mesh with interior nodes displaced by a smooth bump of relative
/// size `amplitude` (fraction of the spacing). The boundary stays straight.
pub fn curvilinear_mesh(n: usize, domain: Domain, amplitude: f64) -> GfdResult<StructuredMesh> {
    check_points_per_side(n)?;
    let hx = (domain[1] - domain[0]) / (n - 1) as f64;
    let hy = (domain[3] - domain[2]) / (n - 1) as f64;
    let last = (n - 1) as f64;

    let x = DMatrix::from_fn(n, n, |i, j| {
        let (x, _) = lattice_coord(&domain, n, i, j);
        let (s, t) = (i as f64 / last, j as f64 / last);
        x + amplitude * hx * (PI * s).sin() * (2.0 * PI * t).sin()
    });
    let y = DMatrix::from_fn(n, n, |i, j| {
        let (_, y) = lattice_coord(&domain, n, i, j);
        let (s, t) = (i as f64 / last, j as f64 / last);
        y + amplitude * hy * (2.0 * PI * s).sin() * (PI * t).sin()
    });
    StructuredMesh::new(x, y)
}

/// `n x n` lattice cloud with interior nodes jittered uniformly by up to
/// `jitter` times the spacing. Nodes are ordered `i + j * n`.
pub fn jittered_cloud(n: usize, domain: Domain, jitter: f64, seed: u64) -> GfdResult<NodeSet> {
    check_points_per_side(n)?;
    if !(jitter.is_finite() && jitter >= 0.0) {
        return Err(GfdError::Shape(format!(
            "jitter must be finite and >= 0, got {jitter}"
        )));
    }
    let hx = (domain[1] - domain[0]) / (n - 1) as f64;
    let hy = (domain[3] - domain[2]) / (n - 1) as f64;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut nodes = Vec::with_capacity(n * n);
    for j in 0..n {
        for i in 0..n {
            let (x, y) = lattice_coord(&domain, n, i, j);
            let on_edge = i == 0 || j == 0 || i == n - 1 || j == n - 1;
            if on_edge {
                nodes.push(Node::boundary(x, y));
            } else {
                let dx = rng.gen_range(-jitter..=jitter) * hx;
                let dy = rng.gen_range(-jitter..=jitter) * hy;
                nodes.push(Node::interior(x + dx, y + dy));
            }
        }
    }
    Ok(NodeSet::new(nodes))
}

/// Two triangles per lattice cell for a node set ordered like [`jittered_cloud`].
pub fn lattice_triangles(n: usize) -> Vec<[usize; 3]> {
    let cells = n.saturating_sub(1);
    let mut triangles = Vec::with_capacity(2 * cells * cells);
    for j in 0..cells {
        for i in 0..cells {
            let a = i + j * n;
            let b = a + 1;
            let c = a + n;
            let d = c + 1;
            triangles.push([a, b, d]);
            triangles.push([a, d, c]);
        }
    }
    triangles
}
