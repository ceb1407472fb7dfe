use glam::DVec2;
use nalgebra::DMatrix;

use crate::error::{GfdError, GfdResult};

/// Ring offsets `(d_row, d_col)` counter-clockwise from East.
/// East is `row + 1`, North is `col + 1`.
pub const RING: [(isize, isize); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Logically rectangular mesh given by `rows x cols` coordinate arrays.
///
/// Nodes are flattened as `row + col * rows`; the outer ring of rows and
/// columns is the Dirichlet boundary.
#[derive(Clone, Debug)]
pub struct StructuredMesh {
    x: DMatrix<f64>,
    y: DMatrix<f64>,
}

impl StructuredMesh {
    pub fn new(x: DMatrix<f64>, y: DMatrix<f64>) -> GfdResult<Self> {
        if x.shape() != y.shape() {
            return Err(GfdError::Shape(format!(
                "x is {:?} but y is {:?}",
                x.shape(),
                y.shape()
            )));
        }
        if x.nrows() < 3 || x.ncols() < 3 {
            return Err(GfdError::Shape(format!(
                "a mesh needs at least 3x3 nodes to have an interior, got {:?}",
                x.shape()
            )));
        }
        Ok(Self { x, y })
    }

    pub fn rows(&self) -> usize {
        self.x.nrows()
    }

    pub fn cols(&self) -> usize {
        self.x.ncols()
    }

    pub fn node_count(&self) -> usize {
        self.x.len()
    }

    pub fn x(&self) -> &DMatrix<f64> {
        &self.x
    }

    pub fn y(&self) -> &DMatrix<f64> {
        &self.y
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row + col * self.rows()
    }

    #[inline]
    pub fn row_col(&self, node: usize) -> (usize, usize) {
        (node % self.rows(), node / self.rows())
    }

    #[inline]
    pub fn position_at(&self, row: usize, col: usize) -> DVec2 {
        DVec2::new(self.x[(row, col)], self.y[(row, col)])
    }

    pub fn is_boundary_at(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row + 1 == self.rows() || col + 1 == self.cols()
    }

    /// Flat indices of the 8-ring of an interior node in [`RING`] order.
    pub fn ring(&self, row: usize, col: usize) -> [usize; 8] {
        debug_assert!(!self.is_boundary_at(row, col));
        RING.map(|(dr, dc)| {
            self.index(
                row.wrapping_add_signed(dr),
                col.wrapping_add_signed(dc),
            )
        })
    }
}
