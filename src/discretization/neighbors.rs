//! Neighbour tables and the two ways of producing them: distance search for
//! point clouds and adjacency for triangulations.

use std::collections::BTreeSet;

use rayon::prelude::*;

use super::cloud::NodeSet;
use crate::error::{GfdError, GfdResult};

/// Per-node neighbour indices, `width` slots per row, right-padded with `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborTable {
    width: usize,
    slots: Vec<Option<usize>>,
}

impl NeighborTable {
    /// Build from rows that are already padded to `width` or shorter.
    /// Shorter rows are padded; longer rows are rejected.
    pub fn from_rows(rows: Vec<Vec<usize>>, width: usize) -> GfdResult<Self> {
        let mut slots = Vec::with_capacity(rows.len() * width);
        for (node, row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(GfdError::NeighborTable {
                    node,
                    reason: format!("{} neighbors exceed table width {width}", row.len()),
                });
            }
            let pad = width - row.len();
            slots.extend(row.into_iter().map(Some));
            slots.extend(std::iter::repeat(None).take(pad));
        }
        Ok(Self { width, slots })
    }

    /// Pad rows known to fit in `width`.
    fn padded(rows: Vec<Vec<usize>>, width: usize) -> Self {
        let mut slots = Vec::with_capacity(rows.len() * width);
        for row in rows {
            debug_assert!(row.len() <= width);
            let pad = width.saturating_sub(row.len());
            slots.extend(row.into_iter().take(width).map(Some));
            slots.extend(std::iter::repeat(None).take(pad));
        }
        Self { width, slots }
    }

    /// Build from a signed index array where any negative entry is the sentinel.
    pub fn from_signed(rows: &[Vec<i64>]) -> GfdResult<Self> {
        let width = rows.first().map_or(0, |r| r.len());
        let mut slots = Vec::with_capacity(rows.len() * width);
        for (node, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(GfdError::NeighborTable {
                    node,
                    reason: format!("row has {} slots, expected {width}", row.len()),
                });
            }
            slots.extend(row.iter().map(|&j| usize::try_from(j).ok()));
        }
        Ok(Self { width, slots })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        if self.width == 0 {
            0
        } else {
            self.slots.len() / self.width
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw row including sentinel slots.
    pub fn row(&self, node: usize) -> &[Option<usize>] {
        &self.slots[node * self.width..(node + 1) * self.width]
    }

    /// Number of non-sentinel entries in the row.
    pub fn count(&self, node: usize) -> usize {
        self.row(node).iter().filter(|s| s.is_some()).count()
    }

    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.row(node).iter().filter_map(|s| *s)
    }

    /// Rows as signed indices with `-1` for empty slots.
    pub fn to_signed(&self) -> Vec<Vec<i64>> {
        (0..self.len())
            .map(|i| {
                self.row(i)
                    .iter()
                    .map(|s| s.map_or(-1, |j| j as i64))
                    .collect()
            })
            .collect()
    }

    /// Check the table against a node set: one row per node, indices in range,
    /// sentinels only as right padding and at least one neighbour per interior node.
    pub fn validate(&self, nodes: &NodeSet) -> GfdResult<()> {
        if self.len() != nodes.len() {
            return Err(GfdError::NeighborTable {
                node: self.len().min(nodes.len()),
                reason: format!(
                    "table has {} rows for {} nodes",
                    self.len(),
                    nodes.len()
                ),
            });
        }
        for node in 0..self.len() {
            let row = self.row(node);
            let filled = row.iter().take_while(|s| s.is_some()).count();
            if row[filled..].iter().any(|s| s.is_some()) {
                return Err(GfdError::NeighborTable {
                    node,
                    reason: "sentinel entries must be right-padded".to_string(),
                });
            }
            if let Some(&bad) = row[..filled]
                .iter()
                .flatten()
                .find(|&&j| j >= nodes.len())
            {
                return Err(GfdError::NeighborTable {
                    node,
                    reason: format!("neighbor index {bad} out of range for {} nodes", nodes.len()),
                });
            }
            if filled == 0 && !nodes.get(node).is_boundary() {
                return Err(GfdError::NeighborTable {
                    node,
                    reason: "interior node has no neighbors".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Sort candidate neighbours of `node` by distance, ties by index, and keep `k`.
fn nearest_of(
    nodes: &NodeSet,
    node: usize,
    candidates: impl Iterator<Item = usize>,
    k: usize,
) -> Vec<usize> {
    let origin = nodes.get(node).position;
    let mut ranked: Vec<(f64, usize)> = candidates
        .filter(|&j| j != node)
        .map(|j| (origin.distance_squared(nodes.get(j).position), j))
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    ranked.truncate(k);
    ranked.into_iter().map(|(_, j)| j).collect()
}

/// `k` nearest neighbours of every node by Euclidean distance.
/// `parallel` spreads the per-node search over the rayon pool.
pub fn find_neighbors(nodes: &NodeSet, k: usize, parallel: bool) -> NeighborTable {
    let search = |i| nearest_of(nodes, i, 0..nodes.len(), k);
    let rows: Vec<Vec<usize>> = if parallel {
        (0..nodes.len()).into_par_iter().map(search).collect()
    } else {
        (0..nodes.len()).map(search).collect()
    };
    NeighborTable::padded(rows, k)
}

/// Shift a triangle index array to 0-based when its smallest index is 1.
pub fn normalize_triangles(raw: &[[i64; 3]]) -> GfdResult<Vec<[usize; 3]>> {
    if let Some(t) = raw.iter().position(|tri| tri.iter().any(|&v| v < 0)) {
        return Err(GfdError::Triangle {
            triangle: t,
            reason: "negative vertex index".to_string(),
        });
    }
    let offset = match raw.iter().flatten().copied().min() {
        Some(1) => 1,
        _ => 0,
    };
    Ok(raw
        .iter()
        .map(|tri| tri.map(|v| (v - offset) as usize))
        .collect())
}

/// Neighbours from triangle adjacency: every node sharing a triangle, nearest first.
pub fn neighbors_from_triangles(
    nodes: &NodeSet,
    triangles: &[[usize; 3]],
    k: usize,
    parallel: bool,
) -> GfdResult<NeighborTable> {
    let mut adjacency: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); nodes.len()];
    for (t, tri) in triangles.iter().enumerate() {
        if let Some(&v) = tri.iter().find(|&&v| v >= nodes.len()) {
            return Err(GfdError::Triangle {
                triangle: t,
                reason: format!("vertex {v} out of range for {} nodes", nodes.len()),
            });
        }
        for &a in tri {
            for &b in tri {
                if a != b {
                    adjacency[a].insert(b);
                }
            }
        }
    }

    let rank = |(i, adj): (usize, &BTreeSet<usize>)| nearest_of(nodes, i, adj.iter().copied(), k);
    let rows: Vec<Vec<usize>> = if parallel {
        adjacency.par_iter().enumerate().map(rank).collect()
    } else {
        adjacency.iter().enumerate().map(rank).collect()
    };
    Ok(NeighborTable::padded(rows, k))
}
