use glam::DVec2;

use super::cloud::NodeSet;
use super::mesh::StructuredMesh;
use super::neighbors::{find_neighbors, neighbors_from_triangles, NeighborTable};
use crate::error::GfdResult;

/// What the assembler and the time-stepper need to know about a discretization.
pub trait Geometry: Sync {
    fn node_count(&self) -> usize;

    fn position(&self, node: usize) -> DVec2;

    fn is_boundary(&self, node: usize) -> bool;

    /// Write the neighbour indices of `node` into `out`, replacing its contents.
    fn neighbors_into(&self, node: usize, out: &mut Vec<usize>);

    /// Upper bound on the number of neighbours of any node.
    fn max_neighbors(&self) -> usize;

    fn boundary_nodes(&self) -> Vec<usize> {
        (0..self.node_count())
            .filter(|&i| self.is_boundary(i))
            .collect()
    }

    fn interior_nodes(&self) -> Vec<usize> {
        (0..self.node_count())
            .filter(|&i| !self.is_boundary(i))
            .collect()
    }
}

impl Geometry for StructuredMesh {
    fn node_count(&self) -> usize {
        StructuredMesh::node_count(self)
    }

    fn position(&self, node: usize) -> DVec2 {
        let (r, c) = self.row_col(node);
        self.position_at(r, c)
    }

    fn is_boundary(&self, node: usize) -> bool {
        let (r, c) = self.row_col(node);
        self.is_boundary_at(r, c)
    }

    fn neighbors_into(&self, node: usize, out: &mut Vec<usize>) {
        out.clear();
        let (r, c) = self.row_col(node);
        if !self.is_boundary_at(r, c) {
            out.extend_from_slice(&self.ring(r, c));
        }
    }

    fn max_neighbors(&self) -> usize {
        8
    }
}

/// Unstructured node set with a validated neighbour table.
#[derive(Clone, Debug)]
pub struct Cloud {
    nodes: NodeSet,
    neighbors: NeighborTable,
}

impl Cloud {
    /// Pair a node set with a caller-supplied table. The table is validated.
    pub fn with_table(nodes: NodeSet, neighbors: NeighborTable) -> GfdResult<Self> {
        neighbors.validate(&nodes)?;
        Ok(Self { nodes, neighbors })
    }

    /// Neighbours by nearest-neighbour search.
    pub fn from_search(nodes: NodeSet, max_neighbors: usize, parallel: bool) -> GfdResult<Self> {
        let neighbors = find_neighbors(&nodes, max_neighbors, parallel);
        Self::with_table(nodes, neighbors)
    }

    pub fn nodes(&self) -> &NodeSet {
        &self.nodes
    }

    pub fn neighbor_table(&self) -> &NeighborTable {
        &self.neighbors
    }

    pub fn into_parts(self) -> (NodeSet, NeighborTable) {
        (self.nodes, self.neighbors)
    }
}

impl Geometry for Cloud {
    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn position(&self, node: usize) -> DVec2 {
        self.nodes.get(node).position
    }

    fn is_boundary(&self, node: usize) -> bool {
        self.nodes.get(node).is_boundary()
    }

    fn neighbors_into(&self, node: usize, out: &mut Vec<usize>) {
        out.clear();
        out.extend(self.neighbors.neighbors(node));
    }

    fn max_neighbors(&self) -> usize {
        self.neighbors.width()
    }
}

/// Triangulated node set. Behaves as a [`Cloud`] whose neighbours come from
/// triangle adjacency.
#[derive(Clone, Debug)]
pub struct Triangulation {
    cloud: Cloud,
    triangles: Vec<[usize; 3]>,
}

impl Triangulation {
    /// `triangles` must already be 0-based, see
    /// [`normalize_triangles`](super::neighbors::normalize_triangles).
    pub fn new(
        nodes: NodeSet,
        triangles: Vec<[usize; 3]>,
        max_neighbors: usize,
        parallel: bool,
    ) -> GfdResult<Self> {
        let neighbors = neighbors_from_triangles(&nodes, &triangles, max_neighbors, parallel)?;
        let cloud = Cloud::with_table(nodes, neighbors)?;
        Ok(Self { cloud, triangles })
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn cloud(&self) -> &Cloud {
        &self.cloud
    }

    pub fn into_cloud(self) -> Cloud {
        self.cloud
    }
}

impl Geometry for Triangulation {
    fn node_count(&self) -> usize {
        self.cloud.node_count()
    }

    fn position(&self, node: usize) -> DVec2 {
        self.cloud.position(node)
    }

    fn is_boundary(&self, node: usize) -> bool {
        self.cloud.is_boundary(node)
    }

    fn neighbors_into(&self, node: usize, out: &mut Vec<usize>) {
        self.cloud.neighbors_into(node, out)
    }

    fn max_neighbors(&self) -> usize {
        self.cloud.max_neighbors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::cloud::Node;
    use crate::error::GfdError;
    use nalgebra::DMatrix;

    #[test]
    fn mesh_boundary_nodes_have_no_neighbors() {
        let x = DMatrix::from_fn(4, 4, |i, _| i as f64);
        let y = DMatrix::from_fn(4, 4, |_, j| j as f64);
        let mesh = StructuredMesh::new(x, y).unwrap();
        let mut buf = Vec::new();

        mesh.neighbors_into(0, &mut buf);
        assert!(buf.is_empty());

        mesh.neighbors_into(mesh.index(1, 1), &mut buf);
        assert_eq!(buf.len(), 8);
        assert_eq!(mesh.interior_nodes().len(), 4);
        assert_eq!(mesh.boundary_nodes().len(), 12);
    }

    #[test]
    fn cloud_rejects_bad_table() {
        let nodes = NodeSet::new(vec![Node::boundary(0.0, 0.0), Node::interior(1.0, 0.0)]);
        let table = NeighborTable::from_rows(vec![vec![1], vec![]], 2).unwrap();
        assert!(matches!(
            Cloud::with_table(nodes, table),
            Err(GfdError::NeighborTable { node: 1, .. })
        ));
    }
}
