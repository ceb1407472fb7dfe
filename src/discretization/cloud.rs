use glam::DVec2;

use crate::error::{GfdError, GfdResult};

/// Role of a node in the time march.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Updated by the stencil every step (flag 0).
    Interior,
    /// Dirichlet node, value taken from the boundary function (flag 1).
    Boundary,
}

impl NodeKind {
    /// Parse the trailing flag column of a node array. Only exact 0 and 1 are accepted.
    pub fn from_flag(node: usize, flag: f64) -> GfdResult<Self> {
        if flag == 0.0 {
            Ok(NodeKind::Interior)
        } else if flag == 1.0 {
            Ok(NodeKind::Boundary)
        } else {
            Err(GfdError::BoundaryFlag { node, flag })
        }
    }

    pub fn flag(self) -> f64 {
        match self {
            NodeKind::Interior => 0.0,
            NodeKind::Boundary => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub position: DVec2,
    pub kind: NodeKind,
}

impl Node {
    pub fn interior(x: f64, y: f64) -> Self {
        Self {
            position: DVec2::new(x, y),
            kind: NodeKind::Interior,
        }
    }

    pub fn boundary(x: f64, y: f64) -> Self {
        Self {
            position: DVec2::new(x, y),
            kind: NodeKind::Boundary,
        }
    }

    pub fn is_boundary(&self) -> bool {
        self.kind == NodeKind::Boundary
    }
}

/// Ordered set of nodes. The order defines every index used by the solver.
#[derive(Clone, Debug, Default)]
pub struct NodeSet {
    nodes: Vec<Node>,
}

impl NodeSet {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Build from `m x 3` rows of `(x, y, flag)`.
    pub fn from_rows(rows: &[[f64; 3]]) -> GfdResult<Self> {
        let nodes = rows
            .iter()
            .enumerate()
            .map(|(i, &[x, y, flag])| {
                Ok(Node {
                    position: DVec2::new(x, y),
                    kind: NodeKind::from_flag(i, flag)?,
                })
            })
            .collect::<GfdResult<Vec<_>>>()?;
        Ok(Self { nodes })
    }

    pub fn to_rows(&self) -> Vec<[f64; 3]> {
        self.nodes
            .iter()
            .map(|n| [n.position.x, n.position.y, n.kind.flag()])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn get(&self, i: usize) -> &Node {
        &self.nodes[i]
    }

    pub fn positions(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.nodes.iter().map(|n| n.position)
    }

    pub fn interior_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_boundary()).count()
    }
}
