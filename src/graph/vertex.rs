// src/graph/vertex.rs

use crate::graph::Edge;
use crate::graph::VertexId;

/// A graph node identified by a unique key, holding the edges that touch it.
///
/// The edge list is kept symmetric with the opposite endpoint's list by the
/// owning [`Graph`](crate::graph::Graph): every insertion and removal goes
/// through the graph so that both sides stay in agreement. The vertex itself
/// only answers read-side queries over its own list.
#[derive(Debug, Clone)]
pub struct Vertex {
    id: VertexId,
    pub(crate) edges: Vec<Edge>,
}

impl Vertex {
    pub fn new(id: impl Into<VertexId>) -> Self {
        Self {
            id: id.into(),
            edges: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// IDs this vertex points to: for an undirected edge the opposite
    /// endpoint, for a directed edge the target only when this vertex is the
    /// edge's source.
    pub fn adjacent(&self) -> impl Iterator<Item = &str> {
        self.edges.iter().filter_map(|edge| {
            if !edge.directed {
                Some(edge.opposite_of(&self.id).as_str())
            } else if edge.from == self.id {
                Some(edge.to.as_str())
            } else {
                None
            }
        })
    }

    /// IDs that point to this vertex; the mirror of [`adjacent`](Self::adjacent).
    pub fn precedent(&self) -> impl Iterator<Item = &str> {
        self.edges.iter().filter_map(|edge| {
            if !edge.directed {
                Some(edge.opposite_of(&self.id).as_str())
            } else if edge.to == self.id {
                Some(edge.from.as_str())
            } else {
                None
            }
        })
    }

    /// First edge touching `other`, if any.
    pub fn edge_between(&self, other: &str) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.has_vertex(other))
    }

    pub fn has_edge_between(&self, other: &str) -> bool {
        self.edge_between(other).is_some()
    }

    /// Structural membership test for a specific edge.
    pub fn has_edge(&self, target: &Edge) -> bool {
        self.edges.iter().any(|edge| edge == target)
    }

    /// Undirected edges count toward both degrees; directed edges count here
    /// only when this vertex is the target.
    pub fn indegree(&self) -> usize {
        self.edges
            .iter()
            .filter(|edge| !edge.directed || edge.to == self.id)
            .count()
    }

    /// Undirected edges count toward both degrees; directed edges count here
    /// only when this vertex is the source.
    pub fn outdegree(&self) -> usize {
        self.edges
            .iter()
            .filter(|edge| !edge.directed || edge.from == self.id)
            .count()
    }

    /// Reorder the edge list by [`Edge::sort_identifier`] for deterministic
    /// serialization and comparison.
    pub fn sort_edges(&mut self) {
        self.edges.sort_by_key(|edge| edge.sort_identifier());
    }
}
