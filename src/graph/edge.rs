// src/graph/edge.rs

use serde::{Deserialize, Serialize};

use crate::errors::GraphError;
use crate::graph::VertexId;

/// A link between two vertices, optionally directed, carrying a weight.
///
/// Edges do not own their vertices; they hold the IDs of endpoints owned by
/// the [`Graph`](crate::graph::Graph). An edge connecting A and B is stored
/// in *both* vertices' edge lists, so equality is structural (same endpoints,
/// direction and weight) rather than by identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: VertexId,
    pub to: VertexId,
    pub directed: bool,
    pub weight: f64,
}

/// Optional edge attributes; direction defaults to undirected, weight to 1.
#[derive(Debug, Clone, Copy)]
pub struct EdgeOptions {
    pub directed: bool,
    pub weight: f64,
}

impl Default for EdgeOptions {
    fn default() -> Self {
        Self {
            directed: false,
            weight: 1.0,
        }
    }
}

impl EdgeOptions {
    /// Shorthand for a directed edge with the default weight.
    pub fn directed() -> Self {
        Self {
            directed: true,
            ..Self::default()
        }
    }
}

impl Edge {
    /// Construct an edge between two endpoint IDs.
    ///
    /// Fails with [`GraphError::InvalidEdge`] if either endpoint is empty.
    pub fn new(
        from: impl Into<VertexId>,
        to: impl Into<VertexId>,
        opts: EdgeOptions,
    ) -> Result<Self, GraphError> {
        let from = from.into();
        let to = to.into();

        if from.is_empty() || to.is_empty() {
            return Err(GraphError::InvalidEdge { from, to });
        }

        Ok(Self {
            from,
            to,
            directed: opts.directed,
            weight: opts.weight,
        })
    }

    /// True if `id` is either endpoint of this edge.
    pub fn has_vertex(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }

    /// Return the endpoint that is not `id`.
    ///
    /// When `id` matches neither endpoint, `to` is returned. Callers that
    /// already know `id` is an endpoint never hit the fallback; it exists so
    /// the method has a total, deterministic answer.
    pub fn opposite_of(&self, id: &str) -> &VertexId {
        if self.to == id {
            &self.from
        } else {
            &self.to
        }
    }

    /// Deterministic key combining weight, endpoints and directedness, used
    /// to give a vertex's edge list a stable order.
    pub fn sort_identifier(&self) -> String {
        format!("{}|{}|{}|{}", self.weight, self.from, self.to, self.directed)
    }

    /// Plain serializable form of this edge.
    pub fn record(&self) -> EdgeRecord {
        EdgeRecord {
            from: self.from.clone(),
            to: self.to.clone(),
            directed: self.directed,
            weight: self.weight,
        }
    }
}

/// Persistence/debugging form of an [`Edge`]: endpoint IDs plus attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: VertexId,
    pub to: VertexId,
    #[serde(default)]
    pub directed: bool,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}
