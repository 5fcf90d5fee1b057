// src/errors.rs

//! Structured error types for the graph library and the batch executor.
//!
//! The graph layer reports everything through [`GraphError`] so callers can
//! match on the exact failure (e.g. distinguish a real cycle from a misuse of
//! the API). The exec layer wraps graph errors and adds its own scheduling
//! failures in [`ExecError`]. The application layer on top of both keeps
//! using `anyhow` for context-rich propagation.

use thiserror::Error;

use crate::graph::VertexId;

/// Errors raised by the graph data structure and its algorithms.
#[derive(Debug, Error)]
pub enum GraphError {
    /// An edge needs two endpoints; empty IDs are rejected at construction.
    #[error("cannot construct an edge without two vertices (from {from:?} to {to:?})")]
    InvalidEdge { from: String, to: String },

    /// A vertex with this ID is already present in the graph.
    #[error("a vertex with ID {0} already exists in the graph")]
    DuplicateVertex(VertexId),

    /// The named vertex is not present in the graph.
    #[error("vertex with ID {0} does not exist in the graph")]
    VertexNotFound(VertexId),

    /// DFS found a cycle while `allow_cycle` was false. Carries the two
    /// offending vertex IDs (the revisited vertex and the vertex it was
    /// reached from).
    #[error("cycle exists from {from} to {to}")]
    CycleDetected { from: VertexId, to: VertexId },

    /// The requested operation is not meaningful for this graph, e.g.
    /// topological sorting or root-finding on an undirected graph.
    #[error("{0}")]
    InvalidOperation(String),
}

/// Errors raised while compiling or executing a batch of steps.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Two step descriptors in the same batch share an ID.
    #[error("duplicate step ID {0}")]
    DuplicateStepId(String),

    /// A graph construction or validation failure, surfaced as-is.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The injected task capability failed for a step.
    #[error("task '{step}' failed: {source}")]
    TaskFailed {
        step: String,
        #[source]
        source: anyhow::Error,
    },
}
