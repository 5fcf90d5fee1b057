// src/graph/mod.rs

//! Generic graph data structure and algorithms.
//!
//! - [`edge`] holds the edge value type and its serializable record.
//! - [`vertex`] holds a node plus the edges touching it.
//! - [`graph`] owns the vertices and implements traversal, cycle detection,
//!   topological sorting, sub-graph extraction and serialization.

pub mod edge;
pub mod graph;
pub mod vertex;

pub use edge::{Edge, EdgeOptions, EdgeRecord};
pub use graph::{DfsOptions, Graph, GraphRecord};
pub use vertex::Vertex;

/// Unique, comparable vertex key. The graph never generates these; callers
/// supply them (the batch executor uses step IDs).
pub type VertexId = String;
