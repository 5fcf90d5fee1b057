// src/graph/graph.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::errors::GraphError;
use crate::graph::edge::{Edge, EdgeOptions, EdgeRecord};
use crate::graph::vertex::Vertex;
use crate::graph::VertexId;

/// Vertex colour during depth-first search:
/// unvisited, on the current recursion stack, or finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Options for [`Graph::depth_first_search`].
#[derive(Debug, Clone)]
pub struct DfsOptions {
    /// Starting vertices; defaults to every vertex in the graph.
    pub sources: Option<Vec<VertexId>>,
    /// When false, sources are pre-marked visited and excluded from the
    /// output; the search runs only from their direct neighbours.
    pub include_sources: bool,
    /// When false, finding a cycle fails with [`GraphError::CycleDetected`].
    pub allow_cycle: bool,
    /// Traversal mode; defaults to [`Graph::is_directed`].
    pub is_directed: Option<bool>,
    /// Marks this search as a topological sort; requires directed mode.
    pub topological_sorting: bool,
}

impl Default for DfsOptions {
    fn default() -> Self {
        Self {
            sources: None,
            include_sources: true,
            allow_cycle: true,
            is_directed: None,
            topological_sorting: false,
        }
    }
}

/// Plain serializable form of a [`Graph`]: sorted vertex IDs plus a
/// de-duplicated structural edge list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRecord {
    pub vertices: Vec<VertexId>,
    pub edges: Vec<EdgeRecord>,
}

/// An unordered collection of vertices keyed by ID.
///
/// The graph owns its vertices; edges reference endpoints by ID and are
/// stored symmetrically in both endpoints' edge lists. All edge mutation
/// goes through the graph so that both sides are always updated together.
///
/// Keyed by `BTreeMap` so traversals and serialization are deterministic.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    vertices: BTreeMap<VertexId, Vertex>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex(&self, id: &str) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn has_vertex(&self, id: &str) -> bool {
        self.vertices.contains_key(id)
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = &str> {
        self.vertices.keys().map(|id| id.as_str())
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    /// Add a standalone vertex. Fails with [`GraphError::DuplicateVertex`] if
    /// the ID is already taken.
    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<(), GraphError> {
        if self.vertices.contains_key(vertex.id()) {
            return Err(GraphError::DuplicateVertex(vertex.id().to_string()));
        }
        self.vertices.insert(vertex.id().to_string(), vertex);
        Ok(())
    }

    /// Remove a vertex and prune every edge that referenced it from the
    /// remaining vertices, so no dangling edges survive.
    pub fn remove_vertex(&mut self, id: &str) -> Result<(), GraphError> {
        if self.vertices.remove(id).is_none() {
            return Err(GraphError::VertexNotFound(id.to_string()));
        }
        self.prune();
        Ok(())
    }

    /// Create an edge from `from` to `to` and insert it into both endpoints'
    /// edge lists. Both endpoints must already be in the graph.
    pub fn add_edge(
        &mut self,
        from: &str,
        to: &str,
        opts: EdgeOptions,
    ) -> Result<Edge, GraphError> {
        if !self.vertices.contains_key(from) {
            return Err(GraphError::VertexNotFound(from.to_string()));
        }
        if !self.vertices.contains_key(to) {
            return Err(GraphError::VertexNotFound(to.to_string()));
        }

        let edge = Edge::new(from, to, opts)?;

        if let Some(vertex) = self.vertices.get_mut(from) {
            vertex.edges.push(edge.clone());
        }
        // A self-loop keeps a single copy in the one list it belongs to.
        if from != to {
            if let Some(vertex) = self.vertices.get_mut(to) {
                vertex.edges.push(edge.clone());
            }
        }

        Ok(edge)
    }

    /// Remove all structurally-equal copies of `edge` from both endpoints'
    /// edge lists.
    pub fn remove_edge(&mut self, edge: &Edge) {
        for endpoint in [edge.from.clone(), edge.to.clone()] {
            if let Some(vertex) = self.vertices.get_mut(&endpoint) {
                vertex.edges.retain(|e| e != edge);
            }
        }
    }

    /// Remove every edge connecting `left` and `right`, from both sides.
    pub fn remove_edges_between(&mut self, left: &str, right: &str) {
        if let Some(vertex) = self.vertices.get_mut(left) {
            vertex.edges.retain(|e| !e.has_vertex(right));
        }
        if left != right {
            if let Some(vertex) = self.vertices.get_mut(right) {
                vertex.edges.retain(|e| !e.has_vertex(left));
            }
        }
    }

    /// Structural membership test for an edge anywhere in the graph.
    pub fn has_edge(&self, edge: &Edge) -> bool {
        self.vertices.values().any(|vertex| vertex.has_edge(edge))
    }

    /// First edge connecting `left` and `right`, if any.
    pub fn edge_between(&self, left: &str, right: &str) -> Option<&Edge> {
        if let Some(edge) = self.vertices.get(left).and_then(|v| v.edge_between(right)) {
            return Some(edge);
        }
        self.vertices.get(right).and_then(|v| v.edge_between(left))
    }

    pub fn has_edge_between(&self, left: &str, right: &str) -> bool {
        self.edge_between(left, right).is_some()
    }

    /// True iff at least one edge in the graph is directed. A graph may hold
    /// a mix of directed and undirected edges.
    pub fn is_directed(&self) -> bool {
        self.vertices
            .values()
            .any(|vertex| vertex.edges().iter().any(|edge| edge.directed))
    }

    /// Force every edge's directedness to `directed`.
    pub fn set_all_directed(&mut self, directed: bool) {
        for vertex in self.vertices.values_mut() {
            for edge in vertex.edges.iter_mut() {
                edge.directed = directed;
            }
        }
    }

    /// Classic three-colour depth-first search over the graph.
    ///
    /// Returns the post-order list of visited vertex IDs. Cycle handling
    /// depends on the traversal mode: in directed mode, reaching a vertex
    /// that is still on the recursion stack signals a cycle; in undirected
    /// mode, reaching any already-seen vertex that is not the immediate DFS
    /// parent does. With `allow_cycle = false` such a cycle fails the search
    /// with [`GraphError::CycleDetected`].
    pub fn depth_first_search(&self, opts: DfsOptions) -> Result<Vec<VertexId>, GraphError> {
        let directed = opts.is_directed.unwrap_or_else(|| self.is_directed());

        if opts.topological_sorting && !directed {
            return Err(GraphError::InvalidOperation(
                "topological sorting on an undirected graph is not meaningful".to_string(),
            ));
        }

        let sources: Vec<VertexId> = match opts.sources {
            Some(sources) => sources,
            None => self.vertices.keys().cloned().collect(),
        };

        let mut colors: HashMap<VertexId, Color> = HashMap::new();
        let mut list: Vec<VertexId> = Vec::new();

        if opts.include_sources {
            for source in &sources {
                if color_of(&colors, source) == Color::White {
                    self.dfs_visit(
                        source,
                        None,
                        directed,
                        opts.allow_cycle,
                        &mut colors,
                        &mut list,
                    )?;
                }
            }
        } else {
            // Pre-mark the sources as finished without enqueueing them, then
            // search everything reachable from their direct neighbours.
            for source in &sources {
                colors.insert(source.clone(), Color::Black);
            }

            for source in &sources {
                let Some(vertex) = self.vertices.get(source) else {
                    continue;
                };
                let neighbours: Vec<VertexId> =
                    vertex.adjacent().map(|id| id.to_string()).collect();

                for neighbour in neighbours {
                    if color_of(&colors, &neighbour) == Color::White {
                        self.dfs_visit(
                            &neighbour,
                            None,
                            directed,
                            opts.allow_cycle,
                            &mut colors,
                            &mut list,
                        )?;
                    }
                }
            }
        }

        Ok(list)
    }

    fn dfs_visit(
        &self,
        id: &str,
        parent: Option<&str>,
        directed: bool,
        allow_cycle: bool,
        colors: &mut HashMap<VertexId, Color>,
        list: &mut Vec<VertexId>,
    ) -> Result<(), GraphError> {
        match color_of(colors, id) {
            Color::White => {}
            Color::Gray => {
                // Back edge. In directed mode this is always a cycle; in
                // undirected mode the immediate parent was already skipped
                // before recursing, so this is a cycle too.
                if !allow_cycle {
                    return Err(GraphError::CycleDetected {
                        from: id.to_string(),
                        to: parent.unwrap_or(id).to_string(),
                    });
                }
                return Ok(());
            }
            Color::Black => {
                // Reaching a finished vertex is a cycle only in undirected
                // mode; a directed DAG legitimately shares subtrees.
                if !directed && !allow_cycle {
                    return Err(GraphError::CycleDetected {
                        from: id.to_string(),
                        to: parent.unwrap_or(id).to_string(),
                    });
                }
                return Ok(());
            }
        }

        let vertex = self
            .vertices
            .get(id)
            .ok_or_else(|| GraphError::VertexNotFound(id.to_string()))?;

        colors.insert(id.to_string(), Color::Gray);

        let neighbours: Vec<VertexId> = vertex.adjacent().map(|n| n.to_string()).collect();

        for neighbour in neighbours {
            if !directed {
                // Don't walk straight back up the tree edge we came from.
                if let Some(parent) = parent {
                    if neighbour == parent {
                        continue;
                    }
                }
            }
            self.dfs_visit(&neighbour, Some(id), directed, allow_cycle, colors, list)?;
        }

        colors.insert(id.to_string(), Color::Black);
        list.push(id.to_string());

        Ok(())
    }

    /// Run a cycle check: `Ok(true)` when a disallowed cycle exists,
    /// `Ok(false)` for an acyclic traversal, any other failure rethrown.
    pub fn has_cycle(&self, mut opts: DfsOptions) -> Result<bool, GraphError> {
        opts.allow_cycle = false;

        match self.depth_first_search(opts) {
            Ok(_) => Ok(false),
            Err(GraphError::CycleDetected { .. }) => Ok(true),
            Err(err) => Err(err),
        }
    }

    /// DFS-based topological sort: the reversed post-order of a DAG is a
    /// valid linearization respecting every directed edge. Fails with
    /// [`GraphError::CycleDetected`] on a cyclic graph and
    /// [`GraphError::InvalidOperation`] on an undirected one.
    pub fn topological_sort(&self, mut opts: DfsOptions) -> Result<Vec<VertexId>, GraphError> {
        opts.topological_sorting = true;
        opts.allow_cycle = false;

        let mut list = self.depth_first_search(opts)?;
        list.reverse();
        Ok(list)
    }

    /// Directed graphs: non-isolated vertices with no outgoing edges.
    /// Undirected graphs: vertices with exactly one incident edge.
    pub fn leaves(&self) -> Vec<&str> {
        let is_directed = self.is_directed();

        self.vertices
            .values()
            .filter(|vertex| {
                if is_directed {
                    vertex.outdegree() == 0 && vertex.indegree() >= 1
                } else {
                    vertex.edges().len() == 1
                }
            })
            .map(|vertex| vertex.id())
            .collect()
    }

    /// Directed graphs only: vertices with no incoming edges.
    pub fn roots(&self) -> Result<Vec<&str>, GraphError> {
        if !self.is_directed() {
            return Err(GraphError::InvalidOperation(
                "finding roots of an undirected graph is not meaningful".to_string(),
            ));
        }

        Ok(self
            .vertices
            .values()
            .filter(|vertex| vertex.indegree() == 0)
            .map(|vertex| vertex.id())
            .collect())
    }

    /// Sort every vertex's edge list for deterministic comparison.
    pub fn sort(&mut self) {
        for vertex in self.vertices.values_mut() {
            vertex.sort_edges();
        }
    }

    /// Carve out a new graph containing copies of the named vertices, with
    /// every edge whose opposite endpoint falls outside the subset pruned.
    /// IDs not present in this graph are skipped.
    pub fn fragment_from<I, S>(&self, ids: I) -> Graph
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fragment = Graph::new();

        for id in ids {
            if let Some(vertex) = self.vertices.get(id.as_ref()) {
                fragment
                    .vertices
                    .insert(vertex.id().to_string(), vertex.clone());
            }
        }

        fragment.prune();
        fragment
    }

    /// Remove every edge whose opposite endpoint is no longer in the graph.
    fn prune(&mut self) {
        let mut dangling: Vec<Edge> = Vec::new();

        for vertex in self.vertices.values() {
            for edge in vertex.edges() {
                let opposite = edge.opposite_of(vertex.id());
                if !self.vertices.contains_key(opposite) {
                    dangling.push(edge.clone());
                }
            }
        }

        for edge in dangling {
            self.remove_edge(&edge);
        }
    }

    /// Produce the plain record form: sorted vertex IDs and structurally
    /// de-duplicated edges.
    pub fn serialize(&self) -> GraphRecord {
        let vertices: Vec<VertexId> = self.vertices.keys().cloned().collect();

        let mut edges: Vec<EdgeRecord> = Vec::new();
        for vertex in self.vertices.values() {
            for edge in vertex.edges() {
                let record = edge.record();
                if !edges.contains(&record) {
                    edges.push(record);
                }
            }
        }

        GraphRecord { vertices, edges }
    }

    /// Reconstruct a graph from its record form: vertices first, then edges,
    /// each re-linked into both endpoints' edge lists.
    pub fn deserialize(record: &GraphRecord) -> Result<Graph, GraphError> {
        let mut graph = Graph::new();

        for id in &record.vertices {
            graph.add_vertex(Vertex::new(id.clone()))?;
        }

        for edge in &record.edges {
            graph.add_edge(
                &edge.from,
                &edge.to,
                EdgeOptions {
                    directed: edge.directed,
                    weight: edge.weight,
                },
            )?;
        }

        Ok(graph)
    }
}

fn color_of(colors: &HashMap<VertexId, Color>, id: &str) -> Color {
    colors.get(id).copied().unwrap_or(Color::White)
}
