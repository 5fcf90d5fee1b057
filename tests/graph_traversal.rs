use std::error::Error;

use repodag::errors::GraphError;
use repodag::graph::{DfsOptions, EdgeOptions, Graph, Vertex};

type TestResult = Result<(), Box<dyn Error>>;

/// a -> b, a -> c, b -> d, c -> d
fn diamond() -> Result<Graph, GraphError> {
    let mut graph = Graph::new();
    for id in ["a", "b", "c", "d"] {
        graph.add_vertex(Vertex::new(id))?;
    }
    for (from, to) in [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")] {
        graph.add_edge(from, to, EdgeOptions::directed())?;
    }
    Ok(graph)
}

/// p - q - r, undirected.
fn undirected_path() -> Result<Graph, GraphError> {
    let mut graph = Graph::new();
    for id in ["p", "q", "r"] {
        graph.add_vertex(Vertex::new(id))?;
    }
    graph.add_edge("p", "q", EdgeOptions::default())?;
    graph.add_edge("q", "r", EdgeOptions::default())?;
    Ok(graph)
}

fn position(order: &[String], id: &str) -> Result<usize, String> {
    order
        .iter()
        .position(|v| v == id)
        .ok_or_else(|| format!("{id} missing from {order:?}"))
}

#[test]
fn topological_sort_respects_every_edge() -> TestResult {
    let graph = diamond()?;

    let order = graph.topological_sort(DfsOptions::default())?;

    assert_eq!(order.len(), 4);
    for (before, after) in [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")] {
        assert!(
            position(&order, before)? < position(&order, after)?,
            "expected {before} before {after} in {order:?}"
        );
    }
    Ok(())
}

#[test]
fn acyclic_directed_graph_has_no_cycle() -> TestResult {
    let graph = diamond()?;
    assert!(!graph.has_cycle(DfsOptions::default())?);
    Ok(())
}

#[test]
fn directed_cycle_is_detected() -> TestResult {
    let mut graph = Graph::new();
    graph.add_vertex(Vertex::new("x"))?;
    graph.add_vertex(Vertex::new("y"))?;
    graph.add_edge("x", "y", EdgeOptions::directed())?;
    graph.add_edge("y", "x", EdgeOptions::directed())?;

    assert!(graph.has_cycle(DfsOptions::default())?);

    let err = graph.topological_sort(DfsOptions::default()).unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected { .. }));
    Ok(())
}

#[test]
fn undirected_triangle_is_a_cycle() -> TestResult {
    let mut graph = Graph::new();
    for id in ["p", "q", "r"] {
        graph.add_vertex(Vertex::new(id))?;
    }
    for (from, to) in [("p", "q"), ("q", "r"), ("r", "p")] {
        graph.add_edge(from, to, EdgeOptions::default())?;
    }

    assert!(graph.has_cycle(DfsOptions::default())?);
    Ok(())
}

#[test]
fn undirected_path_has_no_cycle() -> TestResult {
    let graph = undirected_path()?;
    assert!(!graph.has_cycle(DfsOptions::default())?);
    Ok(())
}

#[test]
fn topological_sort_on_undirected_graph_fails() -> TestResult {
    let graph = undirected_path()?;

    let err = graph.topological_sort(DfsOptions::default()).unwrap_err();
    assert!(matches!(err, GraphError::InvalidOperation(_)));
    Ok(())
}

#[test]
fn diamond_roots_and_leaves() -> TestResult {
    let graph = diamond()?;

    assert_eq!(graph.roots()?, vec!["a"]);
    assert_eq!(graph.leaves(), vec!["d"]);
    Ok(())
}

#[test]
fn undirected_path_leaves_are_its_ends() -> TestResult {
    let graph = undirected_path()?;

    let mut leaves = graph.leaves();
    leaves.sort();
    assert_eq!(leaves, vec!["p", "r"]);

    let err = graph.roots().unwrap_err();
    assert!(matches!(err, GraphError::InvalidOperation(_)));
    Ok(())
}

#[test]
fn dfs_can_exclude_its_sources() -> TestResult {
    let graph = diamond()?;

    let order = graph.depth_first_search(DfsOptions {
        sources: Some(vec!["a".to_string()]),
        include_sources: false,
        ..DfsOptions::default()
    })?;

    assert!(!order.contains(&"a".to_string()));
    for id in ["b", "c", "d"] {
        assert!(order.contains(&id.to_string()), "{id} missing from {order:?}");
    }
    Ok(())
}

#[test]
fn dfs_from_a_subtree_only_reaches_descendants() -> TestResult {
    let graph = diamond()?;

    let order = graph.depth_first_search(DfsOptions {
        sources: Some(vec!["b".to_string()]),
        ..DfsOptions::default()
    })?;

    assert_eq!(order.len(), 2);
    assert!(order.contains(&"b".to_string()));
    assert!(order.contains(&"d".to_string()));
    Ok(())
}

#[test]
fn dfs_post_order_finishes_children_first() -> TestResult {
    let mut graph = Graph::new();
    for id in ["a", "b", "c"] {
        graph.add_vertex(Vertex::new(id))?;
    }
    graph.add_edge("a", "b", EdgeOptions::directed())?;
    graph.add_edge("b", "c", EdgeOptions::directed())?;

    let order = graph.depth_first_search(DfsOptions {
        sources: Some(vec!["a".to_string()]),
        ..DfsOptions::default()
    })?;

    assert_eq!(order, vec!["c".to_string(), "b".to_string(), "a".to_string()]);
    Ok(())
}
