// src/exec/scheduler.rs

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::errors::{ExecError, GraphError};
use crate::exec::parallel;
use crate::exec::runner::TaskRunner;
use crate::graph::{DfsOptions, EdgeOptions, Graph, Vertex};

/// One step of a batch: a unique ID, the task parameters the runner needs,
/// and dependency references on other step IDs.
///
/// `upstream` names steps that must finish before this one;
/// `downstream` names steps that wait for this one. Both are normalized into
/// the same directed-edge representation when the graph is compiled.
#[derive(Debug, Clone)]
pub struct Step {
    pub id: String,
    pub cmd: String,
    pub dir: Option<PathBuf>,
    pub upstream: Vec<String>,
    pub downstream: Vec<String>,
}

/// Result of [`GraphExec::compile_graph`]: the dependency graph (absent for
/// the degenerate zero-or-one-step batch) plus the original step list, which
/// maps vertex IDs back to task parameters.
#[derive(Debug)]
pub struct CompiledBatch {
    pub graph: Option<Graph>,
    pub steps: Vec<Step>,
}

/// Compiles step descriptors into a dependency graph and drives their
/// execution through an injected [`TaskRunner`], either sequentially or with
/// maximum concurrency between independent branches.
pub struct GraphExec {
    runner: Arc<dyn TaskRunner>,
}

impl GraphExec {
    pub fn new(runner: Arc<dyn TaskRunner>) -> Self {
        Self { runner }
    }

    /// Build the directed dependency graph for a batch.
    ///
    /// Duplicate step IDs fail with [`ExecError::DuplicateStepId`].
    /// References to unknown step IDs are ignored with a debug log; the
    /// engine is deliberately lenient here. Batches of zero or one step
    /// compile to no graph at all.
    pub fn compile_graph(steps: &[Step]) -> Result<CompiledBatch, ExecError> {
        ensure_unique_ids(steps)?;

        if steps.len() <= 1 {
            return Ok(CompiledBatch {
                graph: None,
                steps: steps.to_vec(),
            });
        }

        let mut graph = Graph::new();

        for step in steps {
            graph.add_vertex(Vertex::new(step.id.clone()))?;
        }

        for step in steps {
            for upstream in &step.upstream {
                if graph.has_vertex(upstream) {
                    graph.add_edge(upstream, &step.id, EdgeOptions::directed())?;
                } else {
                    debug!(
                        step = %step.id,
                        upstream = %upstream,
                        "ignoring reference to unknown upstream step"
                    );
                }
            }

            for downstream in &step.downstream {
                if graph.has_vertex(downstream) {
                    graph.add_edge(&step.id, downstream, EdgeOptions::directed())?;
                } else {
                    debug!(
                        step = %step.id,
                        downstream = %downstream,
                        "ignoring reference to unknown downstream step"
                    );
                }
            }
        }

        graph.set_all_directed(true);

        Ok(CompiledBatch {
            graph: Some(graph),
            steps: steps.to_vec(),
        })
    }

    /// Pure validation plus ordering: topologically sorted step IDs, no
    /// execution. A cyclic batch fails loudly with
    /// [`GraphError::CycleDetected`]; this is the contract the strictly
    /// sequential path relies on.
    pub fn compile_steps(steps: &[Step]) -> Result<Vec<String>, ExecError> {
        let compiled = Self::compile_graph(steps)?;

        match compiled.graph {
            None => Ok(compiled.steps.iter().map(|step| step.id.clone()).collect()),
            Some(graph) => Ok(graph.topological_sort(DfsOptions::default())?),
        }
    }

    /// Sequential driver: run each step in topological order, awaiting each
    /// before starting the next. The first failure aborts the remainder.
    pub async fn exec_all(&self, name: &str, steps: &[Step]) -> Result<(), ExecError> {
        let start = Instant::now();

        let order = Self::compile_steps(steps)?;
        let by_id: HashMap<&str, &Step> = steps.iter().map(|s| (s.id.as_str(), s)).collect();
        let ordered: Vec<&Step> = order
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).copied())
            .collect();

        self.exec_sequential(&ordered).await?;

        info!(
            batch = %name,
            elapsed_secs = format!("{:.3}", start.elapsed().as_secs_f64()),
            "completed batch"
        );
        Ok(())
    }

    /// Concurrent DAG driver.
    ///
    /// Compiles the graph and checks it with a topological sort. A cycle is
    /// not fatal here: execution degrades to the sequential path in the
    /// batch's input order. Otherwise independent branches run concurrently,
    /// each step starting only once all of its upstream steps have signaled
    /// completion.
    pub async fn parallel_exec_all(&self, name: &str, steps: &[Step]) -> Result<(), ExecError> {
        let start = Instant::now();

        let compiled = Self::compile_graph(steps)?;

        match compiled.graph {
            None => {
                let ordered: Vec<&Step> = compiled.steps.iter().collect();
                self.exec_sequential(&ordered).await?;
            }
            Some(graph) => match graph.topological_sort(DfsOptions::default()) {
                Ok(order) => {
                    parallel::run_directed(self.runner.clone(), &compiled.steps, &graph, &order)
                        .await?;
                }
                Err(err @ GraphError::CycleDetected { .. }) => {
                    warn!(
                        batch = %name,
                        error = %err,
                        "topological sort failed; proceeding with sequential execution"
                    );
                    let ordered: Vec<&Step> = compiled.steps.iter().collect();
                    self.exec_sequential(&ordered).await?;
                }
                Err(err) => return Err(err.into()),
            },
        }

        info!(
            batch = %name,
            elapsed_secs = format!("{:.3}", start.elapsed().as_secs_f64()),
            "completed batch"
        );
        Ok(())
    }

    async fn exec_sequential(&self, steps: &[&Step]) -> Result<(), ExecError> {
        for step in steps {
            debug!(step = %step.id, "running step sequentially");
            self.runner
                .run(step)
                .await
                .map_err(|source| ExecError::TaskFailed {
                    step: step.id.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

fn ensure_unique_ids(steps: &[Step]) -> Result<(), ExecError> {
    let mut seen: HashSet<&str> = HashSet::new();

    for step in steps {
        if !seen.insert(step.id.as_str()) {
            return Err(ExecError::DuplicateStepId(step.id.clone()));
        }
    }
    Ok(())
}
