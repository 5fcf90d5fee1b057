// src/exec/parallel.rs

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, error, warn};

use crate::errors::ExecError;
use crate::exec::runner::TaskRunner;
use crate::exec::scheduler::Step;
use crate::graph::{Graph, VertexId};

/// Per-step state during one concurrent batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    /// Waiting on at least one upstream step.
    Pending,
    /// Every upstream step has signaled completion.
    Ready,
    /// The step's task body is executing.
    Running,
    /// Terminal: the step finished, or was skipped after an earlier failure.
    Done,
    /// Terminal: the step's task body failed.
    Failed,
}

type StateMap = Arc<Mutex<BTreeMap<VertexId, RunState>>>;
type FailureSlot = Arc<Mutex<Option<ExecError>>>;

/// Dependency-driven concurrent executor.
///
/// One tokio task per vertex. Each vertex owns a one-shot done broadcast
/// (a `watch` channel) that all of its dependents subscribe to; a vertex's
/// task first awaits the done signal of every upstream vertex (the fan-in
/// join), then runs its step unless a failure has already been recorded
/// anywhere in the graph, and finally broadcasts its own completion — also
/// after a failure or a skip, so the DAG always drains instead of
/// deadlocking on never-signaled ancestors.
///
/// The overall run completes once every leaf has signaled done (all spawned
/// tasks are joined as well, which covers a graph with no leaves at all).
/// The first recorded error is the one surfaced; later errors are logged.
pub(crate) async fn run_directed(
    runner: Arc<dyn TaskRunner>,
    steps: &[Step],
    graph: &Graph,
    order: &[VertexId],
) -> Result<(), ExecError> {
    let steps_by_id: HashMap<String, Step> = steps
        .iter()
        .map(|step| (step.id.clone(), step.clone()))
        .collect();

    // One done-broadcast per vertex. Senders move into the vertex tasks;
    // every subscription needed later is taken out first.
    let mut signals: BTreeMap<VertexId, watch::Sender<bool>> = BTreeMap::new();
    for id in graph.vertex_ids() {
        let (tx, _rx) = watch::channel(false);
        signals.insert(id.to_string(), tx);
    }

    let mut upstream_rxs: BTreeMap<VertexId, Vec<watch::Receiver<bool>>> = BTreeMap::new();
    for id in graph.vertex_ids() {
        let Some(vertex) = graph.vertex(id) else {
            continue;
        };
        let rxs: Vec<watch::Receiver<bool>> = vertex
            .precedent()
            .filter_map(|upstream| signals.get(upstream).map(watch::Sender::subscribe))
            .collect();
        upstream_rxs.insert(id.to_string(), rxs);
    }

    let leaf_rxs: Vec<(VertexId, watch::Receiver<bool>)> = graph
        .leaves()
        .into_iter()
        .filter_map(|leaf| signals.get(leaf).map(|tx| (leaf.to_string(), tx.subscribe())))
        .collect();

    let failure: FailureSlot = Arc::new(Mutex::new(None));
    let states: StateMap = Arc::new(Mutex::new(
        graph
            .vertex_ids()
            .map(|id| (id.to_string(), RunState::Pending))
            .collect(),
    ));

    let mut handles = Vec::new();

    // Spawn in topological order so roots are first off the blocks; the
    // ordering guarantees themselves come from the fan-in joins.
    for id in order {
        let Some(tx) = signals.remove(id) else {
            continue;
        };
        let rxs = upstream_rxs.remove(id).unwrap_or_default();
        let step = steps_by_id.get(id).cloned();
        let runner = runner.clone();
        let failure = failure.clone();
        let states = states.clone();
        let id = id.clone();

        handles.push(tokio::spawn(async move {
            for mut rx in rxs {
                // A closed channel means the upstream task is gone without
                // signaling; treat the dependency as settled so the DAG can
                // still drain.
                if rx.wait_for(|done| *done).await.is_err() {
                    warn!(step = %id, "upstream completion channel closed early");
                }
            }

            set_state(&states, &id, RunState::Ready).await;

            let already_failed = failure.lock().await.is_some();

            match (already_failed, step) {
                (false, Some(step)) => {
                    set_state(&states, &id, RunState::Running).await;

                    match runner.run(&step).await {
                        Ok(()) => {
                            set_state(&states, &id, RunState::Done).await;
                        }
                        Err(source) => {
                            error!(step = %id, error = %source, "step failed");
                            set_state(&states, &id, RunState::Failed).await;

                            let mut slot = failure.lock().await;
                            if slot.is_none() {
                                *slot = Some(ExecError::TaskFailed {
                                    step: id.clone(),
                                    source,
                                });
                            } else {
                                debug!(
                                    step = %id,
                                    "additional failure after the first recorded error"
                                );
                            }
                        }
                    }
                }
                (true, _) => {
                    debug!(step = %id, "skipping step after earlier failure");
                    set_state(&states, &id, RunState::Done).await;
                }
                (false, None) => {
                    warn!(step = %id, "vertex has no matching step; marking done");
                    set_state(&states, &id, RunState::Done).await;
                }
            }

            // Fan-out: unblock every dependent, run or not.
            tx.send_replace(true);
        }));
    }

    for (leaf, mut rx) in leaf_rxs {
        if rx.wait_for(|done| *done).await.is_err() {
            warn!(step = %leaf, "leaf completion channel closed early");
        }
        debug!(step = %leaf, "leaf signaled done");
    }

    for handle in handles {
        if handle.await.is_err() {
            warn!("a step task panicked; continuing drain");
        }
    }

    match failure.lock().await.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

async fn set_state(states: &StateMap, id: &str, state: RunState) {
    let mut map = states.lock().await;
    debug!(step = %id, ?state, "step state change");
    map.insert(id.to_string(), state);
}
