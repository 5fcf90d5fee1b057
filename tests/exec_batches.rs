use std::collections::HashSet;
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use repodag::errors::ExecError;
use repodag::exec::{GraphExec, Step, TaskRunner};

type TestResult = Result<(), Box<dyn Error>>;

/// Runner that appends `start:<id>` / `end:<id>` markers to a shared log and
/// fails the configured steps.
struct RecordingRunner {
    events: Arc<Mutex<Vec<String>>>,
    fail: HashSet<String>,
}

impl RecordingRunner {
    fn new(fail: &[&str]) -> (Arc<Self>, Arc<Mutex<Vec<String>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let runner = Arc::new(Self {
            events: events.clone(),
            fail: fail.iter().map(|s| s.to_string()).collect(),
        });
        (runner, events)
    }
}

#[async_trait]
impl TaskRunner for RecordingRunner {
    async fn run(&self, step: &Step) -> anyhow::Result<()> {
        self.events
            .lock()
            .expect("event log")
            .push(format!("start:{}", step.id));

        tokio::time::sleep(Duration::from_millis(10)).await;

        self.events
            .lock()
            .expect("event log")
            .push(format!("end:{}", step.id));

        if self.fail.contains(&step.id) {
            bail!("step {} exploded", step.id);
        }
        Ok(())
    }
}

fn step(id: &str, upstream: &[&str]) -> Step {
    Step {
        id: id.to_string(),
        cmd: format!("echo {id}"),
        dir: None,
        upstream: upstream.iter().map(|s| s.to_string()).collect(),
        downstream: vec![],
    }
}

fn diamond() -> Vec<Step> {
    vec![
        step("a", &[]),
        step("b", &["a"]),
        step("c", &["a"]),
        step("d", &["b", "c"]),
    ]
}

fn position(events: &[String], marker: &str) -> Result<usize, String> {
    events
        .iter()
        .position(|e| e == marker)
        .ok_or_else(|| format!("{marker} missing from {events:?}"))
}

#[tokio::test]
async fn parallel_diamond_respects_dependency_order() -> TestResult {
    let (runner, events) = RecordingRunner::new(&[]);
    let executor = GraphExec::new(runner);

    executor.parallel_exec_all("diamond", &diamond()).await?;

    let events = events.lock().expect("event log").clone();

    // "a" finishes before either branch starts.
    assert!(position(&events, "end:a")? < position(&events, "start:b")?);
    assert!(position(&events, "end:a")? < position(&events, "start:c")?);

    // "d" starts only after both branches have finished.
    assert!(position(&events, "end:b")? < position(&events, "start:d")?);
    assert!(position(&events, "end:c")? < position(&events, "start:d")?);
    Ok(())
}

#[tokio::test]
async fn failed_branch_skips_dependents_and_surfaces_its_error() -> TestResult {
    let (runner, events) = RecordingRunner::new(&["b"]);
    let executor = GraphExec::new(runner);

    let err = executor
        .parallel_exec_all("diamond", &diamond())
        .await
        .unwrap_err();
    assert!(matches!(err, ExecError::TaskFailed { step, .. } if step == "b"));

    let events = events.lock().expect("event log").clone();

    // The DAG drained: "d" reached a terminal state without ever running.
    assert!(!events.contains(&"start:d".to_string()), "{events:?}");
    // The independent branch was not torn down mid-flight.
    assert!(events.contains(&"start:c".to_string()), "{events:?}");
    Ok(())
}

#[tokio::test]
async fn cyclic_batch_degrades_to_sequential_input_order() -> TestResult {
    let (runner, events) = RecordingRunner::new(&[]);
    let executor = GraphExec::new(runner);

    let steps = vec![step("x", &["y"]), step("y", &["x"])];
    executor.parallel_exec_all("cyclic", &steps).await?;

    let events = events.lock().expect("event log").clone();
    assert_eq!(events, vec!["start:x", "end:x", "start:y", "end:y"]);
    Ok(())
}

#[tokio::test]
async fn sequential_driver_runs_in_topological_order() -> TestResult {
    let (runner, events) = RecordingRunner::new(&[]);
    let executor = GraphExec::new(runner);

    // Input order deliberately reversed; compile_steps fixes it.
    let steps = vec![step("c", &["b"]), step("b", &["a"]), step("a", &[])];
    executor.exec_all("chain", &steps).await?;

    let events = events.lock().expect("event log").clone();
    assert_eq!(
        events,
        vec!["start:a", "end:a", "start:b", "end:b", "start:c", "end:c"]
    );
    Ok(())
}

#[tokio::test]
async fn sequential_driver_aborts_on_first_failure() -> TestResult {
    let (runner, events) = RecordingRunner::new(&["b"]);
    let executor = GraphExec::new(runner);

    let steps = vec![step("a", &[]), step("b", &["a"]), step("c", &["b"])];
    let err = executor.exec_all("chain", &steps).await.unwrap_err();
    assert!(matches!(err, ExecError::TaskFailed { step, .. } if step == "b"));

    let events = events.lock().expect("event log").clone();
    assert!(!events.contains(&"start:c".to_string()), "{events:?}");
    Ok(())
}

#[tokio::test]
async fn sequential_driver_rejects_cycles_loudly() {
    let (runner, _events) = RecordingRunner::new(&[]);
    let executor = GraphExec::new(runner);

    let steps = vec![step("x", &["y"]), step("y", &["x"])];
    let err = executor.exec_all("cyclic", &steps).await.unwrap_err();
    assert!(matches!(err, ExecError::Graph(_)));
}

#[tokio::test]
async fn single_step_batch_runs_without_a_graph() -> TestResult {
    let (runner, events) = RecordingRunner::new(&[]);
    let executor = GraphExec::new(runner);

    executor
        .parallel_exec_all("solo", &[step("only", &[])])
        .await?;

    let events = events.lock().expect("event log").clone();
    assert_eq!(events, vec!["start:only", "end:only"]);
    Ok(())
}

#[tokio::test]
async fn empty_batch_is_a_no_op() -> TestResult {
    let (runner, events) = RecordingRunner::new(&[]);
    let executor = GraphExec::new(runner);

    executor.parallel_exec_all("empty", &[]).await?;

    assert!(events.lock().expect("event log").is_empty());
    Ok(())
}

#[tokio::test]
async fn independent_steps_run_concurrently() -> TestResult {
    let (runner, events) = RecordingRunner::new(&[]);
    let executor = GraphExec::new(runner);

    // Two branches off one root; the sleep inside the runner means that with
    // real concurrency both branches start before either ends.
    let steps = vec![step("root", &[]), step("b1", &["root"]), step("b2", &["root"])];
    executor.parallel_exec_all("fanout", &steps).await?;

    let events = events.lock().expect("event log").clone();
    assert!(position(&events, "start:b1")? < position(&events, "end:b2")?);
    assert!(position(&events, "start:b2")? < position(&events, "end:b1")?);
    Ok(())
}
