// src/exec/runner.rs

use std::process::Stdio;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::exec::scheduler::Step;

/// The opaque task capability the executor is given: run one step, report
/// success or failure. What running actually means (spawning a shell,
/// talking to a version-control system) is entirely up to the implementor.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run(&self, step: &Step) -> Result<()>;
}

/// Default runner: executes the step's command through the platform shell in
/// the step's directory, streaming output through `tracing`.
#[derive(Debug, Default)]
pub struct ShellRunner;

#[async_trait]
impl TaskRunner for ShellRunner {
    async fn run(&self, step: &Step) -> Result<()> {
        run_shell(step).await
    }
}

async fn run_shell(step: &Step) -> Result<()> {
    info!(step = %step.id, cmd = %step.cmd, "starting step process");

    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&step.cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&step.cmd);
        c
    };

    if let Some(dir) = &step.dir {
        cmd.current_dir(dir);
    }

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for step '{}'", step.id))?;

    // Drain both pipes concurrently so neither can fill up and stall the
    // child. Stdout surfaces at info, stderr at debug.
    if let Some(stdout) = child.stdout.take() {
        let step_id = step.id.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                info!(step = %step_id, "stdout: {}", line);
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        let step_id = step.id.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(step = %step_id, "stderr: {}", line);
            }
        });
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of step '{}'", step.id))?;

    let code = status.code().unwrap_or(-1);
    info!(
        step = %step.id,
        exit_code = code,
        success = status.success(),
        "step process exited"
    );

    if status.success() {
        Ok(())
    } else {
        Err(anyhow!("step '{}' exited with code {}", step.id, code))
    }
}
