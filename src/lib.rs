// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod graph;
pub mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::BatchConfig;
use crate::exec::{GraphExec, ShellRunner, Step};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - batch lookup
/// - the graph executor with the default shell runner
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let batch = cfg
        .batch
        .get(&args.batch)
        .ok_or_else(|| anyhow!("could not find batch {}", args.batch))?;

    let steps = batch.to_steps();

    if args.dry_run {
        print_dry_run(&args.batch, batch, &steps)?;
        return Ok(());
    }

    let executor = GraphExec::new(Arc::new(ShellRunner));

    if args.sequential {
        info!(batch = %args.batch, "running batch sequentially");
        executor.exec_all(&args.batch, &steps).await?;
    } else {
        info!(batch = %args.batch, "running batch with dependency-driven concurrency");
        executor.parallel_exec_all(&args.batch, &steps).await?;
    }

    Ok(())
}

/// Dry-run output: the steps, the compiled execution order, and the
/// dependency graph in its serialized record form.
fn print_dry_run(name: &str, batch: &BatchConfig, steps: &[Step]) -> Result<()> {
    println!("repodag dry-run: batch {name}");
    println!();

    println!("steps ({}):", batch.step.len());
    for step in &batch.step {
        println!("  - {}", step.id);
        println!("      cmd: {}", step.cmd);
        if let Some(dir) = &step.dir {
            println!("      dir: {}", dir.display());
        }
        let upstream = step.upstream.to_vec();
        if !upstream.is_empty() {
            println!("      upstream: {:?}", upstream);
        }
        let downstream = step.downstream.to_vec();
        if !downstream.is_empty() {
            println!("      downstream: {:?}", downstream);
        }
    }
    println!();

    let order = GraphExec::compile_steps(steps)?;
    println!("execution order: {:?}", order);

    let compiled = GraphExec::compile_graph(steps)?;
    if let Some(graph) = compiled.graph {
        let record = graph.serialize();
        let json =
            serde_json::to_string_pretty(&record).context("serializing dependency graph")?;
        println!("dependency graph:");
        println!("{json}");
    }

    Ok(())
}
