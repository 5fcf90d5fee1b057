// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `repodag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "repodag",
    version,
    about = "Run batches of commands across repositories, ordered by DAG dependencies.",
    long_about = None
)]
pub struct CliArgs {
    /// Name of the batch to run (a `[batch.<name>]` section in the config).
    #[arg(value_name = "BATCH")]
    pub batch: String,

    /// Path to the config file (TOML).
    ///
    /// Default: `Repodag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Repodag.toml")]
    pub config: String,

    /// Run steps strictly one after another in topological order instead of
    /// running independent branches concurrently.
    #[arg(long)]
    pub sequential: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `REPODAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the compiled order and the dependency graph,
    /// but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
