// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `calcdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "calcdag",
    version,
    about = "Evaluate arithmetic expressions as a graph of dependent tasks.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Calcdag.toml` in the current working directory. A missing
    /// file means built-in defaults.
    #[arg(long, value_name = "PATH", default_value = "Calcdag.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CALCDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Number of in-process workers. Overrides `[agent].computing_power`.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Owner id the expressions are submitted under.
    #[arg(long, value_name = "ID", default_value_t = 1)]
    pub owner: u64,

    /// Compile each expression and print its task graph without evaluating.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the simulated per-operation durations.
    #[arg(long)]
    pub no_delay: bool,

    /// Expressions to evaluate, e.g. `"2 + 3 * 4"`.
    #[arg(value_name = "EXPR", required = true)]
    pub expressions: Vec<String>,
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
