// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::types::parse_duration;

/// Command-line arguments for `sidepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sidepipe",
    version,
    about = "Run a batch tool once, capturing its text output and a binary side channel.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Sidepipe.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run the `[tool.<NAME>]` profile from the config file.
    #[arg(long, value_name = "NAME")]
    pub tool: Option<String>,

    /// Watchdog budget: kill the tool after this long without any I/O
    /// progress (e.g. `500ms`, `10s`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Kill the tool after this much wall-clock time, progress or not.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub max_runtime: Option<Duration>,

    /// File fed to the tool's stdin. Default (or `-`): read our own stdin.
    #[arg(long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Where to write the side-channel payload.
    #[arg(long, value_name = "PATH")]
    pub binary_out: Option<PathBuf>,

    /// Side-channel kind tag, substituted for `{side_channel_kind}`.
    #[arg(long, value_name = "TAG")]
    pub kind: Option<String>,

    /// Send the tool's stderr to the text channel.
    #[arg(long)]
    pub merge_stderr: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SIDEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the request, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Tool argv template, after `--`. `{side_channel}` becomes the
    /// `/dev/fd/<n>` path of the side channel.
    #[arg(last = true, value_name = "ARGV")]
    pub argv: Vec<String>,
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
