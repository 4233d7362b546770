//! CLI module for BatchTrim
//!
//! This module handles command-line argument parsing and command execution.

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// BatchTrim client
///
/// Scans a folder of episodes through the processing service, submits a trim
/// job for the whole folder and follows it to completion.
#[derive(Parser, Debug)]
#[command(name = "batchtrim")]
#[command(about = "BatchTrim - Batch trimming of episodic video folders")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Config file (TOML with a [batchtrim] table)
    #[arg(long, global = true, env = "BATCHTRIM_CONFIG")]
    pub config: Option<String>,

    /// Base URL of the processing service
    #[arg(long, global = true)]
    pub service_url: Option<String>,

    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (pretty, compact, json)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List chapters and audio tracks of a folder's first episode
    Scan(args::ScanArgs),
    /// Scan, configure, submit and follow a trim job
    Run(args::RunArgs),
    /// Query the status of the current job once
    Status(args::StatusArgs),
}
