//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for CRD using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// CRD - Coverage Requirements Discovery
#[derive(Parser, Debug)]
#[command(name = "crd")]
#[command(version, about, long_about = None)]
#[command(author = "CRD Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "crd.toml", env = "CRD_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CRD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run coverage discovery for a CDS Hooks request file
    Discover(commands::discover::DiscoverArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
