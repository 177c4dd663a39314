//! CLI module for maintainerd-onboard
//!
//! Provides subcommands for driving onboarding from the command line:
//! - `onboard`: reconcile a project's state on a compliance service and print
//!   the report

pub mod onboard;

use clap::{Parser, Subcommand};

/// maintainerd-onboard - Onboard maintainer-d projects to compliance services
#[derive(Parser)]
#[command(name = "maintainerd-onboard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the SQLite database file (overrides config)
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check and reconcile the onboarding status of a project
    Onboard(onboard::OnboardArgs),
}
