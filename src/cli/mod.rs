//! Command-line interface for todo-reminder.
//!
//! `serve` (the default) starts the task page and the deadline checker.
//! `check` runs a single deadline check and exits, for use from cron.

mod run;


pub use run::{run, CliOutput};

use crate::config::ConfigOverrides;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// A to-do list web page with deadline reminders.
#[derive(Parser, Debug)]
#[command(name = "todo-reminder")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: ~/.todo-reminder/config.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Task database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// The command to execute (default: serve)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the task page and run the deadline checker until Ctrl-C.
    Serve(ServeArgs),

    /// Run one deadline check and exit.
    Check,
}

/// Options for `serve`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long)]
    pub port: Option<u16>,

    /// Seconds between deadline checks
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,
}

impl Cli {
    /// The command to run, with `serve` standing in for none.
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or_else(|| Command::Serve(ServeArgs::default()))
    }

    /// Command-line values that override the configuration file.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        let serve = match self.command() {
            Command::Serve(args) => args,
            Command::Check => ServeArgs::default(),
        };
        ConfigOverrides {
            database_path: self.db.clone(),
            host: serve.host,
            port: serve.port,
            check_interval_secs: serve.interval,
        }
    }
}
