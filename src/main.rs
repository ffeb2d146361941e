//! CLI binary for todo-reminder.
//!
//! This binary is a thin wrapper that parses arguments and delegates to the library.

use std::process::ExitCode;

use clap::Parser;
use todo_reminder::cli::{run, Cli};

#[tokio::main]
async fn main() -> ExitCode {
    todo_reminder::logging::init();

    let output = run(Cli::parse()).await;

    for msg in output.stdout {
        println!("{msg}");
    }
    for msg in output.stderr {
        eprintln!("{msg}");
    }

    output.exit_code
}
