//! Command execution for the CLI.

use crate::app::App;
use crate::checker::TickReport;
use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::error::Result;
use std::process::ExitCode;

/// Output from running the CLI, with separate stdout and stderr messages.
#[derive(Debug)]
pub struct CliOutput {
    /// Exit code for the process.
    pub exit_code: ExitCode,
    /// Messages to print to stdout.
    pub stdout: Vec<String>,
    /// Messages to print to stderr.
    pub stderr: Vec<String>,
}

impl CliOutput {
    fn success(stdout: Vec<String>, stderr: Vec<String>) -> Self {
        Self { exit_code: ExitCode::SUCCESS, stdout, stderr }
    }

    fn error(message: String) -> Self {
        Self { exit_code: ExitCode::FAILURE, stdout: vec![], stderr: vec![message] }
    }
}

/// Run a parsed command line.
pub async fn run(cli: Cli) -> CliOutput {
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => return CliOutput::error(format!("Error: {e}")),
    };

    let result = match cli.command() {
        Command::Serve(_) => run_serve(config).await,
        Command::Check => run_check(config),
    };
    result.unwrap_or_else(|e| CliOutput::error(format!("Error: {e}")))
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let config = AppConfig::load(cli.config.as_deref())?.apply_overrides(cli.overrides());
    config.validate()?;
    Ok(config)
}

async fn run_serve(config: AppConfig) -> Result<CliOutput> {
    App::from_config(config)?.serve().await?;
    Ok(CliOutput::success(vec![], vec![]))
}

fn run_check(config: AppConfig) -> Result<CliOutput> {
    let report = App::from_config(config)?.check_once()?;
    let (stdout, stderr) = describe_report(&report);
    Ok(CliOutput::success(stdout, stderr))
}

fn describe_report(report: &TickReport) -> (Vec<String>, Vec<String>) {
    let stdout = vec![
        format!("Reminders sent: {}", report.reminded.len()),
        format!("Approaching alerts sent: {}", report.approaching.len()),
        format!("Overdue alerts sent: {}", report.overdue.len()),
    ];
    let stderr = report
        .failures
        .iter()
        .map(|f| format!("Task #{}: {:?} notification failed: {}", f.task_id, f.kind, f.error))
        .collect();
    (stdout, stderr)
}
