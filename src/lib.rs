// ABOUTME: Main library for the MySQL provisioning tool
// ABOUTME: Module declarations, logging setup, and the top-level run used by the binary

use anyhow::Context;
use std::process::ExitCode;

// Module declarations
pub mod cli;
pub mod config;
pub mod db;
pub mod models;
pub mod prompt;
pub mod reporter;
pub mod script;
pub mod setup;

use cli::Cli;
use config::DbConfig;
use db::MySqlConnector;
use models::SetupOutcome;
use prompt::{LinePrompt, Prompt};
use reporter::{ConsoleReporter, Reporter, Terminal};
use setup::Setup;

/// Route `log` output to stderr. `RUST_LOG` wins over the default level.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .try_init();
}

/// Run one provisioning pass and map the result to a process exit code
pub async fn run(cli: Cli) -> ExitCode {
    init_logging(cli.verbose);

    let terminal = Terminal::for_operator(cli.json);
    let mut reporter = ConsoleReporter::on(terminal);
    let mut prompt = LinePrompt::stdin(terminal);

    let result = provision(&cli, &mut reporter, &mut prompt).await;
    prompt.close();

    match &result {
        Ok(SetupOutcome::Provisioned(report)) if cli.json => {
            match serde_json::to_string_pretty(report) {
                Ok(json) => println!("{}", json),
                Err(e) => log::error!("Failed to serialize setup report: {}", e),
            }
        }
        Ok(_) => {}
        Err(e) => reporter.error(&format!("Database setup failed: {:#}", e)),
    }
    ExitCode::from(exit_status(&result))
}

/// `0` for a finished run or an operator exit, `1` for any failure
pub fn exit_status<E>(result: &Result<SetupOutcome, E>) -> u8 {
    match result {
        Ok(SetupOutcome::Provisioned(_)) | Ok(SetupOutcome::Aborted) => 0,
        Err(_) => 1,
    }
}

/// Resolve configuration and drive the setup flow against MySQL
pub async fn provision<R, P>(cli: &Cli, reporter: &mut R, prompt: &mut P) -> anyhow::Result<SetupOutcome>
where
    R: Reporter,
    P: Prompt,
{
    let config = DbConfig::from_env()
        .and_then(|config| cli.apply(config))
        .context("Invalid configuration")?;

    match serde_json::to_string(&config) {
        Ok(json) => log::debug!("Configuration: {}", json),
        Err(e) => log::debug!("Configuration could not be serialized: {}", e),
    }

    let outcome = Setup::new(&config, reporter)
        .with_disposition(cli.action)
        .run(&MySqlConnector, prompt)
        .await?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use models::{SchemaAction, SetupReport, TableInventory};

    #[test]
    fn test_exit_status() {
        let now = Utc::now();
        let report = SetupReport {
            database: "shop".to_string(),
            action: SchemaAction::Created,
            sql_file: "config/db_complete.sql".to_string(),
            statements_removed: 2,
            rows_affected: 0,
            inventory: TableInventory {
                count: 0,
                tables: Vec::new(),
            },
            started_at: now,
            finished_at: now,
        };

        let provisioned: anyhow::Result<SetupOutcome> = Ok(SetupOutcome::Provisioned(report));
        let aborted: anyhow::Result<SetupOutcome> = Ok(SetupOutcome::Aborted);
        let failed: anyhow::Result<SetupOutcome> = Err(anyhow::anyhow!("connection refused"));

        assert_eq!(exit_status(&provisioned), 0);
        assert_eq!(exit_status(&aborted), 0);
        assert_eq!(exit_status(&failed), 1);
    }
}
