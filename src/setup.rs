// ABOUTME: The provisioning flow from connect to cleanup
// ABOUTME: Checks the schema, resolves what to do with an existing one, runs the script, verifies tables

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::DbConfig;
use crate::db::{Connector, DbError, SchemaServer};
use crate::models::{SchemaAction, SetupOutcome, SetupReport, TableInventory};
use crate::prompt::{Disposition, Prompt, PromptError};
use crate::reporter::Reporter;
use crate::script::{ScriptError, SqlScript};

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Could not connect to the MySQL server")]
    Connect(#[source] DbError),
    #[error("Could not read the operator's choice")]
    Prompt(#[from] PromptError),
    #[error("Invalid choice '{0}', expected 1, 2 or 3")]
    InvalidChoice(String),
    #[error("{step} failed")]
    Statement {
        step: String,
        #[source]
        source: DbError,
    },
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("Failed to close the connection")]
    Close(#[source] DbError),
}

/// One provisioning run against one server
pub struct Setup<'a, R> {
    config: &'a DbConfig,
    reporter: &'a mut R,
    preset: Option<Disposition>,
}

impl<'a, R: Reporter> Setup<'a, R> {
    pub fn new(config: &'a DbConfig, reporter: &'a mut R) -> Self {
        Self {
            config,
            reporter,
            preset: None,
        }
    }

    /// Decide up front what happens to an existing schema instead of prompting
    pub fn with_disposition(mut self, disposition: Option<Disposition>) -> Self {
        self.preset = disposition;
        self
    }

    /// Connect, provision, and always release the connection and the prompt
    pub async fn run<C, P>(&mut self, connector: &C, prompt: &mut P) -> Result<SetupOutcome, SetupError>
    where
        C: Connector,
        P: Prompt,
    {
        let started_at = Utc::now();

        self.reporter.step(&format!(
            "Connecting to MySQL server at {}",
            self.config.server_label()
        ));
        let mut server = match connector.connect(self.config).await {
            Ok(server) => server,
            Err(e) => {
                self.reporter.error("Connection failed");
                prompt.close();
                return Err(SetupError::Connect(e));
            }
        };
        self.reporter.success("Connected to MySQL server");

        let result = self.provision(&mut server, prompt, started_at).await;

        prompt.close();
        let closed = server.close().await;

        match (result, closed) {
            (Ok(outcome), Ok(())) => {
                self.reporter.info("Connection closed");
                Ok(outcome)
            }
            (Ok(_), Err(e)) => {
                self.reporter.error("Failed to close the connection");
                Err(SetupError::Close(e))
            }
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                self.reporter
                    .warning(&format!("Also failed to close the connection: {}", close_err));
                Err(e)
            }
        }
    }

    async fn provision<S, P>(
        &mut self,
        server: &mut S,
        prompt: &mut P,
        started_at: DateTime<Utc>,
    ) -> Result<SetupOutcome, SetupError>
    where
        S: SchemaServer,
        P: Prompt,
    {
        let config = self.config;
        let database = config.database.as_str();

        match server.server_version().await {
            Ok(version) => self.reporter.info(&format!("Server version: {}", version)),
            Err(e) => log::warn!("Could not read server version: {}", e),
        }

        let action = if self.check_existence(server, database).await {
            match self.resolve_disposition(prompt, database)? {
                Disposition::Exit => {
                    self.reporter.info("Exiting without changes");
                    return Ok(SetupOutcome::Aborted);
                }
                Disposition::Recreate => SchemaAction::Recreated,
                Disposition::Reuse => SchemaAction::Reused,
            }
        } else {
            SchemaAction::Created
        };

        self.prepare_schema(server, database, action).await?;

        let script = self.load_script()?;
        let rows_affected = self.execute_script(server, &script).await?;
        let inventory = self.verify(server, database).await?;

        let report = SetupReport {
            database: database.to_string(),
            action,
            sql_file: script.path.display().to_string(),
            statements_removed: script.removed,
            rows_affected,
            inventory,
            started_at,
            finished_at: Utc::now(),
        };
        self.reporter.success(&format!(
            "Database setup completed in {} ms",
            report.elapsed_ms()
        ));
        Ok(SetupOutcome::Provisioned(report))
    }

    /// A failed lookup counts as "does not exist"
    async fn check_existence<S: SchemaServer>(&mut self, server: &mut S, database: &str) -> bool {
        self.reporter
            .step(&format!("Checking if database '{}' exists", database));
        match server.database_exists(database).await {
            Ok(true) => {
                self.reporter
                    .warning(&format!("Database '{}' already exists", database));
                true
            }
            Ok(false) => {
                self.reporter
                    .info(&format!("Database '{}' does not exist yet", database));
                false
            }
            Err(e) => {
                self.reporter.warning(&format!(
                    "Could not check whether database '{}' exists ({}), assuming it does not",
                    database, e
                ));
                false
            }
        }
    }

    fn resolve_disposition<P: Prompt>(
        &mut self,
        prompt: &mut P,
        database: &str,
    ) -> Result<Disposition, SetupError> {
        if let Some(preset) = self.preset {
            self.reporter
                .info(&format!("Using preselected action: {}", preset.as_str()));
            return Ok(preset);
        }

        let question = format!(
            "Database '{}' already exists. What would you like to do?",
            database
        );
        let answer = match prompt.prompt_choice(&question, &Disposition::MENU) {
            Ok(answer) => answer,
            Err(e) => {
                self.reporter.error("No choice entered");
                return Err(e.into());
            }
        };

        match Disposition::from_answer(&answer) {
            Some(disposition) => Ok(disposition),
            None => {
                self.reporter
                    .error(&format!("Invalid choice '{}', exiting", answer));
                Err(SetupError::InvalidChoice(answer))
            }
        }
    }

    async fn prepare_schema<S: SchemaServer>(
        &mut self,
        server: &mut S,
        database: &str,
        action: SchemaAction,
    ) -> Result<(), SetupError> {
        if action == SchemaAction::Recreated {
            let step = format!("Dropping database '{}'", database);
            self.reporter.step(&step);
            if let Err(source) = server.drop_database(database).await {
                return Err(self.statement_failed(step, source));
            }
            self.reporter
                .success(&format!("Database '{}' dropped", database));
        }

        if action == SchemaAction::Reused {
            self.reporter
                .info(&format!("Using existing database '{}'", database));
        } else {
            let step = format!("Creating database '{}'", database);
            self.reporter.step(&step);
            if let Err(source) = server.create_database(database).await {
                return Err(self.statement_failed(step, source));
            }
            self.reporter
                .success(&format!("Database '{}' created", database));
        }

        let step = format!("Selecting database '{}'", database);
        self.reporter.step(&step);
        if let Err(source) = server.use_database(database).await {
            return Err(self.statement_failed(step, source));
        }
        self.reporter
            .success(&format!("Now using database '{}'", database));
        Ok(())
    }

    fn load_script(&mut self) -> Result<SqlScript, SetupError> {
        let config = self.config;
        let path = &config.sql_file;
        self.reporter
            .step(&format!("Loading SQL file {}", path.display()));

        let script = match SqlScript::load(path) {
            Ok(script) => script,
            Err(e) => {
                self.reporter.error("Could not read SQL file");
                return Err(e.into());
            }
        };

        self.reporter.success(&format!(
            "Loaded {} bytes with {} table definition(s)",
            script.raw.len(),
            script.table_definitions()
        ));
        if script.removed > 0 {
            self.reporter.info(&format!(
                "Removed {} CREATE DATABASE/USE statement(s)",
                script.removed
            ));
        }
        Ok(script)
    }

    async fn execute_script<S: SchemaServer>(
        &mut self,
        server: &mut S,
        script: &SqlScript,
    ) -> Result<u64, SetupError> {
        let step = "Executing SQL script".to_string();
        self.reporter.step(&step);

        if script.is_empty() {
            self.reporter
                .warning("SQL script is empty after sanitizing, nothing to execute");
            return Ok(0);
        }

        match server.execute_batch(&script.sanitized).await {
            Ok(rows) => {
                self.reporter.success(&format!(
                    "SQL script executed successfully ({} row(s) affected)",
                    rows
                ));
                Ok(rows)
            }
            Err(source) => Err(self.statement_failed(step, source)),
        }
    }

    async fn verify<S: SchemaServer>(
        &mut self,
        server: &mut S,
        database: &str,
    ) -> Result<TableInventory, SetupError> {
        let step = "Verifying tables".to_string();
        self.reporter.step(&step);

        let count = match server.table_count(database).await {
            Ok(count) => count,
            Err(source) => return Err(self.statement_failed(step, source)),
        };
        let tables = match server.list_tables(database).await {
            Ok(tables) => tables,
            Err(source) => return Err(self.statement_failed(step, source)),
        };

        self.reporter
            .success(&format!("Database '{}' has {} table(s)", database, count));
        for table in &tables {
            self.reporter.info(&format!("  - {}", table));
        }

        Ok(TableInventory { count, tables })
    }

    fn statement_failed(&mut self, step: String, source: DbError) -> SetupError {
        self.reporter.error(&format!("{} failed", step));
        SetupError::Statement { step, source }
    }
}
