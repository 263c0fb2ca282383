// ABOUTME: Data models produced by a provisioning run
// ABOUTME: Table inventory and the final setup report (serializable for --json output)

use chrono::{DateTime, Utc};
use serde::Serialize;

/// How the target schema was prepared before the script ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaAction {
    /// Did not exist (or the existence check failed) and was created
    Created,
    /// Existed, was dropped and created again
    Recreated,
    /// Existed and was used as-is
    Reused,
}

/// Tables found in the schema after the script ran
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableInventory {
    pub count: i64,
    pub tables: Vec<String>,
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct SetupReport {
    pub database: String,
    pub action: SchemaAction,
    #[serde(rename = "sqlFile")]
    pub sql_file: String,
    #[serde(rename = "statementsRemoved")]
    pub statements_removed: usize,
    #[serde(rename = "rowsAffected")]
    pub rows_affected: u64,
    pub inventory: TableInventory,
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "finishedAt")]
    pub finished_at: DateTime<Utc>,
}

impl SetupReport {
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Result of a run that did not fail
#[derive(Debug, Clone)]
pub enum SetupOutcome {
    Provisioned(SetupReport),
    /// Operator chose to exit at the existing-schema prompt
    Aborted,
}
