// ABOUTME: Database module exports for the provisioning tool
// ABOUTME: Defines the server operations the setup flow needs and the MySQL implementation

pub mod mysql;

pub use mysql::{quote_identifier, DbError, MySqlConnector, MySqlServer};

use crate::config::DbConfig;

/// Opens the single server connection a run works with
#[allow(async_fn_in_trait)]
pub trait Connector {
    type Server: SchemaServer;

    async fn connect(&self, config: &DbConfig) -> Result<Self::Server, DbError>;
}

/// Server-level operations, issued one at a time on one connection
#[allow(async_fn_in_trait)]
pub trait SchemaServer {
    /// Version string reported by the server
    async fn server_version(&mut self) -> Result<String, DbError>;

    /// Whether a schema with this exact name exists
    async fn database_exists(&mut self, name: &str) -> Result<bool, DbError>;

    async fn drop_database(&mut self, name: &str) -> Result<(), DbError>;

    /// Create the schema unless it already exists
    async fn create_database(&mut self, name: &str) -> Result<(), DbError>;

    /// Make the schema the connection's default
    async fn use_database(&mut self, name: &str) -> Result<(), DbError>;

    /// Run several `;`-separated statements as one call. Returns rows affected.
    async fn execute_batch(&mut self, sql: &str) -> Result<u64, DbError>;

    async fn table_count(&mut self, database: &str) -> Result<i64, DbError>;

    /// Table names in the schema, alphabetically
    async fn list_tables(&mut self, database: &str) -> Result<Vec<String>, DbError>;

    /// Release the connection. Consumes the handle so it cannot be closed twice.
    async fn close(self) -> Result<(), DbError>
    where
        Self: Sized;
}
