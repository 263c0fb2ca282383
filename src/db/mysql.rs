// ABOUTME: MySQL connection management using sqlx
// ABOUTME: Handles connecting, schema lifecycle statements, batch execution, and table inventory

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use thiserror::Error;

use crate::config::DbConfig;
use crate::db::{Connector, SchemaServer};

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection to {target} failed")]
    ConnectionFailed {
        target: String,
        #[source]
        source: sqlx::Error,
    },
    /// A lookup that must return one row came back empty. Only the version
    /// query relies on this; the existence check treats no row as `false`.
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Quote a schema or table name for MySQL, doubling any embedded backticks
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Connects to the configured MySQL server without selecting a schema
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlConnector;

impl Connector for MySqlConnector {
    type Server = MySqlServer;

    async fn connect(&self, config: &DbConfig) -> Result<MySqlServer, DbError> {
        MySqlServer::connect(config).await
    }
}

pub struct MySqlServer {
    conn: MySqlConnection,
}

impl MySqlServer {
    /// Connect to MySQL using the run's configuration
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password);

        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|source| DbError::ConnectionFailed {
                target: config.server_label(),
                source,
            })?;

        log::debug!("Opened connection to {}", config.server_label());
        Ok(Self { conn })
    }

    /// Statements like USE are not allowed over the prepared statement
    /// protocol, so schema-level DDL goes through the text protocol.
    async fn execute_text(&mut self, statement: &str) -> Result<u64, DbError> {
        log::debug!("Executing: {}", statement);
        let result = sqlx::raw_sql(statement).execute(&mut self.conn).await?;
        Ok(result.rows_affected())
    }
}

impl SchemaServer for MySqlServer {
    async fn server_version(&mut self) -> Result<String, DbError> {
        let version: Option<String> = sqlx::query_scalar("SELECT CAST(VERSION() AS CHAR)")
            .fetch_optional(&mut self.conn)
            .await?;
        require_row(version, "No version returned")
    }

    async fn database_exists(&mut self, name: &str) -> Result<bool, DbError> {
        let found: Option<String> = sqlx::query_scalar(
            "SELECT CAST(SCHEMA_NAME AS CHAR) FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = ?",
        )
        .bind(name)
        .fetch_optional(&mut self.conn)
        .await?;
        Ok(found.is_some())
    }

    async fn drop_database(&mut self, name: &str) -> Result<(), DbError> {
        let statement = format!("DROP DATABASE IF EXISTS {}", quote_identifier(name));
        self.execute_text(&statement).await?;
        Ok(())
    }

    async fn create_database(&mut self, name: &str) -> Result<(), DbError> {
        let statement = format!("CREATE DATABASE IF NOT EXISTS {}", quote_identifier(name));
        self.execute_text(&statement).await?;
        Ok(())
    }

    async fn use_database(&mut self, name: &str) -> Result<(), DbError> {
        let statement = format!("USE {}", quote_identifier(name));
        self.execute_text(&statement).await?;
        Ok(())
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<u64, DbError> {
        log::debug!("Executing SQL batch ({} bytes)", sql.len());
        let result = sqlx::raw_sql(sql).execute(&mut self.conn).await?;
        Ok(result.rows_affected())
    }

    async fn table_count(&mut self, database: &str) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.TABLES WHERE TABLE_SCHEMA = ?",
        )
        .bind(database)
        .fetch_one(&mut self.conn)
        .await?;
        Ok(count)
    }

    async fn list_tables(&mut self, database: &str) -> Result<Vec<String>, DbError> {
        let tables: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT CAST(TABLE_NAME AS CHAR)
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = ?
            ORDER BY TABLE_NAME
            "#,
        )
        .bind(database)
        .fetch_all(&mut self.conn)
        .await?;
        Ok(tables)
    }

    async fn close(self) -> Result<(), DbError> {
        self.conn.close().await?;
        log::debug!("Connection closed");
        Ok(())
    }
}

fn require_row<T>(row: Option<T>, missing: &str) -> Result<T, DbError> {
    row.ok_or_else(|| DbError::QueryFailed(missing.to_string()))
}
