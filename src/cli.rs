// ABOUTME: Command line flags for the provisioning tool
// ABOUTME: Every flag is optional and overrides the matching DB_* environment variable

use clap::Parser;
use std::path::PathBuf;

use crate::config::{ConfigError, DbConfig};
use crate::prompt::Disposition;

#[derive(Parser, Debug)]
#[command(name = "db-provision")]
#[command(about = "Create and seed the application's MySQL database")]
#[command(version)]
pub struct Cli {
    /// MySQL host (overrides DB_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// MySQL port (overrides DB_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// MySQL user (overrides DB_USER)
    #[arg(long)]
    pub user: Option<String>,

    /// Database to provision (overrides DB_NAME)
    #[arg(long)]
    pub database: Option<String>,

    /// SQL file to execute (overrides DB_SQL_FILE)
    #[arg(long)]
    pub sql_file: Option<PathBuf>,

    /// What to do if the database already exists, instead of asking
    #[arg(long, value_enum)]
    pub action: Option<Disposition>,

    /// Print the setup report as JSON on stdout (progress moves to stderr)
    #[arg(long)]
    pub json: bool,

    /// Show debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply flag overrides on top of the environment configuration
    pub fn apply(&self, mut config: DbConfig) -> Result<DbConfig, ConfigError> {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(user) = &self.user {
            config.user = user.clone();
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if let Some(sql_file) = &self.sql_file {
            config.sql_file = sql_file.clone();
        }
        config.validate()?;
        Ok(config)
    }
}
