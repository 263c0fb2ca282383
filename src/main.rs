// ABOUTME: Entry point for the db-provision command line tool
// ABOUTME: Parses flags and hands off to the library run function

use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    db_provision_lib::run(db_provision_lib::cli::Cli::parse()).await
}
