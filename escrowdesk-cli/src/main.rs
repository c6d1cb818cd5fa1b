//! escrowdesk CLI - operator entry point for the escrow tracking portal
//!
//! Wires logging and configuration, then calls into `escrowdesk-db`:
//! - `provision`: ensure the users and transactions tables exist
//! - `register` / `login` / `lookup`: the account flows the web pages use
//!
//! Failures from the database layer are reported generically; details are
//! only visible with `--debug`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use escrowdesk_db::DbError;

mod commands;
mod config;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "escrowdesk",
    author,
    version,
    about = "Transaction coordination portal for escrows - database tooling"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file (default: ~/.escrowdesk/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create missing tables (or check them when auto_create_schema is off)
    Provision(commands::provision::ProvisionArgs),
    /// Create a user account
    Register(commands::users::RegisterArgs),
    /// Verify an email and password
    Login(commands::users::LoginArgs),
    /// List accounts for an email
    Lookup(commands::users::LookupArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            eprintln!("error: {}", user_message(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<bool> {
    config::load_dotenv();
    let db_config = config::resolve(cli.config.as_deref())?;
    escrowdesk_db::init(&db_config)?;

    match cli.command {
        Commands::Provision(args) => commands::run_provision(args).await?,
        Commands::Register(args) => commands::run_register(args).await?,
        Commands::Login(args) => return commands::run_login(args).await,
        Commands::Lookup(args) => commands::run_lookup(args).await?,
    }
    Ok(true)
}

/// Message safe to show: never a raw database error or connection string.
fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<DbError>() {
        Some(DbError::Configuration { reason }) => {
            format!("database is not configured: {}", reason)
        }
        Some(DbError::Validation(invalid)) => invalid.to_string(),
        Some(_) => "request failed".to_string(),
        // outermost context only; parser sources may quote file contents
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn database_errors_are_not_echoed() {
        let err = anyhow::Error::from(DbError::AlreadyInitialized);
        assert_eq!(user_message(&err), "request failed");

        let err = anyhow::Error::from(DbError::config("DATABASE_URL is not set"));
        assert_eq!(
            user_message(&err),
            "database is not configured: DATABASE_URL is not set"
        );
    }
}
