//! User commands - register, login check, lookup
//!
//! Stand-ins for the registration and login pages. Output never includes
//! password hashes.

use anyhow::Result;
use clap::Parser;
use escrowdesk_db::{create_user, get_user, verify_credentials};

use super::PasswordArgs;

#[derive(Parser, Debug)]
#[command(about = "Create a user account")]
pub struct RegisterArgs {
    /// Account email (not required to be unique)
    #[arg(long)]
    pub email: String,

    #[command(flatten)]
    pub password: PasswordArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Check an email and password against stored accounts")]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    #[command(flatten)]
    pub password: PasswordArgs,
}

#[derive(Parser, Debug)]
#[command(about = "List accounts registered under an email")]
pub struct LookupArgs {
    #[arg(long)]
    pub email: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run_register(args: RegisterArgs) -> Result<()> {
    let password = args.password.read()?;
    let existing = get_user(&args.email).await?;
    if !existing.is_empty() {
        tracing::warn!(
            count = existing.len(),
            "email already registered; creating another account"
        );
    }

    create_user(&args.email, &password).await?;
    println!("registered {}", args.email);
    Ok(())
}

/// Returns `false` on a credential mismatch.
pub async fn run_login(args: LoginArgs) -> Result<bool> {
    let password = args.password.read()?;
    match verify_credentials(&args.email, &password).await? {
        Some(user) => {
            println!("ok (user {})", user.id);
            Ok(true)
        }
        None => {
            println!("invalid credentials");
            Ok(false)
        }
    }
}

pub async fn run_lookup(args: LookupArgs) -> Result<()> {
    let users = get_user(&args.email).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("no accounts for {}", args.email);
    }
    for user in users {
        println!("{}\t{}", user.id, user.email.unwrap_or_default());
    }
    Ok(())
}
