//! Command implementations for the escrowdesk CLI

pub mod provision;
pub mod users;

pub use provision::run_provision;
pub use users::{run_login, run_lookup, run_register};

use std::io::{self, BufRead};

use anyhow::{bail, Context, Result};
use clap::Args;

/// Password source shared by `register` and `login`
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct PasswordArgs {
    /// Password (visible in shell history; prefer --password-stdin)
    #[arg(long)]
    pub password: Option<String>,

    /// Read the password from the first line of stdin
    #[arg(long)]
    pub password_stdin: bool,
}

impl PasswordArgs {
    pub fn read(self) -> Result<String> {
        if let Some(password) = self.password {
            return Ok(password);
        }

        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read password from stdin")?;
        let password = line.trim_end_matches(['\r', '\n']).to_string();
        if password.is_empty() {
            bail!("No password on stdin");
        }
        Ok(password)
    }
}
