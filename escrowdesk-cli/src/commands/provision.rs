//! Provision command - make sure both tables exist
//!
//! With `auto_create_schema` off nothing is created; the command only reports
//! whether the pre-provisioned tables are there.

use anyhow::{bail, Result};
use clap::Parser;
use escrowdesk_db::schema::table_exists;
use escrowdesk_db::{
    ensure_transactions_table_exists, get_query_executor, DbError, SchemaMode, USERS_TABLE,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Create the users and transactions tables if they are missing")]
pub struct ProvisionArgs {}

pub async fn run_provision(_args: ProvisionArgs) -> Result<()> {
    let db = get_query_executor()?;
    let mode = db.schema_mode();
    if mode == SchemaMode::PreProvisioned {
        info!("auto_create_schema is off; checking tables only");
    }

    let handles = [
        db.ensure_table_exists(&USERS_TABLE).await?,
        ensure_transactions_table_exists().await?,
    ];

    // auto-create already confirmed each table against the catalog
    if !needs_presence_check(mode) {
        for handle in handles {
            println!("present\t{}", handle);
        }
        return Ok(());
    }

    let mut missing = Vec::new();
    for handle in handles {
        let present = table_exists(db.pool(), handle.name())
            .await
            .map_err(|source| DbError::SchemaCheck {
                table: handle.name(),
                source,
            })?;
        println!("{}\t{}", if present { "present" } else { "missing" }, handle);
        if !present {
            missing.push(handle.name());
        }
    }

    if !missing.is_empty() {
        bail!("tables missing: {}", missing.join(", "));
    }
    Ok(())
}

/// Pre-provisioned handles come back without touching the catalog.
fn needs_presence_check(mode: SchemaMode) -> bool {
    mode == SchemaMode::PreProvisioned
}
