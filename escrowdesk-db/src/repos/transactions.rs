//! Transactions repository
//!
//! Only provisioning exists so far. Reads and writes built later take the
//! same [`TableHandle`] the users repository does.

use crate::error::Result;
use crate::pool::{get_query_executor, Database};
use crate::schema::{TableHandle, TRANSACTIONS_TABLE};

/// Status a new transaction starts in.
///
/// Other lifecycle states are not defined yet.
pub const DEFAULT_STATUS: &str = "open";

/// Transactions repository
pub struct TransactionRepo<'a> {
    db: &'a Database,
}

impl<'a> TransactionRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Handle for the `transactions` table, creating it first if allowed.
    pub async fn ensure_table(&self) -> Result<TableHandle> {
        self.db.ensure_table_exists(&TRANSACTIONS_TABLE).await
    }
}

/// [`TransactionRepo::ensure_table`] against the process-wide database.
pub async fn ensure_transactions_table_exists() -> Result<TableHandle> {
    let db = get_query_executor()?;
    TransactionRepo::new(db).ensure_table().await
}
