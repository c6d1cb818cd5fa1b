//! Repository implementations for database access
//!
//! Each repository follows these patterns:
//! - Obtains its table handle from the provisioner before issuing SQL
//! - Builds select lists from the handle, not hand-written column names
//! - One statement per operation; failures are returned unchanged

pub mod transactions;
pub mod users;

use serde::Serialize;

pub use transactions::{ensure_transactions_table_exists, TransactionRepo, DEFAULT_STATUS};
pub use users::{create_user, get_user, verify_credentials, User, UserRepo};

/// Acknowledgment for a write statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteAck {
    pub rows_affected: u64,
}

impl From<sqlx::postgres::PgQueryResult> for WriteAck {
    fn from(result: sqlx::postgres::PgQueryResult) -> Self {
        Self {
            rows_affected: result.rows_affected(),
        }
    }
}
