//! escrowdesk-db: database access layer for the escrow tracking portal
//!
//! Provides the lazily-built process-wide connection, on-demand schema
//! provisioning, and the `users` and `transactions` repositories. Callers
//! (pages, server actions, the CLI) use the free functions re-exported here;
//! nothing in this crate touches the environment or the network until one of
//! them runs.
//!
//! ```ignore
//! let ack = escrowdesk_db::create_user("a@example.com", "secret").await?;
//! let rows = escrowdesk_db::get_user("a@example.com").await?;
//! ```

pub mod config;
pub mod error;
pub mod password;
pub mod pool;
pub mod repos;
pub mod schema;

pub use config::{require_tls, resolve_connection_url, DbConfig};
pub use error::{DbError, Result, ValidationError};
pub use pool::{get_connection, get_query_executor, init, Database};
pub use repos::{
    create_user, ensure_transactions_table_exists, get_user, verify_credentials, TransactionRepo,
    User, UserRepo, WriteAck,
};
pub use schema::{SchemaMode, TableHandle, TableSpec, TRANSACTIONS_TABLE, USERS_TABLE};
