//! Database connection management
//!
//! The process holds a single [`Database`], built lazily on first use from
//! environment configuration. Nothing is resolved or connected at load time.
//! The pool itself connects lazily too, so a bad host surfaces on the first
//! query rather than here.

use once_cell::sync::OnceCell;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::config::DbConfig;
use crate::error::{DbError, Result};
use crate::schema::{SchemaMode, SchemaProvisioner, TableHandle, TableSpec};

static DATABASE: OnceCell<Database> = OnceCell::new();

/// Connection pool plus the provisioner bound to it.
///
/// A `PgPool` is both the connection handle and the query executor; this
/// type adds the schema policy repositories need.
#[derive(Debug)]
pub struct Database {
    pool: PgPool,
    provisioner: SchemaProvisioner,
}

impl Database {
    /// Build a pool for `config` without opening any connection.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Configuration`] if the URL cannot be parsed.
    pub fn connect_lazy(config: &DbConfig) -> Result<Self> {
        let options: PgConnectOptions = config
            .database_url
            .parse()
            .map_err(|_| DbError::config("connection string is not a valid postgres URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(options);

        let mode = SchemaMode::from_auto_create(config.auto_create_schema);
        tracing::debug!(
            max_connections = config.max_connections,
            schema_mode = ?mode,
            "database pool configured"
        );

        Ok(Self::from_pool(pool, mode))
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool, mode: SchemaMode) -> Self {
        Self {
            pool,
            provisioner: SchemaProvisioner::new(mode),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn schema_mode(&self) -> SchemaMode {
        self.provisioner.mode()
    }

    /// Return a handle for `spec`, provisioning the table per this database's mode.
    pub async fn ensure_table_exists(&self, spec: &'static TableSpec) -> Result<TableHandle> {
        self.provisioner.ensure_table_exists(&self.pool, spec).await
    }
}

/// Explicitly initialize the process-wide database.
///
/// # Errors
///
/// Returns [`DbError::AlreadyInitialized`] if it was already built, either by
/// an earlier `init` or by a lazy accessor.
pub fn init(config: &DbConfig) -> Result<&'static Database> {
    let db = Database::connect_lazy(config)?;
    DATABASE
        .set(db)
        .map_err(|_| DbError::AlreadyInitialized)?;
    get_query_executor()
}

/// Process-wide query executor, built from the environment on first call.
///
/// Concurrent first calls converge on one instance. On failure nothing is
/// cached, so a later call can succeed once configuration appears.
pub fn get_query_executor() -> Result<&'static Database> {
    DATABASE.get_or_try_init(|| {
        let config = DbConfig::from_env()?;
        Database::connect_lazy(&config)
    })
}

/// Process-wide connection pool, built on first call.
pub fn get_connection() -> Result<&'static PgPool> {
    get_query_executor().map(Database::pool)
}
