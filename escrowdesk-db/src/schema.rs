//! Table descriptors and on-demand schema provisioning.
//!
//! Schema is only ever created, never altered or dropped. Two deployment
//! modes are supported:
//!
//! - [`SchemaMode::AutoCreate`]: check the catalog and create a missing table
//! - [`SchemaMode::PreProvisioned`]: the role may not issue DDL; trust that the
//!   table exists and hand back its descriptor without touching the database
//!
//! Creation is check-then-create, which is not atomic. Two callers can both see
//! a table as absent; the loser's `CREATE TABLE` fails with a duplicate error
//! that is treated as success.

use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;

use sqlx::PgPool;

use crate::error::{DbError, Result};

/// Namespace every table lives in; the catalog check, DDL and queries all name it.
pub const SCHEMA: &str = "public";

/// SQLSTATE duplicate_table
const DUPLICATE_TABLE: &str = "42P07";
/// SQLSTATE unique_violation; concurrent CREATE TABLE can trip the pg_type index
const UNIQUE_VIOLATION: &str = "23505";

/// One column of a table definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub sql_type: &'static str,
    /// Trailing constraints and defaults, e.g. `NOT NULL DEFAULT 'open'`
    pub constraints: &'static str,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, sql_type: &'static str, constraints: &'static str) -> Self {
        Self {
            name,
            sql_type,
            constraints,
        }
    }

    fn definition(&self) -> String {
        if self.constraints.is_empty() {
            format!("{} {}", self.name, self.sql_type)
        } else {
            format!("{} {} {}", self.name, self.sql_type, self.constraints)
        }
    }
}

/// Logical table name plus its column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    /// Name as stored in the catalog (case-sensitive)
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl TableSpec {
    /// Schema-qualified, double-quoted identifier, e.g. `public."User"`.
    ///
    /// Qualifying keeps statements off whatever `search_path` puts first.
    pub fn quoted_name(&self) -> String {
        format!("{}.\"{}\"", SCHEMA, self.name.replace('"', "\"\""))
    }

    /// `CREATE TABLE` with exactly the declared columns and defaults.
    pub fn create_statement(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(ColumnSpec::definition)
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({})", self.quoted_name(), columns)
    }
}

/// Descriptor handed to repositories for building queries.
///
/// Not a live resource: two handles for the same table compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableHandle {
    spec: &'static TableSpec,
}

impl TableHandle {
    pub fn new(spec: &'static TableSpec) -> Self {
        Self { spec }
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn columns(&self) -> &'static [ColumnSpec] {
        self.spec.columns
    }

    pub fn quoted_name(&self) -> String {
        self.spec.quoted_name()
    }

    /// Comma-separated column names for SELECT lists.
    pub fn column_list(&self) -> String {
        self.spec
            .columns
            .iter()
            .map(|c| c.name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for TableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.spec.quoted_name(), self.column_list())
    }
}

/// Users table. Email is not unique at the storage layer.
pub static USERS_TABLE: TableSpec = TableSpec {
    name: "User",
    columns: &[
        ColumnSpec::new("id", "SERIAL", "PRIMARY KEY"),
        ColumnSpec::new("email", "VARCHAR(64)", ""),
        ColumnSpec::new("password", "VARCHAR(64)", ""),
    ],
};

/// Escrow transactions. `acceptance_date` is Day 0 of the escrow timeline.
pub static TRANSACTIONS_TABLE: TableSpec = TableSpec {
    name: "transactions",
    columns: &[
        ColumnSpec::new("id", "SERIAL", "PRIMARY KEY"),
        ColumnSpec::new("address", "VARCHAR(255)", "NOT NULL"),
        ColumnSpec::new("acceptance_date", "DATE", "NOT NULL"),
        ColumnSpec::new("status", "VARCHAR(20)", "NOT NULL DEFAULT 'open'"),
        ColumnSpec::new("created_at", "TIMESTAMP", "DEFAULT NOW()"),
    ],
};

/// Whether the provisioner may issue DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaMode {
    AutoCreate,
    PreProvisioned,
}

impl SchemaMode {
    pub fn from_auto_create(enabled: bool) -> Self {
        if enabled {
            Self::AutoCreate
        } else {
            Self::PreProvisioned
        }
    }
}

/// Ensures tables exist before repositories use them.
///
/// Remembers which tables it has confirmed so the catalog is queried at most
/// once per table per process (barring concurrent first calls).
#[derive(Debug)]
pub struct SchemaProvisioner {
    mode: SchemaMode,
    provisioned: Mutex<HashSet<&'static str>>,
}

impl SchemaProvisioner {
    pub fn new(mode: SchemaMode) -> Self {
        Self {
            mode,
            provisioned: Mutex::new(HashSet::new()),
        }
    }

    pub fn mode(&self) -> SchemaMode {
        self.mode
    }

    /// Return a handle for `spec`, creating the table first if allowed and absent.
    ///
    /// # Errors
    ///
    /// - [`DbError::SchemaCheck`] if the catalog query fails
    /// - [`DbError::SchemaCreation`] if `CREATE TABLE` fails for any reason
    ///   other than the table already existing
    pub async fn ensure_table_exists(
        &self,
        pool: &PgPool,
        spec: &'static TableSpec,
    ) -> Result<TableHandle> {
        let handle = TableHandle::new(spec);

        if self.mode == SchemaMode::PreProvisioned || self.is_provisioned(spec.name) {
            return Ok(handle);
        }

        let exists = table_exists(pool, spec.name)
            .await
            .map_err(|source| DbError::SchemaCheck {
                table: spec.name,
                source,
            })?;

        if exists {
            tracing::debug!(table = spec.name, "table already present");
        } else {
            create_table(pool, spec).await?;
        }

        self.mark_provisioned(spec.name);
        Ok(handle)
    }

    fn is_provisioned(&self, name: &str) -> bool {
        self.provisioned
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(name)
    }

    fn mark_provisioned(&self, name: &'static str) {
        self.provisioned
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name);
    }
}

/// Catalog lookup for a table in [`SCHEMA`].
pub async fn table_exists(pool: &PgPool, name: &str) -> std::result::Result<bool, sqlx::Error> {
    tracing::debug!(table = name, "checking catalog");

    let (exists,): (bool,) = sqlx::query_as(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM information_schema.tables
            WHERE table_schema = $1 AND table_name = $2
        )
        "#,
    )
    .bind(SCHEMA)
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

async fn create_table(pool: &PgPool, spec: &'static TableSpec) -> Result<()> {
    match sqlx::query(&spec.create_statement()).execute(pool).await {
        Ok(_) => {
            tracing::info!(table = spec.name, "created table");
            Ok(())
        }
        Err(err) if is_already_exists(&err) => {
            tracing::warn!(table = spec.name, "table created concurrently, continuing");
            Ok(())
        }
        Err(source) => Err(DbError::SchemaCreation {
            table: spec.name,
            source,
        }),
    }
}

fn is_already_exists(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| is_duplicate_code(&code))
}

fn is_duplicate_code(code: &str) -> bool {
    code == DUPLICATE_TABLE || code == UNIQUE_VIOLATION
}
