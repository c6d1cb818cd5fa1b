//! Users repository
//!
//! - get: equality filter on email, all matches in id order
//! - create: bcrypt-hash then INSERT; the plaintext never reaches SQL
//!
//! Email is not unique. Two registrations with one address produce two rows,
//! and lookups return both.

use serde::Serialize;
use sqlx::FromRow;

use super::WriteAck;
use crate::error::{check_varchar, Result, ValidationError};
use crate::error::DbError;
use crate::password::{hash_password, verify_password, PASSWORD_MAX_BYTES};
use crate::pool::{get_query_executor, Database};
use crate::schema::USERS_TABLE;

/// Column limit for `email`
pub const EMAIL_MAX_LEN: usize = 64;

/// User record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct User {
    pub id: i32,
    pub email: Option<String>,
    /// bcrypt hash
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

/// Users repository
pub struct UserRepo<'a> {
    db: &'a Database,
}

impl<'a> UserRepo<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All users with `email`, in storage order.
    pub async fn get(&self, email: &str) -> Result<Vec<User>> {
        let table = self.db.ensure_table_exists(&USERS_TABLE).await?;

        let sql = format!(
            "SELECT {} FROM {} WHERE email = $1 ORDER BY id",
            table.column_list(),
            table.quoted_name()
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_all(self.db.pool())
            .await?;

        Ok(users)
    }

    /// Insert a user, storing a salted hash of `password`.
    ///
    /// No duplicate check is made on `email`. Passwords longer than
    /// [`PASSWORD_MAX_BYTES`] are rejected rather than silently truncated.
    pub async fn create(&self, email: &str, password: &str) -> Result<WriteAck> {
        check_varchar("email", email, EMAIL_MAX_LEN)?;
        if password.is_empty() {
            return Err(ValidationError::Empty { field: "password" }.into());
        }
        if password.len() > PASSWORD_MAX_BYTES {
            return Err(ValidationError::TooManyBytes {
                field: "password",
                max: PASSWORD_MAX_BYTES,
            }
            .into());
        }

        let hash = hash_password(password).await?;
        let table = self.db.ensure_table_exists(&USERS_TABLE).await?;

        let sql = format!(
            "INSERT INTO {} (email, password) VALUES ($1, $2)",
            table.quoted_name()
        );
        let result = sqlx::query(&sql)
            .bind(email)
            .bind(&hash)
            .execute(self.db.pool())
            .await?;

        tracing::debug!(rows = result.rows_affected(), "user inserted");
        Ok(result.into())
    }

    /// First user with `email` whose stored hash matches `password`.
    ///
    /// Rows without a stored hash, or with one bcrypt cannot parse, never
    /// match; the remaining rows are still checked.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        for user in self.get(email).await? {
            let Some(hash) = user.password.as_deref() else {
                continue;
            };
            match verify_password(password, hash).await {
                Ok(true) => return Ok(Some(user)),
                Ok(false) => {}
                Err(DbError::PasswordHash(_)) => {
                    tracing::warn!(user_id = user.id, "stored password hash is malformed, skipping");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }
}

/// [`UserRepo::get`] against the process-wide database.
pub async fn get_user(email: &str) -> Result<Vec<User>> {
    let db = get_query_executor()?;
    UserRepo::new(db).get(email).await
}

/// [`UserRepo::create`] against the process-wide database.
pub async fn create_user(email: &str, password: &str) -> Result<WriteAck> {
    let db = get_query_executor()?;
    UserRepo::new(db).create(email, password).await
}

/// [`UserRepo::verify_credentials`] against the process-wide database.
pub async fn verify_credentials(email: &str, password: &str) -> Result<Option<User>> {
    let db = get_query_executor()?;
    UserRepo::new(db).verify_credentials(email, password).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaMode;

    fn offline_db() -> Database {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(500))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .expect("lazy pool");
        Database::from_pool(pool, SchemaMode::PreProvisioned)
    }

    #[tokio::test]
    async fn create_rejects_bad_input_before_io() {
        let db = offline_db();
        let repo = UserRepo::new(&db);

        let err = repo.create("", "secret").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::Empty { field: "email" })
        ));

        let long = format!("{}@example.com", "a".repeat(60));
        let err = repo.create(&long, "secret").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::TooLong { field: "email", .. })
        ));

        let err = repo.create("a@example.com", "").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::Empty { field: "password" })
        ));

        // 72 bytes is the most bcrypt reads; one more would be dropped silently
        let at_limit = "é".repeat(36);
        let over = format!("{}x", at_limit);
        let err = repo.create("a@example.com", &over).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::TooManyBytes { field: "password", max: 72 })
        ));
    }

    #[tokio::test]
    async fn query_failure_surfaces_as_query_error() {
        let db = offline_db();
        let err = UserRepo::new(&db).get("a@example.com").await.unwrap_err();
        assert!(matches!(err, DbError::Query(_)));
    }

    #[test]
    fn serialized_user_omits_hash() {
        let user = User {
            id: 7,
            email: Some("a@example.com".into()),
            password: Some("$2b$10$abcdefghijklmnopqrstuv".into()),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(json, r#"{"id":7,"email":"a@example.com"}"#);
    }
}
