//! Users repository end to end.
//!
//! Run with: DATABASE_URL=postgres://... cargo test -p escrowdesk-db -- --ignored
//!
//! Each test builds its own `Database`: a pool must not outlive the runtime of
//! the test that opened its connections. Only one test goes through the
//! process-wide accessors.

use escrowdesk_db::password::verify_password;
use escrowdesk_db::schema::table_exists;
use escrowdesk_db::{Database, DbConfig, SchemaMode, UserRepo, USERS_TABLE};
use sqlx::postgres::PgPoolOptions;
use sqlx::Executor;

fn database() -> Database {
    let config = DbConfig::from_env().expect("DATABASE_URL required");
    Database::connect_lazy(&config).expect("lazy pool")
}

fn unique_email() -> String {
    format!("{}@example.com", &uuid::Uuid::new_v4().simple().to_string()[..12])
}

#[tokio::test]
#[ignore = "requires database"]
async fn create_then_get_through_global_accessors() {
    let email = unique_email();

    let ack = escrowdesk_db::create_user(&email, "secret")
        .await
        .expect("create");
    assert_eq!(ack.rows_affected, 1);
    let pool = escrowdesk_db::get_connection().unwrap();
    assert!(table_exists(pool, "User").await.unwrap());

    let users = escrowdesk_db::get_user(&email).await.expect("get");
    assert_eq!(users.len(), 1);
    let user = &users[0];
    assert_eq!(user.email.as_deref(), Some(email.as_str()));

    let hash = user.password.as_deref().expect("hash stored");
    assert_ne!(hash, "secret");
    assert_eq!(hash.len(), 60);
    assert!(verify_password("secret", hash).await.unwrap());
}

#[tokio::test]
#[ignore = "requires database"]
async fn duplicate_emails_are_allowed() {
    let db = database();
    let repo = UserRepo::new(&db);
    let email = unique_email();

    repo.create(&email, "first").await.expect("create first");
    repo.create(&email, "second").await.expect("create second");

    let users = repo.get(&email).await.expect("get");
    assert_eq!(users.len(), 2);
    assert!(users[0].id < users[1].id);

    let matched = repo
        .verify_credentials(&email, "second")
        .await
        .expect("verify")
        .expect("second password matches");
    assert_eq!(matched.id, users[1].id);
}

#[tokio::test]
#[ignore = "requires database"]
async fn existing_table_is_read_without_creation() {
    let db = database();
    let email = unique_email();
    UserRepo::new(&db)
        .create(&email, "secret")
        .await
        .expect("seed row");

    // Auto-create stays on, but the session rejects any DDL: the read only
    // succeeds if the catalog check finds the table and nothing is created.
    let config = DbConfig::from_env().unwrap();
    let read_only = PgPoolOptions::new()
        .max_connections(1)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET default_transaction_read_only = on").await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("pool creation failed");
    let restricted = Database::from_pool(read_only, SchemaMode::AutoCreate);

    let users = UserRepo::new(&restricted).get(&email).await.expect("get");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].email.as_deref(), Some(email.as_str()));
}

#[tokio::test]
#[ignore = "requires database"]
async fn wrong_password_and_unknown_email_do_not_verify() {
    let db = database();
    let repo = UserRepo::new(&db);
    let email = unique_email();
    repo.create(&email, "secret").await.expect("create");

    assert!(repo.verify_credentials(&email, "Secret").await.unwrap().is_none());
    assert!(repo
        .verify_credentials(&unique_email(), "secret")
        .await
        .unwrap()
        .is_none());
    assert!(repo.get(&unique_email()).await.unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires database"]
async fn malformed_stored_hash_does_not_block_other_rows() {
    let db = database();
    let repo = UserRepo::new(&db);
    let email = unique_email();

    // oldest row carries a value bcrypt cannot parse
    let table = db.ensure_table_exists(&USERS_TABLE).await.expect("ensure");
    sqlx::query(&format!(
        "INSERT INTO {} (email, password) VALUES ($1, $2)",
        table.quoted_name()
    ))
    .bind(&email)
    .bind("not-a-bcrypt-hash")
    .execute(db.pool())
    .await
    .expect("seed malformed row");
    repo.create(&email, "secret").await.expect("create");

    let users = repo.get(&email).await.expect("get");
    assert_eq!(users.len(), 2);

    let matched = repo
        .verify_credentials(&email, "secret")
        .await
        .expect("verify")
        .expect("well-formed row matches");
    assert_eq!(matched.id, users[1].id);
    assert!(repo.verify_credentials(&email, "wrong").await.unwrap().is_none());
}
