//! Test database setup and management
#![allow(dead_code)]

use modgate::app_config::DatabaseConfig;
use sea_orm::{DatabaseConnection, DbErr};
use std::env;

/// Get a test database connection
///
/// Uses TEST_DATABASE_URL when set. The default is a private in-memory SQLite
/// database, so every test starts empty and tests can run in parallel.
pub async fn get_test_db() -> Result<DatabaseConnection, DbErr> {
    let url = env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());

    modgate::db::connect(&DatabaseConfig {
        url,
        ..Default::default()
    })
    .await
}

/// Setup test database - connect and create the schema
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    let db = get_test_db().await?;
    modgate::db::create_schema(&db).await?;

    Ok(db)
}
