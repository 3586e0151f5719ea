//! Database connection and schema bootstrap

use crate::app_config::DatabaseConfig;
use crate::orm::{actors, bans, comments, moderation_events, role_assignments};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};

/// Open a connection pool for the configured database.
///
/// Every connection to `sqlite::memory:` opens its own empty database, so
/// in-memory SQLite is pinned to a single connection.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());

    if is_in_memory_sqlite(&config.url) {
        options.max_connections(1).min_connections(1);
    } else {
        options.max_connections(config.max_connections.max(1));
    }
    options.sqlx_logging(false);

    let db = Database::connect(options).await?;
    log::info!("Connected to database ({:?})", db.get_database_backend());

    Ok(db)
}

/// The connection URL with any credentials masked, for logs and errors.
pub fn redacted_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_string();
    };
    let authority_start = scheme_end + 3;
    let authority_end = url[authority_start..]
        .find(|c| c == '/' || c == '?')
        .map_or(url.len(), |i| authority_start + i);

    match url[authority_start..authority_end].rfind('@') {
        Some(at) => format!(
            "{}***@{}",
            &url[..authority_start],
            &url[authority_start + at + 1..]
        ),
        None => url.to_string(),
    }
}

fn is_in_memory_sqlite(url: &str) -> bool {
    url.starts_with("sqlite:") && url.contains(":memory:")
}

/// Create any missing tables.
///
/// Tables are created in dependency order so foreign keys resolve.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, actors::Entity).await?;
    create_table(db, role_assignments::Entity).await?;
    create_table(db, comments::Entity).await?;
    create_table(db, moderation_events::Entity).await?;
    create_table(db, bans::Entity).await?;

    log::info!("Database schema is up to date");

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut statement = Schema::new(backend).create_table_from_entity(entity);
    statement.if_not_exists();

    db.execute(backend.build(&statement)).await?;

    Ok(())
}
