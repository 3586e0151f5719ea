//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with MODGATE_, nested keys split on `__`)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! Database credentials belong in `DATABASE_URL` or `MODGATE_DATABASE__URL`,
//! not in the config file.

use crate::constants;
use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Global application configuration
pub static APP_CONFIG: Lazy<RwLock<AppConfig>> = Lazy::new(|| {
    RwLock::new(AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    }))
});

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    /// Worker threads; 0 keeps the actix default (one per core)
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
            workers: 0,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL (postgres://, mysql:// or sqlite:)
    pub url: String,
    pub max_connections: u32,
    /// Create missing tables on startup
    pub create_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 10,
            create_schema: true,
        }
    }
}

/// Identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Request header holding the authenticated actor id
    pub header: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            header: constants::DEFAULT_IDENTITY_HEADER.to_string(),
        }
    }
}

/// Moderation policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationConfig {
    /// Holding any of these roles grants moderate and ban capabilities
    pub moderator_roles: Vec<String>,
    /// Maximum comment ids per batch action
    pub max_batch_size: usize,
    /// Maximum characters in a flag or ban reason
    pub max_reason_length: usize,
    /// Maximum comments returned by one queue listing
    pub queue_limit: u64,
    /// Offenders returned when no limit is requested
    pub default_offender_limit: u64,
    /// Ban length when the moderator does not pick one
    pub ban_duration_days: i64,
    /// Longest ban a moderator may issue
    pub max_ban_duration_days: i64,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            moderator_roles: constants::DEFAULT_MODERATOR_ROLES
                .iter()
                .map(|r| r.to_string())
                .collect(),
            max_batch_size: constants::DEFAULT_MAX_BATCH_SIZE,
            max_reason_length: constants::DEFAULT_MAX_REASON_LENGTH,
            queue_limit: constants::DEFAULT_QUEUE_LIMIT,
            default_offender_limit: constants::DEFAULT_OFFENDER_LIMIT,
            ban_duration_days: constants::DEFAULT_BAN_DURATION_DAYS,
            max_ban_duration_days: constants::MAX_BAN_DURATION_DAYS,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub moderation: ModerationConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g. MODGATE_SERVER__PORT, MODGATE_MODERATION__MODERATOR_ROLES=a,b
            .add_source(
                Environment::with_prefix("MODGATE")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("moderation.moderator_roles")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;

        if let Ok(url) = std::env::var("DATABASE_URL") {
            app_config.database.url = url;
        }

        Ok(app_config)
    }
}

/// Initialize application configuration
///
/// Triggers the lazy load of the config file and logs the outcome.
pub fn init() {
    let config = get_config();
    log::info!(
        "Configuration loaded: listening on {}:{}, moderator roles = {:?}",
        config.server.bind_address,
        config.server.port,
        config.moderation.moderator_roles
    );
}

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.read().map(|c| c.clone()).unwrap_or_default()
}

pub fn server() -> ServerConfig {
    get_config().server
}

pub fn database() -> DatabaseConfig {
    get_config().database
}

pub fn identity() -> IdentityConfig {
    get_config().identity
}

pub fn moderation() -> ModerationConfig {
    get_config().moderation
}
