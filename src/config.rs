use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS: u64 = 300;

/// Application configuration with validation.
///
/// Values come from `config/default.toml`, an optional per-environment file,
/// and `APP__`-prefixed environment variables, in increasing precedence.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Identity platform base URL (token verification, account management)
    pub identity_base_url: String,

    /// Identity platform API key
    pub identity_api_key: String,

    /// Object store base URL (reply attachments)
    pub storage_base_url: String,

    /// Transactional email API base URL
    pub email_base_url: String,

    /// Transactional email API key
    pub email_api_key: String,

    /// Sender address for RFQ notifications
    #[validate(email)]
    pub email_from_address: String,

    /// Sender display name for RFQ notifications
    #[serde(default = "default_email_from_name")]
    pub email_from_name: String,

    /// Portal URL included in supplier notification emails
    #[serde(default = "default_portal_url")]
    pub portal_url: String,

    /// Interval for the RFQ expiry sweep task, in seconds
    #[serde(default = "default_expiry_sweep_interval")]
    pub expiry_sweep_interval_secs: u64,

    /// Database pool tuning
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_email_from_name() -> String {
    "Sourcing Portal".to_string()
}

fn default_portal_url() -> String {
    "http://localhost:5173".to_string()
}

fn default_expiry_sweep_interval() -> u64 {
    DEFAULT_EXPIRY_SWEEP_INTERVAL_SECS
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_db_acquire_timeout_secs() -> u64 {
    8
}

fn default_db_idle_timeout_secs() -> u64 {
    600
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Load configuration from files and environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let environment = std::env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());
    load_config_for(&environment)
}

fn load_config_for(environment: &str) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder()
        .add_source(File::from(Path::new(CONFIG_DIR).join("default")).required(false))
        .add_source(File::from(Path::new(CONFIG_DIR).join(environment)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"));

    // Development fallbacks so a bare checkout starts against local services.
    if environment == DEFAULT_ENV {
        builder = builder
            .set_default("database_url", "sqlite::memory:")?
            .set_default("identity_base_url", "http://localhost:9099")?
            .set_default("identity_api_key", "dev-identity-key")?
            .set_default("storage_base_url", "http://localhost:9199")?
            .set_default("email_base_url", "http://localhost:9299")?
            .set_default("email_api_key", "dev-email-key")?
            .set_default("email_from_address", "sourcing@example.com")?;
    }

    let cfg: AppConfig = builder.build()?.try_deserialize()?;

    cfg.validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;

    Ok(cfg)
}

/// Initialize the tracing subscriber from configuration.
pub fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sourcing_api={log_level},tower_http=info")));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!("Tracing initialized at level {}", log_level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults_deserialize() {
        let cfg = load_config_for(DEFAULT_ENV).expect("development config should load");
        assert!(cfg.is_development());
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.expiry_sweep_interval_secs, 300);
    }
}
