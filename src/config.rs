use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_DATABASE_URL: &str = "sqlite://storefront.db?mode=rwc";
const DEFAULT_SHIPPING_FEE: i64 = 30_000;
const DEFAULT_CURRENCY: &str = "VND";

/// Storefront settings, layered from files and `APP__*` variables.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// sea-orm URL, e.g. `sqlite://storefront.db?mode=rwc` or `postgres://...`
    pub database_url: String,

    /// Selects `config/<environment>.toml`
    pub environment: String,

    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Emit JSON log lines instead of the human format
    #[serde(default)]
    pub log_json: bool,

    /// Apply pending migrations when the CLI starts
    #[serde(default)]
    pub auto_migrate: bool,

    /// Pool size; keep at 1 for `sqlite::memory:`
    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1, max = 1000))]
    pub db_max_connections: u32,

    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// Pool timeouts, in seconds
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Prefix applied to stored media paths when they leave the core.
    /// Empty means paths are returned as stored.
    #[serde(default)]
    #[validate(custom = "validate_media_base_url")]
    pub media_base_url: String,

    /// Flat shipping fee added to every order, in the store currency.
    #[serde(default = "default_shipping_fee")]
    #[validate(custom = "validate_shipping_fee")]
    pub shipping_fee: Decimal,

    /// ISO currency code stamped on orders and payments
    #[serde(default = "default_currency")]
    #[validate(length(equal = 3))]
    pub default_currency: String,

    /// Catalog page size used when the caller does not pass a limit
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 1000))]
    pub default_page_size: u64,

    /// Upper bound for caller supplied catalog page sizes
    #[serde(default = "default_max_page_size")]
    #[validate(range(min = 1, max = 10000))]
    pub max_page_size: u64,

    /// When false, order placement fails with `InsufficientStock` instead of
    /// driving on-hand inventory below zero.
    #[serde(default = "default_true_bool")]
    pub allow_oversell: bool,

    /// New reviews start as `pending` and stay hidden until approved.
    #[serde(default)]
    pub moderate_reviews: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            environment: DEFAULT_ENV.to_string(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            media_base_url: String::new(),
            shipping_fee: default_shipping_fee(),
            default_currency: default_currency(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            allow_oversell: true,
            moderate_reviews: false,
        }
    }
}

impl AppConfig {
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Checks that span more than one field.
    fn validate_additional_constraints(&self) -> Result<(), validator::ValidationErrors> {
        let mut errors = validator::ValidationErrors::new();

        if self.default_page_size > self.max_page_size {
            let mut err = ValidationError::new("default_page_size");
            err.message = Some("default_page_size must not exceed max_page_size".into());
            errors.add("default_page_size", err);
        }

        if self.db_min_connections > self.db_max_connections {
            let mut err = ValidationError::new("db_min_connections");
            err.message = Some("db_min_connections must not exceed db_max_connections".into());
            errors.add("db_min_connections", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Runs derive validation and the cross-field checks.
    pub fn validate_all(&self) -> Result<(), AppConfigError> {
        self.validate().map_err(|e| {
            error!("Configuration validation failed: {:?}", e);
            AppConfigError::Validation(e)
        })?;
        self.validate_additional_constraints().map_err(|e| {
            error!("Configuration validation failed: {:?}", e);
            AppConfigError::Validation(e)
        })
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
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
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    30
}

fn default_shipping_fee() -> Decimal {
    Decimal::from(DEFAULT_SHIPPING_FEE)
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_page_size() -> u64 {
    20
}

fn default_max_page_size() -> u64 {
    100
}

fn default_true_bool() -> bool {
    true
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_media_base_url(url: &str) -> Result<(), ValidationError> {
    if url.is_empty()
        || url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with('/')
    {
        return Ok(());
    }
    let mut err = ValidationError::new("media_base_url");
    err.message = Some("media_base_url must be empty, absolute (http/https) or rooted".into());
    Err(err)
}

fn validate_shipping_fee(fee: &Decimal) -> Result<(), ValidationError> {
    if fee.is_sign_negative() {
        let mut err = ValidationError::new("shipping_fee");
        err.message = Some("shipping_fee cannot be negative".into());
        return Err(err);
    }
    Ok(())
}

/// Installs the global subscriber. `RUST_LOG` wins over `level` when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("storefront_core={},storefront={}", level, level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let filter = EnvFilter::new(filter_directive);
    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

/// Loads application configuration from `./config`
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

/// Same layering as [`load_config`] with an explicit config directory.
pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(&run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate_all()?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        writeln!(file, "{}", content).unwrap();
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate_all().is_ok());
        assert_eq!(cfg.shipping_fee, dec!(30000));
        assert_eq!(cfg.default_currency, "VND");
        assert!(cfg.allow_oversell);
        assert!(!cfg.moderate_reviews);
    }

    #[test]
    fn default_page_size_cannot_exceed_max() {
        let cfg = AppConfig {
            default_page_size: 200,
            max_page_size: 50,
            ..AppConfig::default()
        };
        assert!(matches!(
            cfg.validate_all(),
            Err(AppConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_negative_shipping_fee_and_bad_media_url() {
        let cfg = AppConfig {
            shipping_fee: dec!(-1),
            media_base_url: "cdn.example.com".into(),
            ..AppConfig::default()
        };
        let Err(AppConfigError::Validation(errors)) = cfg.validate_all() else {
            panic!("expected validation failure");
        };
        let fields = errors.field_errors();
        assert!(fields.contains_key("shipping_fee"));
        assert!(fields.contains_key("media_base_url"));
    }

    #[test]
    fn loads_values_from_default_toml() {
        let dir = TempDir::new().unwrap();
        write_file(
            dir.path(),
            "default.toml",
            r#"
            database_url = "sqlite::memory:"
            media_base_url = "https://cdn.example.com"
            shipping_fee = 25000
            max_page_size = 60
            allow_oversell = false
            "#,
        );

        let cfg = load_config_from(dir.path()).unwrap();
        assert_eq!(cfg.database_url(), "sqlite::memory:");
        assert_eq!(cfg.media_base_url, "https://cdn.example.com");
        assert_eq!(cfg.shipping_fee, dec!(25000));
        assert_eq!(cfg.max_page_size, 60);
        assert!(!cfg.allow_oversell);
        assert_eq!(cfg.default_page_size, 20);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "default.toml", "jwt_secret = \"nope\"");
        assert!(matches!(
            load_config_from(dir.path()),
            Err(AppConfigError::Load(_))
        ));
    }
}
