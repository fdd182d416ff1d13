use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: i64 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_DATABASE_NAME: &str = "platform-production";
const DEFAULT_TENANT_NAME: &str = "Vault";
const DEFAULT_CUSTOMER_ID: &str = "64fda3c3823ef77f92d0af36";
const DEFAULT_WAREHOUSE_ID: &str = "63f204af4730a6193c250f5c";
const DEFAULT_START_DATE: &str = "2025-01-30";
const DEFAULT_END_DATE: &str = "2025-02-19";
const DEFAULT_NA_AWS_REGION: &str = "us-east-1";
const DEFAULT_SE_AWS_REGION: &str = "ap-southeast-1";

/// Where to find the connection-string secret for one region: the AWS
/// region hosting the secret and the Secrets Manager id to read.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegionConfig {
    #[validate(length(min = 1))]
    pub aws_region: String,

    #[validate(length(min = 1))]
    pub secret_id: String,
}

/// The two regional deployments of the shared schema.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegionsConfig {
    /// Hosts the `tenants` collection.
    #[validate]
    pub north_america: RegionConfig,

    /// Hosts the order, line item, batch, and consignment collections.
    #[validate]
    pub south_east: RegionConfig,
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Logical database name, identical in both regions
    pub database_name: String,

    /// Tenant resolved once at startup; scopes every report query
    #[validate(length(min = 1))]
    pub tenant_name: String,

    /// Customer scope for both reports
    #[validate(custom = "validate_object_id_hex")]
    pub customer_id: String,

    /// Warehouse scope for both reports
    #[validate(custom = "validate_object_id_hex")]
    pub warehouse_id: String,

    /// Date-picker default when no start date is supplied
    #[validate(custom = "validate_calendar_date")]
    pub default_start_date: String,

    /// Date-picker default when no end date is supplied
    #[validate(custom = "validate_calendar_date")]
    pub default_end_date: String,

    /// Region to secret mappings
    #[validate]
    pub regions: RegionsConfig,
}

fn default_port() -> u16 {
    DEFAULT_PORT as u16
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn validate_object_id_hex(value: &str) -> Result<(), ValidationError> {
    if value.len() == 24 && value.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(ValidationError::new("object_id_hex"))
    }
}

fn validate_calendar_date(value: &str) -> Result<(), ValidationError> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ValidationError::new("calendar_date"))
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("configuration load error: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured
/// level when set.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("vault_reports_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads the application configuration: built-in defaults, then the files
/// under `config/`, then `APP__`-prefixed environment variables.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // NOTE: the secret ids have no default - they MUST be provided via
    // environment variables or a config file so that no production secret
    // location is baked into the binary.
    let config = Config::builder()
        .set_default("port", DEFAULT_PORT)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("database_name", DEFAULT_DATABASE_NAME)?
        .set_default("tenant_name", DEFAULT_TENANT_NAME)?
        .set_default("customer_id", DEFAULT_CUSTOMER_ID)?
        .set_default("warehouse_id", DEFAULT_WAREHOUSE_ID)?
        .set_default("default_start_date", DEFAULT_START_DATE)?
        .set_default("default_end_date", DEFAULT_END_DATE)?
        .set_default("regions.north_america.aws_region", DEFAULT_NA_AWS_REGION)?
        .set_default("regions.south_east.aws_region", DEFAULT_SE_AWS_REGION)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // Check the secret ids before deserialization to provide a clear error message
    for key in [
        "regions.north_america.secret_id",
        "regions.south_east.secret_id",
    ] {
        if config.get_string(key).is_err() {
            error!(
                "Database secret id '{}' is not configured. Set APP__{} to the Secrets Manager id holding the connection string.",
                key,
                key.to_uppercase().replace('.', "__")
            );
            return Err(AppConfigError::Load(ConfigError::NotFound(format!(
                "{} is required but not configured",
                key
            ))));
        }
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    Ok(app_config)
}
