//! # Application Configuration
//!
//! This module defines the configuration structure for the `fletia-server` and
//! provides the logic for loading it from a `config.yml` file and environment
//! variables.

use config::{Config as ConfigBuilder, Environment, File, FileFormat, Map};
use fletia::constants::{DEFAULT_DB_FILE, PLATFORM_NAME};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use tracing::info;

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The account created (or promoted) at startup so the platform always has
/// an administrator.
#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_admin_name")]
    pub nombre: String,
}

fn default_admin_name() -> String {
    "Administrador".to_string()
}

/// The transactional-mail HTTP API used for carrier credentials.
#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub from_address: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

fn default_from_name() -> String {
    PLATFORM_NAME.to_string()
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The path to the SQLite database file. Loaded from `DB_URL` env var.
    #[serde(default = "default_db_url")]
    pub db_url: String,
    /// HS256 signing secret for session tokens. Loaded from `JWT_SECRET`.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// How long a session token stays valid.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    #[serde(default)]
    pub admin: Option<AdminConfig>,
    #[serde(default)]
    pub mail: Option<MailConfig>,
}

/// Provides a default value for the `port` field if not set in the environment.
fn default_port() -> u16 {
    9090
}
/// Provides a default value for the `db_url` field if not set in the environment.
fn default_db_url() -> String {
    DEFAULT_DB_FILE.to_string()
}

pub const DEFAULT_JWT_SECRET: &str = "a-secure-secret-key";

/// Unprefixed environment variables that override top-level keys. Other
/// variables (`MAIL`, `USER`, ...) must never reach the nested sections.
const TOP_LEVEL_ENV_VARS: &[&str] = &["PORT", "DB_URL", "JWT_SECRET", "TOKEN_TTL_HOURS"];

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_token_ttl_hours() -> i64 {
    24
}

impl AppConfig {
    /// The admin bootstrap settings, if both email and password are set.
    pub fn admin_bootstrap(&self) -> Option<&AdminConfig> {
        self.admin
            .as_ref()
            .filter(|a| !a.email.trim().is_empty() && !a.password.is_empty())
    }

    /// The mail API settings, if an API URL is set.
    pub fn mail_api(&self) -> Option<&MailConfig> {
        self.mail.as_ref().filter(|m| !m.api_url.trim().is_empty())
    }
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}")
        .map_err(|e| ConfigError::General(format!("Invalid substitution pattern: {e}")))?;
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// - An explicit `config_path_override` must exist. Otherwise `config.yml` next
///   to the crate manifest is used when present, and defaults apply when not.
/// - `${VAR}` placeholders in the file are replaced with environment values.
/// - Top-level keys are overridden by `PORT`, `DB_URL`, `JWT_SECRET` and
///   `TOKEN_TTL_HOURS` only.
/// - Nested keys are overridden by `FLETIA_...` variables (e.g., `FLETIA_MAIL__API_URL`).
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");
    let mut builder = ConfigBuilder::builder();

    let file_content = match config_path_override {
        Some(path) => Some(read_and_substitute(path)?.ok_or_else(|| {
            ConfigError::NotFound(format!("Config file not found at '{path}'."))
        })?),
        None => {
            let user_config_path = format!("{base_path}/config.yml");
            let content = read_and_substitute(&user_config_path)?;
            if content.is_some() {
                info!("Loading user-defined configuration from '{user_config_path}'.");
            } else {
                info!("'{user_config_path}' not found. Using defaults and environment only.");
            }
            content
        }
    };
    if let Some(content) = file_content {
        builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
    }

    let top_level: Map<String, String> = TOP_LEVEL_ENV_VARS
        .iter()
        .filter_map(|key| env::var(key).ok().map(|value| (key.to_string(), value)))
        .collect();

    let settings = builder
        // Load environment variables for top-level keys like PORT.
        .add_source(Environment::default().source(Some(top_level)))
        // Load prefixed environment variables for deeper overrides.
        .add_source(
            Environment::with_prefix("FLETIA")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    Ok(config)
}
