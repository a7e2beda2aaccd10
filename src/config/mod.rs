//! Configuration loading for the feedback intake service.
//!
//! Loads layered `.env` files and process environment variables
//! (`APP_*`, `DB_*`, `GEMINI_*`, `DATABASE_URL`), producing a typed
//! [`AppConfig`].

use std::{collections::BTreeMap, env, net::SocketAddr, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::error::RepositoryError;

/// SSL modes understood by libpq-compatible drivers.
pub const SSL_MODES: &[&str] = &[
    "disable",
    "allow",
    "prefer",
    "require",
    "verify-ca",
    "verify-full",
];

const REDACTED: &str = "[REDACTED]";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct AppConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Appends raw storage error detail to the user-facing failure message.
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_db_name")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_db_sslmode")]
    pub sslmode: String,
    /// Issue idempotent schema statements before every insert.
    #[serde(default = "default_db_ensure_schema")]
    pub ensure_schema: bool,
    #[serde(default = "default_db_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

/// Gemini API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GeminiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_gemini_api_base")]
    pub api_base: String,
    #[serde(default = "default_gemini_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            api_bind_addr: default_api_bind_addr(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            debug: false,
            database: DatabaseConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: None,
            port: default_db_port(),
            name: default_db_name(),
            user: None,
            password: None,
            sslmode: default_db_sslmode(),
            ensure_schema: default_db_ensure_schema(),
            connect_timeout_ms: default_db_connect_timeout_ms(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            api_base: default_gemini_api_base(),
            timeout_ms: default_gemini_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Returns the configured bind address as a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.api_bind_addr.parse()
    }

    /// Returns a redacted JSON representation (secrets are redacted).
    pub fn redacted_json(&self) -> serde_json::Result<String> {
        let mut config = self.clone();
        if config.gemini.api_key.is_some() {
            config.gemini.api_key = Some(REDACTED.to_string());
        }
        if config.database.password.is_some() {
            config.database.password = Some(REDACTED.to_string());
        }
        // URLs may embed credentials
        if config.database.url.is_some() {
            config.database.url = Some(REDACTED.to_string());
        }
        serde_json::to_string_pretty(&config)
    }

    /// Validates well-formedness of the loaded settings.
    ///
    /// Missing credentials are not errors here: a missing API key degrades the
    /// analysis and missing database settings surface as storage failures.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SSL_MODES.contains(&self.database.sslmode.as_str()) {
            return Err(ConfigError::InvalidSslMode {
                value: self.database.sslmode.clone(),
            });
        }

        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(ConfigError::InvalidLogFormat {
                value: self.log_format.clone(),
            });
        }

        if self.database.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidDbConnectTimeout {
                value: self.database.connect_timeout_ms,
            });
        }

        if self.gemini.timeout_ms == 0 {
            return Err(ConfigError::InvalidGeminiTimeout {
                value: self.gemini.timeout_ms,
            });
        }

        Ok(())
    }
}

impl DatabaseConfig {
    /// Builds the connection URL for this configuration.
    ///
    /// `DATABASE_URL` is returned verbatim when set; otherwise a
    /// percent-encoded `postgres://` URL is assembled from the parts.
    pub fn connection_url(&self) -> Result<String, RepositoryError> {
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return Ok(url.to_string());
        }

        let host = self
            .host
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| RepositoryError::invalid_configuration("database host is not set"))?;

        let mut url = Url::parse("postgres://localhost")
            .map_err(|e| RepositoryError::invalid_configuration(e.to_string()))?;
        url.set_host(Some(host))
            .map_err(|e| RepositoryError::invalid_configuration(format!("invalid database host: {e}")))?;
        url.set_port(Some(self.port))
            .map_err(|_| RepositoryError::invalid_configuration("database port rejected"))?;
        if let Some(user) = self.user.as_deref() {
            url.set_username(user)
                .map_err(|_| RepositoryError::invalid_configuration("database user rejected"))?;
        }
        if let Some(password) = self.password.as_deref() {
            url.set_password(Some(password))
                .map_err(|_| RepositoryError::invalid_configuration("database password rejected"))?;
        }
        url.set_path(&self.name);
        url.query_pairs_mut().append_pair("sslmode", &self.sslmode);

        Ok(url.into())
    }
}

impl GeminiConfig {
    /// Returns the API key when one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

fn default_profile() -> String {
    "local".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "postgres".to_string()
}

fn default_db_sslmode() -> String {
    "require".to_string()
}

fn default_db_ensure_schema() -> bool {
    true
}

fn default_db_connect_timeout_ms() -> u64 {
    5000
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_gemini_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_timeout_ms() -> u64 {
    30_000
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load environment file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        source: dotenvy::Error,
    },
    #[error("invalid api bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error(
        "invalid DB_SSLMODE '{value}'; expected one of disable, allow, prefer, require, verify-ca, verify-full"
    )]
    InvalidSslMode { value: String },
    #[error("invalid APP_LOG_FORMAT '{value}'; expected json or pretty")]
    InvalidLogFormat { value: String },
    #[error("DB_CONNECT_TIMEOUT_MS must be positive, got {value}")]
    InvalidDbConnectTimeout { value: u64 },
    #[error("GEMINI_TIMEOUT_MS must be positive, got {value}")]
    InvalidGeminiTimeout { value: u64 },
}

/// Loads configuration using layered `.env` files and environment variables.
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a new loader rooted at the current working directory.
    pub fn new() -> Self {
        Self {
            base_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Creates a loader rooted at the provided directory (useful for tests).
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Loads `.env`, `.env.local`, `.env.{profile}`, `.env.{profile}.local`,
    /// then the process environment, later layers winning.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let (mut layered, profile_hint) = self.collect_layered_env()?;

        for (key, value) in env::vars() {
            if is_recognized_key(&key) {
                layered.insert(key, value);
            }
        }

        // Blank values count as unset.
        let mut take = |key: &str| layered.remove(key).filter(|v| !v.trim().is_empty());

        let profile = take("APP_PROFILE").unwrap_or(profile_hint);
        let api_bind_addr = take("APP_BIND_ADDR").unwrap_or_else(default_api_bind_addr);
        let log_level = take("APP_LOG_LEVEL").unwrap_or_else(default_log_level);
        let log_format = take("APP_LOG_FORMAT").unwrap_or_else(default_log_format);
        let debug = take("APP_DEBUG").is_some_and(|v| parse_flag(&v));

        let database = DatabaseConfig {
            url: take("DATABASE_URL"),
            host: take("DB_HOST"),
            port: take("DB_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or_else(default_db_port),
            name: take("DB_NAME").unwrap_or_else(default_db_name),
            user: take("DB_USER"),
            password: take("DB_PASSWORD"),
            sslmode: take("DB_SSLMODE")
                .map(|v| v.trim().to_lowercase())
                .unwrap_or_else(default_db_sslmode),
            ensure_schema: take("DB_ENSURE_SCHEMA")
                .map(|v| parse_flag(&v))
                .unwrap_or_else(default_db_ensure_schema),
            connect_timeout_ms: take("DB_CONNECT_TIMEOUT_MS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or_else(default_db_connect_timeout_ms),
        };

        let gemini = GeminiConfig {
            api_key: take("GEMINI_API_KEY").map(|v| v.trim().to_string()),
            model: take("GEMINI_MODEL")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(default_gemini_model),
            api_base: take("GEMINI_API_BASE")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(default_gemini_api_base),
            timeout_ms: take("GEMINI_TIMEOUT_MS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or_else(default_gemini_timeout_ms),
        };

        let config = AppConfig {
            profile,
            api_bind_addr,
            log_level,
            log_format,
            debug,
            database,
            gemini,
        };

        config.validate()?;

        match config.bind_addr() {
            Ok(_) => Ok(config),
            Err(source) => Err(ConfigError::InvalidBindAddr {
                value: config.api_bind_addr.clone(),
                source,
            }),
        }
    }

    fn collect_layered_env(&self) -> Result<(BTreeMap<String, String>, String), ConfigError> {
        let mut values = BTreeMap::new();

        self.merge_dotenv(self.base_dir.join(".env"), &mut values)?;
        self.merge_dotenv(self.base_dir.join(".env.local"), &mut values)?;

        let profile = env::var("APP_PROFILE")
            .ok()
            .filter(|v| !v.is_empty())
            .or_else(|| values.get("APP_PROFILE").cloned())
            .unwrap_or_else(default_profile);

        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}", &profile)),
            &mut values,
        )?;
        self.merge_dotenv(
            self.base_dir.join(format!(".env.{}.local", &profile)),
            &mut values,
        )?;

        Ok((values, profile))
    }

    fn merge_dotenv(
        &self,
        path: PathBuf,
        values: &mut BTreeMap<String, String>,
    ) -> Result<(), ConfigError> {
        match dotenvy::from_path_iter(&path) {
            Ok(iter) => {
                for item in iter {
                    let (key, value) = item.map_err(|source| ConfigError::EnvFile {
                        path: path.clone(),
                        source,
                    })?;
                    if is_recognized_key(&key) {
                        values.insert(key, value);
                    }
                }
                Ok(())
            }
            Err(dotenvy::Error::Io(ref io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(())
            }
            Err(err) => Err(ConfigError::EnvFile { path, source: err }),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_recognized_key(key: &str) -> bool {
    key == "DATABASE_URL"
        || key.starts_with("APP_")
        || key.starts_with("DB_")
        || key.starts_with("GEMINI_")
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
