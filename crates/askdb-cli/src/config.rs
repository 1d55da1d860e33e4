//! Configuration for the askdb binary.
//!
//! Loads configuration from:
//! 1. askdb.yaml - operational settings (database, model, logging)
//! 2. .env / process environment - secrets (API keys) and overrides
//!
//! Environment variables always override file values. The config file is
//! optional; a missing file yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Database backend selection plus its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Backend: "duckdb" or "postgres"
    pub backend: String,

    /// DuckDB database file; in-memory when unset.
    pub path: Option<String>,

    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,

    /// Schema searched when no explicit tables are given. Defaults per
    /// backend when unset.
    pub schema: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: "postgres".to_string(),
            path: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            dbname: "postgres".to_string(),
            schema: None,
        }
    }
}

impl DatabaseConfig {
    /// Effective schema: the configured value, else the backend's default
    /// ("main" for DuckDB, "public" otherwise).
    pub fn effective_schema(&self) -> &str {
        match &self.schema {
            Some(schema) => schema,
            None if self.backend == "duckdb" => "main",
            None => "public",
        }
    }
}

/// Language-model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Chat model used for SQL generation
    pub model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: askdb_openai::DEFAULT_MODEL.to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file with environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = if path.as_ref().exists() {
            serde_yaml::from_str(&std::fs::read_to_string(path)?)?
        } else {
            Config::default()
        };

        if let Ok(backend) = std::env::var("ASKDB_DB_BACKEND") {
            config.database.backend = backend;
        }
        if let Ok(path) = std::env::var("ASKDB_DB_PATH") {
            config.database.path = Some(path);
        }
        if let Ok(host) = std::env::var("ASKDB_DB_HOST") {
            config.database.host = host;
        }
        if let Ok(port) = std::env::var("ASKDB_DB_PORT") {
            if let Ok(port_num) = port.parse() {
                config.database.port = port_num;
            }
        }
        if let Ok(user) = std::env::var("ASKDB_DB_USER") {
            config.database.user = user;
        }
        if let Ok(password) = std::env::var("ASKDB_DB_PASSWORD") {
            config.database.password = password;
        }
        if let Ok(dbname) = std::env::var("ASKDB_DB_NAME") {
            config.database.dbname = dbname;
        }
        if let Ok(schema) = std::env::var("ASKDB_SCHEMA") {
            config.database.schema = Some(schema);
        }

        if let Ok(model) = std::env::var("ASKDB_MODEL") {
            config.llm.model = model;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            config.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            config.logging.directory = dir;
        }

        Ok(config)
    }

    /// Get the OpenAI API key from the environment (never the config file).
    pub fn openai_api_key() -> Result<String, ConfigError> {
        std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))
    }
}
