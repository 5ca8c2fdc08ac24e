use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    #[serde(default)]
    pub cards: CardsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub unix_socket: Option<PathBuf>,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
    /// Base URL printed into generated QR scan links
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Json,
    Rest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// PostgREST base URL, required by the rest backend
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Guards the monitoring endpoint
    pub api_key: String,
    #[serde(default = "default_session_ttl")]
    pub session_ttl: i64,
    #[serde(default = "default_max_login_attempts")]
    pub max_login_attempts_per_minute: u32,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
    /// Read the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Only enable behind a reverse proxy that overwrites those headers.
    #[serde(default)]
    pub trust_forwarded_headers: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CardsConfig {
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
            endpoint: None,
            api_key: None,
        }
    }
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
        }
    }
}

// Default value functions
fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_public_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_backend() -> StorageBackend {
    StorageBackend::Json
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_session_ttl() -> i64 {
    86_400 // 1 day
}

fn default_max_login_attempts() -> u32 {
    10
}

fn default_cleanup_interval() -> u64 {
    300 // 5 minutes
}

fn default_max_batch_size() -> i64 {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port.is_none() && self.server.unix_socket.is_none() {
            bail!("Either port or unix_socket must be specified in server config");
        }

        if let Some(port) = self.server.port {
            if port == 0 {
                bail!("Server port must be greater than 0");
            }
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if !self.server.public_url.starts_with("http://")
            && !self.server.public_url.starts_with("https://")
        {
            bail!(
                "public_url '{}' must start with http:// or https://",
                self.server.public_url
            );
        }

        if self.storage.backend == StorageBackend::Rest {
            if self.storage.endpoint.as_deref().map_or(true, str::is_empty) {
                bail!("storage.endpoint must be set for the rest backend");
            }
            if self.storage.api_key.as_deref().map_or(true, str::is_empty) {
                bail!("storage.api_key must be set for the rest backend");
            }
        }

        if self.security.api_key.is_empty() {
            bail!("security.api_key must not be empty");
        }

        if self.security.session_ttl <= 0 {
            bail!("session_ttl must be greater than 0");
        }

        if self.security.max_login_attempts_per_minute == 0 {
            bail!("max_login_attempts_per_minute must be greater than 0");
        }

        if self.security.cleanup_interval == 0 {
            bail!("cleanup_interval must be greater than 0");
        }

        if self.cards.max_batch_size <= 0 {
            bail!("max_batch_size must be greater than 0");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}
