use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants;

/// Environment variable overriding [`SecurityConfig::jwt_secret`].
pub const ENV_JWT_SECRET: &str = "ORNOTES_JWT_SECRET";

/// Environment variable overriding [`TranscriptsConfig::api_key`].
pub const ENV_TRANSCRIPT_API_KEY: &str = "ORNOTES_TRANSCRIPT_API_KEY";

/// Environment variable overriding [`GeneralConfig::database_path`].
pub const ENV_DATABASE_PATH: &str = "ORNOTES_DATABASE_PATH";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub transcripts: TranscriptsConfig,

    pub report: ReportConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format
    pub json_logs: bool,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/hospital.db".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    pub argon2_parallelism: u32,

    /// HMAC secret for signing bearer tokens. Never ship a value in the
    /// config file template; set it via `ORNOTES_JWT_SECRET`.
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    pub token_lifetime_minutes: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            jwt_secret: String::new(),
            token_lifetime_minutes: constants::auth::TOKEN_LIFETIME_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptsConfig {
    pub base_url: String,

    #[serde(skip_serializing)]
    pub api_key: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,
}

impl Default for TranscriptsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".to_string(),
            api_key: String::new(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// IANA zone the stored UTC timestamps are shown in
    pub timezone: String,

    /// Optional PNG printed in the letterhead
    pub logo_path: Option<String>,

    pub branding: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            timezone: constants::report::DEFAULT_TIMEZONE.to_string(),
            logo_path: Some("assets/logo.png".to_string()),
            branding: "Operating Room Notes".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets and the database location may come from the process
    /// environment (or a `.env` file loaded by the caller).
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(secret) = lookup(ENV_JWT_SECRET).filter(|v| !v.is_empty()) {
            self.security.jwt_secret = secret;
        }
        if let Some(key) = lookup(ENV_TRANSCRIPT_API_KEY).filter(|v| !v.is_empty()) {
            self.transcripts.api_key = key;
        }
        if let Some(path) = lookup(ENV_DATABASE_PATH).filter(|v| !v.is_empty()) {
            self.general.database_path = path;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("ornotes").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".ornotes").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.report
            .timezone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow::anyhow!("Invalid report timezone '{}': {e}", self.report.timezone))?;

        if self.security.token_lifetime_minutes == 0 {
            anyhow::bail!("Token lifetime must be > 0 minutes");
        }

        if self.security.token_lifetime_minutes > constants::auth::MAX_TOKEN_LIFETIME_MINUTES {
            anyhow::bail!(
                "Token lifetime must be at most {} minutes",
                constants::auth::MAX_TOKEN_LIFETIME_MINUTES
            );
        }

        Ok(())
    }

    /// Checks that apply only when the HTTP server is about to start.
    pub fn validate_for_server(&self) -> Result<()> {
        self.validate()?;

        if self.security.jwt_secret.is_empty() {
            anyhow::bail!("JWT secret is not set. Export {ENV_JWT_SECRET} before starting the server");
        }

        Ok(())
    }
}
