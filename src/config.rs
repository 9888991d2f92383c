use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable that overrides `database.url`.
pub const DATABASE_URL_ENV: &str = "GATEKEEPER_DATABASE_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub database: DatabaseConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub tokens: TokenConfig,

    pub mailer: MailerConfig,

    pub permissions: PermissionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub json_logs: bool,

    /// Number of tokio worker threads (default: 0)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            worker_threads: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `sqlite:` or `postgres://` connection URL.
    pub url: String,

    pub max_connections: u32,

    pub min_connections: u32,

    /// How long a request waits for a pooled connection before failing.
    pub acquire_timeout_seconds: u64,

    /// Upper bound on every individual storage call.
    pub query_timeout_ms: u64,

    pub idle_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/gatekeeper.db".to_string(),
            max_connections: 25,
            min_connections: 1,
            acquire_timeout_seconds: 3,
            query_timeout_ms: 3000,
            idle_timeout_seconds: 15 * 60,
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    /// Requests running longer than this are cancelled.
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 19456 = 19MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 19 * 1024,
            argon2_time_cost: 2,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub activation_ttl_hours: i64,

    pub authentication_ttl_hours: i64,

    pub password_reset_ttl_minutes: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            activation_ttl_hours: 3 * 24,
            authentication_ttl_hours: 24,
            password_reset_ttl_minutes: 45,
        }
    }
}

impl TokenConfig {
    #[must_use]
    pub fn activation_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.activation_ttl_hours)
    }

    #[must_use]
    pub fn authentication_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.authentication_ttl_hours)
    }

    #[must_use]
    pub fn password_reset_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.password_reset_ttl_minutes)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailerConfig {
    pub sender: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            sender: "Gatekeeper <no-reply@gatekeeper.local>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionConfig {
    /// Codes granted to every newly registered user.
    pub default_codes: Vec<String>,
}

impl Default for PermissionConfig {
    fn default() -> Self {
        Self {
            default_codes: vec!["movies:read".to_string()],
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
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

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV)
            && !url.is_empty()
        {
            self.database.url = url;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("gatekeeper").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".gatekeeper").join("config.toml"));
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
        if self.database.url.is_empty() {
            anyhow::bail!("database.url cannot be empty");
        }

        if self.database.max_connections == 0
            || self.database.min_connections > self.database.max_connections
        {
            anyhow::bail!("database pool size must satisfy 0 < min_connections <= max_connections");
        }

        if self.database.query_timeout_ms == 0 || self.database.acquire_timeout_seconds == 0 {
            anyhow::bail!("database timeouts must be > 0");
        }

        if self.server.request_timeout_seconds == 0 {
            anyhow::bail!("server.request_timeout_seconds must be > 0");
        }

        if self.tokens.activation_ttl_hours <= 0
            || self.tokens.authentication_ttl_hours <= 0
            || self.tokens.password_reset_ttl_minutes <= 0
        {
            anyhow::bail!("token lifetimes must be > 0");
        }

        argon2::Params::new(
            self.security.argon2_memory_cost_kib,
            self.security.argon2_time_cost,
            self.security.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.query_timeout_ms, 3000);
        assert_eq!(config.tokens.activation_ttl(), chrono::Duration::days(3));
        assert_eq!(config.tokens.password_reset_ttl(), chrono::Duration::minutes(45));
        assert_eq!(config.permissions.default_codes, vec!["movies:read"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[tokens]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [tokens]
            authentication_ttl_hours = 2
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.tokens.authentication_ttl(), chrono::Duration::hours(2));

        assert_eq!(config.tokens.activation_ttl_hours, 72);
        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.database.query_timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tokens.password_reset_ttl_minutes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.security.argon2_time_cost = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.database.min_connections = 30;
        assert!(config.validate().is_err());
    }
}
