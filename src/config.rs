//! Application configuration
//!
//! Loaded from a TOML file, by default `~/.config/campus-transport/config.toml`.
//! Every section and field is optional; missing values fall back to the defaults below.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [security]
//! jwt_secret = "change-me"
//!
//! [smtp]
//! host = "smtp.campus.edu"
//! from_address = "transport@campus.edu"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::application::data_management::DataManagementConfig;
use crate::application::drivers::{DriverQrConfig, DEFAULT_QR_WIDTH};
use crate::application::identity::DAILY_SECS;
use crate::infrastructure::crypto::JwtConfig;
use crate::infrastructure::mail::SmtpMailerConfig;
use crate::infrastructure::DatabaseConfig;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "CAMPUS_CONFIG";

const APP_DIR: &str = "campus-transport";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// `$CAMPUS_CONFIG` if set, else `~/.config/campus-transport/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.toml")
}

fn data_dir() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSettings,
    pub security: SecurityConfig,
    pub admin: AdminConfig,
    pub app: PublicAppConfig,
    pub data_management: DataManagementSettings,
    pub smtp: Option<SmtpConfig>,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight work on shutdown.
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Full connection URL. Takes precedence over `path`.
    pub url: Option<String>,
    /// SQLite file path.
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            path: data_dir().join("campus_transport.db"),
        }
    }
}

impl DatabaseSettings {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}?mode=rwc", self.path.display()),
        }
    }

    pub fn to_database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.connection_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    /// Return the password reset token in the forgot-password response.
    /// Only for development without SMTP.
    pub expose_reset_token: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "campus-transport-dev-secret-change-me".to_string(),
            jwt_expiration_hours: 24,
            expose_reset_token: false,
        }
    }
}

impl SecurityConfig {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(self.jwt_secret.clone(), self.jwt_expiration_hours)
    }
}

/// Account created on first start when the user table is empty
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: "admin@campus.edu".to_string(),
            name: "Administrator".to_string(),
            password: "admin123".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicAppConfig {
    /// Frontend origin embedded in driver QR codes.
    pub base_url: String,
    pub qr_width: u32,
    pub student_expiry_check_secs: u64,
}

impl Default for PublicAppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            qr_width: DEFAULT_QR_WIDTH,
            student_expiry_check_secs: DAILY_SECS,
        }
    }
}

impl PublicAppConfig {
    pub fn qr_config(&self) -> DriverQrConfig {
        DriverQrConfig {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            width: self.qr_width,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataManagementSettings {
    pub backup_dir: PathBuf,
    /// Directories emptied by the clear-cache operation.
    pub cache_dirs: Vec<PathBuf>,
}

impl Default for DataManagementSettings {
    fn default() -> Self {
        let base = data_dir();
        Self {
            backup_dir: base.join("backups"),
            cache_dirs: vec![base.join("cache"), base.join("tmp")],
        }
    }
}

impl DataManagementSettings {
    pub fn service_config(&self) -> DataManagementConfig {
        DataManagementConfig {
            backup_dir: self.backup_dir.clone(),
            cache_dirs: self.cache_dirs.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub from_address: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

fn default_smtp_port() -> u16 {
    587
}

impl From<&SmtpConfig> for SmtpMailerConfig {
    fn from(c: &SmtpConfig) -> Self {
        SmtpMailerConfig {
            host: c.host.clone(),
            port: c.port,
            from_address: c.from_address.clone(),
            username: c.username.clone(),
            password: c.password.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("security.jwt_secret must not be empty".into()));
        }
        if self.security.jwt_expiration_hours <= 0 {
            return Err(ConfigError::Invalid(
                "security.jwt_expiration_hours must be positive".into(),
            ));
        }
        if self.app.qr_width == 0 {
            return Err(ConfigError::Invalid("app.qr_width must be positive".into()));
        }
        if self.app.student_expiry_check_secs == 0 {
            return Err(ConfigError::Invalid(
                "app.student_expiry_check_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.security.jwt_expiration_hours, 24);
        assert!(config.smtp.is_none());
        assert_eq!(config.logging.format, "text");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_override_fields() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 9090

            [database]
            url = "sqlite::memory:"

            [app]
            base_url = "https://transport.campus.edu/"

            [smtp]
            host = "smtp.campus.edu"
            from_address = "transport@campus.edu"

            [data_management]
            backup_dir = "/var/backups/transport"
            cache_dirs = ["/tmp/a"]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.connection_url(), "sqlite::memory:");
        assert_eq!(config.app.qr_config().base_url, "https://transport.campus.edu");
        assert_eq!(config.app.qr_config().width, DEFAULT_QR_WIDTH);
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(
            config.data_management.service_config().backup_dir,
            PathBuf::from("/var/backups/transport")
        );
        assert_eq!(config.data_management.cache_dirs.len(), 1);
    }

    #[test]
    fn sqlite_path_becomes_url() {
        let settings = DatabaseSettings {
            url: None,
            path: PathBuf::from("/data/transport.db"),
        };
        assert_eq!(
            settings.connection_url(),
            "sqlite:///data/transport.db?mode=rwc"
        );
    }

    #[test]
    fn blank_secret_is_rejected() {
        let mut config = AppConfig::default();
        config.security.jwt_secret = "  ".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug\"\nformat = \"json\"\n").unwrap();
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }
}
