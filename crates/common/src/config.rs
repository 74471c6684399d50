//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration (job queue backing).
    pub redis: RedisConfig,
    /// JWT signing configuration.
    pub jwt: JwtConfig,
    /// Bootstrap admin account seeded on first start.
    pub bootstrap: BootstrapConfig,
    /// Push notification (FCM) configuration.
    #[serde(default)]
    pub fcm: FcmConfig,
    /// SMTP mail configuration.
    #[serde(default)]
    pub smtp: SmtpConfig,
    /// Object storage configuration (profile images).
    #[serde(default)]
    pub storage: StorageSettings,
    /// Background scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
}

/// JWT signing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret for access tokens.
    pub access_secret: String,
    /// Secret for refresh tokens.
    pub refresh_secret: String,
    /// Access token lifetime in minutes.
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: i64,
    /// Refresh token lifetime in days.
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: i64,
}

/// Bootstrap admin account configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// Admin username.
    pub admin_username: String,
    /// Admin password (hashed at seed time).
    pub admin_password: String,
    /// Admin first name.
    #[serde(default = "default_admin_name")]
    pub admin_first_name: String,
    /// Admin last name.
    #[serde(default = "default_admin_name")]
    pub admin_last_name: String,
}

/// FCM push configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FcmConfig {
    /// FCM server key. Push dispatch is disabled when absent.
    #[serde(default)]
    pub server_key: Option<String>,
    /// FCM send endpoint override (tests point this at a local server).
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// SMTP mail configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmtpConfig {
    /// SMTP relay host. Mail delivery is disabled when absent.
    #[serde(default)]
    pub host: Option<String>,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub password: Option<String>,
    /// From address for outgoing mail.
    #[serde(default)]
    pub from: Option<String>,
}

/// Object storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend kind: "local" or "s3".
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    /// Base path for local storage.
    #[serde(default = "default_storage_path")]
    pub base_path: String,
    /// Base URL for serving locally stored files.
    #[serde(default = "default_storage_url")]
    pub base_url: String,
    /// S3 endpoint URL.
    #[serde(default)]
    pub s3_endpoint: Option<String>,
    /// S3 bucket name.
    #[serde(default)]
    pub s3_bucket: Option<String>,
    /// S3 region.
    #[serde(default)]
    pub s3_region: Option<String>,
    /// S3 access key ID.
    #[serde(default)]
    pub s3_access_key_id: Option<String>,
    /// S3 secret access key.
    #[serde(default)]
    pub s3_secret_access_key: Option<String>,
    /// Public URL prefix for S3-served files.
    #[serde(default)]
    pub s3_public_url: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            base_path: default_storage_path(),
            base_url: default_storage_url(),
            s3_endpoint: None,
            s3_bucket: None,
            s3_region: None,
            s3_access_key_id: None,
            s3_secret_access_key: None,
            s3_public_url: None,
        }
    }
}

/// Background scheduler settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// Interval between reminder sweeps, in seconds.
    #[serde(default = "default_reminder_interval_secs")]
    pub reminder_interval_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            reminder_interval_secs: default_reminder_interval_secs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_access_ttl_minutes() -> i64 {
    15
}

const fn default_refresh_ttl_days() -> i64 {
    30
}

fn default_admin_name() -> String {
    "Admin".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_storage_backend() -> String {
    "local".to_string()
}

fn default_storage_path() -> String {
    "./files".to_string()
}

fn default_storage_url() -> String {
    "/files".to_string()
}

const fn default_reminder_interval_secs() -> u64 {
    3600
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `ATTENDA_ENV`)
    /// 3. Environment variables with `ATTENDA_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("ATTENDA_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ATTENDA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("ATTENDA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_settings_default() {
        let settings = StorageSettings::default();
        assert_eq!(settings.backend, "local");
        assert_eq!(settings.base_url, "/files");
        assert!(settings.s3_bucket.is_none());
    }

    #[test]
    fn test_scheduler_settings_default() {
        let settings = SchedulerSettings::default();
        assert_eq!(settings.reminder_interval_secs, 3600);
    }
}
