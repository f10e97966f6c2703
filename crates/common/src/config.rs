//! Application configuration.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Mail configuration.
    #[serde(default)]
    pub mail: MailConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Base URL of the web frontend (used to build activation links).
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
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
    /// Public URL of the API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Deployment environment (`development`, `staging`, `production`).
    #[serde(default = "default_env")]
    pub env: String,
    /// Upper bound on a whole HTTP request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
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
    /// Idle connection lifetime, in seconds.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Bound on every store operation, in seconds.
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

/// Which transport delivers notification mail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    /// `SendGrid` HTTP API.
    Sendgrid,
    /// Plain SMTP relay.
    Smtp,
    /// Log messages instead of sending them.
    #[default]
    Log,
}

/// Mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Transport to use.
    #[serde(default)]
    pub provider: MailProvider,
    /// Sender address.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// API key (`SendGrid`).
    #[serde(default)]
    pub api_key: Option<String>,
    /// SMTP relay host.
    #[serde(default)]
    pub smtp_host: Option<String>,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: Option<String>,
    /// How long an invitation token stays valid, in hours.
    #[serde(default = "default_invitation_expiry_hours")]
    pub invitation_expiry_hours: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            provider: MailProvider::default(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            api_key: None,
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            invitation_expiry_hours: default_invitation_expiry_hours(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8080
}

fn default_api_url() -> String {
    "localhost:8080".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    60
}

const fn default_max_connections() -> u32 {
    30
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_idle_timeout_secs() -> u64 {
    900
}

const fn default_query_timeout_secs() -> u64 {
    5
}

fn default_from_email() -> String {
    "hello@social.local".to_string()
}

fn default_from_name() -> String {
    "Social".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

const fn default_invitation_expiry_hours() -> u64 {
    72
}

fn default_frontend_url() -> String {
    "http://localhost:5173".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present, into the process environment)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `SOCIAL_ENV`)
    /// 4. Environment variables with `SOCIAL_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let env = std::env::var("SOCIAL_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("SOCIAL")
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
                config::Environment::with_prefix("SOCIAL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Whether this deployment sends real mail.
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.server.env == "production"
    }
}

impl DatabaseConfig {
    /// Bound applied to each store operation.
    #[must_use]
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

impl MailConfig {
    /// Validity window of a freshly issued invitation.
    #[must_use]
    pub const fn invitation_expiry(&self) -> Duration {
        Duration::from_secs(self.invitation_expiry_hours * 3600)
    }
}
