use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of a session token, in days.
    pub token_ttl_days: i64,
    /// Mark the session cookie `Secure` (HTTPS only).
    pub secure_cookie: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedConfig {
    /// Insert the demo users, workshops and gateway transactions on startup.
    pub demo_data: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentsConfig {
    /// Shared secret expected in `X-Webhook-Secret`. Unset disables the check.
    pub webhook_secret: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub max_bytes: usize,
    pub public_prefix: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub seed: SeedConfig,
    pub payments: PaymentsConfig,
    pub upload: UploadConfig,
    pub log: LogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?.build()?.try_deserialize()
    }

    /// Defaults for every key, without file or environment sources.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::with_defaults(Config::builder())?
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Ok(Self::with_defaults(Config::builder())?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., WORKSHOPHUB__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("WORKSHOPHUB")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            ))
    }

    fn with_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", vec!["http://localhost:5173"])?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite::memory:")?
            .set_default("auth.jwt_secret", "change-me-in-production")?
            .set_default("auth.token_ttl_days", 7)?
            .set_default("auth.secure_cookie", false)?
            .set_default("seed.demo_data", true)?
            .set_default("upload.max_bytes", 5 * 1024 * 1024)?
            .set_default("upload.public_prefix", "/uploads/payments")?
            .set_default("log.level", "info")
    }
}
