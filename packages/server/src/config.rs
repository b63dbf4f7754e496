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
    /// Lifetime of issued bearer tokens.
    pub token_ttl_hours: i64,
    /// Lifetime of registration / password-reset OTPs.
    pub otp_ttl_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory backing the public disk.
    pub public_dir: String,
    /// URL prefix the public disk is served under.
    pub public_url: String,
    /// Fallback video limit in bytes when the `max_video_size_mb` setting is absent.
    pub max_video_size: u64,
    /// Fallback image limit in bytes when the `max_image_size_mb` setting is absent.
    pub max_image_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    pub razorpay_api_base: String,
}

/// Optional first administrator created on startup.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BootstrapConfig {
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub payment: PaymentConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://casting.db?mode=rwc")?
            .set_default("auth.token_ttl_hours", 24 * 7)?
            .set_default("auth.otp_ttl_minutes", 10)?
            .set_default("storage.public_dir", "./storage/public")?
            .set_default("storage.public_url", "http://127.0.0.1:3000/storage")?
            .set_default("storage.max_video_size", 100 * 1024 * 1024)?
            .set_default("storage.max_image_size", 5 * 1024 * 1024)?
            .set_default("payment.razorpay_api_base", "https://api.razorpay.com/v1")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., CASTING__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("CASTING").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
