use crate::core::{AppError, Result};
use std::env;
use std::str::FromStr;

pub mod database;
pub mod server;

pub use database::{run_migrations, DatabaseConfig};
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub gateways: GatewayConfig,
    pub security: SecurityConfig,
    pub capacity: CapacityConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(AppError::Configuration(format!("Invalid LOG_FORMAT: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    MySql,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(StoreBackend::MySql),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(AppError::Configuration(format!("Invalid STORE_BACKEND: {}", s))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Present when the backend is MySQL
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub mercadopago_webhook_secret: String,
    pub mercadopago_signature_tolerance_secs: u64,
    pub webpay_webhook_secret: String,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// `(admin id, argon2 hash)` pairs
    pub admin_api_keys: Vec<(String, String)>,
    pub admin_allowed_origin: Option<String>,
    pub webhook_rate_limit_per_minute: u32,
}

#[derive(Debug, Clone)]
pub struct CapacityConfig {
    pub revalidate_url: Option<String>,
    pub revalidate_token: Option<String>,
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T, name: &str) -> Result<T> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", name))),
        None => Ok(default),
    }
}

/// Parse `ADMIN_API_KEYS`: `id:hash` entries separated by `;`
pub fn parse_admin_keys(raw: &str) -> Result<Vec<(String, String)>> {
    raw.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (id, hash) = entry.split_once(':').ok_or_else(|| {
                AppError::Configuration(
                    "ADMIN_API_KEYS entries must look like <id>:<argon2 hash>".to_string(),
                )
            })?;
            let (id, hash) = (id.trim(), hash.trim());
            if id.is_empty() || hash.is_empty() {
                return Err(AppError::Configuration(
                    "ADMIN_API_KEYS entry has an empty id or hash".to_string(),
                ));
            }
            Ok((id.to_string(), hash.to_string()))
        })
        .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Load configuration from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = parse_or(lookup("STORE_BACKEND"), StoreBackend::MySql, "STORE_BACKEND")?;
        let database = match backend {
            StoreBackend::MySql => Some(DatabaseConfig::from_lookup(&lookup)?),
            StoreBackend::Memory => None,
        };

        let config = Config {
            app: AppConfig {
                env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
                log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                log_format: parse_or(lookup("LOG_FORMAT"), LogFormat::Pretty, "LOG_FORMAT")?,
            },
            server: ServerConfig::from_lookup(&lookup)?,
            store: StoreConfig { backend, database },
            gateways: GatewayConfig {
                mercadopago_webhook_secret: lookup("MERCADOPAGO_WEBHOOK_SECRET").ok_or_else(
                    || AppError::Configuration("MERCADOPAGO_WEBHOOK_SECRET not set".to_string()),
                )?,
                mercadopago_signature_tolerance_secs: parse_or(
                    lookup("MERCADOPAGO_SIGNATURE_TOLERANCE_SECS"),
                    300,
                    "MERCADOPAGO_SIGNATURE_TOLERANCE_SECS",
                )?,
                webpay_webhook_secret: lookup("WEBPAY_WEBHOOK_SECRET").ok_or_else(|| {
                    AppError::Configuration("WEBPAY_WEBHOOK_SECRET not set".to_string())
                })?,
            },
            security: SecurityConfig {
                admin_api_keys: parse_admin_keys(&lookup("ADMIN_API_KEYS").unwrap_or_default())?,
                admin_allowed_origin: lookup("ADMIN_ALLOWED_ORIGIN"),
                webhook_rate_limit_per_minute: parse_or(
                    lookup("WEBHOOK_RATE_LIMIT_PER_MINUTE"),
                    600,
                    "WEBHOOK_RATE_LIMIT_PER_MINUTE",
                )?,
            },
            capacity: CapacityConfig {
                revalidate_url: lookup("CAPACITY_REVALIDATE_URL"),
                revalidate_token: lookup("CAPACITY_REVALIDATE_TOKEN"),
            },
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.gateways.mercadopago_webhook_secret.trim().is_empty()
            || self.gateways.webpay_webhook_secret.trim().is_empty()
        {
            return Err(AppError::Configuration(
                "Webhook secrets must not be blank".to_string(),
            ));
        }

        if self.gateways.mercadopago_signature_tolerance_secs == 0 {
            return Err(AppError::Configuration(
                "Signature tolerance must be greater than 0".to_string(),
            ));
        }

        if self.security.webhook_rate_limit_per_minute == 0 {
            return Err(AppError::Configuration(
                "Rate limit must be greater than 0".to_string(),
            ));
        }

        if self.store.backend == StoreBackend::MySql && self.store.database.is_none() {
            return Err(AppError::Configuration(
                "MySQL backend requires DATABASE_URL".to_string(),
            ));
        }

        if let Some(url) = &self.capacity.revalidate_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AppError::Configuration(
                    "CAPACITY_REVALIDATE_URL must be an http(s) URL".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}
