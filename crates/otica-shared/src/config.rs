//! Configuration management

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_ACCESS_TOKEN_EXPIRY, DEFAULT_ADMIN_ROLE, DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE,
    DEFAULT_REFRESH_TOKEN_EXPIRY,
};
use crate::error::AppError;

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub auth: AuthSettings,
    pub http: HttpSettings,
    pub log: LogSettings,
    #[serde(default)]
    pub bootstrap: BootstrapSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub issuer: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthSettings {
    pub admin_role: String,
    pub login_attempts_per_minute: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpSettings {
    /// Empty list means any origin.
    pub allowed_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Echo raw database errors in 500 responses.
    pub expose_internal_errors: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

/// First administrator, created on startup when the users table is empty.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BootstrapSettings {
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("OTICA")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("http.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;
        let config: AppConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "otica-server")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.acquire_timeout_secs", 3)?
            .set_default("database.run_migrations", true)?
            .set_default("jwt.issuer", "otica-pos")?
            .set_default("jwt.access_token_expiry", DEFAULT_ACCESS_TOKEN_EXPIRY)?
            .set_default("jwt.refresh_token_expiry", DEFAULT_REFRESH_TOKEN_EXPIRY)?
            .set_default("auth.admin_role", DEFAULT_ADMIN_ROLE)?
            .set_default("auth.login_attempts_per_minute", DEFAULT_LOGIN_ATTEMPTS_PER_MINUTE)?
            .set_default("http.allowed_origins", Vec::<String>::new())?
            .set_default("http.request_timeout_secs", 30)?
            .set_default("http.expose_internal_errors", true)?
            .set_default("log.filter", "info,otica=debug,tower_http=info")?
            .set_default("log.format", "json")
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AppError::InternalError(format!(
                "jwt.secret must be at least {} bytes",
                MIN_JWT_SECRET_LENGTH
            )));
        }
        if self.jwt.access_token_expiry <= 0 || self.jwt.refresh_token_expiry <= 0 {
            return Err(AppError::InternalError("token expiries must be positive".into()));
        }
        if self.auth.login_attempts_per_minute == 0 {
            return Err(AppError::InternalError(
                "auth.login_attempts_per_minute must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}
