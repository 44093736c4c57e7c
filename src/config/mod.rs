use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid URL in {name}: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub mail: MailConfig,
    pub identity: IdentityConfig,
    pub image_host: ImageHostConfig,
    pub accounts: AccountConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL. `None` selects the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
    /// Upper bound for every store round trip and every bounded external call.
    pub operation_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub expiry_days: i64,
    pub cookie_domain: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub per_second: f64,
    pub burst: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Relay endpoint. Without one, outgoing mail is only logged.
    pub api_url: Option<String>,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub google_client_id: String,
    pub token_info_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageHostConfig {
    pub upload_url: String,
    #[serde(skip_serializing)]
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Display name reserved for the site administrator.
    pub admin_name: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        override_parsed("PORT", &mut self.server.port);
        override_parsed("MAX_UPLOAD_BYTES", &mut self.server.max_upload_bytes);

        if let Some(v) = non_empty_var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        override_parsed("DATABASE_MAX_CONNECTIONS", &mut self.database.max_connections);
        override_parsed("STORE_TIMEOUT_SECS", &mut self.database.operation_timeout_secs);

        if let Some(v) = non_empty_var("JWT_SECRET") {
            self.session.jwt_secret = v;
        }
        override_parsed("JWT_EXPIRY_DAYS", &mut self.session.expiry_days);
        if let Some(v) = non_empty_var("COOKIE_DOMAIN") {
            self.session.cookie_domain = Some(v);
        }

        override_parsed("RATE_LIMIT_PER_SEC", &mut self.rate_limit.per_second);
        override_parsed("RATE_LIMIT_BURST", &mut self.rate_limit.burst);

        if let Some(v) = non_empty_var("FRONTEND_ORIGINS") {
            self.cors.allowed_origins = split_origins(&v);
        }

        if let Some(v) = non_empty_var("MAIL_API_URL") {
            self.mail.api_url = Some(v);
        }
        if let Some(v) = non_empty_var("MAIL_USERNAME") {
            self.mail.username = v;
        }
        if let Some(v) = non_empty_var("MAIL_PASSWORD") {
            self.mail.password = v;
        }

        if let Some(v) = non_empty_var("GOOGLE_CLIENT_ID") {
            self.identity.google_client_id = v;
        }
        if let Some(v) = non_empty_var("IMAGE_HOST_URL") {
            self.image_host.upload_url = v;
        }
        if let Some(v) = non_empty_var("IMAGE_HOST_TOKEN") {
            self.image_host.access_token = v;
        }
        if let Some(v) = non_empty_var("ADMIN_NAME") {
            self.accounts.admin_name = v;
        }

        self
    }

    /// Checks the settings that have no safe default outside development.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        if let Some(url) = &self.mail.api_url {
            Url::parse(url).map_err(|source| ConfigError::InvalidUrl { name: "MAIL_API_URL", source })?;
        }
        Url::parse(&self.image_host.upload_url)
            .map_err(|source| ConfigError::InvalidUrl { name: "IMAGE_HOST_URL", source })?;
        Url::parse(&self.identity.token_info_url)
            .map_err(|source| ConfigError::InvalidUrl { name: "GOOGLE_TOKEN_INFO_URL", source })?;
        if self.environment != Environment::Development && self.session.jwt_secret.len() < 32 {
            tracing::warn!("JWT_SECRET is shorter than 32 bytes");
        }
        Ok(())
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.database.operation_timeout_secs)
    }

    /// Origin used when building links that point back at the web client.
    pub fn frontend_origin(&self) -> &str {
        self.cors
            .allowed_origins
            .first()
            .map(String::as_str)
            .unwrap_or("http://localhost:5173")
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 5000,
                max_upload_bytes: 10 << 20,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                operation_timeout_secs: 10,
            },
            session: SessionConfig {
                jwt_secret: "development-only-secret-change-me".to_string(),
                expiry_days: 7,
                cookie_domain: None,
            },
            rate_limit: RateLimitConfig {
                per_second: 35.0,
                burst: 40.0,
            },
            cors: CorsConfig {
                allowed_origins: vec!["http://localhost:5173".to_string()],
            },
            mail: MailConfig {
                api_url: None,
                username: String::new(),
                password: String::new(),
            },
            identity: IdentityConfig {
                google_client_id: String::new(),
                token_info_url: "https://oauth2.googleapis.com/tokeninfo".to_string(),
            },
            image_host: ImageHostConfig {
                upload_url: "https://api.imgur.com/3/image".to_string(),
                access_token: String::new(),
            },
            accounts: AccountConfig {
                admin_name: "admin".to_string(),
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.session.jwt_secret = String::new();
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.session.jwt_secret = String::new();
        config.cors.allowed_origins = Vec::new();
        config
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn override_parsed<T: FromStr + std::fmt::Debug>(name: &str, slot: &mut T) {
    let Some(raw) = non_empty_var(name) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *slot = value,
        Err(_) => tracing::warn!(variable = name, value = %raw, current = ?slot, "ignoring unparsable override"),
    }
}

/// Origins are space delimited, matching how the web client deploys them.
pub fn split_origins(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.rate_limit.per_second, 35.0);
        assert_eq!(config.rate_limit.burst, 40.0);
        assert_eq!(config.session.expiry_days, 7);
        assert_eq!(config.operation_timeout(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_requires_secret() {
        let config = AppConfig::production();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn test_split_origins_on_whitespace() {
        let origins = split_origins("http://a.test  https://b.test");
        assert_eq!(origins, vec!["http://a.test", "https://b.test"]);
    }

    #[test]
    fn test_frontend_origin_falls_back() {
        let mut config = AppConfig::development();
        config.cors.allowed_origins.clear();
        assert_eq!(config.frontend_origin(), "http://localhost:5173");
    }
}
