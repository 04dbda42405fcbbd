//! Configuration management for the account service
//!
//! Loads settings from environment variables, with a `.env` file picked up in
//! debug builds. Every token class carries its own signing secret and TTL so
//! that a token minted for one flow can never satisfy another.

use crate::token::TokenClass;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub redis: RedisSettings,
    pub kafka: KafkaSettings,
    pub server: ServerSettings,
    pub email: EmailSettings,
    pub tokens: TokenSettings,
}

impl Settings {
    /// Load settings from environment variables (and `.env` in development).
    pub fn load() -> Result<Self> {
        if cfg!(debug_assertions) {
            dotenvy::dotenv().ok();
            info!("Loaded .env file for development");
        }

        Ok(Settings {
            database: DatabaseSettings::from_env()?,
            redis: RedisSettings::from_env()?,
            kafka: KafkaSettings::from_env(),
            server: ServerSettings::from_env()?,
            email: EmailSettings::from_env()?,
            tokens: TokenSettings::from_env()?,
        })
    }
}

/// Database connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,
        })
    }
}

/// Redis token cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSettings {
    pub url: String,
}

impl RedisSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            url: env::var("REDIS_URL").context("REDIS_URL must be set")?,
        })
    }
}

/// Kafka task dispatch settings
///
/// Brokers are optional; without them the deletion cascade runs in log-only
/// mode (development).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaSettings {
    pub brokers: Vec<String>,
    pub task_topic: String,
}

impl KafkaSettings {
    fn from_env() -> Self {
        let brokers = env::var("KAFKA_BROKERS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            brokers,
            task_topic: env::var("KAFKA_TASK_TOPIC")
                .unwrap_or_else(|_| "account.tasks".to_string()),
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Externally visible base URL used when building confirmation links.
    pub public_base_url: String,
}

impl ServerSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("Invalid SERVER_PORT")?,
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
        })
    }
}

/// Email (SMTP) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub use_starttls: bool,
}

impl EmailSettings {
    fn from_env() -> Result<Self> {
        Ok(Self {
            smtp_host: env::var("SMTP_HOST").unwrap_or_default(),
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "1025".to_string())
                .parse()
                .context("Invalid SMTP_PORT")?,
            smtp_username: env::var("SMTP_USERNAME").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "noreply@corelink.dev".to_string()),
            use_starttls: env::var("SMTP_USE_STARTTLS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        })
    }
}

/// Per-class signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassConfig {
    pub secret: String,
    pub ttl_secs: u64,
}

/// Token signing settings
///
/// The project name doubles as both issuer and audience claim on every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    pub project_name: String,
    pub activation: ClassConfig,
    pub access: ClassConfig,
    pub refresh: ClassConfig,
    pub deactivation: ClassConfig,
    pub deletion: ClassConfig,
    pub reset_password: ClassConfig,
    pub update_username: ClassConfig,
    pub update_email: ClassConfig,
}

impl TokenSettings {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "corelink".to_string()),
            activation: class_from_env("ACTIVATION", 1800)?,
            access: class_from_env("ACCESS", 3600)?,
            refresh: class_from_env("REFRESH", 86_400)?,
            deactivation: class_from_env("DEACTIVATION", 86_400)?,
            deletion: class_from_env("DELETION", 86_400)?,
            reset_password: class_from_env("RESET_PASSWORD", 86_400)?,
            update_username: class_from_env("UPDATE_USERNAME", 86_400)?,
            update_email: class_from_env("UPDATE_EMAIL", 86_400)?,
        })
    }

    /// Signing configuration for a token class.
    pub fn class(&self, class: TokenClass) -> &ClassConfig {
        match class {
            TokenClass::Activation => &self.activation,
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
            TokenClass::Deactivation => &self.deactivation,
            TokenClass::Deletion => &self.deletion,
            TokenClass::ResetPassword => &self.reset_password,
            TokenClass::UpdateUsername => &self.update_username,
            TokenClass::UpdateEmail => &self.update_email,
        }
    }
}

fn class_from_env(prefix: &str, default_ttl: u64) -> Result<ClassConfig> {
    let secret_var = format!("{}_TOKEN_SECRET", prefix);
    let ttl_var = format!("{}_TOKEN_TTL_SECS", prefix);

    Ok(ClassConfig {
        secret: env::var(&secret_var).with_context(|| format!("{} must be set", secret_var))?,
        ttl_secs: env::var(&ttl_var)
            .unwrap_or_else(|_| default_ttl.to_string())
            .parse()
            .with_context(|| format!("Invalid {}", ttl_var))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_token_settings_from_env() {
        for prefix in [
            "ACTIVATION",
            "ACCESS",
            "REFRESH",
            "DEACTIVATION",
            "DELETION",
            "RESET_PASSWORD",
            "UPDATE_USERNAME",
            "UPDATE_EMAIL",
        ] {
            env::set_var(format!("{}_TOKEN_SECRET", prefix), format!("{}-secret", prefix));
        }
        env::set_var("ACCESS_TOKEN_TTL_SECS", "7200");

        let settings = TokenSettings::from_env().unwrap();

        assert_eq!(settings.project_name, "corelink");
        assert_eq!(settings.class(TokenClass::Access).ttl_secs, 7200);
        assert_eq!(settings.class(TokenClass::Activation).ttl_secs, 1800);
        assert_eq!(
            settings.class(TokenClass::Refresh).secret,
            "REFRESH-secret"
        );

        for prefix in [
            "ACTIVATION",
            "ACCESS",
            "REFRESH",
            "DEACTIVATION",
            "DELETION",
            "RESET_PASSWORD",
            "UPDATE_USERNAME",
            "UPDATE_EMAIL",
        ] {
            env::remove_var(format!("{}_TOKEN_SECRET", prefix));
        }
        env::remove_var("ACCESS_TOKEN_TTL_SECS");
    }

    #[test]
    #[serial]
    fn test_missing_secret_is_an_error() {
        env::remove_var("ACTIVATION_TOKEN_SECRET");
        assert!(class_from_env("ACTIVATION", 1800).is_err());
    }

    #[test]
    #[serial]
    fn test_server_settings_defaults() {
        env::remove_var("SERVER_HOST");
        env::remove_var("SERVER_PORT");
        env::remove_var("PUBLIC_BASE_URL");

        let settings = ServerSettings::from_env().unwrap();

        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.public_base_url, "http://localhost:8000");
    }
}
