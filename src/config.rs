//! Configuration management for Lector Server

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session id
    pub cookie_name: String,
    /// Idle time after which a reading session is dropped
    pub ttl_minutes: i64,
    /// Interval of the expired-session sweep
    pub cleanup_interval_secs: u64,
    /// Upper bound on live sessions held in memory
    pub max_sessions: usize,
    /// Upper bound on the combined size of all loaded books
    pub max_total_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted request body
    pub max_bytes: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            session: SessionConfig::default(),
            upload: UploadConfig {
                max_bytes: 100 * 1024 * 1024,
            },
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            cookie_name: "lector_session".to_string(),
            ttl_minutes: 60,
            cleanup_interval_secs: 300,
            max_sessions: 64,
            max_total_bytes: 1024 * 1024 * 1024,
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.ttl_minutes)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.max(1))
    }
}

impl Config {
    /// Read configuration from the environment, using defaults for unset keys
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
            },
            session: SessionConfig {
                cookie_name: env::var("SESSION_COOKIE_NAME")
                    .unwrap_or(defaults.session.cookie_name),
                ttl_minutes: parse_var("SESSION_TTL_MINUTES", defaults.session.ttl_minutes)?,
                cleanup_interval_secs: parse_var(
                    "SESSION_CLEANUP_SECONDS",
                    defaults.session.cleanup_interval_secs,
                )?,
                max_sessions: parse_var("SESSION_MAX_SESSIONS", defaults.session.max_sessions)?,
                max_total_bytes: parse_var(
                    "SESSION_MAX_BYTES",
                    defaults.session.max_total_bytes,
                )?,
            },
            upload: UploadConfig {
                max_bytes: parse_var("UPLOAD_MAX_BYTES", defaults.upload.max_bytes)?,
            },
        })
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        Err(_) => Ok(default),
    }
}
