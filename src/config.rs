// src/config.rs

use std::env;

use dotenvy::dotenv;
use thiserror::Error;

/// Questions served from cache at most this many times before fresh generation.
pub const QUESTION_REUSE_CAP: i32 = 3;

/// Number of recent answers considered by the difficulty adjuster.
pub const DIFFICULTY_WINDOW: usize = 10;

/// Below this many answers the requested difficulty is kept.
pub const DIFFICULTY_MIN_SAMPLES: usize = 3;

/// Points available per question; session percentages divide by this times the count.
pub const MAX_POINTS_PER_QUESTION: i64 = 10;

/// Number of history entries shown on the dashboard.
pub const DASHBOARD_HISTORY_LIMIT: i64 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Required environment variable '{0}' is not set")]
    Missing(&'static str),

    #[error("Environment variable '{key}' is invalid: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Outgoing mail relay for OTP emails.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender mailbox, e.g. `InterviewAI <noreply@example.com>`.
    pub from: String,
}

impl SmtpConfig {
    /// `None` when `SMTP_HOST` is unset; the other variables are then required.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(host) = optional("SMTP_HOST") else {
            return Ok(None);
        };
        let username = require("SMTP_USERNAME")?;
        Ok(Some(Self {
            host,
            port: parse_or("SMTP_PORT", 587)?,
            password: require("SMTP_PASSWORD")?,
            from: optional("SMTP_FROM").unwrap_or_else(|| username.clone()),
            username,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. When absent the in-process store is used.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub llm_timeout_secs: u64,
    /// Redis connection string for OTP state. When absent OTPs live in-process.
    pub redis_url: Option<String>,
    pub otp_ttl_secs: u64,
    /// OTP emails are only logged as undelivered when absent.
    pub smtp: Option<SmtpConfig>,
    pub cors_origins: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let jwt_secret = require("JWT_SECRET")?;
        let gemini_api_key = require("GEMINI_API_KEY")?;

        let cors_origins = optional("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url: optional("DATABASE_URL"),
            jwt_secret,
            jwt_expiration: parse_or("JWT_EXPIRATION", 3600)?,
            gemini_api_key,
            gemini_model: optional("GEMINI_MODEL")
                .unwrap_or_else(|| "gemini-2.5-flash-lite".to_string()),
            llm_timeout_secs: parse_or("LLM_TIMEOUT_SECS", 60)?,
            redis_url: optional("REDIS_URL"),
            otp_ttl_secs: parse_or("OTP_TTL_SECS", 300)?,
            smtp: SmtpConfig::from_env()?,
            cors_origins,
            port: parse_or("PORT", 8000)?,
            rust_log: optional("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}
