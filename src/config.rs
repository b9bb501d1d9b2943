use std::env;
use std::str::FromStr;

use chrono::NaiveTime;
use dotenvy::dotenv;
use thiserror::Error;

use crate::ledger::LedgerRules;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Attendance rules
    pub late_after: NaiveTime,
    pub standard_hours: f64,

    // Logging
    pub log_dir: String,
    pub log_level: String,
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<String, ConfigError> {
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let late_after = match lookup("LATE_AFTER") {
            None => NaiveTime::from_hms_opt(8, 15, 0).unwrap_or(NaiveTime::MIN),
            Some(value) => NaiveTime::parse_from_str(value.trim(), "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(value.trim(), "%H:%M"))
                .map_err(|_| ConfigError::Invalid {
                    name: "LATE_AFTER",
                    value,
                })?,
        };

        // must be positive and finite
        let standard_hours: f64 = parsed(&lookup, "STANDARD_HOURS", 8.0)?;
        if !standard_hours.is_finite() || standard_hours <= 0.0 {
            return Err(ConfigError::Invalid {
                name: "STANDARD_HOURS",
                value: lookup("STANDARD_HOURS").unwrap_or_default(),
            });
        }

        Ok(Self {
            server_addr: required(&lookup, "SERVER_ADDR")?,
            database_url: required(&lookup, "DATABASE_URL")?,
            jwt_secret: required(&lookup, "JWT_SECRET")?,
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            access_token_ttl: parsed(&lookup, "ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parsed(&lookup, "REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: parsed(&lookup, "RATE_LOGIN_PER_MIN", 60)?,
            rate_refresh_per_min: parsed(&lookup, "RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parsed(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),

            late_after,
            standard_hours,

            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn ledger_rules(&self) -> LedgerRules {
        LedgerRules {
            late_after: self.late_after,
            standard_hours: self.standard_hours,
        }
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self::from_lookup(|name| match name {
            "SERVER_ADDR" => Some("127.0.0.1:0".into()),
            "DATABASE_URL" => Some("mysql://localhost/test".into()),
            "JWT_SECRET" => Some("test-secret".into()),
            _ => None,
        })
        .unwrap()
    }
}
