//! Configuration loading and representation.
//!
//! Settings come from `ROLEGATE_*` environment variables. Anything unset
//! falls back to a development default; anything set but unparsable is an
//! error.

use core::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use rolegate_observability::{LogFormat, LogSettings};

pub const JWT_SECRET: &str = "ROLEGATE_JWT_SECRET";
pub const TOKEN_TTL_DAYS: &str = "ROLEGATE_TOKEN_TTL_DAYS";
pub const MISSING_UPDATE_TARGET: &str = "ROLEGATE_MISSING_UPDATE_TARGET";
pub const LOG_LEVEL: &str = "ROLEGATE_LOG_LEVEL";
pub const LOG_FORMAT: &str = "ROLEGATE_LOG_FORMAT";

const DEV_SECRET: &str = "dev-secret";
const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;
/// Upper bound on token lifetime. Keeps `issued_at + ttl` well inside chrono's range.
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// What an update against a missing account reports.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingUpdateTarget {
    /// Same three-way outcome as read and delete.
    #[default]
    NotFound,
    /// Indistinguishable from a denial.
    Forbidden,
}

impl FromStr for MissingUpdateTarget {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "not_found" | "notfound" => Ok(MissingUpdateTarget::NotFound),
            "forbidden" => Ok(MissingUpdateTarget::Forbidden),
            _ => Err(()),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub missing_update_target: MissingUpdateTarget,
    pub log: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_SECRET.to_string(),
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
            missing_update_target: MissingUpdateTarget::default(),
            log: LogSettings::default(),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_days", &self.token_ttl_days)
            .field("missing_update_target", &self.missing_update_target)
            .field("log", &self.log)
            .finish()
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (tests, config files).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        match lookup(JWT_SECRET) {
            Some(secret) if !secret.is_empty() => settings.jwt_secret = secret,
            _ => tracing::warn!("{JWT_SECRET} not set; using insecure dev default"),
        }

        if let Some(raw) = lookup(TOKEN_TTL_DAYS) {
            settings.token_ttl_days = raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| (1..=MAX_TOKEN_TTL_DAYS).contains(days))
                .ok_or_else(|| invalid(TOKEN_TTL_DAYS, &raw))?;
        }

        if let Some(raw) = lookup(MISSING_UPDATE_TARGET) {
            settings.missing_update_target = raw
                .parse()
                .map_err(|_| invalid(MISSING_UPDATE_TARGET, &raw))?;
        }

        if let Some(level) = lookup(LOG_LEVEL) {
            settings.log.level = level;
        }

        if let Some(raw) = lookup(LOG_FORMAT) {
            settings.log.format = raw
                .parse::<LogFormat>()
                .map_err(|_| invalid(LOG_FORMAT, &raw))?;
        }

        Ok(settings)
    }

    /// Token lifetime, clamped to `1..=MAX_TOKEN_TTL_DAYS` days.
    pub fn token_ttl(&self) -> Duration {
        Duration::days(self.token_ttl_days.clamp(1, MAX_TOKEN_TTL_DAYS))
    }
}

fn invalid(key: &'static str, value: &str) -> SettingsError {
    SettingsError::Invalid {
        key,
        value: value.to_string(),
    }
}
