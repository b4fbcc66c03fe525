//! Load settings from the process environment (call `dotenvy::dotenv()` first to pick up `.env`).

use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use std::env;
use std::str::FromStr;

impl RsvpConfig {
    /// Load `.env` (if present) into the process environment, then [`RsvpConfig::from_env`].
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "failed to read .env");
            }
        }
        Self::from_env()
    }

    /// Read every setting from env, falling back to defaults. Missing remote
    /// credentials are not an error here: they are logged and the caller decides
    /// between failing fast and the local fallback.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`RsvpConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match get("RSVP_BACKEND") {
            Some(v) => v.parse()?,
            None => StoreBackend::Rest,
        };
        let remote = RemoteSettings {
            url: get("SUPABASE_URL"),
            anon_key: get("SUPABASE_ANON_KEY"),
        };
        if backend == StoreBackend::Rest && !remote.is_complete() {
            tracing::warn!(
                url_set = remote.url.is_some(),
                key_set = remote.anon_key.is_some(),
                "SUPABASE_URL and SUPABASE_ANON_KEY must both be set; the remote guest store is unavailable"
            );
        }
        let database_url = get("DATABASE_URL");
        if backend == StoreBackend::Postgres && database_url.is_none() {
            tracing::warn!("DATABASE_URL not set; the postgres guest store is unavailable");
        }

        let tables = TableNames {
            guests: get("RSVP_GUESTS_TABLE").unwrap_or_else(|| DEFAULT_GUESTS_TABLE.into()),
            master: get("RSVP_MASTER_TABLE").unwrap_or_else(|| DEFAULT_MASTER_TABLE.into()),
        };

        let companion_policy = match get("RSVP_COMPANION_POLICY") {
            Some(v) => v.parse()?,
            None => CompanionPolicy::Fixed,
        };
        let default_companions = parse_or("RSVP_DEFAULT_COMPANIONS", get("RSVP_DEFAULT_COMPANIONS"), DEFAULT_COMPANIONS)?;
        let display_offset = parse_utc_offset(
            get("RSVP_DISPLAY_UTC_OFFSET").as_deref().unwrap_or(DEFAULT_UTC_OFFSET),
        )?;

        let config = RsvpConfig {
            backend,
            remote,
            database_url,
            tables,
            guests: GuestSettings {
                companion_policy,
                default_companions,
                display_offset,
            },
            bind_addr: get("RSVP_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into()),
            body_limit_bytes: parse_or("RSVP_BODY_LIMIT_BYTES", get("RSVP_BODY_LIMIT_BYTES"), DEFAULT_BODY_LIMIT_BYTES)?,
        };
        validate(&config)?;
        Ok(config)
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: format!("'{}': {}", v, e),
        }),
    }
}
