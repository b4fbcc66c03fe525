//! Runtime settings for the guest store and the HTTP surface.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;

pub const DEFAULT_GUESTS_TABLE: &str = "wedding_guests";
pub const DEFAULT_MASTER_TABLE: &str = "invitados_maestro";
pub const DEFAULT_COMPANIONS: i32 = 2;
pub const DEFAULT_UTC_OFFSET: &str = "-06:00";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 16 * 1024;

/// Which store implementation backs the repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Managed backend over its PostgREST HTTP API (endpoint URL + public API key).
    Rest,
    /// Same tables reached directly through a Postgres connection pool.
    Postgres,
    /// Process-local tables; the fallback path.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rest" | "supabase" | "postgrest" => Ok(StoreBackend::Rest),
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "local" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::Invalid {
                key: "RSVP_BACKEND",
                reason: format!("unknown backend '{}' (expected rest, postgres or memory)", other),
            }),
        }
    }
}

/// How the companion allowance is chosen when a guest is inserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanionPolicy {
    /// 0 when declining, the configured default otherwise.
    Fixed,
    /// 0 when declining; left null on "yes" so the database trigger copies the
    /// master-list pass count.
    MasterTrigger,
}

impl FromStr for CompanionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" => Ok(CompanionPolicy::Fixed),
            "master_trigger" | "trigger" => Ok(CompanionPolicy::MasterTrigger),
            other => Err(ConfigError::Invalid {
                key: "RSVP_COMPANION_POLICY",
                reason: format!("unknown policy '{}' (expected fixed or master_trigger)", other),
            }),
        }
    }
}

/// Endpoint and credentials of the managed backend. Both are required.
#[derive(Clone, Debug, Default)]
pub struct RemoteSettings {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

impl RemoteSettings {
    pub fn is_complete(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
            && self.anon_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Table names; column names are fixed by the schema.
#[derive(Clone, Debug)]
pub struct TableNames {
    pub guests: String,
    pub master: String,
}

impl Default for TableNames {
    fn default() -> Self {
        TableNames {
            guests: DEFAULT_GUESTS_TABLE.into(),
            master: DEFAULT_MASTER_TABLE.into(),
        }
    }
}

/// Repository behavior that does not depend on the backend.
#[derive(Clone, Debug)]
pub struct GuestSettings {
    pub companion_policy: CompanionPolicy,
    /// Allowance assumed when the stored value is null, and the fixed-policy insert value.
    pub default_companions: i32,
    /// Offset used to render display timestamps.
    pub display_offset: FixedOffset,
}

impl Default for GuestSettings {
    fn default() -> Self {
        GuestSettings {
            companion_policy: CompanionPolicy::Fixed,
            default_companions: DEFAULT_COMPANIONS,
            display_offset: FixedOffset::west_opt(6 * 3600).unwrap_or_else(|| Utc.fix()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RsvpConfig {
    pub backend: StoreBackend,
    pub remote: RemoteSettings,
    pub database_url: Option<String>,
    pub tables: TableNames,
    pub guests: GuestSettings,
    pub bind_addr: String,
    pub body_limit_bytes: usize,
}

impl Default for RsvpConfig {
    fn default() -> Self {
        RsvpConfig {
            backend: StoreBackend::Rest,
            remote: RemoteSettings::default(),
            database_url: None,
            tables: TableNames::default(),
            guests: GuestSettings::default(),
            bind_addr: DEFAULT_BIND_ADDR.into(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

/// Parse "+HH:MM" / "-HH:MM" / "Z" into a fixed offset.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        key: "RSVP_DISPLAY_UTC_OFFSET",
        reason: format!("'{}': {}", s, reason),
    };
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s == "0" {
        return FixedOffset::east_opt(0).ok_or_else(|| invalid("out of range"));
    }
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(invalid("expected a leading + or -")),
    };
    let (h, m) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = h.parse().map_err(|_| invalid("hours must be a number"))?;
    let minutes: i32 = m.parse().map_err(|_| invalid("minutes must be a number"))?;
    if hours > 14 || minutes > 59 {
        return Err(invalid("out of range"));
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(|| invalid("out of range"))
}
