//! Config validation: identifiers, endpoint shape and numeric ranges.

use crate::config::RsvpConfig;
use crate::error::ConfigError;

/// Table names are interpolated (quoted) into SQL and into REST paths, so keep them to plain identifiers.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn validate(config: &RsvpConfig) -> Result<(), ConfigError> {
    for (key, name) in [
        ("RSVP_GUESTS_TABLE", &config.tables.guests),
        ("RSVP_MASTER_TABLE", &config.tables.master),
    ] {
        if !is_plain_identifier(name) {
            return Err(ConfigError::Invalid {
                key,
                reason: format!("'{}' is not a plain table identifier", name),
            });
        }
    }
    if let Some(url) = &config.remote.url {
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                key: "SUPABASE_URL",
                reason: "must start with http:// or https://".into(),
            });
        }
    }
    if config.guests.default_companions < 0 {
        return Err(ConfigError::Invalid {
            key: "RSVP_DEFAULT_COMPANIONS",
            reason: "must not be negative".into(),
        });
    }
    if config.body_limit_bytes == 0 {
        return Err(ConfigError::Invalid {
            key: "RSVP_BODY_LIMIT_BYTES",
            reason: "must be greater than zero".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_plain_identifier("wedding_guests"));
        assert!(is_plain_identifier("_t1"));
        assert!(!is_plain_identifier("1guests"));
        assert!(!is_plain_identifier("guests; drop table x"));
        assert!(!is_plain_identifier(""));
    }

    #[test]
    fn rejects_bad_url_and_negative_default() {
        let mut config = RsvpConfig::default();
        config.remote.url = Some("abc.supabase.co".into());
        assert!(validate(&config).is_err());

        let mut config = RsvpConfig::default();
        config.guests.default_companions = -1;
        assert!(validate(&config).is_err());

        assert!(validate(&RsvpConfig::default()).is_ok());
    }
}
