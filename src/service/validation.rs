//! Input validation: guest names and the companion-count ratchet.

use crate::error::AppError;
use regex::Regex;
use std::sync::OnceLock;

/// Longest accepted guest name, in characters.
pub const MAX_NAME_CHARS: usize = 100;

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern compiles"))
}

/// Trim and collapse inner whitespace runs to a single space.
pub fn normalize_name(raw: &str) -> String {
    whitespace_runs().replace_all(raw.trim(), " ").into_owned()
}

pub struct GuestValidator;

impl GuestValidator {
    /// Normalized name, or a validation error when blank or too long.
    pub fn name(raw: &str) -> Result<String, AppError> {
        let name = normalize_name(raw);
        if name.is_empty() {
            return Err(AppError::Validation("name is required".into()));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::Validation(format!(
                "name must be at most {} characters",
                MAX_NAME_CHARS
            )));
        }
        Ok(name)
    }

    /// Range check that needs no stored value.
    pub fn companion_count(new_count: i32) -> Result<(), AppError> {
        if new_count < 0 {
            return Err(AppError::Validation(format!(
                "companion count must be 0 or more (got {})",
                new_count
            )));
        }
        Ok(())
    }

    /// The ratchet: the allowance may be held or lowered, never raised.
    pub fn companion_decrease(current: i32, new_count: i32) -> Result<(), AppError> {
        Self::companion_count(new_count)?;
        if new_count > current {
            return Err(AppError::Validation(format!(
                "companion count can only be lowered (current {}, requested {})",
                current, new_count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_whitespace() {
        assert_eq!(normalize_name("  Juan \t  Pérez \n"), "Juan Pérez");
        assert_eq!(GuestValidator::name(" Ana ").unwrap(), "Ana");
    }

    #[test]
    fn rejects_blank_and_long_names() {
        assert!(matches!(GuestValidator::name("   "), Err(AppError::Validation(_))));
        let long = "ñ".repeat(MAX_NAME_CHARS + 1);
        assert!(GuestValidator::name(&long).is_err());
        assert!(GuestValidator::name(&"ñ".repeat(MAX_NAME_CHARS)).is_ok());
    }

    #[test]
    fn ratchet_only_goes_down() {
        assert!(GuestValidator::companion_decrease(2, 2).is_ok());
        assert!(GuestValidator::companion_decrease(2, 0).is_ok());
        assert!(GuestValidator::companion_decrease(1, 2).is_err());
        assert!(GuestValidator::companion_decrease(2, -1).is_err());
    }
}
