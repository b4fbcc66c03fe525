//! Confirmation message shown after a master-list match.

/// Builds the confirmation text for `name` holding `pass_count` places.
/// Phrasing is singular ("lugar", "ti") only when `pass_count == 1`.
pub fn confirmation_message(name: &str, pass_count: i32) -> String {
    let (places, whom) = if pass_count == 1 {
        ("lugar", "ti")
    } else {
        ("lugares", "ustedes")
    };
    format!(
        "¡Gracias por confirmar, {}! Tenemos reservado {} {} para {}.",
        name.trim(),
        pass_count,
        places,
        whom
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singular_for_one_pass() {
        let msg = confirmation_message("Ana", 1);
        assert_eq!(msg, "¡Gracias por confirmar, Ana! Tenemos reservado 1 lugar para ti.");
        assert!(!msg.contains("lugares"));
        assert!(!msg.contains("ustedes"));
    }

    #[test]
    fn plural_for_two_passes() {
        let msg = confirmation_message("Ana y Luis", 2);
        assert_eq!(msg, "¡Gracias por confirmar, Ana y Luis! Tenemos reservado 2 lugares para ustedes.");
    }

    #[test]
    fn zero_passes_reads_plural() {
        assert!(confirmation_message("Ana", 0).contains("0 lugares para ustedes"));
    }
}
