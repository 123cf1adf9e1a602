//! Utility functions

/// Keep only ASCII digits (CPF, CNPJ and phone numbers are stored this way).
pub fn only_digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trim an optional text field, turning blank values into `None`.
pub fn blank_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        if local.len() <= 2 {
            format!("{}***{}", local.chars().next().unwrap_or('*'), domain)
        } else {
            format!("{}***{}", &local[..2], domain)
        }
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_digits() {
        assert_eq!(only_digits("123.456.789-09"), "12345678909");
        assert_eq!(only_digits("(11) 9 8765-4321"), "11987654321");
        assert_eq!(only_digits("abc"), "");
    }

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none(Some("  ".into())), None);
        assert_eq!(blank_to_none(Some(" x ".into())), Some("x".into()));
        assert_eq!(blank_to_none(None), None);
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("maria@otica.com"), "ma***@otica.com");
        assert_eq!(mask_email("a@otica.com"), "a***@otica.com");
        assert_eq!(mask_email("@otica.com"), "****@otica.com");
        assert_eq!(mask_email("invalid"), "***");
    }
}
