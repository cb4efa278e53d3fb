//! Small input validation helpers shared by the API layer.

use validator::ValidateEmail;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Return the trimmed value, or an error naming the missing field.
pub fn require_non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(format!("{field} must not be empty"))
    } else {
        Ok(trimmed)
    }
}

/// Validate an email address.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.validate_email() {
        Ok(())
    } else {
        Err(format!("'{email}' is not a valid email address"))
    }
}

/// Normalize an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_non_empty_trims() {
        assert_eq!(require_non_empty("name", "  Acme "), Ok("Acme"));
        assert!(require_non_empty("name", "   ")
            .unwrap_err()
            .contains("name must not be empty"));
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("jane@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email(" Jane@Example.COM "), "jane@example.com");
    }
}
