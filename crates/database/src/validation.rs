//! Input validation and normalization for account fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid email format.
    InvalidEmail(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum allowed length for display names.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 120;

/// Canonical form of an email address: trimmed and lower-cased.
///
/// Every lookup and insert goes through this, so uniqueness is
/// case- and whitespace-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate an email address (basic RFC 5322 format check).
///
/// Checks for exactly one `@`, a non-empty local part, and a dotted
/// domain without empty labels at either end.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    };

    if domain.contains('@') {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if domain.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing domain (after @)".to_string(),
        ));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail(
            "cannot contain whitespace".to_string(),
        ));
    }

    if !domain.contains('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must contain at least one dot".to_string(),
        ));
    }

    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidEmail(
            "domain cannot start or end with a dot".to_string(),
        ));
    }

    if domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "domain cannot contain consecutive dots".to_string(),
        ));
    }

    Ok(())
}

/// Validate a display name.
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Empty("display name".to_string()));
    }

    let len = name.chars().count();
    if len > MAX_DISPLAY_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "display name".to_string(),
            max: MAX_DISPLAY_NAME_LENGTH,
            actual: len,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  ADMIN@Example.com "), "admin@example.com");
        assert_eq!(normalize_email("a@b.c"), "a@b.c");
    }

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.co.uk").is_ok());
        assert!(validate_email("a@b.c").is_ok());
        assert!(validate_email(" test@example.com ").is_ok()); // trimmed
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(matches!(validate_email(""), Err(ValidationError::Empty(_))));

        for bad in [
            "test.example.com",
            "test@example@com",
            "@example.com",
            "test@",
            "test@localhost",
            "test@.example.com",
            "test@example.com.",
            "test@example..com",
            "te st@example.com",
        ] {
            assert!(
                matches!(validate_email(bad), Err(ValidationError::InvalidEmail(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_email_too_long() {
        let email = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            validate_email(&email),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_display_name() {
        assert!(validate_display_name("Asha").is_ok());
        assert!(matches!(
            validate_display_name("   "),
            Err(ValidationError::Empty(_))
        ));
        assert!(matches!(
            validate_display_name(&"x".repeat(200)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::InvalidEmail("test message".to_string());
        assert_eq!(err.to_string(), "Invalid email: test message");

        let err = ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
            actual: 300,
        };
        assert_eq!(err.to_string(), "email is too long (300 chars, max 254)");
    }
}
