//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest identity handle accepted from the transport.
pub const MAX_IDENTITY_LENGTH: usize = 64;

/// Validates an opaque identity handle (player or host).
///
/// Handles are compared byte for byte, so surrounding or embedded whitespace
/// and control characters are rejected rather than silently trimmed.
///
/// # Examples
///
/// ```ignore
/// validate_identity("U024BE7LH")   // Ok
/// validate_identity("")            // Err - empty
/// validate_identity("user 42")     // Err - whitespace
/// ```
pub fn validate_identity(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.chars().count() > MAX_IDENTITY_LENGTH {
        let mut err = ValidationError::new("identity_length");
        err.message = Some(
            format!(
                "Identity must be between 1 and {MAX_IDENTITY_LENGTH} characters (got {})",
                id.chars().count()
            )
            .into(),
        );
        return Err(err);
    }

    if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        let mut err = ValidationError::new("identity_format");
        err.message = Some("Identity must not contain whitespace or control characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_identity_valid() {
        assert!(validate_identity("U024BE7LH").is_ok());
        assert!(validate_identity("player-1").is_ok());
        assert!(validate_identity("플레이어").is_ok());
    }

    #[test]
    fn test_validate_identity_invalid_length() {
        assert!(validate_identity("").is_err());
        assert!(validate_identity(&"a".repeat(MAX_IDENTITY_LENGTH + 1)).is_err());
        assert!(validate_identity(&"a".repeat(MAX_IDENTITY_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_identity_invalid_format() {
        assert!(validate_identity("user 42").is_err()); // space
        assert!(validate_identity(" user").is_err()); // leading space
        assert!(validate_identity("user\n").is_err()); // newline
    }
}
