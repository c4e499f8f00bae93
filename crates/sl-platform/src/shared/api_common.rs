//! Common API helpers

use crate::shared::error::{PlatformError, Result};

/// Join a configured base URL and a path without doubling the slash.
pub fn public_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Require `value` to be non-blank and at most `max_chars` characters.
pub fn require_text(field: &str, value: &str, max_chars: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PlatformError::validation(format!("{field} is required")));
    }
    if value.chars().count() > max_chars {
        return Err(PlatformError::validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url() {
        assert_eq!(public_url("http://localhost:9002", "Abc123"), "http://localhost:9002/Abc123");
        assert_eq!(public_url("http://localhost:9004/", "/n/Abc123"), "http://localhost:9004/n/Abc123");
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("title", "hello", 5).is_ok());
        assert!(require_text("title", "   ", 5).is_err());
        assert!(require_text("title", "toolong", 5).is_err());
        // Counted in characters, not bytes
        assert!(require_text("title", "ééééé", 5).is_ok());
    }
}
