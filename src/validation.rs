// Validation utilities module
// Provides custom validation functions for domain-specific formats

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

fn postcode_regex() -> &'static Regex {
    static POSTCODE_RE: OnceLock<Regex> = OnceLock::new();
    POSTCODE_RE.get_or_init(|| {
        // Outward code with an optional inward code
        Regex::new(r"^[A-Za-z]{1,2}[0-9][0-9A-Za-z]?\s?([0-9][A-Za-z]{2})?$")
            .expect("postcode regex is valid")
    })
}

/// Whether a string looks like a postcode (outward form or full form)
pub fn postcode_is_valid(postcode: &str) -> bool {
    postcode_regex().is_match(postcode.trim())
}

/// Validates a postcode field for request DTOs
pub fn validate_postcode(postcode: &str) -> Result<(), ValidationError> {
    if postcode_is_valid(postcode) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_postcode"))
    }
}

/// Whether a string is a plausible band code (short alphanumeric)
pub fn band_code_is_valid(code: &str) -> bool {
    let code = code.trim();
    !code.is_empty() && code.len() <= 4 && code.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Validates a band code field for request DTOs
pub fn validate_band_code(code: &str) -> Result<(), ValidationError> {
    if band_code_is_valid(code) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_band_code"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_postcodes_are_accepted() {
        assert!(postcode_is_valid("AB1 2CD"));
        assert!(postcode_is_valid("ab12cd"));
        assert!(postcode_is_valid("SW1A 1AA"));
    }

    #[test]
    fn test_outward_postcodes_are_accepted() {
        assert!(postcode_is_valid("AB1"));
        assert!(postcode_is_valid("AB10"));
        assert!(postcode_is_valid("M1"));
    }

    #[test]
    fn test_malformed_postcodes_are_rejected() {
        assert!(!postcode_is_valid(""));
        assert!(!postcode_is_valid("12345"));
        assert!(!postcode_is_valid("ABCDE"));
        assert!(!postcode_is_valid("AB1 2CDE"));
    }

    #[test]
    fn test_band_codes() {
        assert!(band_code_is_valid("A"));
        assert!(band_code_is_valid("b2"));
        assert!(!band_code_is_valid(""));
        assert!(!band_code_is_valid("TOOLONG"));
        assert!(!band_code_is_valid("A-1"));
    }
}
