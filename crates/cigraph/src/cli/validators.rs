//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

/// Longest accepted external item ID.
pub const MAX_CMDB_ID_LENGTH: usize = 64;

/// Longest accepted relationship description.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

fn is_disallowed_control(c: char, allow_newlines: bool) -> bool {
    let code = c as u32;
    let newline = c == '\n' || c == '\r';
    (code < 0x20 && c != '\t' && !(allow_newlines && newline)) || (0x7F..=0x9F).contains(&code)
}

/// Validate an external item ID (e.g., `CI-00042`).
///
/// IDs are opaque to cigraph, so only emptiness, length, whitespace, and
/// control characters are checked. Surrounding whitespace is trimmed.
pub fn validate_cmdb_id(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Item ID cannot be empty".to_string());
    }

    if s.len() > MAX_CMDB_ID_LENGTH {
        return Err(format!(
            "Item ID cannot exceed {MAX_CMDB_ID_LENGTH} characters, got {} characters",
            s.len()
        ));
    }

    if s.chars().any(char::is_whitespace) {
        return Err(format!("Item ID cannot contain whitespace: '{s}'"));
    }

    if let Some(pos) = s.chars().position(|c| is_disallowed_control(c, false)) {
        return Err(format!(
            "Item ID contains invalid control character at position {pos}"
        ));
    }

    Ok(s.to_string())
}

/// Validate an actor name recorded on relationships and change entries.
pub fn validate_actor(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Actor cannot be empty".to_string());
    }

    if let Some(pos) = s.chars().position(|c| is_disallowed_control(c, false)) {
        return Err(format!(
            "Actor contains invalid control character at position {pos}"
        ));
    }

    Ok(s.to_string())
}

/// Validate a relationship description.
///
/// Allows newlines but rejects control characters that could cause display issues.
pub fn validate_description(s: &str) -> Result<String, String> {
    if s.len() > MAX_DESCRIPTION_LENGTH {
        return Err(format!(
            "Description cannot exceed {MAX_DESCRIPTION_LENGTH} characters, got {} characters",
            s.len()
        ));
    }

    if let Some(pos) = s.chars().position(|c| is_disallowed_control(c, true)) {
        return Err(format!(
            "Description contains invalid control character at position {pos}"
        ));
    }

    Ok(s.to_string())
}
