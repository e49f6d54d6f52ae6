//! Shared validation helpers.

/// Push an error if `value` is outside `[min, max]` (integer).
pub(crate) fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error if `value` is outside `[min, max]` (float).
pub(crate) fn validate_range_f64(
    errors: &mut Vec<String>,
    name: &str,
    value: f64,
    min: f64,
    max: f64,
) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

/// Push an error if a display name is blank or longer than `max_len` chars.
pub(crate) fn validate_name(errors: &mut Vec<String>, name: &str, value: &str, max_len: u32) {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(format!("{name} must not be empty"));
    } else if trimmed.chars().count() > max_len as usize {
        errors.push(format!("{name} is longer than {max_len} characters"));
    }
}
