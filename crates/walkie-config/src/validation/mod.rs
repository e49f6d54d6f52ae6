//! Full configuration validation.
//!
//! Validates numeric ranges and name constraints, collecting every
//! problem into a single `ConfigError`.

mod helpers;

#[cfg(test)]
mod tests;

use crate::schema::WalkieConfig;
use walkie_common::ConfigError;

use helpers::{validate_name, validate_range, validate_range_f64};

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &WalkieConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_range(
        &mut errors,
        "session.registration_timeout_ms",
        config.session.registration_timeout_ms,
        1_000,
        120_000,
    );
    validate_range(
        &mut errors,
        "session.max_name_len",
        config.session.max_name_len,
        1,
        128,
    );
    validate_name(
        &mut errors,
        "session.placeholder_name",
        &config.session.placeholder_name,
        config.session.max_name_len,
    );
    validate_name(
        &mut errors,
        "identity.display_name",
        &config.identity.display_name,
        config.session.max_name_len,
    );

    if config.channel.name.is_empty()
        || !config
            .channel
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        errors.push(format!(
            "channel.name = {:?} must be non-empty and use only [A-Za-z0-9_-]",
            config.channel.name
        ));
    }

    validate_range(
        &mut errors,
        "cues.static_delay_ms",
        config.cues.static_delay_ms,
        0,
        5_000,
    );
    validate_range_f64(&mut errors, "cues.volume", config.cues.volume, 0.0, 1.0);
    validate_range_f64(
        &mut errors,
        "cues.static_volume",
        config.cues.static_volume,
        0.0,
        1.0,
    );

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
