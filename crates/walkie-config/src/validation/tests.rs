//! Tests for the full validation pipeline.

use super::*;
use crate::schema::WalkieConfig;

#[test]
fn default_config_validates() {
    let config = WalkieConfig::default();
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_registration_timeout_too_small() {
    let mut config = WalkieConfig::default();
    config.session.registration_timeout_ms = 10;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("session.registration_timeout_ms"));
}

#[test]
fn catches_static_delay_too_large() {
    let mut config = WalkieConfig::default();
    config.cues.static_delay_ms = 60_000;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("cues.static_delay_ms"));
}

#[test]
fn catches_volume_out_of_range() {
    let mut config = WalkieConfig::default();
    config.cues.volume = 1.5;
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("cues.volume"));
}

#[test]
fn catches_blank_display_name() {
    let mut config = WalkieConfig::default();
    config.identity.display_name = "   ".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("identity.display_name must not be empty"));
}

#[test]
fn catches_display_name_over_limit() {
    let mut config = WalkieConfig::default();
    config.session.max_name_len = 4;
    config.identity.display_name = "Carlos".into();
    config.session.placeholder_name = "U".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("identity.display_name is longer than 4"));
}

#[test]
fn name_limit_counts_characters_not_bytes() {
    let mut config = WalkieConfig::default();
    config.session.max_name_len = 7;
    // "Anónimo" is 7 chars but 8 bytes.
    assert!(validate(&config).is_ok());
}

#[test]
fn catches_bad_channel_name() {
    let mut config = WalkieConfig::default();
    config.channel.name = "has spaces".into();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("channel.name"));
}

#[test]
fn collects_multiple_errors() {
    let mut config = WalkieConfig::default();
    config.cues.volume = -1.0;
    config.cues.static_volume = 2.0;
    config.channel.name = String::new();
    let err = validate(&config).unwrap_err().to_string();
    assert!(err.contains("cues.volume"));
    assert!(err.contains("cues.static_volume"));
    assert!(err.contains("channel.name"));
}
