//! Tests for TOML config loading, creation, and path resolution.

use super::*;
use std::path::Path;
use walkie_common::ConfigError;

#[test]
fn load_from_nonexistent_returns_file_not_found() {
    let result = load_from_path(Path::new("/tmp/nonexistent_walkie_config.toml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r##"
[identity]
display_name = "Carlos"

[cues]
static_delay_ms = 150
"##,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.identity.display_name, "Carlos");
    assert_eq!(config.cues.static_delay_ms, 150);
    // Defaults preserved
    assert_eq!(config.channel.name, "corazones-abiertos");
    assert_eq!(config.session.registration_timeout_ms, 15_000);
    assert!(config.cues.enabled);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let result = load_from_path(&path);
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn load_config_with_invalid_values_returns_parsed_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[session]
registration_timeout_ms = 5
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.session.registration_timeout_ms, 5);
}

#[test]
fn create_and_load_default_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("walkie").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.identity.display_name, "Anónimo");
    assert_eq!(config.channel.name, "corazones-abiertos");
    assert_eq!(config.cues.static_delay_ms, 300);
}

#[test]
fn default_template_validates() {
    let config: crate::schema::WalkieConfig =
        toml::from_str(&super::template::default_config_toml()).unwrap();
    assert!(crate::validation::validate(&config).is_ok());
}

#[test]
fn default_config_path_ends_with_walkie_config() {
    if let Ok(path) = default_config_path() {
        assert!(path.ends_with("walkie/config.toml"));
    }
}
