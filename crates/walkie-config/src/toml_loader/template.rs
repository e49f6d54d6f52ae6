//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Walkie Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[identity]
display_name = "Anónimo"

[channel]
# Endpoint ids are proposed as "<name>-<random>".
name = "corazones-abiertos"

[session]
# registration_timeout_ms = 15000   # 1000-120000
# placeholder_name = "Usuario"      # shown until a peer announces itself
# max_name_len = 32                 # 1-128

[cues]
# enabled = true
# static_delay_ms = 300             # 0-5000
# volume = 0.7                      # 0.0-1.0
# static_volume = 0.2               # 0.0-1.0

[logging]
# level = "INFO"                    # DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
