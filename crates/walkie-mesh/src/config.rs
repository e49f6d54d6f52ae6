//! Runtime configuration for the mesh manager.

use std::time::Duration;

/// Settings the mesh manager needs at runtime.
///
/// The binary maps its TOML config onto this; tests build it directly.
#[derive(Debug, Clone)]
pub struct MeshConfig {
    /// Initial local display name.
    pub display_name: String,
    /// Prefix of the identifier proposed at registration.
    pub channel_name: String,
    /// Upper bound on `TransportProvider::register`.
    pub registration_timeout: Duration,
    /// Name shown for a peer until it announces itself.
    pub placeholder_name: String,
    pub max_name_len: usize,
    pub cues_enabled: bool,
    /// Delay between a start tone and the looping static.
    pub static_cue_delay: Duration,
    /// Capacity of the event bus.
    pub event_capacity: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            display_name: "Anónimo".into(),
            channel_name: "corazones-abiertos".into(),
            registration_timeout: Duration::from_secs(15),
            placeholder_name: "Usuario".into(),
            max_name_len: 32,
            cues_enabled: true,
            static_cue_delay: Duration::from_millis(300),
            event_capacity: 256,
        }
    }
}
