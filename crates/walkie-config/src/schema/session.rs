//! Peer session configuration types.

use serde::{Deserialize, Serialize};

/// Session and registration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Registration timeout in milliseconds (valid range: 1000-120000).
    pub registration_timeout_ms: u32,
    /// Name shown for a peer until it announces its identity.
    pub placeholder_name: String,
    /// Longest accepted display name, in characters (valid range: 1-128).
    pub max_name_len: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            registration_timeout_ms: 15_000,
            placeholder_name: "Usuario".into(),
            max_name_len: 32,
        }
    }
}
