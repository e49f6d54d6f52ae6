//! Local identity and channel configuration types.

use serde::{Deserialize, Serialize};

/// Local participant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Name announced to peers until the user picks another one.
    pub display_name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            display_name: "Anónimo".into(),
        }
    }
}

/// Shared channel the local endpoint joins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Prefix of the endpoint identifier proposed at registration.
    pub name: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: "corazones-abiertos".into(),
        }
    }
}
