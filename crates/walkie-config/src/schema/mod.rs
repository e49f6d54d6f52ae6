//! Configuration schema types for Walkie.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod cues;
mod identity;
mod session;
mod system;

pub use cues::*;
pub use identity::*;
pub use session::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Walkie.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkieConfig {
    pub identity: IdentityConfig,
    pub channel: ChannelConfig,
    pub session: SessionConfig,
    pub cues: CuesConfig,
    pub logging: LoggingConfig,
}
