//! Radio cue configuration types.

use serde::{Deserialize, Serialize};

/// Start/static/end tone settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CuesConfig {
    pub enabled: bool,
    /// Delay between the start tone and the looping static (valid range: 0-5000).
    pub static_delay_ms: u32,
    pub volume: f64,
    /// Static is mixed quieter than the tones.
    pub static_volume: f64,
}

impl Default for CuesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            static_delay_ms: 300,
            volume: 0.7,
            static_volume: 0.2,
        }
    }
}
