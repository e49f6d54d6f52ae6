//! Per-peer sessions and the registry that owns them.

mod registry;
mod types;

pub use registry::Registry;
pub use types::{Session, SessionPhase};
