pub mod errors;
pub mod events;
pub mod id;

pub use errors::{ConfigError, ErrorKind, WalkieError};
pub use events::{Event, EventBus, Participant};
pub use id::{new_short_id, ChannelId, PeerId};
