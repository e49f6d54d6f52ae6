use serde::{Deserialize, Serialize};
use std::fmt;

/// Short random suffix used when proposing endpoint identifiers.
pub fn new_short_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    let bytes = uuid.as_bytes();
    format!(
        "{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4]
    )
}

/// Opaque endpoint identifier assigned by the transport provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build a candidate identifier of the form `<prefix>-<random>`.
    pub fn candidate(prefix: &str) -> Self {
        if prefix.is_empty() {
            Self(new_short_id())
        } else {
            Self(format!("{prefix}-{}", new_short_id()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PeerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PeerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of one logical channel handed out by a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_is_ten_hex_chars() {
        let sid = new_short_id();
        assert_eq!(sid.len(), 10);
        assert!(sid.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn short_id_is_unique() {
        assert_ne!(new_short_id(), new_short_id());
    }

    #[test]
    fn candidate_uses_prefix() {
        let id = PeerId::candidate("corazones-abiertos");
        assert!(id.as_str().starts_with("corazones-abiertos-"));
        assert_eq!(id.as_str().len(), "corazones-abiertos-".len() + 10);
    }

    #[test]
    fn candidate_without_prefix_is_bare_suffix() {
        let id = PeerId::candidate("");
        assert_eq!(id.as_str().len(), 10);
    }

    #[test]
    fn peer_id_display_matches_inner() {
        let id = PeerId::from("p1");
        assert_eq!(id.to_string(), "p1");
        assert_eq!(id.as_str(), "p1");
    }

    #[test]
    fn peer_id_serializes_as_plain_string() {
        let id = PeerId::new("p2");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"p2\"");
        let back: PeerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn peer_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(PeerId::from("a"));
        set.insert(PeerId::from("a"));
        set.insert(PeerId::from("b"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn peer_id_ordering_is_lexicographic() {
        assert!(PeerId::from("p1") < PeerId::from("p2"));
    }

    #[test]
    fn channel_id_display() {
        assert_eq!(ChannelId(7).to_string(), "ch#7");
    }
}
