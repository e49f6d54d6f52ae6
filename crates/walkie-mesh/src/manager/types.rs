use walkie_common::PeerId;

/// The local participant as seen by the mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalState {
    /// Assigned by the transport once registration completes.
    pub identity: Option<PeerId>,
    pub display_name: String,
    pub is_talking: bool,
    pub connected: bool,
    /// Set when no local audio source could be acquired at connect.
    pub receive_only: bool,
}

impl LocalState {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            identity: None,
            display_name: display_name.into(),
            is_talking: false,
            connected: false,
            receive_only: false,
        }
    }

    pub fn is_local(&self, peer: &PeerId) -> bool {
        self.identity.as_ref() == Some(peer)
    }
}
