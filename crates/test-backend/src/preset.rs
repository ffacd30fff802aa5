use helpdesk_protocol::StreamEvent;
use serde::{Deserialize, Serialize};

/// The scripted outcome of one turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PresetTurn {
    /// The turn streams these events in order.
    Events(Vec<StreamEvent>),
    /// The exchange cannot be established at all.
    ConnectionFailure,
}

impl PresetTurn {
    /// Creates a `PresetTurn` that streams the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<StreamEvent>>) -> Self {
        Self::Events(events.into())
    }
}
