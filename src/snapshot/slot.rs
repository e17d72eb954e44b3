//! Output slots and their values.

use serde_json::{json, Value};

/// Text published in every slot when the viewer is disabled.
pub const DISABLED_MARKER: &str = "[ChatRoomViewer: Disabled]";

/// One of the seven independently cached output categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    Status,
    Theme,
    SessionWatcher,
    Agents,
    ModeBubbleTip,
    SessionTimeElapsed,
    GroupSessionWatcher,
}

impl Slot {
    pub const COUNT: usize = 7;

    /// Every slot, in publication order.
    pub const ALL: [Slot; Self::COUNT] = [
        Slot::Status,
        Slot::Theme,
        Slot::SessionWatcher,
        Slot::Agents,
        Slot::ModeBubbleTip,
        Slot::SessionTimeElapsed,
        Slot::GroupSessionWatcher,
    ];

    /// Placeholder token the host substitutes.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Status => "{{VCPChatStatus}}",
            Self::Theme => "{{VCPChatTheme}}",
            Self::SessionWatcher => "{{VCPChatSessionWatcher}}",
            Self::Agents => "{{VCPChatAgent}}",
            Self::ModeBubbleTip => "{{VCPChatModeBubbleTip}}",
            Self::SessionTimeElapsed => "{{VCPChatSessionTimeElapsed}}",
            Self::GroupSessionWatcher => "{{VCPChatGroupSessionWatcher}}",
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Theme => "theme",
            Self::SessionWatcher => "sessionWatcher",
            Self::Agents => "agents",
            Self::ModeBubbleTip => "modeBubbleTip",
            Self::SessionTimeElapsed => "sessionTimeElapsed",
            Self::GroupSessionWatcher => "groupSessionWatcher",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Content of one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    /// A computed document.
    Structured(Value),
    /// The slot could not be computed at all.
    Error(String),
    /// The viewer is switched off.
    Disabled,
}

impl SlotValue {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// The slot as a JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Structured(value) => value.clone(),
            Self::Error(message) => json!({ "error": message }),
            Self::Disabled => Value::String(DISABLED_MARKER.to_string()),
        }
    }

    /// Serialize once into the string placed under the slot's token.
    ///
    /// Every variant encodes to a valid JSON text, so hosts can always
    /// decode the value as an embedded document.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Structured(value) => value.to_string(),
            Self::Error(_) | Self::Disabled => self.to_json().to_string(),
        }
    }
}
