use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// Shared error type for the engine crates. Rich taxonomies live in the
/// crates that own them; this is the lowest common denominator carried
/// across port boundaries.
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("{message}")]
    Message { message: String },
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PageId(pub String);

impl PageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FrameId(pub String);

impl FrameId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Identity of one navigation attempt, minted by whatever detects the
/// navigation (the transport layer, or a scripted source in tests) and
/// carried through every lifecycle notification for that attempt. Stale
/// commits and aborts are recognized by id mismatch, never by guesswork.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct NavigationId(pub String);

impl NavigationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Document load milestones a frame can reach after a commit.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LoadState {
    DomContentLoaded,
    Load,
}

impl LoadState {
    /// Event-name spelling exposed to callers waiting on page events.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadState::DomContentLoaded => "domcontentloaded",
            LoadState::Load => "load",
        }
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved routing of an action to one frame. The `mutex_key` is the
/// serialization key for everything that mutates that frame's navigation
/// state.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FrameRoute {
    pub session: SessionId,
    pub page: PageId,
    pub frame: FrameId,
    pub mutex_key: String,
}

impl FrameRoute {
    pub fn new(session: SessionId, page: PageId, frame: FrameId) -> Self {
        let mutex_key = format!("frame:{}", frame.0);
        Self {
            session,
            page,
            frame,
            mutex_key,
        }
    }
}

impl fmt::Display for FrameRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session={} page={} frame={} mutex={}",
            self.session.0, self.page.0, self.frame.0, self.mutex_key
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_mutex_key_is_frame_scoped() {
        let route = FrameRoute::new(SessionId::new(), PageId::new(), FrameId("f1".into()));
        assert_eq!(route.mutex_key, "frame:f1");
    }

    #[test]
    fn load_state_names_match_event_vocabulary() {
        assert_eq!(LoadState::Load.as_str(), "load");
        assert_eq!(LoadState::DomContentLoaded.as_str(), "domcontentloaded");
    }
}
