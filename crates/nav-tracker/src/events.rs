use serde::{Deserialize, Serialize};
use url::Url;

use autowait_core_types::{FrameId, LoadState, NavigationId};

/// Ledger transitions, published on the tracker bus in the order they are
/// applied. Per frame the order is total; across frames there is no
/// ordering relation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum NavEvent {
    Started {
        frame: FrameId,
        id: NavigationId,
        url: Option<Url>,
        cross_process: bool,
        ts: u64,
    },
    Committed {
        frame: FrameId,
        id: NavigationId,
        url: Option<Url>,
        ts: u64,
    },
    Superseded {
        frame: FrameId,
        id: NavigationId,
        by: NavigationId,
        ts: u64,
    },
    Aborted {
        frame: FrameId,
        id: NavigationId,
        reason: String,
        ts: u64,
    },
    LifecycleReached {
        frame: FrameId,
        id: NavigationId,
        state: LoadState,
        ts: u64,
    },
}

impl NavEvent {
    pub fn frame(&self) -> &FrameId {
        match self {
            NavEvent::Started { frame, .. }
            | NavEvent::Committed { frame, .. }
            | NavEvent::Superseded { frame, .. }
            | NavEvent::Aborted { frame, .. }
            | NavEvent::LifecycleReached { frame, .. } => frame,
        }
    }

    pub fn navigation(&self) -> &NavigationId {
        match self {
            NavEvent::Started { id, .. }
            | NavEvent::Committed { id, .. }
            | NavEvent::Superseded { id, .. }
            | NavEvent::Aborted { id, .. }
            | NavEvent::LifecycleReached { id, .. } => id,
        }
    }

    /// Page-level event name this transition surfaces to callers, if any.
    /// Supersede and abort are internal to the ledger.
    pub fn page_event_name(&self) -> Option<&'static str> {
        match self {
            NavEvent::Committed { .. } => Some("framenavigated"),
            NavEvent::LifecycleReached { state, .. } => Some(state.as_str()),
            _ => None,
        }
    }
}

pub(crate) fn timestamp_now() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_event_names_cover_commit_and_lifecycle() {
        let frame = FrameId::new();
        let id = NavigationId::new();
        let committed = NavEvent::Committed {
            frame: frame.clone(),
            id: id.clone(),
            url: None,
            ts: 0,
        };
        assert_eq!(committed.page_event_name(), Some("framenavigated"));

        let loaded = NavEvent::LifecycleReached {
            frame: frame.clone(),
            id: id.clone(),
            state: LoadState::Load,
            ts: 0,
        };
        assert_eq!(loaded.page_event_name(), Some("load"));

        let superseded = NavEvent::Superseded {
            frame,
            id: id.clone(),
            by: NavigationId::new(),
            ts: 0,
        };
        assert_eq!(superseded.page_event_name(), None);
    }
}
