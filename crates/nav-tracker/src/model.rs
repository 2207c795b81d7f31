use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use autowait_core_types::{FrameId, LoadState, NavigationId};

/// Terminal states of a navigation attempt. A record with no outcome yet is
/// pending; once one of these is written it never changes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum NavOutcome {
    Committed,
    Superseded,
    Aborted,
}

/// One navigation attempt on one frame, from detection to settle.
///
/// Records are owned by the tracker; callers only ever see clones. The frame
/// field is an id, not a handle, so a record can never keep frame state
/// alive on its own.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavigationRecord {
    pub id: NavigationId,
    pub frame: FrameId,
    /// Destination if known at start; `javascript:` pseudo-navigations and
    /// some provisional loads have none.
    pub url: Option<Url>,
    pub cross_process: bool,
    pub started_at: DateTime<Utc>,
    /// Set when the document actually commits, never for supersede or abort.
    pub committed_at: Option<DateTime<Utc>>,
    pub outcome: Option<NavOutcome>,
    pub abort_reason: Option<String>,
    pub dom_content_loaded_at: Option<DateTime<Utc>>,
    pub load_at: Option<DateTime<Utc>>,
}

impl NavigationRecord {
    pub(crate) fn open(
        id: NavigationId,
        frame: FrameId,
        url: Option<Url>,
        cross_process: bool,
    ) -> Self {
        Self {
            id,
            frame,
            url,
            cross_process,
            started_at: Utc::now(),
            committed_at: None,
            outcome: None,
            abort_reason: None,
            dom_content_loaded_at: None,
            load_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn is_settled(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn reached(&self, state: LoadState) -> bool {
        match state {
            LoadState::DomContentLoaded => self.dom_content_loaded_at.is_some(),
            LoadState::Load => self.load_at.is_some(),
        }
    }

    /// Display form of the destination for logs and diagnostics.
    pub fn url_str(&self) -> String {
        self.url
            .as_ref()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string())
    }
}

/// Ledger tuning. All knobs have conservative defaults; tests override them
/// to force eviction early.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Settled, unpinned records kept per frame before the oldest are
    /// evicted.
    pub retention: usize,
    /// Depth of the transition broadcast channel.
    pub bus_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            retention: 32,
            bus_capacity: 256,
        }
    }
}
