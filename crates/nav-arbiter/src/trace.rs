use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use autowait_core_types::{FrameId, NavigationId};
use nav_tracker::NavOutcome;

/// One candidate the window adopted, kept as display data so the trace
/// stays meaningful after the record itself is evicted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CandidateNote {
    pub nav: NavigationId,
    pub url: String,
    pub cross_process: bool,
    pub adopted_at: DateTime<Utc>,
}

/// Ordered history of what a wait window did. Every adoption contributes a
/// step, so a race that replaced candidates twice shows all three attempts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum TraceStep {
    Opened {
        frame: FrameId,
        at: DateTime<Utc>,
    },
    Adopted(CandidateNote),
    NoNavigation {
        at: DateTime<Utc>,
    },
    Settled {
        nav: NavigationId,
        outcome: NavOutcome,
        at: DateTime<Utc>,
    },
    DeadlineExceeded {
        at: DateTime<Utc>,
    },
    Cancelled {
        at: DateTime<Utc>,
    },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct WaitTrace {
    pub steps: Vec<TraceStep>,
}

impl WaitTrace {
    pub(crate) fn push(&mut self, step: TraceStep) {
        self.steps.push(step);
    }

    /// All adopted candidates in adoption order.
    pub fn candidates(&self) -> Vec<&CandidateNote> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                TraceStep::Adopted(note) => Some(note),
                _ => None,
            })
            .collect()
    }

    /// The candidate the window was awaiting when it closed.
    pub fn last_candidate(&self) -> Option<&CandidateNote> {
        self.candidates().into_iter().last()
    }
}
