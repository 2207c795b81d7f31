use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use autowait_core_types::{ActionId, FrameRoute, NavigationId};
use nav_tracker::{NavOutcome, NavigationRecord};

/// Execution context delivered by the caller for one action.
#[derive(Clone, Debug)]
pub struct ExecCtx {
    pub action_id: ActionId,
    pub route: FrameRoute,
    pub deadline: Instant,
    pub cancel: CancellationToken,
}

impl ExecCtx {
    pub fn new(
        action_id: ActionId,
        route: FrameRoute,
        deadline: Instant,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            action_id,
            route,
            deadline,
            cancel,
        }
    }
}

/// Budget left before the context's deadline.
pub fn remaining_deadline(ctx: &ExecCtx) -> Duration {
    ctx.deadline
        .checked_duration_since(Instant::now())
        .unwrap_or_else(|| Duration::from_secs(0))
}

/// The user action to dispatch, with the payload the input layer needs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ActionKind {
    Click { selector: String },
    Dblclick { selector: String },
    Fill { selector: String, text: String },
    Evaluate { script: String },
    Goto { url: String },
}

impl ActionKind {
    /// Short name used in logs and in the `page.{name}` timeout prefix.
    pub fn log_name(&self) -> &'static str {
        match self {
            ActionKind::Click { .. } => "click",
            ActionKind::Dblclick { .. } => "dblclick",
            ActionKind::Fill { .. } => "fill",
            ActionKind::Evaluate { .. } => "evaluate",
            ActionKind::Goto { .. } => "goto",
        }
    }
}

/// Per-action tweaks recognized by `perform`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ActionOpt {
    /// Overall deadline including any auto-wait; policy default when unset.
    pub timeout_ms: Option<u64>,
    /// Skip all post-action waiting. The action resolves at input local
    /// completion even when a navigation is scheduled.
    pub no_wait_after: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionRequest {
    pub kind: ActionKind,
    pub opt: ActionOpt,
}

impl ActionRequest {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            opt: ActionOpt::default(),
        }
    }

    pub fn with_opt(kind: ActionKind, opt: ActionOpt) -> Self {
        Self { kind, opt }
    }
}

/// The navigation an action ended up synchronized with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NavigationSummary {
    pub nav: NavigationId,
    pub url: String,
    pub cross_process: bool,
    pub outcome: NavOutcome,
}

impl NavigationSummary {
    pub(crate) fn from_record(record: &NavigationRecord, outcome: NavOutcome) -> Self {
        Self {
            nav: record.id.clone(),
            url: record.url_str(),
            cross_process: record.cross_process,
            outcome,
        }
    }
}

/// Outcome of one perform call.
#[derive(Clone, Debug)]
pub struct ActionReport {
    pub ok: bool,
    pub issued_at: DateTime<Utc>,
    pub started_at: Instant,
    pub finished_at: Instant,
    pub latency_ms: u128,
    /// False when `no_wait_after` skipped the window entirely.
    pub waited: bool,
    pub navigation: Option<NavigationSummary>,
}

impl ActionReport {
    pub fn new(started_at: Instant) -> Self {
        Self {
            ok: false,
            issued_at: Utc::now(),
            started_at,
            finished_at: started_at,
            latency_ms: 0,
            waited: false,
            navigation: None,
        }
    }

    pub fn finish(mut self, finished_at: Instant) -> Self {
        self.finished_at = finished_at;
        self.latency_ms = finished_at
            .saturating_duration_since(self.started_at)
            .as_millis();
        self
    }
}
