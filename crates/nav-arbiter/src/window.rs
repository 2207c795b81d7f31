use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use autowait_core_types::{FrameId, NavigationId};
use nav_tracker::{NavEvent, NavOutcome, NavigationRecord, NavigationTracker};

use crate::trace::{CandidateNote, TraceStep, WaitTrace};

/// Default grace period after an action's local completion before the
/// window concludes that no navigation was caused. A handful of scheduler
/// turns is enough for a navigation the action really triggered to surface;
/// `javascript:` pseudo-links must not stall longer than this.
pub const DEFAULT_GRACE_MS: u64 = 50;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArbiterConfig {
    /// Tunable no-navigation grace, in milliseconds.
    pub grace_ms: u64,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            grace_ms: DEFAULT_GRACE_MS,
        }
    }
}

impl ArbiterConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

/// How a wait window resolved.
#[derive(Clone, Debug)]
pub enum Verdict {
    /// Nothing started within the grace period.
    NoNavigation,
    /// The awaited candidate reached Committed or Aborted.
    Settled(NavigationRecord),
    /// The action deadline passed while a candidate was still pending.
    DeadlineExceeded,
    /// The caller's cancellation token fired.
    Cancelled,
}

/// Read-only observer of one frame's navigations on behalf of one action.
///
/// Open the window before dispatching the action's input: the subscription
/// is taken first, so navigation starts that land while the input is still
/// in flight are buffered, not lost. The window never mutates ledger state
/// beyond pinning candidates against eviction.
pub struct WaitWindow {
    tracker: Arc<NavigationTracker>,
    frame: FrameId,
    rx: broadcast::Receiver<NavEvent>,
    candidate: Option<NavigationId>,
    trace: WaitTrace,
}

impl WaitWindow {
    pub fn open(tracker: Arc<NavigationTracker>, frame: FrameId) -> Self {
        let rx = tracker.subscribe();
        let mut window = Self {
            tracker,
            frame: frame.clone(),
            rx,
            candidate: None,
            trace: WaitTrace::default(),
        };
        window.trace.push(TraceStep::Opened {
            frame,
            at: Utc::now(),
        });
        if let Some(pending) = window.tracker.current_pending(&window.frame) {
            window.adopt(pending.id.clone(), pending.url_str(), pending.cross_process);
        }
        window
    }

    pub fn frame(&self) -> &FrameId {
        &self.frame
    }

    pub fn candidate(&self) -> Option<&NavigationId> {
        self.candidate.as_ref()
    }

    /// Snapshot of the candidate history so far.
    pub fn trace(&self) -> WaitTrace {
        self.trace.clone()
    }

    fn adopt(&mut self, id: NavigationId, url: String, cross_process: bool) {
        if let Some(old) = self.candidate.take() {
            self.tracker.unpin(&self.frame, &old);
        }
        self.tracker.pin(&self.frame, &id);
        debug!(
            target: "nav_arbiter",
            frame = %self.frame.0,
            nav = %id.0,
            %url,
            cross_process,
            "wait window adopted candidate"
        );
        self.trace.push(TraceStep::Adopted(CandidateNote {
            nav: id.clone(),
            url,
            cross_process,
            adopted_at: Utc::now(),
        }));
        self.candidate = Some(id);
    }

    fn event_url(url: Option<&Url>) -> String {
        url.map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string())
    }

    /// Run the arbitration loop until a verdict is reached.
    ///
    /// `grace` bounds how long to wait for a first candidate after the
    /// action's local completion; `remaining` is the action deadline budget
    /// left. Replacement of the candidate stays possible for the whole wait,
    /// so the last navigation started on the frame is always the one
    /// awaited.
    pub async fn conclude(
        &mut self,
        grace: Duration,
        remaining: Duration,
        cancel: &CancellationToken,
    ) -> Verdict {
        let grace_deadline = Instant::now() + grace;
        let deadline = Instant::now() + remaining;
        loop {
            if let Some(id) = self.candidate.clone() {
                if let Some(rec) = self.tracker.record(&self.frame, &id) {
                    match rec.outcome {
                        Some(outcome @ (NavOutcome::Committed | NavOutcome::Aborted)) => {
                            self.trace.push(TraceStep::Settled {
                                nav: id,
                                outcome,
                                at: Utc::now(),
                            });
                            // Give sibling subscribers (framenavigated and
                            // load listeners) a turn to observe the settle
                            // before the action itself resolves.
                            tokio::task::yield_now().await;
                            return Verdict::Settled(rec);
                        }
                        // Superseded: the replacing start is already queued
                        // on our receiver, keep draining.
                        _ => {}
                    }
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.trace.push(TraceStep::Cancelled { at: Utc::now() });
                    return Verdict::Cancelled;
                }
                received = self.rx.recv() => match received {
                    Ok(ev) => {
                        if ev.frame() != &self.frame {
                            continue;
                        }
                        if let NavEvent::Started { id, url, cross_process, .. } = ev {
                            self.adopt(id, Self::event_url(url.as_ref()), cross_process);
                        }
                        // Commit/abort/supersede transitions are picked up
                        // by the ledger check at the top of the loop.
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(target: "nav_arbiter", skipped, "wait window lagged behind the ledger");
                        if self.candidate.is_none() {
                            if let Some(pending) = self.tracker.current_pending(&self.frame) {
                                self.adopt(pending.id.clone(), pending.url_str(), pending.cross_process);
                            }
                        }
                    }
                    Err(RecvError::Closed) => {
                        self.trace.push(TraceStep::NoNavigation { at: Utc::now() });
                        return Verdict::NoNavigation;
                    }
                },
                _ = sleep_until(grace_deadline), if self.candidate.is_none() => {
                    self.trace.push(TraceStep::NoNavigation { at: Utc::now() });
                    return Verdict::NoNavigation;
                }
                _ = sleep_until(deadline) => {
                    self.trace.push(TraceStep::DeadlineExceeded { at: Utc::now() });
                    return Verdict::DeadlineExceeded;
                }
            }
        }
    }
}

impl Drop for WaitWindow {
    fn drop(&mut self) {
        if let Some(id) = self.candidate.take() {
            self.tracker.unpin(&self.frame, &id);
        }
    }
}
