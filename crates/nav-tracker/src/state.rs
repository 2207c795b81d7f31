use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use url::Url;

use autowait_core_types::{FrameId, LoadState, NavigationId};
use autowait_event_bus::{EventBus, InMemoryBus};

use crate::events::{timestamp_now, NavEvent};
use crate::metrics;
use crate::model::{NavOutcome, NavigationRecord, TrackerConfig};

struct RecordSlot {
    record: NavigationRecord,
    /// Open wait windows holding this record; evictable only at zero.
    pins: u32,
}

#[derive(Default)]
struct FrameLedger {
    /// Detection order, oldest first.
    records: VecDeque<RecordSlot>,
    pending: Option<NavigationId>,
}

impl FrameLedger {
    fn slot_mut(&mut self, id: &NavigationId) -> Option<&mut RecordSlot> {
        self.records.iter_mut().find(|slot| &slot.record.id == id)
    }

    fn slot(&self, id: &NavigationId) -> Option<&RecordSlot> {
        self.records.iter().find(|slot| &slot.record.id == id)
    }
}

/// The single authoritative writer of navigation state.
///
/// All mutation for one frame happens under that frame's ledger lock and
/// every transition is published on the bus before the lock is released, so
/// subscribers observe per-frame transitions in exactly the order they were
/// applied. Frames are independent of each other.
pub struct NavigationTracker {
    frames: DashMap<FrameId, Arc<Mutex<FrameLedger>>>,
    bus: Arc<InMemoryBus<NavEvent>>,
    config: TrackerConfig,
}

impl NavigationTracker {
    pub fn new(config: TrackerConfig) -> Arc<Self> {
        let bus = InMemoryBus::new(config.bus_capacity);
        Arc::new(Self {
            frames: DashMap::new(),
            bus,
            config,
        })
    }

    pub fn with_defaults() -> Arc<Self> {
        Self::new(TrackerConfig::default())
    }

    /// Subscribe to ledger transitions. Subscribe before triggering the
    /// action that may navigate; the channel only buffers from that point.
    pub fn subscribe(&self) -> broadcast::Receiver<NavEvent> {
        self.bus.subscribe()
    }

    fn ledger(&self, frame: &FrameId) -> Arc<Mutex<FrameLedger>> {
        self.frames
            .entry(frame.clone())
            .or_insert_with(|| Arc::new(Mutex::new(FrameLedger::default())))
            .value()
            .clone()
    }

    fn ledger_if_present(&self, frame: &FrameId) -> Option<Arc<Mutex<FrameLedger>>> {
        self.frames.get(frame).map(|entry| entry.value().clone())
    }

    /// A navigation attempt has begun on `frame`. Any prior pending attempt
    /// on the same frame is superseded immediately; the new record becomes
    /// the frame's only pending one.
    pub fn navigation_started(
        &self,
        frame: &FrameId,
        id: NavigationId,
        url: Option<Url>,
        cross_process: bool,
    ) {
        let ledger = self.ledger(frame);
        let mut guard = ledger.lock();

        if guard.slot(&id).is_some() {
            warn!(target: "nav_tracker", frame = %frame.0, nav = %id.0, "duplicate navigation start ignored");
            return;
        }

        if let Some(prev) = guard.pending.take() {
            if let Some(slot) = guard.slot_mut(&prev) {
                slot.record.outcome = Some(NavOutcome::Superseded);
                metrics::record_superseded();
                debug!(
                    target: "nav_tracker",
                    frame = %frame.0,
                    nav = %prev.0,
                    by = %id.0,
                    "pending navigation superseded"
                );
                self.bus.publish_now(NavEvent::Superseded {
                    frame: frame.clone(),
                    id: prev,
                    by: id.clone(),
                    ts: timestamp_now(),
                });
            }
        }

        let record = NavigationRecord::open(id.clone(), frame.clone(), url.clone(), cross_process);
        guard.records.push_back(RecordSlot { record, pins: 0 });
        guard.pending = Some(id.clone());
        metrics::record_started();
        debug!(
            target: "nav_tracker",
            frame = %frame.0,
            nav = %id.0,
            url = url.as_ref().map(|u| u.as_str()).unwrap_or("<unknown>"),
            cross_process,
            "navigation started"
        );
        self.bus.publish_now(NavEvent::Started {
            frame: frame.clone(),
            id,
            url,
            cross_process,
            ts: timestamp_now(),
        });
        self.evict_locked(frame, &mut guard);
    }

    /// The document for attempt `id` has committed. A commit for an attempt
    /// that was already superseded or aborted is stale and ignored; it never
    /// resurrects the record.
    pub fn navigation_committed(&self, frame: &FrameId, id: &NavigationId) {
        let Some(ledger) = self.ledger_if_present(frame) else {
            debug!(target: "nav_tracker", frame = %frame.0, nav = %id.0, "commit for unknown frame ignored");
            return;
        };
        let mut guard = ledger.lock();
        let was_pending = guard.pending.as_ref() == Some(id);

        let url = match guard.slot_mut(id) {
            None => {
                debug!(target: "nav_tracker", frame = %frame.0, nav = %id.0, "commit for unknown navigation ignored");
                return;
            }
            Some(slot) if slot.record.is_settled() => {
                debug!(
                    target: "nav_tracker",
                    frame = %frame.0,
                    nav = %id.0,
                    outcome = ?slot.record.outcome,
                    "stale commit ignored"
                );
                return;
            }
            Some(slot) => {
                slot.record.outcome = Some(NavOutcome::Committed);
                slot.record.committed_at = Some(Utc::now());
                slot.record.url.clone()
            }
        };

        if was_pending {
            guard.pending = None;
        }
        metrics::record_committed();
        debug!(target: "nav_tracker", frame = %frame.0, nav = %id.0, "navigation committed");
        self.bus.publish_now(NavEvent::Committed {
            frame: frame.clone(),
            id: id.clone(),
            url,
            ts: timestamp_now(),
        });
        self.evict_locked(frame, &mut guard);
    }

    /// Attempt `id` was abandoned by the browser. Settles the record as
    /// Aborted; stale aborts are ignored the same way stale commits are.
    pub fn navigation_aborted(&self, frame: &FrameId, id: &NavigationId, reason: impl Into<String>) {
        let Some(ledger) = self.ledger_if_present(frame) else {
            debug!(target: "nav_tracker", frame = %frame.0, nav = %id.0, "abort for unknown frame ignored");
            return;
        };
        let mut guard = ledger.lock();
        let was_pending = guard.pending.as_ref() == Some(id);
        let reason = reason.into();

        match guard.slot_mut(id) {
            None => {
                debug!(target: "nav_tracker", frame = %frame.0, nav = %id.0, "abort for unknown navigation ignored");
                return;
            }
            Some(slot) if slot.record.is_settled() => {
                debug!(target: "nav_tracker", frame = %frame.0, nav = %id.0, "stale abort ignored");
                return;
            }
            Some(slot) => {
                slot.record.outcome = Some(NavOutcome::Aborted);
                slot.record.abort_reason = Some(reason.clone());
            }
        }

        if was_pending {
            guard.pending = None;
        }
        metrics::record_aborted();
        debug!(target: "nav_tracker", frame = %frame.0, nav = %id.0, %reason, "navigation aborted");
        self.bus.publish_now(NavEvent::Aborted {
            frame: frame.clone(),
            id: id.clone(),
            reason,
            ts: timestamp_now(),
        });
        self.evict_locked(frame, &mut guard);
    }

    /// The committed document for attempt `id` reached a load milestone.
    /// Each milestone is recorded and surfaced once per document.
    pub fn lifecycle_reached(&self, frame: &FrameId, id: &NavigationId, state: LoadState) {
        let Some(ledger) = self.ledger_if_present(frame) else {
            debug!(target: "nav_tracker", frame = %frame.0, nav = %id.0, "lifecycle for unknown frame ignored");
            return;
        };
        let mut guard = ledger.lock();
        let newly_reached = match guard.slot_mut(id) {
            None => {
                debug!(target: "nav_tracker", frame = %frame.0, nav = %id.0, "lifecycle for unknown navigation ignored");
                return;
            }
            Some(slot) => {
                if slot.record.outcome != Some(NavOutcome::Committed) {
                    debug!(
                        target: "nav_tracker",
                        frame = %frame.0,
                        nav = %id.0,
                        state = %state,
                        "lifecycle before commit ignored"
                    );
                    return;
                }
                if slot.record.reached(state) {
                    false
                } else {
                    let now = Utc::now();
                    match state {
                        LoadState::DomContentLoaded => slot.record.dom_content_loaded_at = Some(now),
                        LoadState::Load => slot.record.load_at = Some(now),
                    }
                    true
                }
            }
        };

        if newly_reached {
            metrics::record_lifecycle();
            debug!(target: "nav_tracker", frame = %frame.0, nav = %id.0, state = %state, "load state reached");
            self.bus.publish_now(NavEvent::LifecycleReached {
                frame: frame.clone(),
                id: id.clone(),
                state,
                ts: timestamp_now(),
            });
        }
    }

    /// Read-only snapshot of the frame's pending attempt, if any.
    pub fn current_pending(&self, frame: &FrameId) -> Option<NavigationRecord> {
        let ledger = self.ledger_if_present(frame)?;
        let guard = ledger.lock();
        let id = guard.pending.clone()?;
        guard.slot(&id).map(|slot| slot.record.clone())
    }

    /// Read-only snapshot of one attempt.
    pub fn record(&self, frame: &FrameId, id: &NavigationId) -> Option<NavigationRecord> {
        let ledger = self.ledger_if_present(frame)?;
        let guard = ledger.lock();
        guard.slot(id).map(|slot| slot.record.clone())
    }

    /// All retained attempts for the frame in detection order.
    pub fn history(&self, frame: &FrameId) -> Vec<NavigationRecord> {
        match self.ledger_if_present(frame) {
            None => Vec::new(),
            Some(ledger) => {
                let guard = ledger.lock();
                guard.records.iter().map(|slot| slot.record.clone()).collect()
            }
        }
    }

    /// Whether the frame's current document already reached `state`. Looks
    /// at the most recently committed record, so a newer pending attempt
    /// does not mask the state of the document still on screen.
    pub fn load_reached(&self, frame: &FrameId, state: LoadState) -> bool {
        let Some(ledger) = self.ledger_if_present(frame) else {
            return false;
        };
        let guard = ledger.lock();
        guard
            .records
            .iter()
            .rev()
            .find(|slot| slot.record.outcome == Some(NavOutcome::Committed))
            .map(|slot| slot.record.reached(state))
            .unwrap_or(false)
    }

    /// Keep `id` out of eviction while a wait window references it.
    pub fn pin(&self, frame: &FrameId, id: &NavigationId) -> bool {
        let Some(ledger) = self.ledger_if_present(frame) else {
            return false;
        };
        let mut guard = ledger.lock();
        match guard.slot_mut(id) {
            Some(slot) => {
                slot.pins += 1;
                true
            }
            None => false,
        }
    }

    pub fn unpin(&self, frame: &FrameId, id: &NavigationId) {
        let Some(ledger) = self.ledger_if_present(frame) else {
            return;
        };
        let mut guard = ledger.lock();
        if let Some(slot) = guard.slot_mut(id) {
            slot.pins = slot.pins.saturating_sub(1);
        }
        self.evict_locked(frame, &mut guard);
    }

    /// Forget a frame entirely (frame detached or page closed).
    pub fn drop_frame(&self, frame: &FrameId) {
        if self.frames.remove(frame).is_some() {
            debug!(target: "nav_tracker", frame = %frame.0, "frame ledger dropped");
        }
    }

    /// Evict settled records beyond the retention cap, oldest first. The
    /// newest `retention` settled records, the pending record, and pinned
    /// records are never evicted.
    fn evict_locked(&self, frame: &FrameId, guard: &mut FrameLedger) {
        let retention = self.config.retention;
        let settled_idxs: Vec<usize> = guard
            .records
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.record.is_settled())
            .map(|(idx, _)| idx)
            .collect();
        if settled_idxs.len() <= retention {
            return;
        }
        let excess = settled_idxs.len() - retention;
        // Walk candidates back to front so removals keep indices valid.
        for &idx in settled_idxs[..excess].iter().rev() {
            if guard.records[idx].pins > 0 {
                continue;
            }
            if let Some(slot) = guard.records.remove(idx) {
                metrics::record_evicted();
                debug!(
                    target: "nav_tracker",
                    frame = %frame.0,
                    nav = %slot.record.id.0,
                    "settled navigation record evicted"
                );
            }
        }
    }
}
