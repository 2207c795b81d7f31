use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use autowait_core_types::{FrameId, LoadState};

use crate::events::NavEvent;
use crate::state::NavigationTracker;

/// Waits layered on the ledger. These are independent of the auto-wait path:
/// a caller can chain them after an action, and they observe milestones that
/// were recorded before the caller started listening.
impl NavigationTracker {
    /// Resolve once the frame's current document has reached `state`.
    /// Returns false if the deadline passes first. Milestones already in the
    /// ledger resolve immediately.
    pub async fn wait_for_load_state(
        &self,
        frame: &FrameId,
        state: LoadState,
        timeout: Duration,
    ) -> bool {
        // Subscribe before reading the ledger so a milestone landing between
        // the two is seen either way.
        let mut rx = self.subscribe();
        if self.load_reached(frame, state) {
            return true;
        }
        let deadline = Instant::now() + timeout;
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => return false,
                received = rx.recv() => match received {
                    Ok(NavEvent::LifecycleReached { frame: f, state: s, .. })
                        if &f == frame && s == state =>
                    {
                        return true;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(target: "nav_tracker", skipped, "load-state waiter lagged, re-reading ledger");
                        if self.load_reached(frame, state) {
                            return true;
                        }
                    }
                    Err(RecvError::Closed) => return self.load_reached(frame, state),
                },
            }
        }
    }

    /// Resolve on the next page-level event (`framenavigated`, `load`,
    /// `domcontentloaded`) for the frame. Future events only; returns the
    /// matching transition or None on deadline.
    pub async fn wait_for_page_event(
        &self,
        frame: &FrameId,
        event_name: &str,
        timeout: Duration,
    ) -> Option<NavEvent> {
        let mut rx = self.subscribe();
        let deadline = Instant::now() + timeout;
        loop {
            tokio::select! {
                _ = sleep_until(deadline) => return None,
                received = rx.recv() => match received {
                    Ok(ev) => {
                        if ev.frame() == frame && ev.page_event_name() == Some(event_name) {
                            return Some(ev);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(target: "nav_tracker", skipped, "page-event waiter lagged");
                    }
                    Err(RecvError::Closed) => return None,
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use url::Url;

    use autowait_core_types::NavigationId;

    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn late_listener_sees_recorded_load_state() {
        let tracker = NavigationTracker::with_defaults();
        let frame = FrameId::new();
        let id = NavigationId::new();

        tracker.navigation_started(&frame, id.clone(), Some(url("http://x/empty.html")), false);
        tracker.navigation_committed(&frame, &id);
        tracker.lifecycle_reached(&frame, &id, LoadState::Load);

        // The wait starts long after the load event fired.
        assert!(
            tracker
                .wait_for_load_state(&frame, LoadState::Load, Duration::from_millis(50))
                .await
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn load_state_wait_resolves_on_future_event() {
        let tracker = NavigationTracker::with_defaults();
        let frame = FrameId::new();
        let id = NavigationId::new();
        tracker.navigation_started(&frame, id.clone(), Some(url("http://x/empty.html")), false);

        let bg = {
            let tracker = Arc::clone(&tracker);
            let frame = frame.clone();
            let id = id.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                tracker.navigation_committed(&frame, &id);
                tracker.lifecycle_reached(&frame, &id, LoadState::Load);
            })
        };

        assert!(
            tracker
                .wait_for_load_state(&frame, LoadState::Load, Duration::from_secs(2))
                .await
        );
        bg.await.unwrap();
    }

    #[tokio::test]
    async fn load_state_wait_times_out_without_commit() {
        let tracker = NavigationTracker::with_defaults();
        let frame = FrameId::new();
        tracker.navigation_started(&frame, NavigationId::new(), Some(url("http://x/hang")), false);
        assert!(
            !tracker
                .wait_for_load_state(&frame, LoadState::Load, Duration::from_millis(30))
                .await
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn page_event_wait_matches_commit() {
        let tracker = NavigationTracker::with_defaults();
        let frame = FrameId::new();
        let id = NavigationId::new();

        let waiter = {
            let tracker = Arc::clone(&tracker);
            let frame = frame.clone();
            tokio::spawn(async move {
                tracker
                    .wait_for_page_event(&frame, "framenavigated", Duration::from_secs(2))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        tracker.navigation_started(&frame, id.clone(), Some(url("http://x/a")), false);
        tracker.navigation_committed(&frame, &id);

        let ev = waiter.await.unwrap().expect("commit observed");
        assert!(matches!(ev, NavEvent::Committed { .. }));

        // Events from another frame never match.
        let other = FrameId::new();
        assert!(
            tracker
                .wait_for_page_event(&other, "framenavigated", Duration::from_millis(30))
                .await
                .is_none()
        );
    }
}
