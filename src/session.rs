use std::sync::Arc;

use tracing::info;

use action_executor::{ActionExecutor, ActionExecutorBuilder, ActionPolicy, InputPort};
use autowait_core_types::SessionId;
use nav_tracker::NavigationTracker;

use crate::config::EngineConfig;
use crate::page::Page;

/// One wired instance of the engine: a navigation ledger, an executor bound
/// to an input backend, and the policy both were built from. Pages opened on
/// the session share the ledger, so waits on one page never observe another
/// page's frames.
pub struct Session {
    id: SessionId,
    tracker: Arc<NavigationTracker>,
    executor: Arc<dyn ActionExecutor>,
    policy: ActionPolicy,
}

impl Session {
    pub fn new(config: EngineConfig, input: Arc<dyn InputPort>) -> Self {
        let tracker = NavigationTracker::new(config.tracker.clone());
        Self::with_tracker(config, tracker, input)
    }

    /// Wire against an existing ledger. The input backend usually reports
    /// navigations into the same ledger, so both sides need the one instance.
    pub fn with_tracker(
        config: EngineConfig,
        tracker: Arc<NavigationTracker>,
        input: Arc<dyn InputPort>,
    ) -> Self {
        let executor = ActionExecutorBuilder::new(config.policy.clone())
            .with_input(input)
            .with_tracker(Arc::clone(&tracker))
            .build();
        let id = SessionId::new();
        info!(target: "autowait", session = %id.0, "session opened");
        Self {
            id,
            tracker,
            executor,
            policy: config.policy,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn tracker(&self) -> &Arc<NavigationTracker> {
        &self.tracker
    }

    pub fn policy(&self) -> &ActionPolicy {
        &self.policy
    }

    /// Open a page with a fresh main frame.
    pub fn open_page(&self) -> Page {
        Page::open(
            self.id.clone(),
            Arc::clone(&self.tracker),
            Arc::clone(&self.executor),
            self.policy.clone(),
        )
    }
}
