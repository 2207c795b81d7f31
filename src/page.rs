use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use action_executor::{
    ActionExecutor, ActionKind, ActionOpt, ActionPolicy, ActionReport, ActionRequest, ExecCtx,
    PerformError,
};
use autowait_core_types::{
    ActionId, EngineError, FrameId, FrameRoute, LoadState, PageId, SessionId,
};
use nav_tracker::{NavEvent, NavigationTracker};

/// Caller-facing handle for one page's main frame.
///
/// Action methods go through the executor and therefore auto-wait; the
/// `wait_for_*` methods are composable waits reading the same ledger, so
/// they observe milestones recorded before the wait began.
pub struct Page {
    route: FrameRoute,
    tracker: Arc<NavigationTracker>,
    executor: Arc<dyn ActionExecutor>,
    policy: ActionPolicy,
    cancel: CancellationToken,
}

impl Page {
    pub(crate) fn open(
        session: SessionId,
        tracker: Arc<NavigationTracker>,
        executor: Arc<dyn ActionExecutor>,
        policy: ActionPolicy,
    ) -> Self {
        let route = FrameRoute::new(session, PageId::new(), FrameId::new());
        debug!(target: "autowait", %route, "page opened");
        Self {
            route,
            tracker,
            executor,
            policy,
            cancel: CancellationToken::new(),
        }
    }

    pub fn route(&self) -> &FrameRoute {
        &self.route
    }

    pub fn main_frame(&self) -> &FrameId {
        &self.route.frame
    }

    /// Abandon in-flight waits and forget the frame's ledger.
    pub fn close(&self) {
        self.cancel.cancel();
        self.tracker.drop_frame(&self.route.frame);
        debug!(target: "autowait", frame = %self.route.frame.0, "page closed");
    }

    async fn perform(&self, kind: ActionKind, opt: ActionOpt) -> Result<ActionReport, PerformError> {
        let deadline = Instant::now() + self.policy.timeout_for(&opt);
        let ctx = ExecCtx::new(
            ActionId::new(),
            self.route.clone(),
            deadline,
            self.cancel.child_token(),
        );
        self.executor
            .perform(ctx, ActionRequest::with_opt(kind, opt))
            .await
    }

    pub async fn click(&self, selector: &str) -> Result<ActionReport, PerformError> {
        self.click_with(selector, ActionOpt::default()).await
    }

    pub async fn click_with(
        &self,
        selector: &str,
        opt: ActionOpt,
    ) -> Result<ActionReport, PerformError> {
        self.perform(
            ActionKind::Click {
                selector: selector.to_string(),
            },
            opt,
        )
        .await
    }

    pub async fn dblclick(&self, selector: &str) -> Result<ActionReport, PerformError> {
        self.dblclick_with(selector, ActionOpt::default()).await
    }

    pub async fn dblclick_with(
        &self,
        selector: &str,
        opt: ActionOpt,
    ) -> Result<ActionReport, PerformError> {
        self.perform(
            ActionKind::Dblclick {
                selector: selector.to_string(),
            },
            opt,
        )
        .await
    }

    pub async fn fill(&self, selector: &str, text: &str) -> Result<ActionReport, PerformError> {
        self.perform(
            ActionKind::Fill {
                selector: selector.to_string(),
                text: text.to_string(),
            },
            ActionOpt::default(),
        )
        .await
    }

    pub async fn evaluate(&self, script: &str) -> Result<ActionReport, PerformError> {
        self.evaluate_with(script, ActionOpt::default()).await
    }

    pub async fn evaluate_with(
        &self,
        script: &str,
        opt: ActionOpt,
    ) -> Result<ActionReport, PerformError> {
        self.perform(
            ActionKind::Evaluate {
                script: script.to_string(),
            },
            opt,
        )
        .await
    }

    pub async fn goto(&self, url: &str) -> Result<ActionReport, PerformError> {
        self.goto_with(url, ActionOpt::default()).await
    }

    pub async fn goto_with(
        &self,
        url: &str,
        opt: ActionOpt,
    ) -> Result<ActionReport, PerformError> {
        self.perform(
            ActionKind::Goto {
                url: url.to_string(),
            },
            opt,
        )
        .await
    }

    /// Resolve once the current document reaches `state`, using the policy
    /// default deadline.
    pub async fn wait_for_load_state(&self, state: LoadState) -> Result<(), EngineError> {
        self.wait_for_load_state_within(state, self.default_timeout())
            .await
    }

    pub async fn wait_for_load_state_within(
        &self,
        state: LoadState,
        timeout: Duration,
    ) -> Result<(), EngineError> {
        if self
            .tracker
            .wait_for_load_state(&self.route.frame, state, timeout)
            .await
        {
            Ok(())
        } else {
            Err(EngineError::new(format!(
                "page.waitForLoadState: Timeout {}ms exceeded while waiting for \"{}\"",
                timeout.as_millis(),
                state
            )))
        }
    }

    /// Resolve on the next `framenavigated`/`domcontentloaded`/`load` event
    /// for this frame. Future events only.
    pub async fn wait_for_event(&self, event_name: &str) -> Result<NavEvent, EngineError> {
        self.wait_for_event_within(event_name, self.default_timeout())
            .await
    }

    pub async fn wait_for_event_within(
        &self,
        event_name: &str,
        timeout: Duration,
    ) -> Result<NavEvent, EngineError> {
        match self
            .tracker
            .wait_for_page_event(&self.route.frame, event_name, timeout)
            .await
        {
            Some(ev) => Ok(ev),
            None => Err(EngineError::new(format!(
                "page.waitForEvent: Timeout {}ms exceeded while waiting for \"{}\"",
                timeout.as_millis(),
                event_name
            ))),
        }
    }

    fn default_timeout(&self) -> Duration {
        self.policy.timeout_for(&ActionOpt::default())
    }
}
