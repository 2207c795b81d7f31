use std::sync::Arc;

use async_trait::async_trait;

use nav_tracker::NavigationTracker;

use crate::errors::PerformError;
use crate::model::{ActionReport, ActionRequest, ExecCtx};
use crate::policy::ActionPolicy;
use crate::ports::InputPort;
use crate::runner::{execute, RuntimeDeps};

/// Entry point for performing one action with auto-waiting.
///
/// The caller mints the [`ExecCtx`], deriving its deadline from the same
/// policy the executor was built with so the enforced budget and the one
/// rendered into timeout messages agree.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn perform(
        &self,
        ctx: ExecCtx,
        request: ActionRequest,
    ) -> Result<ActionReport, PerformError>;
}

pub struct ActionExecutorBuilder {
    policy: ActionPolicy,
    input: Option<Arc<dyn InputPort>>,
    tracker: Option<Arc<NavigationTracker>>,
}

impl ActionExecutorBuilder {
    pub fn new(policy: ActionPolicy) -> Self {
        Self {
            policy,
            input: None,
            tracker: None,
        }
    }

    pub fn with_input(mut self, port: Arc<dyn InputPort>) -> Self {
        self.input = Some(port);
        self
    }

    pub fn with_tracker(mut self, tracker: Arc<NavigationTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn build(self) -> Arc<dyn ActionExecutor> {
        Arc::new(ActionExecutorImpl {
            policy: self.policy,
            input: self.input.expect("input port is required"),
            tracker: self.tracker.expect("navigation tracker is required"),
        })
    }
}

pub struct ActionExecutorImpl {
    policy: ActionPolicy,
    input: Arc<dyn InputPort>,
    tracker: Arc<NavigationTracker>,
}

#[async_trait]
impl ActionExecutor for ActionExecutorImpl {
    async fn perform(
        &self,
        ctx: ExecCtx,
        request: ActionRequest,
    ) -> Result<ActionReport, PerformError> {
        if ctx.cancel.is_cancelled() {
            return Err(PerformError::Cancelled);
        }
        let runtime = RuntimeDeps {
            input: self.input.as_ref(),
            tracker: &self.tracker,
            policy: &self.policy,
        };
        execute(&ctx, request, runtime).await
    }
}
