use std::time::Duration;

use async_trait::async_trait;

use autowait_core_types::{EngineError, FrameRoute};

use crate::model::ActionKind;

/// The excluded low-level input layer: actionability checks, cursor
/// movement, event delivery, script evaluation. `dispatch` returns at the
/// action's local completion (the input was delivered, the script ran);
/// whatever navigation it triggers is reported to the tracker out of band.
///
/// Errors are surfaced to the caller unchanged.
#[async_trait]
pub trait InputPort: Send + Sync {
    async fn dispatch(
        &self,
        route: &FrameRoute,
        kind: &ActionKind,
        budget: Duration,
    ) -> Result<(), EngineError>;
}
