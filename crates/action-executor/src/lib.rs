//! Orchestration of a single user action with auto-waiting.
//!
//! `perform` dispatches the input through a port, watches the frame for a
//! navigation the action may have caused, and gates the action's completion
//! on that navigation settling. An aborted navigation is still a successful
//! action; only an unsettled wait at the deadline turns into an error, and
//! that error carries the full call log of what was being awaited.

pub mod api;
pub mod errors;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod ports;
pub mod report;

mod runner;

pub use api::{ActionExecutor, ActionExecutorBuilder};
pub use errors::PerformError;
pub use model::{
    remaining_deadline, ActionKind, ActionOpt, ActionReport, ActionRequest, ExecCtx,
    NavigationSummary,
};
pub use policy::ActionPolicy;
pub use ports::InputPort;
