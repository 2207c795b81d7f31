//! Autowait library
//!
//! Exposes the session/page facade and the scripted sim for integration testing

pub mod config;
pub mod page;
pub mod session;
pub mod sim;

// Re-export commonly used types for external use
pub use config::EngineConfig;
pub use page::Page;
pub use session::Session;

pub use action_executor::{ActionOpt, ActionReport, NavigationSummary, PerformError};
pub use autowait_core_types::{EngineError, LoadState};
pub use nav_tracker::{NavEvent, NavOutcome, NavigationTracker};
