//! Per-frame navigation ledger.
//!
//! The tracker is the single authoritative writer for navigation state: it
//! records every navigation attempt the moment the transport reports it,
//! keeps at most one pending attempt per frame (a newer start supersedes the
//! older one immediately), freezes each record's outcome once settled, and
//! publishes every transition on a broadcast bus in the order it happened.
//! Everything else in the engine (race arbitration, load-state waits, page
//! events) is a read-only subscriber of this ledger.

pub mod events;
pub mod metrics;
pub mod model;
pub mod state;
pub mod wait;

pub use events::NavEvent;
pub use model::{NavOutcome, NavigationRecord, TrackerConfig};
pub use state::NavigationTracker;
