//! Race arbitration between an action and the navigations it may cause.
//!
//! A [`WaitWindow`] opens on one frame before the action's input is
//! dispatched, watches the tracker's transition stream, and resolves to a
//! single verdict: no navigation happened, one navigation settled, the
//! deadline passed, or the caller cancelled. When several navigations start
//! in quick succession the newest one always becomes the awaited candidate;
//! superseded attempts stay in the window's trace for diagnostics but are
//! never awaited.

pub mod trace;
pub mod window;

pub use trace::{CandidateNote, TraceStep, WaitTrace};
pub use window::{ArbiterConfig, Verdict, WaitWindow, DEFAULT_GRACE_MS};
