//! Renders the timeout error message with its call log.

use std::fmt::Write as _;
use std::time::Duration;

use nav_arbiter::WaitTrace;

/// Builds `page.{name}: Timeout {ms}ms exceeded.` plus a call log listing
/// every candidate the window adopted, oldest first. A race that replaced
/// the navigation is visible in the error itself: earlier candidates carry
/// a `(superseded)` suffix, cross-document candidates `(cross-process)`.
pub fn render_timeout(action_name: &str, timeout: Duration, trace: &WaitTrace) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "page.{}: Timeout {}ms exceeded.\nCall log:\n  - waiting for scheduled navigations to finish",
        action_name,
        timeout.as_millis()
    );
    let candidates = trace.candidates();
    let last = candidates.len().saturating_sub(1);
    for (idx, note) in candidates.iter().enumerate() {
        let _ = write!(out, "\n  - navigated to \"{}\"", note.url);
        if note.cross_process {
            out.push_str(" (cross-process)");
        }
        if idx < last {
            out.push_str(" (superseded)");
        }
    }
    out
}
