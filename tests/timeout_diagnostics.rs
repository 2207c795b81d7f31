//! Deadline behavior and the rendered call log.
//!
//! Runs on a paused clock so the multi-second deadlines elapse instantly.

use std::time::Duration;

use autowait::sim::{Element, Route, Serve, SimHarness};
use autowait::{ActionOpt, EngineConfig, NavOutcome};

fn harness() -> SimHarness {
    SimHarness::new(EngineConfig::default())
}

fn short(timeout_ms: u64) -> ActionOpt {
    ActionOpt {
        timeout_ms: Some(timeout_ms),
        ..ActionOpt::default()
    }
}

#[tokio::test(start_paused = true)]
async fn hung_navigation_times_out_with_the_call_log() {
    let harness = harness();
    let page = harness.session.open_page();
    harness.browser.add_element(
        "a#slow",
        Element::Anchor {
            href: "slow.html".to_string(),
        },
    );
    harness.browser.set_route(
        "slow.html",
        Route {
            label: Some("route".to_string()),
            serve: Serve::Hang,
        },
    );

    let err = page
        .click_with("a#slow", short(5_000))
        .await
        .expect_err("deadline must pass");

    assert!(err.is_timeout());
    let message = err.to_string();
    assert!(
        message.contains("page.click: Timeout 5000ms exceeded"),
        "{message}"
    );
    assert!(
        message.contains("waiting for scheduled navigations to finish"),
        "{message}"
    );
    assert!(
        message.contains("navigated to \"http://sim.test/slow.html\""),
        "{message}"
    );
    // The server received the request; it just never answered.
    assert_eq!(harness.recorder.joined(), "route");
}

#[tokio::test(start_paused = true)]
async fn timeout_leaves_the_pending_navigation_intact() {
    let harness = harness();
    let page = harness.session.open_page();
    harness.browser.add_element(
        "a#slow",
        Element::Anchor {
            href: "slow.html".to_string(),
        },
    );
    harness.browser.set_route("slow.html", Route::hanging());

    page.click_with("a#slow", short(1_000))
        .await
        .expect_err("deadline must pass");

    let tracker = harness.session.tracker();
    let pending = tracker
        .current_pending(page.main_frame())
        .expect("attempt survives the timeout");
    assert!(pending.outcome.is_none());

    // A late answer from the server still settles the same attempt.
    tracker.navigation_committed(page.main_frame(), &pending.id);
    let record = tracker
        .record(page.main_frame(), &pending.id)
        .expect("record kept");
    assert_eq!(record.outcome, Some(NavOutcome::Committed));
}

#[tokio::test(start_paused = true)]
async fn call_log_marks_superseded_candidates() {
    const SCRIPT: &str = "location.href = 'one.html'; location.href = 'two.html'";

    let harness = harness();
    let page = harness.session.open_page();
    harness.browser.register_script(SCRIPT, &["one.html", "two.html"]);
    harness.browser.set_route("one.html", Route::hanging());
    harness.browser.set_route("two.html", Route::hanging());

    let err = page
        .evaluate_with(SCRIPT, short(5_000))
        .await
        .expect_err("deadline must pass");

    let message = err.to_string();
    assert!(
        message.contains("page.evaluate: Timeout 5000ms exceeded"),
        "{message}"
    );
    assert!(
        message.contains("navigated to \"http://sim.test/one.html\" (superseded)"),
        "{message}"
    );
    assert!(
        message.contains("navigated to \"http://sim.test/two.html\""),
        "{message}"
    );
    assert!(
        !message.contains("navigated to \"http://sim.test/two.html\" (superseded)"),
        "the awaited candidate is not marked: {message}"
    );
}

#[tokio::test(start_paused = true)]
async fn call_log_annotates_cross_process_candidates() {
    let harness = harness();
    let page = harness.session.open_page();
    harness.browser.add_element(
        "a#away",
        Element::Anchor {
            href: "http://cross.sim.test/away.html".to_string(),
        },
    );
    harness
        .browser
        .set_route("http://cross.sim.test/away.html", Route::hanging());

    let err = page
        .click_with("a#away", short(3_000))
        .await
        .expect_err("deadline must pass");

    assert!(
        err.to_string()
            .contains("navigated to \"http://cross.sim.test/away.html\" (cross-process)"),
        "{err}"
    );
}

#[tokio::test(start_paused = true)]
async fn stalled_dispatch_still_renders_the_scheduled_navigation() {
    let harness = harness();
    let page = harness.session.open_page();
    harness.browser.add_element(
        "a#slow",
        Element::Anchor {
            href: "slow.html".to_string(),
        },
    );
    harness.browser.set_route("slow.html", Route::hanging());
    // Input lands, then the transport stalls past the deadline.
    harness
        .browser
        .set_post_dispatch_delay(Duration::from_secs(7));

    let err = page
        .click_with("a#slow", short(5_000))
        .await
        .expect_err("deadline must pass");

    assert!(err.is_timeout());
    assert!(
        err.to_string()
            .contains("navigated to \"http://sim.test/slow.html\""),
        "{err}"
    );
}
