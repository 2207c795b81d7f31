//! Load-state holds, page-event waits, and form submission flows.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use autowait::sim::{Element, FormMethod, Route, Serve, SimHarness};
use autowait::{EngineConfig, LoadState, NavEvent, NavOutcome, Page};

fn harness() -> SimHarness {
    SimHarness::new(EngineConfig::default())
}

fn listen(
    harness: &SimHarness,
    page: &Page,
    event: &'static str,
    label: &'static str,
) -> JoinHandle<()> {
    let tracker = Arc::clone(harness.session.tracker());
    let frame = page.main_frame().clone();
    let recorder = harness.recorder.clone();
    tokio::spawn(async move {
        if tracker
            .wait_for_page_event(&frame, event, Duration::from_secs(5))
            .await
            .is_some()
        {
            recorder.push(label);
        }
    })
}

#[tokio::test]
async fn click_holds_until_the_load_milestone() {
    let harness = harness();
    let page = harness.session.open_page();
    harness.browser.add_element(
        "a#load",
        Element::Anchor {
            href: "page.html".to_string(),
        },
    );
    harness.browser.set_route(
        "page.html",
        Route::committing_after("route", Duration::from_millis(25)),
    );

    let listener = listen(&harness, &page, "load", "load");
    tokio::task::yield_now().await;

    let report = page.click("a#load").await.expect("click resolves");
    assert!(report.ok);
    page.wait_for_load_state(LoadState::Load)
        .await
        .expect("load milestone reached");
    harness.recorder.push("clickload");
    listener.await.expect("listener joins");

    assert_eq!(harness.recorder.joined(), "route|load|clickload");
}

#[tokio::test]
async fn wait_for_event_returns_the_commit() {
    let harness = harness();
    let page = harness.session.open_page();

    // Subscription first, navigation second, on the same task.
    let (event, report) = tokio::join!(
        page.wait_for_event("framenavigated"),
        page.goto("empty.html"),
    );

    let event = event.expect("framenavigated fires");
    let report = report.expect("goto resolves");
    match event {
        NavEvent::Committed { id, url, .. } => {
            let url = url.expect("sim navigations carry a url");
            assert_eq!(url.as_str(), "http://sim.test/empty.html");
            assert_eq!(id, report.navigation.expect("goto synchronized").nav);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn wait_for_event_only_sees_future_events() {
    let harness = harness();
    let page = harness.session.open_page();

    page.goto("empty.html").await.expect("goto resolves");

    let err = page
        .wait_for_event_within("framenavigated", Duration::from_millis(100))
        .await
        .expect_err("no further navigation happens");
    assert!(
        err.to_string()
            .contains("page.waitForEvent: Timeout 100ms exceeded"),
        "{err}"
    );
}

#[tokio::test(start_paused = true)]
async fn load_state_wait_times_out_when_never_reached() {
    let harness = harness();
    let page = harness.session.open_page();
    harness.browser.set_route(
        "partial.html",
        Route {
            label: None,
            serve: Serve::Commit {
                after: Duration::ZERO,
                reach: vec![LoadState::DomContentLoaded],
            },
        },
    );

    page.goto("partial.html").await.expect("goto resolves");

    page.wait_for_load_state_within(LoadState::DomContentLoaded, Duration::from_millis(100))
        .await
        .expect("domcontentloaded was reached");

    let err = page
        .wait_for_load_state_within(LoadState::Load, Duration::from_millis(100))
        .await
        .expect_err("load never fires");
    assert!(
        err.to_string()
            .contains("page.waitForLoadState: Timeout 100ms exceeded while waiting for \"load\""),
        "{err}"
    );
}

#[tokio::test]
async fn get_form_submit_serializes_the_query() {
    let harness = harness();
    let page = harness.session.open_page();
    harness.browser.add_element("input#q", Element::Input);
    harness.browser.add_element(
        "button#send",
        Element::Submit {
            method: FormMethod::Get,
            action: "search.html".to_string(),
            fields: vec![("q".to_string(), "input#q".to_string())],
        },
    );
    harness
        .browser
        .set_route("search.html?q=rust", Route::labelled("route"));

    page.fill("input#q", "rust").await.expect("fill resolves");

    let listener = listen(&harness, &page, "framenavigated", "navigated");
    tokio::task::yield_now().await;

    let report = page.click("button#send").await.expect("submit resolves");
    harness.recorder.push("click");
    listener.await.expect("listener joins");

    assert_eq!(harness.recorder.joined(), "route|navigated|click");
    let nav = report.navigation.expect("submit synchronized");
    assert_eq!(nav.url, "http://sim.test/search.html?q=rust");
}

#[tokio::test]
async fn post_form_navigates_to_the_action_url() {
    let harness = harness();
    let page = harness.session.open_page();
    harness.browser.add_element(
        "button#send",
        Element::Submit {
            method: FormMethod::Post,
            action: "post.html".to_string(),
            fields: Vec::new(),
        },
    );
    harness.browser.set_route("post.html", Route::labelled("route"));

    let report = page.click("button#send").await.expect("submit resolves");

    let nav = report.navigation.expect("submit synchronized");
    assert_eq!(nav.url, "http://sim.test/post.html");
    assert_eq!(nav.outcome, NavOutcome::Committed);
}

#[tokio::test]
async fn fill_alone_causes_no_navigation() {
    let harness = harness();
    let page = harness.session.open_page();
    harness.browser.add_element("input#q", Element::Input);

    let report = page.fill("input#q", "rust").await.expect("fill resolves");

    assert!(report.ok);
    assert!(report.waited);
    assert!(report.navigation.is_none());
}

#[tokio::test]
async fn fill_requires_a_fillable_element() {
    let harness = harness();
    let page = harness.session.open_page();
    harness.browser.add_element(
        "a#link",
        Element::Anchor {
            href: "empty.html".to_string(),
        },
    );

    let err = page
        .fill("a#link", "rust")
        .await
        .expect_err("anchors cannot be filled");
    assert!(
        err.to_string().contains("element \"a#link\" is not fillable"),
        "{err}"
    );
}

#[tokio::test]
async fn goto_following_click_supersedes_the_form_navigation() {
    let harness = harness();
    let page = harness.session.open_page();
    harness.browser.add_element("input#user", Element::Input);
    harness.browser.add_element(
        "input#login",
        Element::Submit {
            method: FormMethod::Get,
            action: "login.html".to_string(),
            fields: vec![("user".to_string(), "input#user".to_string())],
        },
    );
    // The form's server never answers; the goto's does.
    harness.browser.set_route(
        "login.html?user=admin",
        Route {
            label: Some("login".to_string()),
            serve: Serve::Hang,
        },
    );
    harness
        .browser
        .set_route("empty.html", Route::labelled("route"));

    page.fill("input#user", "admin").await.expect("fill resolves");

    // The submit's navigation is still in flight when the goto lands.
    let (click, goto) = tokio::join!(page.click("input#login"), page.goto("empty.html"));

    let click = click.expect("click resolves");
    let goto = goto.expect("goto resolves");
    let click_nav = click.navigation.expect("click synchronized");
    let goto_nav = goto.navigation.expect("goto synchronized");
    assert_eq!(goto_nav.url, "http://sim.test/empty.html");
    assert_eq!(goto_nav.outcome, NavOutcome::Committed);
    // Both waiters settle on the newer navigation.
    assert_eq!(click_nav.nav, goto_nav.nav);

    let history = harness.session.tracker().history(page.main_frame());
    let login = history
        .iter()
        .find(|rec| rec.url_str() == "http://sim.test/login.html?user=admin")
        .expect("form navigation recorded");
    assert_eq!(login.outcome, Some(NavOutcome::Superseded));
    // The superseded request was never served.
    assert_eq!(harness.recorder.joined(), "route");
}

#[tokio::test]
async fn goto_synchronizes_with_the_commit() {
    let harness = harness();
    let page = harness.session.open_page();

    let report = page.goto("empty.html").await.expect("goto resolves");

    let nav = report.navigation.expect("goto synchronized");
    assert_eq!(nav.url, "http://sim.test/empty.html");
    assert_eq!(nav.outcome, NavOutcome::Committed);
    // The default route reaches load immediately.
    page.wait_for_load_state(LoadState::Load)
        .await
        .expect("load reached");
}
