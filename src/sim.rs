//! Scripted browser double for tests and the demo binary.
//!
//! `SimBrowser` plays both excluded collaborators at once: the input
//! dispatcher (as an [`InputPort`]) and the navigation source feeding the
//! ledger. Pages are described as selector-keyed elements, destinations as
//! routes that commit after a delay, hang forever, or abort; a shared
//! [`Recorder`] collects `route`/`navigated`/`click`-style labels so tests
//! can assert externally observable ordering.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;
use url::Url;

use action_executor::{ActionKind, InputPort};
use autowait_core_types::{EngineError, FrameId, FrameRoute, LoadState, NavigationId};
use nav_tracker::{NavOutcome, NavigationTracker};

use crate::config::EngineConfig;
use crate::session::Session;

/// Ordered label sink shared between the sim and the test body.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, label: impl Into<String>) {
        self.0.lock().push(label.into());
    }

    pub fn labels(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// `a|b|c` form used by the ordering assertions.
    pub fn joined(&self) -> String {
        self.labels().join("|")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FormMethod {
    Get,
    Post,
}

/// Page content, one entry per selector.
#[derive(Clone, Debug)]
pub enum Element {
    /// Navigates to `href` on click.
    Anchor { href: String },
    /// `javascript:` pseudo-link; runs script, never navigates.
    JsLink,
    /// Text input targeted by `fill`.
    Input,
    /// Form submit control. GET serializes the named fields from their
    /// inputs' current values into the query; POST navigates to the action
    /// URL as-is.
    Submit {
        method: FormMethod,
        action: String,
        /// (field name, input selector) pairs in serialization order.
        fields: Vec<(String, String)>,
    },
}

/// What the "server" does for one destination.
#[derive(Clone, Debug)]
pub enum Serve {
    /// Respond: commit after `after`, then reach the listed milestones.
    Commit { after: Duration, reach: Vec<LoadState> },
    /// Receive the request and never respond.
    Hang,
    /// Turn the navigation into an abort (download, net error).
    Abort { reason: String },
}

#[derive(Clone, Debug)]
pub struct Route {
    /// Pushed to the recorder when the request is served.
    pub label: Option<String>,
    pub serve: Serve,
}

impl Default for Route {
    fn default() -> Self {
        Self {
            label: None,
            serve: Serve::Commit {
                after: Duration::ZERO,
                reach: vec![LoadState::DomContentLoaded, LoadState::Load],
            },
        }
    }
}

impl Route {
    pub fn labelled(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            ..Self::default()
        }
    }

    pub fn committing_after(label: &str, after: Duration) -> Self {
        Self {
            label: Some(label.to_string()),
            serve: Serve::Commit {
                after,
                reach: vec![LoadState::DomContentLoaded, LoadState::Load],
            },
        }
    }

    pub fn hanging() -> Self {
        Self {
            label: None,
            serve: Serve::Hang,
        }
    }

    pub fn aborting(reason: &str) -> Self {
        Self {
            label: None,
            serve: Serve::Abort {
                reason: reason.to_string(),
            },
        }
    }
}

/// The scripted double. Clone-free by design: share it through `Arc`.
pub struct SimBrowser {
    tracker: Arc<NavigationTracker>,
    recorder: Recorder,
    base: Url,
    elements: DashMap<String, Element>,
    routes: DashMap<String, Route>,
    /// Script source → location assignments it performs, in order.
    scripts: DashMap<String, Vec<String>>,
    /// Input selector → current value.
    values: DashMap<String, String>,
    /// Test hook: stall after the input lands, before dispatch returns.
    post_dispatch_delay: Mutex<Duration>,
}

pub const SIM_ORIGIN: &str = "http://sim.test/";

impl SimBrowser {
    pub fn new(tracker: Arc<NavigationTracker>, recorder: Recorder) -> Arc<Self> {
        let base = Url::parse(SIM_ORIGIN).expect("static origin parses");
        Arc::new(Self {
            tracker,
            recorder,
            base,
            elements: DashMap::new(),
            routes: DashMap::new(),
            scripts: DashMap::new(),
            values: DashMap::new(),
            post_dispatch_delay: Mutex::new(Duration::ZERO),
        })
    }

    pub fn add_element(&self, selector: &str, element: Element) {
        self.elements.insert(selector.to_string(), element);
    }

    /// Register the server behavior for a destination. `target` is resolved
    /// against the sim origin; absolute URLs register cross-origin routes.
    pub fn set_route(&self, target: &str, route: Route) {
        if let Ok(url) = self.base.join(target) {
            self.routes.insert(url.to_string(), route);
        }
    }

    pub fn register_script(&self, script: &str, assigns: &[&str]) {
        self.scripts.insert(
            script.to_string(),
            assigns.iter().map(|s| s.to_string()).collect(),
        );
    }

    pub fn set_post_dispatch_delay(&self, delay: Duration) {
        *self.post_dispatch_delay.lock() = delay;
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    fn resolve(&self, target: &str) -> Result<Url, EngineError> {
        self.base
            .join(target)
            .map_err(|err| EngineError::new(format!("cannot resolve url {target}: {err}")))
    }

    /// Begin a navigation and hand the serving side to a background task.
    /// Cross-process is an origin comparison, like the reference servers on
    /// two hosts.
    fn schedule(&self, frame: &FrameId, url: Url) {
        let cross_process = url.host_str() != self.base.host_str();
        let id = NavigationId::new();
        self.tracker
            .navigation_started(frame, id.clone(), Some(url.clone()), cross_process);
        let plan = self
            .routes
            .get(url.as_str())
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        tokio::spawn(serve(
            Arc::clone(&self.tracker),
            self.recorder.clone(),
            frame.clone(),
            id,
            plan,
        ));
    }

    fn form_target(
        &self,
        method: FormMethod,
        action: &str,
        fields: &[(String, String)],
    ) -> Result<Url, EngineError> {
        let mut url = self.resolve(action)?;
        if method == FormMethod::Get {
            let mut pairs = url.query_pairs_mut();
            for (name, input) in fields {
                let value = self
                    .values
                    .get(input.as_str())
                    .map(|entry| entry.value().clone())
                    .unwrap_or_default();
                pairs.append_pair(name, &value);
            }
            drop(pairs);
        }
        Ok(url)
    }

    fn element(&self, selector: &str) -> Result<Element, EngineError> {
        self.elements
            .get(selector)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| EngineError::new(format!("no element matches selector \"{selector}\"")))
    }
}

/// The server side of one request. A navigation superseded before its
/// request is served was cancelled by the replacing one; its route must not
/// leave any trace.
async fn serve(
    tracker: Arc<NavigationTracker>,
    recorder: Recorder,
    frame: FrameId,
    id: NavigationId,
    plan: Route,
) {
    match plan.serve {
        Serve::Commit { after, reach } => {
            if !after.is_zero() {
                tokio::time::sleep(after).await;
            }
            if cancelled(&tracker, &frame, &id) {
                debug!(target: "autowait::sim", nav = %id.0, "request cancelled before serve");
                return;
            }
            if let Some(label) = &plan.label {
                recorder.push(label.clone());
            }
            tracker.navigation_committed(&frame, &id);
            for state in reach {
                tracker.lifecycle_reached(&frame, &id, state);
            }
        }
        Serve::Hang => {
            if cancelled(&tracker, &frame, &id) {
                return;
            }
            if let Some(label) = &plan.label {
                recorder.push(label.clone());
            }
        }
        Serve::Abort { reason } => {
            if cancelled(&tracker, &frame, &id) {
                return;
            }
            if let Some(label) = &plan.label {
                recorder.push(label.clone());
            }
            tracker.navigation_aborted(&frame, &id, reason);
        }
    }
}

fn cancelled(tracker: &NavigationTracker, frame: &FrameId, id: &NavigationId) -> bool {
    match tracker.record(frame, id) {
        Some(rec) => rec.outcome == Some(NavOutcome::Superseded),
        None => true,
    }
}

#[async_trait]
impl InputPort for SimBrowser {
    async fn dispatch(
        &self,
        route: &FrameRoute,
        kind: &ActionKind,
        _budget: Duration,
    ) -> Result<(), EngineError> {
        match kind {
            ActionKind::Click { selector } | ActionKind::Dblclick { selector } => {
                match self.element(selector)? {
                    Element::Anchor { href } => {
                        let url = self.resolve(&href)?;
                        self.schedule(&route.frame, url);
                    }
                    Element::JsLink => {
                        debug!(target: "autowait::sim", %selector, "javascript link ran, no navigation");
                    }
                    Element::Input => {
                        return Err(EngineError::new(format!(
                            "element \"{selector}\" is not clickable"
                        )));
                    }
                    Element::Submit {
                        method,
                        action,
                        fields,
                    } => {
                        let url = self.form_target(method, &action, &fields)?;
                        self.schedule(&route.frame, url);
                    }
                }
            }
            ActionKind::Fill { selector, text } => match self.element(selector)? {
                Element::Input => {
                    self.values.insert(selector.clone(), text.clone());
                }
                _ => {
                    return Err(EngineError::new(format!(
                        "element \"{selector}\" is not fillable"
                    )));
                }
            },
            ActionKind::Evaluate { script } => {
                let assigns = self
                    .scripts
                    .get(script.as_str())
                    .map(|entry| entry.value().clone())
                    .unwrap_or_default();
                for target in assigns {
                    let url = self.resolve(&target)?;
                    self.schedule(&route.frame, url);
                }
            }
            ActionKind::Goto { url } => {
                let url = self.resolve(url)?;
                self.schedule(&route.frame, url);
            }
        }

        let delay = *self.post_dispatch_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

/// Fully wired engine + sim pair for tests and the demo.
pub struct SimHarness {
    pub session: Session,
    pub browser: Arc<SimBrowser>,
    pub recorder: Recorder,
}

impl SimHarness {
    pub fn new(config: EngineConfig) -> Self {
        let recorder = Recorder::new();
        let tracker = NavigationTracker::new(config.tracker.clone());
        let browser = SimBrowser::new(Arc::clone(&tracker), recorder.clone());
        let session = Session::with_tracker(
            config,
            tracker,
            Arc::clone(&browser) as Arc<dyn InputPort>,
        );
        Self {
            session,
            browser,
            recorder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_form_serializes_filled_values() {
        let tracker = NavigationTracker::with_defaults();
        let sim = SimBrowser::new(tracker, Recorder::new());
        sim.values.insert("input#foo".into(), "bar".into());
        let url = sim
            .form_target(
                FormMethod::Get,
                "empty.html",
                &[("foo".to_string(), "input#foo".to_string())],
            )
            .unwrap();
        assert_eq!(url.as_str(), "http://sim.test/empty.html?foo=bar");
    }

    #[test]
    fn post_form_targets_action_url_unchanged() {
        let tracker = NavigationTracker::with_defaults();
        let sim = SimBrowser::new(tracker, Recorder::new());
        let url = sim
            .form_target(
                FormMethod::Post,
                "post.html",
                &[("foo".to_string(), "input#foo".to_string())],
            )
            .unwrap();
        assert_eq!(url.as_str(), "http://sim.test/post.html");
    }

    #[test]
    fn cross_origin_targets_are_flagged_by_host() {
        let tracker = NavigationTracker::with_defaults();
        let sim = SimBrowser::new(Arc::clone(&tracker), Recorder::new());
        let frame = FrameId::new();

        let url = sim.resolve("http://cross.sim.test/empty.html").unwrap();
        assert_ne!(url.host_str(), sim.base.host_str());

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        rt.block_on(async {
            sim.schedule(&frame, url);
        });
        let pending = tracker.current_pending(&frame).unwrap();
        assert!(pending.cross_process);
    }

    #[test]
    fn recorder_joins_in_push_order() {
        let recorder = Recorder::new();
        recorder.push("route");
        recorder.push("navigated");
        recorder.push("click");
        assert_eq!(recorder.joined(), "route|navigated|click");
    }
}
