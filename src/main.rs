use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use autowait::sim::{Element, FormMethod, Route, Serve, SimHarness};
use autowait::{
    ActionOpt, ActionReport, EngineConfig, LoadState, NavigationSummary, Page, PerformError,
};

/// Autowait - drive input actions synchronized with the navigations they cause
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    /// Output format
    #[arg(short, long, default_value = "human")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive one scripted scenario through the engine
    Run(RunArgs),

    /// List the available scenarios
    Scenarios,
}

#[derive(Args)]
struct RunArgs {
    /// Scenario to drive
    #[arg(value_enum)]
    scenario: Scenario,

    /// Per-action timeout override (e.g. 500ms, 2s)
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Skip the post-action navigation wait
    #[arg(long)]
    no_wait_after: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scenario {
    /// Click an anchor and wait for the navigation it causes
    AnchorClick,
    /// Click a javascript: link that never navigates
    JsLink,
    /// Evaluate a script that assigns the location twice; the second wins
    DoubleAssign,
    /// Fill an input, submit a GET form, wait for the query navigation
    FormGet,
    /// Submit a POST form and wait for the navigation
    FormPost,
    /// Direct navigation via goto
    Goto,
    /// Click toward a server that never responds; report the call log
    Timeout,
    /// Navigate to another origin
    CrossProcess,
    /// Click with the wait skipped; return before the server responds
    NoWaitAfter,
    /// Hold the action dependent on the load milestone
    LoadState,
}

impl Scenario {
    fn name(&self) -> &'static str {
        match self {
            Scenario::AnchorClick => "anchor-click",
            Scenario::JsLink => "js-link",
            Scenario::DoubleAssign => "double-assign",
            Scenario::FormGet => "form-get",
            Scenario::FormPost => "form-post",
            Scenario::Goto => "goto",
            Scenario::Timeout => "timeout",
            Scenario::CrossProcess => "cross-process",
            Scenario::NoWaitAfter => "no-wait-after",
            Scenario::LoadState => "load-state",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Scenario::AnchorClick => "click an anchor, settle on its navigation",
            Scenario::JsLink => "javascript: link, no navigation scheduled",
            Scenario::DoubleAssign => "two location assigns, last one wins",
            Scenario::FormGet => "fill + GET form submit with query serialization",
            Scenario::FormPost => "POST form submit",
            Scenario::Goto => "direct goto navigation",
            Scenario::Timeout => "hanging server, deadline exceeded with call log",
            Scenario::CrossProcess => "cross-origin navigation",
            Scenario::NoWaitAfter => "noWaitAfter skips the navigation wait",
            Scenario::LoadState => "click then hold for the load milestone",
        }
    }

    /// Scenarios that demonstrate a failing action still exit cleanly.
    fn expects_timeout(&self) -> bool {
        matches!(self, Scenario::Timeout)
    }
}

// Deterministic interleaving of sim tasks and listeners needs a single
// worker; the engine itself does not.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_logging(&cli.log_level, cli.debug)?;

    info!("Starting autowait v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_ref())?;

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args, &config, cli.output.clone()).await,
        Commands::Scenarios => cmd_scenarios(),
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

fn load_config(config_path: Option<&PathBuf>) -> Result<EngineConfig> {
    match config_path {
        Some(path) => {
            let config = EngineConfig::from_file(path)?;
            info!("Loaded configuration from: {}", path.display());
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

fn cmd_scenarios() -> Result<()> {
    for scenario in Scenario::value_variants() {
        println!("{:<14} {}", scenario.name(), scenario.describe());
    }
    Ok(())
}

#[derive(Serialize)]
struct DemoOutcome {
    scenario: String,
    ok: bool,
    waited: Option<bool>,
    latency_ms: Option<u128>,
    labels: Vec<String>,
    navigation: Option<NavigationSummary>,
    error: Option<String>,
}

impl DemoOutcome {
    fn from_result(
        scenario: Scenario,
        labels: Vec<String>,
        result: Result<ActionReport, PerformError>,
    ) -> Self {
        match result {
            Ok(report) => Self {
                scenario: scenario.name().to_string(),
                ok: report.ok,
                waited: Some(report.waited),
                latency_ms: Some(report.latency_ms),
                labels,
                navigation: report.navigation,
                error: None,
            },
            Err(err) => Self {
                scenario: scenario.name().to_string(),
                ok: false,
                waited: None,
                latency_ms: None,
                labels,
                navigation: None,
                error: Some(err.to_string()),
            },
        }
    }
}

async fn cmd_run(args: RunArgs, config: &EngineConfig, output: OutputFormat) -> Result<()> {
    let harness = SimHarness::new(config.clone());
    let page = harness.session.open_page();

    let opt = ActionOpt {
        timeout_ms: args.timeout.map(|d| d.as_millis() as u64),
        no_wait_after: args.no_wait_after,
    };

    let outcome = drive(args.scenario, &harness, &page, opt).await;
    page.close();

    match output {
        OutputFormat::Human => print_human(&outcome),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
    }

    if !outcome.ok && !args.scenario.expects_timeout() {
        bail!("scenario {} failed", outcome.scenario);
    }
    Ok(())
}

fn print_human(outcome: &DemoOutcome) {
    println!("scenario: {}", outcome.scenario);
    println!("observed: {}", outcome.labels.join("|"));
    match &outcome.navigation {
        Some(nav) => println!("navigation: {} ({:?})", nav.url, nav.outcome),
        None => println!("navigation: none"),
    }
    if let Some(err) = &outcome.error {
        println!("error: {err}");
    }
    println!("result: {}", if outcome.ok { "ok" } else { "failed" });
}

const LISTEN_BUDGET: Duration = Duration::from_secs(5);

/// Subscribe a label-pushing listener for one page event. Yield once after
/// spawning so the subscription lands before the action dispatches.
fn listen_for(
    harness: &SimHarness,
    page: &Page,
    event: &'static str,
    label: &'static str,
) -> tokio::task::JoinHandle<()> {
    let tracker = Arc::clone(harness.session.tracker());
    let frame = page.main_frame().clone();
    let recorder = harness.recorder.clone();
    tokio::spawn(async move {
        if tracker
            .wait_for_page_event(&frame, event, LISTEN_BUDGET)
            .await
            .is_some()
        {
            recorder.push(label);
        }
    })
}

async fn drive(scenario: Scenario, harness: &SimHarness, page: &Page, opt: ActionOpt) -> DemoOutcome {
    let sim = &harness.browser;
    let recorder = harness.recorder.clone();

    let result = match scenario {
        Scenario::AnchorClick => {
            sim.add_element(
                "a#link",
                Element::Anchor {
                    href: "empty.html".to_string(),
                },
            );
            sim.set_route("empty.html", Route::labelled("route"));
            let listener = listen_for(harness, page, "framenavigated", "navigated");
            tokio::task::yield_now().await;
            let result = page.click_with("a#link", opt).await;
            if result.is_ok() {
                recorder.push("click");
            }
            let _ = listener.await;
            result
        }
        Scenario::JsLink => {
            sim.add_element("a#js", Element::JsLink);
            let result = page.click_with("a#js", opt).await;
            if result.is_ok() {
                recorder.push("click");
            }
            result
        }
        Scenario::DoubleAssign => {
            const SCRIPT: &str =
                "window.location.href = 'one.html'; window.location.href = 'two.html'";
            sim.register_script(SCRIPT, &["one.html", "two.html"]);
            sim.set_route("one.html", Route::labelled("routecancel"));
            sim.set_route("two.html", Route::labelled("routeoverride"));
            let result = page.evaluate_with(SCRIPT, opt).await;
            if result.is_ok() {
                recorder.push("evaluate");
            }
            result
        }
        Scenario::FormGet => {
            sim.add_element("input#q", Element::Input);
            sim.add_element(
                "button#send",
                Element::Submit {
                    method: FormMethod::Get,
                    action: "search.html".to_string(),
                    fields: vec![("q".to_string(), "input#q".to_string())],
                },
            );
            sim.set_route("search.html?q=rust", Route::labelled("route"));
            if let Err(err) = page.fill("input#q", "rust").await {
                return DemoOutcome::from_result(scenario, recorder.labels(), Err(err));
            }
            let listener = listen_for(harness, page, "framenavigated", "navigated");
            tokio::task::yield_now().await;
            let result = page.click_with("button#send", opt).await;
            if result.is_ok() {
                recorder.push("click");
            }
            let _ = listener.await;
            result
        }
        Scenario::FormPost => {
            sim.add_element(
                "button#send",
                Element::Submit {
                    method: FormMethod::Post,
                    action: "post.html".to_string(),
                    fields: Vec::new(),
                },
            );
            sim.set_route("post.html", Route::labelled("route"));
            let listener = listen_for(harness, page, "framenavigated", "navigated");
            tokio::task::yield_now().await;
            let result = page.click_with("button#send", opt).await;
            if result.is_ok() {
                recorder.push("click");
            }
            let _ = listener.await;
            result
        }
        Scenario::Goto => {
            sim.set_route("empty.html", Route::labelled("route"));
            let listener = listen_for(harness, page, "framenavigated", "navigated");
            tokio::task::yield_now().await;
            let result = page.goto_with("empty.html", opt).await;
            if result.is_ok() {
                recorder.push("goto");
            }
            let _ = listener.await;
            result
        }
        Scenario::Timeout => {
            sim.add_element(
                "a#slow",
                Element::Anchor {
                    href: "slow.html".to_string(),
                },
            );
            sim.set_route(
                "slow.html",
                Route {
                    label: Some("route".to_string()),
                    serve: Serve::Hang,
                },
            );
            let opt = ActionOpt {
                timeout_ms: Some(opt.timeout_ms.unwrap_or(2_000)),
                ..opt
            };
            page.click_with("a#slow", opt).await
        }
        Scenario::CrossProcess => {
            sim.add_element(
                "a#away",
                Element::Anchor {
                    href: "http://cross.sim.test/empty.html".to_string(),
                },
            );
            sim.set_route("http://cross.sim.test/empty.html", Route::labelled("route"));
            let listener = listen_for(harness, page, "framenavigated", "navigated");
            tokio::task::yield_now().await;
            let result = page.click_with("a#away", opt).await;
            if result.is_ok() {
                recorder.push("click");
            }
            let _ = listener.await;
            result
        }
        Scenario::NoWaitAfter => {
            sim.add_element(
                "a#link",
                Element::Anchor {
                    href: "slow.html".to_string(),
                },
            );
            sim.set_route("slow.html", Route::hanging());
            let opt = ActionOpt {
                no_wait_after: true,
                ..opt
            };
            let result = page.click_with("a#link", opt).await;
            if result.is_ok() {
                recorder.push("click");
            }
            result
        }
        Scenario::LoadState => {
            sim.add_element(
                "a#load",
                Element::Anchor {
                    href: "page.html".to_string(),
                },
            );
            sim.set_route(
                "page.html",
                Route::committing_after("route", Duration::from_millis(25)),
            );
            let listener = listen_for(harness, page, "load", "load");
            tokio::task::yield_now().await;
            let result = page.click_with("a#load", opt).await;
            if result.is_ok() && page.wait_for_load_state(LoadState::Load).await.is_ok() {
                recorder.push("clickload");
            }
            let _ = listener.await;
            result
        }
    };

    DemoOutcome::from_result(scenario, recorder.labels(), result)
}
