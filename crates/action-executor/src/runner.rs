use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};

use nav_arbiter::{Verdict, WaitWindow};
use nav_tracker::NavigationTracker;

use crate::errors::PerformError;
use crate::metrics;
use crate::model::{remaining_deadline, ActionReport, ActionRequest, ExecCtx, NavigationSummary};
use crate::policy::ActionPolicy;
use crate::ports::InputPort;
use crate::report;

pub struct RuntimeDeps<'a> {
    pub input: &'a dyn InputPort,
    pub tracker: &'a Arc<NavigationTracker>,
    pub policy: &'a ActionPolicy,
}

/// Performs one action end to end: open the wait window, dispatch the
/// input, then gate completion on the window's verdict.
///
/// The window opens before the dispatch goes out, so a navigation that
/// starts while the input event is still in flight is already buffered by
/// the time we wait on it. `no_wait_after` skips the window entirely. A
/// candidate that settles as Aborted is still a successful action; only an
/// expired deadline with an unsettled candidate becomes an error.
#[instrument(skip_all, fields(action = %ctx.action_id.0, kind = request.kind.log_name()))]
pub async fn execute(
    ctx: &ExecCtx,
    request: ActionRequest,
    deps: RuntimeDeps<'_>,
) -> Result<ActionReport, PerformError> {
    metrics::record_performed();
    let mut report = ActionReport::new(Instant::now());

    let window = if request.opt.no_wait_after {
        None
    } else {
        Some(WaitWindow::open(
            Arc::clone(deps.tracker),
            ctx.route.frame.clone(),
        ))
    };

    if let Err(err) = deps
        .input
        .dispatch(&ctx.route, &request.kind, remaining_deadline(ctx))
        .await
    {
        metrics::record_input_failure();
        return Err(PerformError::Input(err));
    }

    let Some(mut window) = window else {
        metrics::record_skipped_wait();
        debug!(target: "action_executor", action = %ctx.action_id.0, "wait skipped by request");
        report.ok = true;
        return Ok(report.finish(Instant::now()));
    };
    report.waited = true;

    let verdict = window
        .conclude(
            deps.policy.arbiter.grace(),
            remaining_deadline(ctx),
            &ctx.cancel,
        )
        .await;
    match verdict {
        Verdict::NoNavigation => {
            metrics::record_no_navigation();
            report.ok = true;
            Ok(report.finish(Instant::now()))
        }
        Verdict::Settled(rec) => {
            metrics::record_settled();
            if let Some(outcome) = rec.outcome {
                report.navigation = Some(NavigationSummary::from_record(&rec, outcome));
            }
            report.ok = true;
            Ok(report.finish(Instant::now()))
        }
        Verdict::DeadlineExceeded => {
            metrics::record_timeout();
            let trace = window.trace();
            let message = report::render_timeout(
                request.kind.log_name(),
                deps.policy.timeout_for(&request.opt),
                &trace,
            );
            warn!(target: "action_executor", action = %ctx.action_id.0, "{message}");
            Err(PerformError::Timeout { message, trace })
        }
        Verdict::Cancelled => {
            metrics::record_cancelled();
            Err(PerformError::Cancelled)
        }
    }
}
