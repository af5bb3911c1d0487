use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::export::export_json;
use super::summary::print_summary;
use crate::config::RunSetup;
use crate::engine::{Engine, RunSummary};
use crate::error::AppResult;
use crate::http::ReqwestExecutor;
use crate::metrics::{TrendPoint, format_x100};
use crate::shutdown_handlers::setup_signal_shutdown_handler;
use crate::sinks::{FanoutSink, ResultTree, TracingSink};

/// Run one resolved setup to completion against real HTTP endpoints.
///
/// # Errors
///
/// Returns an error when the HTTP client cannot be built, the run cannot
/// start, the driver fails, or the JSON export cannot be written.
pub(crate) async fn run_local(setup: RunSetup) -> AppResult<RunSummary> {
    let RunSetup {
        profile,
        plan,
        options,
        client,
        efficient,
        export_json: export_path,
    } = setup;

    let executor = Arc::new(ReqwestExecutor::new(client)?);
    let tree = Arc::new(ResultTree::new(efficient));
    let sink = FanoutSink::new()
        .with(tree.clone())
        .with(Arc::new(TracingSink));
    let engine = Engine::builder(executor)
        .sink(Arc::new(sink))
        .options(options)
        .build();

    info!(
        "Starting {} over {} endpoint(s)...",
        profile,
        plan.steps.len()
    );
    let handle = engine.start(profile, plan)?;
    let signal_task = setup_signal_shutdown_handler(&handle.stopper());
    let trend_task = tokio::spawn(log_trend(handle.subscribe_trend()));

    let summary = handle.wait().await?;
    if let Err(err) = signal_task.await {
        warn!("Signal handler task failed: {}", err);
    }
    if let Err(err) = trend_task.await {
        warn!("Trend logger task failed: {}", err);
    }

    let failures = tree.failures();
    print_summary(&summary, failures.len());
    if let Some(path) = export_path {
        export_json(&path, &summary, &failures).await?;
        info!("Exported run results to {}", path.display());
    }
    Ok(summary)
}

/// One line per trend point until the run's channel closes.
async fn log_trend(mut rx: broadcast::Receiver<TrendPoint>) {
    loop {
        match rx.recv().await {
            Ok(point) => info!("{}", trend_line(&point)),
            Err(RecvError::Lagged(skipped)) => {
                warn!("Trend logger fell behind; skipped {} point(s).", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

pub(super) fn trend_line(point: &TrendPoint) -> String {
    format!(
        "[{:>4}s] workers={} qps={} avg={}ms p99={}ms errors={}%",
        point.second,
        point.active_workers,
        point.qps,
        point.avg_response_ms,
        point.p99_ms,
        format_x100(point.error_percent_x100)
    )
}
