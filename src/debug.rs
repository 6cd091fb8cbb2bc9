use serde_json::{json, Value};
use tracing::info;

use crate::core::client::billing_api_trait::BillingApi;
use crate::core::persistence::metrics::metric_sink_trait::MetricSink;
use crate::domain::cost::cost_sample::SampleOutcome;
use crate::scheduler::tasks::cost_export::task::{CostExportScheduler, CycleReport};
use crate::scheduler::ticker::Ticker;

/// Runs only when in RUSTCOST_EXPORTER_DEBUG_MODE: one cycle, no idle phase.
pub async fn run_debug<B, S, T>(scheduler: &CostExportScheduler<B, S, T>) -> Value
where
    B: BillingApi,
    S: MetricSink,
    T: Ticker,
{
    info!("🔧 Debug mode: running a single export cycle...");

    let report = scheduler.run_cycle().await;
    let value = report_json(&report, &scheduler.publisher().sink().describe());

    info!("Debug cycle completed. Exiting...");
    value
}

pub fn report_json(report: &CycleReport, target: &str) -> Value {
    let error = match &report.sample.outcome {
        SampleOutcome::Fresh => Value::Null,
        SampleOutcome::Fallback(e) => json!({ "kind": e.kind(), "message": e.to_string() }),
    };

    json!({
        "window": report.sample.window,
        "amount": report.sample.amount,
        "outcome": report.sample.outcome_label(),
        "upstream_error": error,
        "target": target,
        "published": report.publish_error.is_none(),
        "publish_error": report.publish_error,
        "rendered": report.rendered,
    })
}
