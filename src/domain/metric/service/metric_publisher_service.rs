use anyhow::Result;
use tracing::error;

use crate::core::persistence::metrics::metric_sink_trait::MetricSink;
use crate::core::util::exposition_util::ExportedMetric;

/// Renders the spend gauge and hands the whole document to the sink.
pub struct MetricPublisher<S: MetricSink> {
    sink: S,
    metric_name: String,
    metric_help: String,
}

impl<S: MetricSink> MetricPublisher<S> {
    pub fn new(sink: S, metric_name: impl Into<String>, metric_help: impl Into<String>) -> Self {
        Self {
            sink,
            metric_name: metric_name.into(),
            metric_help: metric_help.into(),
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn render(&self, amount: f64) -> String {
        ExportedMetric {
            name: &self.metric_name,
            help: &self.metric_help,
            value: amount,
        }
        .render()
    }

    /// Replaces the metrics document. Failures are logged and returned; the caller decides.
    pub fn publish(&self, amount: f64) -> Result<()> {
        self.publish_rendered(&self.render(amount))
    }

    /// Writes a body already produced by [`Self::render`].
    pub fn publish_rendered(&self, body: &str) -> Result<()> {
        self.sink.replace(body).map_err(|e| {
            error!(
                target_path = %self.sink.describe(),
                error = ?e,
                "Failed to write metrics file"
            );
            e
        })
    }
}
