use anyhow::Result;

/// Destination for the rendered metrics document.
///
/// `replace` must swap in the whole document; readers never observe a partial body.
pub trait MetricSink: Send + Sync {
    fn replace(&self, contents: &str) -> Result<()>;

    /// Human-readable location, used in log lines.
    fn describe(&self) -> String;
}
