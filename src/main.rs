use anyhow::{Context, Result};
use tracing::{error, info};

use rustcost_exporter::config::ExporterConfig;
use rustcost_exporter::core::client::cost_explorer_client::CostExplorerClient;
use rustcost_exporter::core::persistence::metrics::metric_file_fs_adapter::MetricFileFsAdapter;
use rustcost_exporter::debug::run_debug;
use rustcost_exporter::domain::cost::service::cost_sampler_service::CostSampler;
use rustcost_exporter::domain::metric::service::metric_publisher_service::MetricPublisher;
use rustcost_exporter::logging::init_logging;
use rustcost_exporter::scheduler::tasks::cost_export::task::CostExportScheduler;
use rustcost_exporter::scheduler::ticker::IntervalTicker;
use rustcost_exporter::EXPORTER_VERSION;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ExporterConfig::load()?;
    let _log_guard = init_logging(config.log_dir.as_deref())?;

    info!("Starting RustCost exporter v{}", EXPORTER_VERSION);
    info!(
        metric_path = %config.metric_path.display(),
        metric_name = %config.metric_name,
        poll_interval_secs = config.poll_interval_secs,
        api_timeout_secs = config.api_timeout_secs,
        aws_region = %config.aws_region,
        "Loaded configuration"
    );

    let billing = CostExplorerClient::from_env(&config.aws_region, config.api_timeout())
        .await
        .context("Failed to construct billing API client")?;

    let mut scheduler = CostExportScheduler::new(
        CostSampler::new(billing, config.api_timeout()),
        MetricPublisher::new(
            MetricFileFsAdapter::new(&config.metric_path),
            &config.metric_name,
            &config.metric_help,
        ),
        IntervalTicker::new(config.poll_interval()),
        config.fallback_warn_after,
    );

    if config.debug_mode {
        let report = run_debug(&scheduler).await;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    tokio::select! {
        stats = scheduler.run(None) => {
            error!(?stats, "Export loop exited unexpectedly");
        }
        _ = shutdown_signal() => {
            info!("Received shutdown signal");
        }
    }

    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed the exporter keeps running.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}
