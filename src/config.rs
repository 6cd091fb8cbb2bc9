//! Exporter configuration, read from `RUSTCOST_EXPORTER_*` environment variables.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use validator::{Validate, ValidationError};

use crate::core::util::exposition_util::is_valid_metric_name;

const ENV_PREFIX: &str = "RUSTCOST_EXPORTER_";

pub const DEFAULT_METRIC_PATH: &str = "prom_metrics/cost.prom";
pub const DEFAULT_METRIC_NAME: &str = "aws_monthly_spend_total";
pub const DEFAULT_METRIC_HELP: &str = "Total AWS spend for the current month";
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 30;
/// Cost Explorer is only served from us-east-1.
pub const DEFAULT_AWS_REGION: &str = "us-east-1";
pub const DEFAULT_FALLBACK_WARN_AFTER: u32 = 3;

#[derive(Debug, Clone, Serialize, Validate)]
pub struct ExporterConfig {
    #[validate(custom(function = "validate_metric_path"))]
    pub metric_path: PathBuf,

    /// Required: there is no built-in cadence.
    #[validate(range(min = 1, max = 86400))]
    pub poll_interval_secs: u64,

    #[validate(custom(function = "validate_metric_name"))]
    pub metric_name: String,

    #[validate(length(min = 1))]
    pub metric_help: String,

    #[validate(range(min = 1, max = 300))]
    pub api_timeout_secs: u64,

    #[validate(length(min = 1))]
    pub aws_region: String,

    #[validate(range(min = 1))]
    pub fallback_warn_after: u32,

    pub log_dir: Option<PathBuf>,

    pub debug_mode: bool,
}

impl ExporterConfig {
    /// Loads `.env` (if any) and then the process environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; keys carry the full prefix.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let poll_interval_secs = match get("POLL_INTERVAL_SECS") {
            Some(raw) => parse_var("POLL_INTERVAL_SECS", &raw)?,
            None => {
                return Err(anyhow!(
                    "{}POLL_INTERVAL_SECS is required (seconds between cost samples)",
                    ENV_PREFIX
                ))
            }
        };

        let cfg = Self {
            metric_path: get("METRIC_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_METRIC_PATH)),
            poll_interval_secs,
            metric_name: get("METRIC_NAME").unwrap_or_else(|| DEFAULT_METRIC_NAME.to_string()),
            metric_help: get("METRIC_HELP").unwrap_or_else(|| DEFAULT_METRIC_HELP.to_string()),
            api_timeout_secs: get("API_TIMEOUT_SECS")
                .map(|v| parse_var("API_TIMEOUT_SECS", &v))
                .transpose()?
                .unwrap_or(DEFAULT_API_TIMEOUT_SECS),
            aws_region: get("AWS_REGION").unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
            fallback_warn_after: get("FALLBACK_WARN_AFTER")
                .map(|v| parse_var("FALLBACK_WARN_AFTER", &v))
                .transpose()?
                .unwrap_or(DEFAULT_FALLBACK_WARN_AFTER),
            log_dir: get("LOG_DIR").map(PathBuf::from),
            debug_mode: get("DEBUG_MODE").map(|v| parse_flag(&v)).unwrap_or(false),
        };

        cfg.validate().context("Invalid exporter configuration")?;
        Ok(cfg)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| anyhow!("{}{} has invalid value {:?}: {}", ENV_PREFIX, name, raw, e))
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn validate_metric_name(name: &str) -> Result<(), ValidationError> {
    if is_valid_metric_name(name) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_metric_name"))
    }
}

fn validate_metric_path(path: &Path) -> Result<(), ValidationError> {
    if path.file_name().is_some() {
        Ok(())
    } else {
        Err(ValidationError::new("metric_path_without_file_name"))
    }
}
