use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_costexplorer::config::Region;
use aws_sdk_costexplorer::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_costexplorer::operation::get_cost_and_usage::{
    GetCostAndUsageError, GetCostAndUsageOutput,
};
use aws_sdk_costexplorer::types::{DateInterval, Granularity};
use aws_sdk_costexplorer::Client;
use chrono::NaiveDate;
use tracing::debug;

use crate::core::client::billing_api_trait::BillingApi;
use crate::domain::cost::billing_window::BillingWindow;
use crate::errors::BillingError;

const COST_METRIC: &str = "UnblendedCost";

/// Cost Explorer backed [`BillingApi`].
pub struct CostExplorerClient {
    client: Client,
    timeout: Duration,
}

impl CostExplorerClient {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Builds a client from the default credential chain (env, profile, instance role).
    ///
    /// Fails when the chain cannot produce credentials within `timeout`.
    pub async fn from_env(region: &str, timeout: Duration) -> Result<Self> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build())
            .load()
            .await;

        let provider = sdk_config
            .credentials_provider()
            .ok_or_else(|| anyhow!("No AWS credentials provider configured for {}", region))?;
        verify_credentials(&provider, timeout).await?;

        debug!(region, "Cost Explorer client initialized");
        Ok(Self::new(Client::new(&sdk_config), timeout))
    }
}

/// Resolves credentials once so a missing identity fails at startup, not every cycle.
pub async fn verify_credentials<P>(provider: &P, timeout: Duration) -> Result<()>
where
    P: ProvideCredentials,
{
    match tokio::time::timeout(timeout, provider.provide_credentials()).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(anyhow!(
            "Failed to resolve AWS credentials: {}",
            DisplayErrorContext(&e)
        )),
        Err(_) => Err(anyhow!(
            "Timed out after {:?} resolving AWS credentials",
            timeout
        )),
    }
}

#[async_trait]
impl BillingApi for CostExplorerClient {
    async fn fetch_month_to_date_cost(&self, window: &BillingWindow) -> Result<f64, BillingError> {
        let (start, end) = request_period(window);
        let period = DateInterval::builder()
            .start(start.format("%Y-%m-%d").to_string())
            .end(end.format("%Y-%m-%d").to_string())
            .build()
            .map_err(|e| BillingError::MalformedResponse(format!("invalid time period: {}", e)))?;

        let output = self
            .client
            .get_cost_and_usage()
            .time_period(period)
            .granularity(Granularity::Monthly)
            .metrics(COST_METRIC)
            .send()
            .await
            .map_err(|e| classify_sdk_error(e, self.timeout))?;

        total_unblended_cost(&output)
    }
}

/// Cost Explorer treats `End` as exclusive and rejects `Start >= End`.
/// On the 1st the window's `end` precedes `start`, so yesterday alone is requested.
pub fn request_period(window: &BillingWindow) -> (NaiveDate, NaiveDate) {
    if window.is_month_boundary() {
        (window.end, window.start)
    } else {
        (window.start, window.end)
    }
}

fn classify_sdk_error(err: SdkError<GetCostAndUsageError>, timeout: Duration) -> BillingError {
    match err {
        SdkError::TimeoutError(_) => BillingError::Timeout(timeout),
        SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            BillingError::Unavailable(DisplayErrorContext(&err).to_string())
        }
        other => {
            let service_err = other.into_service_error();
            let message = service_err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| DisplayErrorContext(&service_err).to_string());
            BillingError::from_code(service_err.code(), message)
        }
    }
}

fn total_unblended_cost(output: &GetCostAndUsageOutput) -> Result<f64, BillingError> {
    let results = output.results_by_time();
    if results.is_empty() {
        return Err(BillingError::MalformedResponse(
            "response contained no ResultsByTime".into(),
        ));
    }

    let mut total = 0.0;
    for result in results {
        let amount = result
            .total()
            .and_then(|t| t.get(COST_METRIC))
            .and_then(|m| m.amount())
            .ok_or_else(|| {
                BillingError::MalformedResponse(format!("missing {} amount", COST_METRIC))
            })?;
        total += parse_amount(amount)?;
    }

    Ok(total)
}

/// Parses an upstream decimal string; non-finite or negative figures are rejected.
pub fn parse_amount(raw: &str) -> Result<f64, BillingError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| BillingError::MalformedResponse(format!("unparsable amount {:?}", raw)))?;

    if !value.is_finite() || value < 0.0 {
        return Err(BillingError::MalformedResponse(format!(
            "amount out of range: {}",
            raw
        )));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::provider::error::CredentialsError;
    use aws_credential_types::provider::future;
    use aws_credential_types::Credentials;

    #[derive(Debug)]
    struct MissingCredentials;

    impl ProvideCredentials for MissingCredentials {
        fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
        where
            Self: 'a,
        {
            future::ProvideCredentials::ready(Err(CredentialsError::not_loaded(
                "no providers in chain provided credentials",
            )))
        }
    }

    #[derive(Debug)]
    struct StalledCredentials;

    impl ProvideCredentials for StalledCredentials {
        fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
        where
            Self: 'a,
        {
            future::ProvideCredentials::new(std::future::pending())
        }
    }

    #[tokio::test]
    async fn resolvable_credentials_pass_startup_check() {
        let creds = Credentials::new("AKIDEXAMPLE", "secret", None, None, "static");
        assert!(verify_credentials(&creds, Duration::from_secs(1)).await.is_ok());
    }

    #[tokio::test]
    async fn missing_credentials_fail_startup() {
        let err = verify_credentials(&MissingCredentials, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to resolve AWS credentials"));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_credential_chain_times_out() {
        let err = verify_credentials(&StalledCredentials, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Timed out"));
    }

    #[test]
    fn sdk_timeout_maps_to_timeout_kind() {
        let err = classify_sdk_error(
            SdkError::timeout_error("operation timed out"),
            Duration::from_secs(30),
        );
        assert_eq!(err, BillingError::Timeout(Duration::from_secs(30)));
        assert_eq!(err.kind(), "timeout");
    }

    #[test]
    fn construction_failure_is_unavailable() {
        let err = classify_sdk_error(
            SdkError::construction_failure("bad request"),
            Duration::from_secs(30),
        );
        assert_eq!(err.kind(), "unavailable");
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn mid_month_period_is_passed_through() {
        let window = BillingWindow::for_date(d(2024, 3, 15));
        assert_eq!(request_period(&window), (d(2024, 3, 1), d(2024, 3, 15)));
    }

    #[test]
    fn first_of_month_requests_yesterday_only() {
        let window = BillingWindow::for_date(d(2024, 4, 1));
        let (start, end) = request_period(&window);
        assert_eq!(start, d(2024, 3, 31));
        assert_eq!(end, d(2024, 4, 1));
        assert!(start < end);
    }

    #[test]
    fn parses_decimal_amounts() {
        assert_eq!(parse_amount("123.45").unwrap(), 123.45);
        assert_eq!(parse_amount(" 0.0000001 ").unwrap(), 0.0000001);
        assert_eq!(parse_amount("0").unwrap(), 0.0);
    }

    #[test]
    fn rejects_garbage_and_negative_amounts() {
        assert!(matches!(
            parse_amount("abc"),
            Err(BillingError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_amount("-3.2"),
            Err(BillingError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_amount("NaN"),
            Err(BillingError::MalformedResponse(_))
        ));
    }
}
