use std::time::Duration;

use chrono::{Local, NaiveDate};
use tracing::{debug, error};

use crate::core::client::billing_api_trait::BillingApi;
use crate::domain::cost::billing_window::BillingWindow;
use crate::domain::cost::cost_sample::CostSample;
use crate::errors::BillingError;

/// Samples month-to-date cost. Total: upstream failures become the fallback sample.
pub struct CostSampler<B: BillingApi> {
    api: B,
    timeout: Duration,
}

impl<B: BillingApi> CostSampler<B> {
    pub fn new(api: B, timeout: Duration) -> Self {
        Self { api, timeout }
    }

    /// Samples the window for today's date on the local clock.
    pub async fn sample(&self) -> CostSample {
        self.sample_on(Local::now().date_naive()).await
    }

    pub async fn sample_on(&self, today: NaiveDate) -> CostSample {
        let window = BillingWindow::for_date(today);
        debug!(start = %window.start, end = %window.end, "Requesting month-to-date cost");

        let result = match tokio::time::timeout(
            self.timeout,
            self.api.fetch_month_to_date_cost(&window),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(BillingError::Timeout(self.timeout)),
        };

        match result {
            Ok(amount) => CostSample::fresh(amount, window),
            Err(e) => {
                error!(
                    start = %window.start,
                    end = %window.end,
                    kind = e.kind(),
                    error = %e,
                    "Billing API error, exporting fallback value"
                );
                CostSample::fallback(window, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cost::cost_sample::{SampleOutcome, FALLBACK_AMOUNT};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedApi {
        result: Result<f64, BillingError>,
        seen: Mutex<Vec<BillingWindow>>,
    }

    impl FixedApi {
        fn new(result: Result<f64, BillingError>) -> Self {
            Self {
                result,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BillingApi for FixedApi {
        async fn fetch_month_to_date_cost(
            &self,
            window: &BillingWindow,
        ) -> Result<f64, BillingError> {
            self.seen.lock().unwrap().push(*window);
            self.result.clone()
        }
    }

    struct HangingApi;

    #[async_trait]
    impl BillingApi for HangingApi {
        async fn fetch_month_to_date_cost(&self, _: &BillingWindow) -> Result<f64, BillingError> {
            std::future::pending::<Result<f64, BillingError>>().await
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn success_returns_upstream_amount() {
        let sampler = CostSampler::new(FixedApi::new(Ok(123.45)), Duration::from_secs(5));

        let sample = sampler.sample_on(d(2024, 3, 15)).await;

        assert_eq!(sample.amount, 123.45);
        assert_eq!(sample.outcome, SampleOutcome::Fresh);
        assert_eq!(sample.window.start, d(2024, 3, 1));
        assert_eq!(sample.window.end, d(2024, 3, 15));
        assert_eq!(sampler.api.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn every_error_kind_falls_back_to_zero() {
        let errors = [
            BillingError::Authentication("denied".into()),
            BillingError::QuotaExceeded("limit".into()),
            BillingError::FeatureDisabled("not enabled".into()),
            BillingError::MalformedResponse("junk".into()),
            BillingError::Unavailable("dns".into()),
        ];

        for err in errors {
            let sampler = CostSampler::new(FixedApi::new(Err(err.clone())), Duration::from_secs(5));
            let sample = sampler.sample_on(d(2024, 3, 15)).await;

            assert_eq!(sample.amount, FALLBACK_AMOUNT);
            assert_eq!(sample.outcome, SampleOutcome::Fallback(err));
        }
    }

    #[tokio::test]
    async fn first_of_month_window_is_still_sampled() {
        let sampler = CostSampler::new(FixedApi::new(Ok(1.5)), Duration::from_secs(5));

        let sample = sampler.sample_on(d(2024, 4, 1)).await;

        assert_eq!(sample.amount, 1.5);
        let seen = sampler.api.seen.lock().unwrap();
        assert_eq!(seen[0].start, d(2024, 4, 1));
        assert_eq!(seen[0].end, d(2024, 3, 31));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_upstream_times_out_into_fallback() {
        let sampler = CostSampler::new(HangingApi, Duration::from_secs(30));

        let sample = sampler.sample_on(d(2024, 3, 15)).await;

        assert_eq!(sample.amount, 0.0);
        assert_eq!(
            sample.outcome,
            SampleOutcome::Fallback(BillingError::Timeout(Duration::from_secs(30)))
        );
    }
}
