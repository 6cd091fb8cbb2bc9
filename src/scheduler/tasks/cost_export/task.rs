use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::client::billing_api_trait::BillingApi;
use crate::core::persistence::metrics::metric_sink_trait::MetricSink;
use crate::domain::cost::cost_sample::{CostSample, SampleOutcome};
use crate::domain::cost::service::cost_sampler_service::CostSampler;
use crate::domain::metric::service::metric_publisher_service::MetricPublisher;
use crate::scheduler::ticker::Ticker;

/// What one Sampling -> Publish pass produced.
#[derive(Debug)]
pub struct CycleReport {
    pub sample: CostSample,
    pub rendered: String,
    pub publish_error: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct CycleStats {
    pub cycles: u64,
    pub fallbacks: u64,
    pub publish_failures: u64,
}

impl CycleStats {
    fn record(&mut self, report: &CycleReport) {
        self.cycles += 1;
        if report.sample.is_fallback() {
            self.fallbacks += 1;
        }
        if report.publish_error.is_some() {
            self.publish_failures += 1;
        }
    }
}

/// Counts consecutive fallback cycles and warns once per streak.
#[derive(Debug)]
pub struct FallbackTracker {
    warn_after: u32,
    streak: u32,
}

impl FallbackTracker {
    pub fn new(warn_after: u32) -> Self {
        Self {
            warn_after: warn_after.max(1),
            streak: 0,
        }
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Returns true exactly when the streak reaches the warning threshold.
    pub fn observe(&mut self, outcome: &SampleOutcome) -> bool {
        match outcome {
            SampleOutcome::Fresh => {
                if self.streak >= self.warn_after {
                    info!(
                        previous_streak = self.streak,
                        "Billing API recovered, exporting fresh cost again"
                    );
                }
                self.streak = 0;
                false
            }
            SampleOutcome::Fallback(_) => {
                self.streak = self.streak.saturating_add(1);
                self.streak == self.warn_after
            }
        }
    }
}

/// Drives Sampler -> Publisher -> idle, strictly one cycle at a time.
pub struct CostExportScheduler<B: BillingApi, S: MetricSink, T: Ticker> {
    sampler: CostSampler<B>,
    publisher: MetricPublisher<S>,
    ticker: T,
    fallbacks: FallbackTracker,
}

impl<B: BillingApi, S: MetricSink, T: Ticker> CostExportScheduler<B, S, T> {
    pub fn new(
        sampler: CostSampler<B>,
        publisher: MetricPublisher<S>,
        ticker: T,
        fallback_warn_after: u32,
    ) -> Self {
        Self {
            sampler,
            publisher,
            ticker,
            fallbacks: FallbackTracker::new(fallback_warn_after),
        }
    }

    pub fn publisher(&self) -> &MetricPublisher<S> {
        &self.publisher
    }

    /// Runs one cycle without sleeping. Never fails: errors end up in the report.
    pub async fn run_cycle(&self) -> CycleReport {
        let sample = self.sampler.sample().await;
        self.publish(sample)
    }

    /// Same as [`Self::run_cycle`] with "today" pinned.
    pub async fn run_cycle_on(&self, today: NaiveDate) -> CycleReport {
        let sample = self.sampler.sample_on(today).await;
        self.publish(sample)
    }

    fn publish(&self, sample: CostSample) -> CycleReport {
        let rendered = self.publisher.render(sample.amount);
        let publish_error = match self.publisher.publish_rendered(&rendered) {
            Ok(()) => {
                info!(
                    amount = sample.amount,
                    outcome = sample.outcome_label(),
                    sampled_at = %sample.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    "Updated cost: ${}",
                    sample.amount
                );
                None
            }
            Err(e) => Some(format!("{:#}", e)),
        };

        CycleReport {
            sample,
            rendered,
            publish_error,
        }
    }

    /// Loops forever when `max_cycles` is `None`.
    /// A bounded run skips the idle phase after its last cycle.
    pub async fn run(&mut self, max_cycles: Option<u64>) -> CycleStats {
        let mut stats = CycleStats::default();

        loop {
            let report = self.run_cycle().await;
            stats.record(&report);

            if self.fallbacks.observe(&report.sample.outcome) {
                warn!(
                    consecutive = self.fallbacks.streak(),
                    "Billing API keeps failing; exported cost is the fallback value"
                );
            }
            if report.publish_error.is_some() {
                warn!("Skipping cycle after metrics write failure; retrying next interval");
            }

            if max_cycles.is_some_and(|max| stats.cycles >= max) {
                break;
            }

            debug!(cycle = stats.cycles, "Cycle finished, idling");
            self.ticker.tick().await;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BillingError;

    #[test]
    fn tracker_warns_once_per_streak() {
        let mut tracker = FallbackTracker::new(2);
        let fail = SampleOutcome::Fallback(BillingError::Unavailable("x".into()));

        assert!(!tracker.observe(&fail));
        assert!(tracker.observe(&fail));
        assert!(!tracker.observe(&fail));
        assert_eq!(tracker.streak(), 3);

        assert!(!tracker.observe(&SampleOutcome::Fresh));
        assert_eq!(tracker.streak(), 0);

        assert!(!tracker.observe(&fail));
        assert!(tracker.observe(&fail));
    }

    #[test]
    fn tracker_threshold_of_zero_is_treated_as_one() {
        let mut tracker = FallbackTracker::new(0);
        let fail = SampleOutcome::Fallback(BillingError::Unavailable("x".into()));
        assert!(tracker.observe(&fail));
    }
}
