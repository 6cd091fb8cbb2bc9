use chrono::{DateTime, Local};

use crate::domain::cost::billing_window::BillingWindow;
use crate::errors::BillingError;

/// Neutral value exported whenever the upstream cost cannot be obtained.
pub const FALLBACK_AMOUNT: f64 = 0.0;

/// Whether a sample carries a real upstream figure or the fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleOutcome {
    Fresh,
    Fallback(BillingError),
}

/// One cycle's cost reading. Created per cycle and dropped after publishing.
#[derive(Debug, Clone)]
pub struct CostSample {
    pub amount: f64,
    pub timestamp: DateTime<Local>,
    pub window: BillingWindow,
    pub outcome: SampleOutcome,
}

impl CostSample {
    pub fn fresh(amount: f64, window: BillingWindow) -> Self {
        Self {
            amount,
            timestamp: Local::now(),
            window,
            outcome: SampleOutcome::Fresh,
        }
    }

    pub fn fallback(window: BillingWindow, error: BillingError) -> Self {
        Self {
            amount: FALLBACK_AMOUNT,
            timestamp: Local::now(),
            window,
            outcome: SampleOutcome::Fallback(error),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, SampleOutcome::Fallback(_))
    }

    pub fn outcome_label(&self) -> &'static str {
        match self.outcome {
            SampleOutcome::Fresh => "fresh",
            SampleOutcome::Fallback(_) => "fallback",
        }
    }
}
