use std::time::Duration;

use async_trait::async_trait;

/// Idle phase between cycles. Tests swap in a ticker that returns immediately.
#[async_trait]
pub trait Ticker: Send {
    async fn tick(&mut self);
}

/// Fixed sleep after each cycle; no catch-up when a cycle runs long.
#[derive(Debug, Clone)]
pub struct IntervalTicker {
    period: Duration,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        tokio::time::sleep(self.period).await;
    }
}
