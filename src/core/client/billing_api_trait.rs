use async_trait::async_trait;

use crate::domain::cost::billing_window::BillingWindow;
use crate::errors::BillingError;

/// Upstream billing capability: month-to-date cost for a window.
///
/// Credentials are resolved ambiently by the implementation, never passed here.
#[async_trait]
pub trait BillingApi: Send + Sync {
    async fn fetch_month_to_date_cost(&self, window: &BillingWindow) -> Result<f64, BillingError>;
}
