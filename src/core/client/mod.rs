pub mod billing_api_trait;
pub mod cost_explorer_client;
