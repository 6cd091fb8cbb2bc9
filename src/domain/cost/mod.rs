pub mod billing_window;
pub mod cost_sample;
pub mod service;
