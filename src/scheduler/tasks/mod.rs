pub mod cost_export;
