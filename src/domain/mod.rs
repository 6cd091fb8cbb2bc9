pub mod cost;
pub mod metric;
