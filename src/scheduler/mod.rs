pub mod tasks;
pub mod ticker;
