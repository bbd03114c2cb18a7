pub mod data;
pub mod scheduler;
