pub mod analytics;
pub mod attendance;
pub mod core;
pub mod reports;
pub mod students;
