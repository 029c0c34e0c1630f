//! Data models for the games room

pub mod activity;
pub mod audit;
pub mod profile;
pub mod shift_report;
pub mod shift_total;

// Re-export commonly used types
pub use activity::Activity;
pub use audit::{Actor, Audit};
pub use profile::Profile;
pub use shift_report::ShiftReport;
pub use shift_total::ShiftTotal;
