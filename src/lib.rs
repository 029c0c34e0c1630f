//! Games Room persistence layer
//!
//! Records for activities, staff profiles, shift totals and shift reports,
//! stored in a Postgres-protocol database (CockroachDB by default), with
//! thin services adding audit stamping, logging and error translation.
//! Batch writes go through a generic one-statement upsert driven by
//! per-type column descriptor tables.

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::Repository;
pub use services::Services;
