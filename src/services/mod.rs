//! Services wrapping the repositories with logging and error translation

pub mod activities;
pub mod profiles;
pub mod shift_reports;
pub mod shift_totals;

use crate::{
    config::AuditConfig,
    error::{AppError, PERSISTENCE_EXCEPTION},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub activities: activities::ActivitiesService,
    pub profiles: profiles::ProfilesService,
    pub shift_totals: shift_totals::ShiftTotalsService,
    pub shift_reports: shift_reports::ShiftReportsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, audit_config: AuditConfig) -> Self {
        Self {
            activities: activities::ActivitiesService::new(repository.clone(), audit_config.clone()),
            profiles: profiles::ProfilesService::new(repository.clone(), audit_config.clone()),
            shift_totals: shift_totals::ShiftTotalsService::new(repository.clone(), audit_config.clone()),
            shift_reports: shift_reports::ShiftReportsService::new(repository, audit_config),
        }
    }
}

/// Log a failed operation and translate the error for the caller.
///
/// Connection-level failures and domain errors are passed through unchanged;
/// any other store error is wrapped as a persistence failure carrying
/// `message`.
pub(crate) fn translate(err: AppError, action: &str, message: &'static str) -> AppError {
    if err.is_data_access_failure() {
        tracing::error!("Data access or transaction failure while {}: {}", action, err);
        return err;
    }

    match err {
        AppError::Database(e) => {
            tracing::error!("An unexpected error occurred while {}: {}", action, e);
            AppError::persistence(message, e)
        }
        other => {
            tracing::error!("Failed {} [{:?}]: {}", action, other.code(), other);
            other
        }
    }
}

/// Shorthand for [`translate`] with the generic persistence message
pub(crate) fn translate_read(err: AppError, action: &str) -> AppError {
    translate(err, action, PERSISTENCE_EXCEPTION)
}
