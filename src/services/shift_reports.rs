//! Shift reports service

use chrono::Utc;
use uuid::Uuid;

use super::{translate, translate_read};
use crate::{
    config::AuditConfig,
    error::{AppResult, UPSERT_FAILED},
    models::{
        audit::Actor,
        shift_report::{ShiftReport, UpdateShiftReport},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ShiftReportsService {
    repository: Repository,
    audit: AuditConfig,
}

impl ShiftReportsService {
    pub fn new(repository: Repository, audit: AuditConfig) -> Self {
        Self { repository, audit }
    }

    /// Save or update a shift report
    pub async fn save_or_update(&self, mut report: ShiftReport, actor: &Actor) -> AppResult<ShiftReport> {
        tracing::debug!("Attempting to save shift report: {:?}", report);
        if report.shift_report_id.is_nil() {
            report.shift_report_id = Uuid::new_v4();
        }
        let (updated_by, accessed_by) = actor.resolve(&self.audit.system_user);
        let now = Utc::now();
        report.audit.stamp_created(updated_by, now);
        report.audit.stamp_updated(updated_by, now);
        report.audit.accessed_by = Some(accessed_by.to_string());

        let id = report.shift_report_id;
        let saved = self
            .repository
            .shift_reports
            .save(report)
            .await
            .map_err(|e| translate(e, &format!("saving shift report {}", id), UPSERT_FAILED))?;

        tracing::info!(
            "Shift report {} closed by '{}' saved successfully",
            saved.shift_report_id,
            saved.attendant_name
        );
        Ok(saved)
    }

    pub async fn update(&self, id: Uuid, data: &UpdateShiftReport, actor: &Actor) -> AppResult<ShiftReport> {
        tracing::debug!("Attempting to update shift report {}: {:?}", id, data);
        let (updated_by, accessed_by) = actor.resolve(&self.audit.system_user);

        let updated = self
            .repository
            .shift_reports
            .update(id, data, updated_by, accessed_by)
            .await
            .map_err(|e| translate_read(e, &format!("updating shift report {}", id)))?;

        tracing::info!("Shift report {} updated successfully", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        tracing::debug!("Attempting to delete shift report {}", id);
        self.repository
            .shift_reports
            .delete(id)
            .await
            .map_err(|e| translate_read(e, &format!("deleting shift report {}", id)))?;

        tracing::info!("Shift report {} deleted successfully", id);
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ShiftReport> {
        self.repository
            .shift_reports
            .find_by_id(id)
            .await
            .map_err(|e| translate_read(e, &format!("loading shift report {}", id)))
    }

    pub async fn list(&self) -> AppResult<Vec<ShiftReport>> {
        let reports = self
            .repository
            .shift_reports
            .find_all()
            .await
            .map_err(|e| translate_read(e, "listing shift reports"))?;

        tracing::info!("Fetched {} shift reports", reports.len());
        Ok(reports)
    }
}
