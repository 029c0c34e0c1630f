//! Shift totals service

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::{translate, translate_read};
use crate::{
    config::AuditConfig,
    error::{AppResult, UPSERT_FAILED},
    models::{
        audit::Actor,
        shift_total::{AttendantCostSummary, ShiftTotal, UpdateShiftTotal},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ShiftTotalsService {
    repository: Repository,
    audit: AuditConfig,
}

impl ShiftTotalsService {
    pub fn new(repository: Repository, audit: AuditConfig) -> Self {
        Self { repository, audit }
    }

    fn prepare(&self, mut total: ShiftTotal, actor: &Actor) -> ShiftTotal {
        if total.id.is_nil() {
            total.id = Uuid::new_v4();
        }
        let (updated_by, _) = actor.resolve(&self.audit.system_user);
        total.audit.stamp_created(updated_by, Utc::now());
        total
    }

    pub async fn save(&self, total: ShiftTotal, actor: &Actor) -> AppResult<ShiftTotal> {
        tracing::debug!("Attempting to save shift total: {:?}", total);
        let total = self.prepare(total, actor);
        let id = total.id;

        let saved = self
            .repository
            .shift_totals
            .save(total)
            .await
            .map_err(|e| translate(e, &format!("saving shift total {}", id), UPSERT_FAILED))?;

        tracing::info!(
            "Shift total {} for '{}' saved successfully",
            saved.id,
            saved.student_name
        );
        Ok(saved)
    }

    /// Save a batch of shift totals with one statement
    pub async fn save_all(&self, totals: Vec<ShiftTotal>, actor: &Actor) -> AppResult<Vec<ShiftTotal>> {
        let count = totals.len();
        tracing::debug!("Attempting to save {} shift totals", count);
        let totals = totals
            .into_iter()
            .map(|total| self.prepare(total, actor))
            .collect();

        let saved = self
            .repository
            .shift_totals
            .upsert_all(totals)
            .await
            .map_err(|e| translate(e, &format!("saving {} shift totals", count), UPSERT_FAILED))?;

        tracing::info!("{} shift totals saved successfully", saved.len());
        Ok(saved)
    }

    pub async fn update(&self, id: Uuid, data: &UpdateShiftTotal, actor: &Actor) -> AppResult<ShiftTotal> {
        tracing::debug!("Attempting to update shift total {}: {:?}", id, data);
        let (updated_by, accessed_by) = actor.resolve(&self.audit.system_user);

        let updated = self
            .repository
            .shift_totals
            .update(id, data, updated_by, accessed_by)
            .await
            .map_err(|e| translate_read(e, &format!("updating shift total {}", id)))?;

        tracing::info!("Shift total {} updated successfully", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        tracing::debug!("Attempting to delete shift total {}", id);
        self.repository
            .shift_totals
            .delete(id)
            .await
            .map_err(|e| translate_read(e, &format!("deleting shift total {}", id)))?;

        tracing::info!("Shift total {} deleted successfully", id);
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ShiftTotal> {
        self.repository
            .shift_totals
            .find_by_id(id)
            .await
            .map_err(|e| translate_read(e, &format!("loading shift total {}", id)))
    }

    pub async fn list(&self) -> AppResult<Vec<ShiftTotal>> {
        let totals = self
            .repository
            .shift_totals
            .find_all()
            .await
            .map_err(|e| translate_read(e, "listing shift totals"))?;

        tracing::info!("Fetched {} shift totals", totals.len());
        Ok(totals)
    }

    /// Takings of one attendant on one day, `None` when nothing was billed
    pub async fn cost_summary(
        &self,
        attendant_name: &str,
        date: NaiveDate,
    ) -> AppResult<Option<AttendantCostSummary>> {
        let summary = self
            .repository
            .shift_totals
            .cost_summary(attendant_name, date)
            .await
            .map_err(|e| {
                translate_read(
                    e,
                    &format!("calculating totals for '{}' on {}", attendant_name, date),
                )
            })?;

        match &summary {
            Some(s) => tracing::info!(
                "Totals for '{}' on {}: card {}, cash {}, total {}",
                attendant_name,
                date,
                s.total_cost_card,
                s.total_cost_cash,
                s.total_cost
            ),
            None => tracing::info!("No shift totals for '{}' on {}", attendant_name, date),
        }
        Ok(summary)
    }
}
