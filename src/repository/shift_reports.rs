//! Shift reports repository

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{add_field, bind_field, upsert::Upserter, AUDIT_SETS};
use crate::{
    error::{AppError, AppResult},
    models::shift_report::{ShiftReport, UpdateShiftReport},
};

#[derive(Clone)]
pub struct ShiftReportsRepository {
    pool: Pool<Postgres>,
    upserter: Upserter,
}

impl ShiftReportsRepository {
    pub fn new(pool: Pool<Postgres>, upserter: Upserter) -> Self {
        Self { pool, upserter }
    }

    pub async fn upsert_all(&self, reports: Vec<ShiftReport>) -> AppResult<Vec<ShiftReport>> {
        self.upserter.upsert_all(reports).await
    }

    pub async fn save(&self, report: ShiftReport) -> AppResult<ShiftReport> {
        let mut saved = self.upserter.upsert_all(vec![report]).await?;
        saved
            .pop()
            .ok_or_else(|| AppError::Internal("Upsert returned no shift report".to_string()))
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<ShiftReport> {
        sqlx::query_as::<_, ShiftReport>("SELECT * FROM shift_report WHERE shift_report_id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shift report {} not found", id)))
    }

    pub async fn find_all(&self) -> AppResult<Vec<ShiftReport>> {
        let rows = sqlx::query_as::<_, ShiftReport>(
            "SELECT * FROM shift_report ORDER BY closing_shift_date DESC, closing_shift_time DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Update the supplied fields and the audit columns
    pub async fn update(
        &self,
        id: Uuid,
        data: &UpdateShiftReport,
        updated_by: &str,
        accessed_by: &str,
    ) -> AppResult<ShiftReport> {
        let mut sets: Vec<String> = AUDIT_SETS.iter().map(|s| s.to_string()).collect();
        let mut idx = AUDIT_SETS.len() + 1;

        add_field!(sets, idx,
            data.closing_shift_date => "closing_shift_date",
            data.closing_shift_time => "closing_shift_time",
            data.attendant_name => "attendant_name",
            data.reconcilor_name => "reconcilor_name",
            data.reconcilor_sign => "reconcilor_sign",
            data.attendant_sign => "attendant_sign",
            data.revenue_in_card => "revenue_in_card",
            data.revenue_in_cash => "revenue_in_cash",
            data.shift_total => "shift_total",
            data.opening_balance => "opening_balance",
        );

        if idx == AUDIT_SETS.len() + 1 {
            return Err(AppError::Validation("No shift report fields to update".to_string()));
        }

        let query = format!(
            "UPDATE shift_report SET {} WHERE shift_report_id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, ShiftReport>(&query)
            .bind(updated_by)
            .bind(Utc::now())
            .bind(accessed_by);

        bind_field!(builder,
            data.closing_shift_date,
            data.closing_shift_time,
            data.attendant_name,
            data.reconcilor_name,
            data.reconcilor_sign,
            data.attendant_sign,
            data.revenue_in_card,
            data.revenue_in_cash,
            data.shift_total,
            data.opening_balance,
        );

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shift report {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM shift_report WHERE shift_report_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Shift report {} not found", id)));
        }
        Ok(())
    }
}
