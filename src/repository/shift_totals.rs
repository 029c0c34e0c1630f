//! Shift totals repository

use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{add_field, bind_field, upsert::Upserter, AUDIT_SETS};
use crate::{
    error::{AppError, AppResult},
    models::shift_total::{
        AttendantCostSummary, ShiftTotal, UpdateShiftTotal, PAYMENT_MODE_CARD, PAYMENT_MODE_CASH,
    },
};

#[derive(Clone)]
pub struct ShiftTotalsRepository {
    pool: Pool<Postgres>,
    upserter: Upserter,
}

impl ShiftTotalsRepository {
    pub fn new(pool: Pool<Postgres>, upserter: Upserter) -> Self {
        Self { pool, upserter }
    }

    pub async fn upsert_all(&self, totals: Vec<ShiftTotal>) -> AppResult<Vec<ShiftTotal>> {
        self.upserter.upsert_all(totals).await
    }

    pub async fn save(&self, total: ShiftTotal) -> AppResult<ShiftTotal> {
        let mut saved = self.upserter.upsert_all(vec![total]).await?;
        saved
            .pop()
            .ok_or_else(|| AppError::Internal("Upsert returned no shift total".to_string()))
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<ShiftTotal> {
        sqlx::query_as::<_, ShiftTotal>("SELECT * FROM shift_total WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shift total {} not found", id)))
    }

    pub async fn find_all(&self) -> AppResult<Vec<ShiftTotal>> {
        let rows = sqlx::query_as::<_, ShiftTotal>(
            "SELECT * FROM shift_total ORDER BY shift_date DESC, start_time DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Card, cash and overall takings of one attendant on one day
    pub async fn cost_summary(
        &self,
        attendant_name: &str,
        date: NaiveDate,
    ) -> AppResult<Option<AttendantCostSummary>> {
        let row = sqlx::query_as::<_, AttendantCostSummary>(
            r#"
            SELECT attendant_name,
                   COALESCE(SUM(CASE WHEN payment_mode = $3 THEN cost ELSE 0 END), 0) AS total_cost_card,
                   COALESCE(SUM(CASE WHEN payment_mode = $4 THEN cost ELSE 0 END), 0) AS total_cost_cash,
                   COALESCE(SUM(cost), 0) AS total_cost
            FROM shift_total
            WHERE shift_date = $1 AND attendant_name = $2
            GROUP BY attendant_name
            "#,
        )
        .bind(date)
        .bind(attendant_name)
        .bind(PAYMENT_MODE_CARD)
        .bind(PAYMENT_MODE_CASH)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update the supplied fields and the audit columns
    pub async fn update(
        &self,
        id: Uuid,
        data: &UpdateShiftTotal,
        updated_by: &str,
        accessed_by: &str,
    ) -> AppResult<ShiftTotal> {
        let mut sets: Vec<String> = AUDIT_SETS.iter().map(|s| s.to_string()).collect();
        let mut idx = AUDIT_SETS.len() + 1;

        add_field!(sets, idx,
            data.student_name => "student_name",
            data.attendant_name => "attendant_name",
            data.activity => "activity",
            data.cost => "cost",
            data.payment_mode => "payment_mode",
            data.duration => "duration",
            data.attendant_status => "attendant_status",
        );

        if idx == AUDIT_SETS.len() + 1 {
            return Err(AppError::Validation("No shift total fields to update".to_string()));
        }

        let query = format!(
            "UPDATE shift_total SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, ShiftTotal>(&query)
            .bind(updated_by)
            .bind(Utc::now())
            .bind(accessed_by);

        bind_field!(builder,
            data.student_name,
            data.attendant_name,
            data.activity,
            data.cost,
            data.payment_mode,
            data.duration,
            data.attendant_status,
        );

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shift total {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM shift_total WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Shift total {} not found", id)));
        }
        Ok(())
    }
}
