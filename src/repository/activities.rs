//! Activities repository

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{add_field, bind_field, upsert::Upserter, AUDIT_SETS};
use crate::{
    error::{AppError, AppResult},
    models::activity::{Activity, UpdateActivity},
};

#[derive(Clone)]
pub struct ActivitiesRepository {
    pool: Pool<Postgres>,
    upserter: Upserter,
}

impl ActivitiesRepository {
    pub fn new(pool: Pool<Postgres>, upserter: Upserter) -> Self {
        Self { pool, upserter }
    }

    /// Insert or update every activity with one statement
    pub async fn upsert_all(&self, activities: Vec<Activity>) -> AppResult<Vec<Activity>> {
        self.upserter.upsert_all(activities).await
    }

    /// Insert or update a single activity
    pub async fn save(&self, activity: Activity) -> AppResult<Activity> {
        let mut saved = self.upserter.upsert_all(vec![activity]).await?;
        saved
            .pop()
            .ok_or_else(|| AppError::Internal("Upsert returned no activity".to_string()))
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Activity> {
        sqlx::query_as::<_, Activity>("SELECT * FROM activity WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", id)))
    }

    pub async fn find_all(&self) -> AppResult<Vec<Activity>> {
        let rows = sqlx::query_as::<_, Activity>("SELECT * FROM activity ORDER BY category, activity")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Distinct activity categories, sorted
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let rows: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM activity ORDER BY category")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    /// Update the supplied fields and the audit columns
    pub async fn update(
        &self,
        id: Uuid,
        data: &UpdateActivity,
        updated_by: &str,
        accessed_by: &str,
    ) -> AppResult<Activity> {
        let mut sets: Vec<String> = AUDIT_SETS.iter().map(|s| s.to_string()).collect();
        let mut idx = AUDIT_SETS.len() + 1;

        add_field!(sets, idx,
            data.activity => "activity",
            data.category => "category",
            data.price => "price",
            data.image_location => "image_location",
        );

        if idx == AUDIT_SETS.len() + 1 {
            return Err(AppError::Validation("No activity fields to update".to_string()));
        }

        let query = format!(
            "UPDATE activity SET {} WHERE id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Activity>(&query)
            .bind(updated_by)
            .bind(Utc::now())
            .bind(accessed_by);

        bind_field!(builder,
            data.activity,
            data.category,
            data.price,
            data.image_location,
        );

        builder
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM activity WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Activity {} not found", id)));
        }
        Ok(())
    }
}
