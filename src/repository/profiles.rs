//! Profiles repository

use chrono::Utc;
use sqlx::{Pool, Postgres};

use super::{add_field, bind_field, upsert::Upserter, AUDIT_SETS};
use crate::{
    error::{AppError, AppResult},
    models::profile::{Profile, UpdateProfile},
};

#[derive(Clone)]
pub struct ProfilesRepository {
    pool: Pool<Postgres>,
    upserter: Upserter,
}

impl ProfilesRepository {
    pub fn new(pool: Pool<Postgres>, upserter: Upserter) -> Self {
        Self { pool, upserter }
    }

    pub async fn upsert_all(&self, profiles: Vec<Profile>) -> AppResult<Vec<Profile>> {
        self.upserter.upsert_all(profiles).await
    }

    /// Insert or update a single profile
    pub async fn save(&self, profile: Profile) -> AppResult<Profile> {
        let mut saved = self.upserter.upsert_all(vec![profile]).await?;
        saved
            .pop()
            .ok_or_else(|| AppError::Internal("Upsert returned no profile".to_string()))
    }

    pub async fn find_by_id(&self, user_id: &str) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profile WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user_id)))
    }

    pub async fn find_all(&self) -> AppResult<Vec<Profile>> {
        let rows = sqlx::query_as::<_, Profile>("SELECT * FROM profile ORDER BY last_name, first_name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Update the supplied fields and the audit columns.
    ///
    /// `data.user_password` must already be hashed.
    pub async fn update(
        &self,
        user_id: &str,
        data: &UpdateProfile,
        updated_by: &str,
        accessed_by: &str,
    ) -> AppResult<Profile> {
        let mut sets: Vec<String> = AUDIT_SETS.iter().map(|s| s.to_string()).collect();
        let mut idx = AUDIT_SETS.len() + 1;

        add_field!(sets, idx,
            data.user_password => "user_password",
            data.first_name => "first_name",
            data.last_name => "last_name",
            data.role => "role",
            data.permission => "permission",
        );

        if idx == AUDIT_SETS.len() + 1 {
            return Err(AppError::Validation("No profile fields to update".to_string()));
        }

        let query = format!(
            "UPDATE profile SET {} WHERE user_id = ${} RETURNING *",
            sets.join(", "),
            idx
        );

        let mut builder = sqlx::query_as::<_, Profile>(&query)
            .bind(updated_by)
            .bind(Utc::now())
            .bind(accessed_by);

        bind_field!(builder,
            data.user_password,
            data.first_name,
            data.last_name,
            data.role,
            data.permission,
        );

        builder
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user_id)))
    }

    pub async fn delete(&self, user_id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM profile WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Profile {} not found", user_id)));
        }
        Ok(())
    }
}
