//! Activities service

use chrono::Utc;
use uuid::Uuid;

use super::{translate, translate_read};
use crate::{
    config::AuditConfig,
    error::{AppResult, UPSERT_FAILED},
    models::{
        activity::{Activity, UpdateActivity},
        audit::Actor,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ActivitiesService {
    repository: Repository,
    audit: AuditConfig,
}

impl ActivitiesService {
    pub fn new(repository: Repository, audit: AuditConfig) -> Self {
        Self { repository, audit }
    }

    /// Stamp creation metadata and assign an id to new activities
    fn prepare(&self, mut activity: Activity, actor: &Actor) -> Activity {
        if activity.id.is_nil() {
            activity.id = Uuid::new_v4();
        }
        let (updated_by, _) = actor.resolve(&self.audit.system_user);
        activity.audit.stamp_created(updated_by, Utc::now());
        activity
    }

    /// Save or update an activity
    pub async fn save(&self, activity: Activity, actor: &Actor) -> AppResult<Activity> {
        tracing::debug!("Attempting to save activity: {:?}", activity);
        let activity = self.prepare(activity, actor);
        let name = activity.activity.clone();

        let saved = self
            .repository
            .activities
            .save(activity)
            .await
            .map_err(|e| translate(e, &format!("saving activity '{}'", name), UPSERT_FAILED))?;

        tracing::info!("Activity '{}' saved or updated successfully", saved.activity);
        Ok(saved)
    }

    /// Save or update several activities with one statement
    pub async fn save_all(&self, activities: Vec<Activity>, actor: &Actor) -> AppResult<Vec<Activity>> {
        let count = activities.len();
        tracing::debug!("Attempting to save {} activities", count);
        let activities = activities
            .into_iter()
            .map(|activity| self.prepare(activity, actor))
            .collect();

        let saved = self
            .repository
            .activities
            .upsert_all(activities)
            .await
            .map_err(|e| translate(e, &format!("saving {} activities", count), UPSERT_FAILED))?;

        tracing::info!("{} activities saved or updated successfully", saved.len());
        Ok(saved)
    }

    pub async fn update(&self, id: Uuid, data: &UpdateActivity, actor: &Actor) -> AppResult<Activity> {
        tracing::debug!("Attempting to update activity {}: {:?}", id, data);
        let (updated_by, accessed_by) = actor.resolve(&self.audit.system_user);

        let updated = self
            .repository
            .activities
            .update(id, data, updated_by, accessed_by)
            .await
            .map_err(|e| translate_read(e, &format!("updating activity {}", id)))?;

        tracing::info!("Activity '{}' updated successfully", updated.activity);
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        tracing::debug!("Attempting to delete activity with ID: {}", id);
        self.repository
            .activities
            .delete(id)
            .await
            .map_err(|e| translate_read(e, &format!("deleting activity {}", id)))?;

        tracing::info!("Activity with ID '{}' deleted successfully", id);
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Activity> {
        self.repository
            .activities
            .find_by_id(id)
            .await
            .map_err(|e| translate_read(e, &format!("loading activity {}", id)))
    }

    pub async fn list(&self) -> AppResult<Vec<Activity>> {
        let activities = self
            .repository
            .activities
            .find_all()
            .await
            .map_err(|e| translate_read(e, "listing activities"))?;

        tracing::info!("Fetched {} activities", activities.len());
        Ok(activities)
    }

    /// Distinct activity categories
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let categories = self
            .repository
            .activities
            .categories()
            .await
            .map_err(|e| translate_read(e, "fetching categories"))?;

        if categories.is_empty() {
            tracing::info!("Fetched no categories");
        } else {
            tracing::info!("Fetched {} categories: {:?}", categories.len(), categories);
        }
        Ok(categories)
    }
}
