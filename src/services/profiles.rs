//! Profiles service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;

use super::{translate, translate_read};
use crate::{
    config::AuditConfig,
    error::{AppError, AppResult, UPSERT_FAILED},
    models::{
        audit::Actor,
        profile::{Profile, UpdateProfile},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct ProfilesService {
    repository: Repository,
    audit: AuditConfig,
}

impl ProfilesService {
    pub fn new(repository: Repository, audit: AuditConfig) -> Self {
        Self { repository, audit }
    }

    /// Save or update a profile, hashing a plain-text password first
    pub async fn save_or_update(&self, mut profile: Profile, actor: &Actor) -> AppResult<Profile> {
        tracing::debug!("Attempting to save or update profile '{}'", profile.user_id);
        if profile.user_id.trim().is_empty() {
            tracing::warn!("Attempted to save a profile without a user id");
            return Err(AppError::Validation("Profile user id is required".to_string()));
        }

        if !is_password_hash(&profile.user_password) {
            profile.user_password = hash_password(&profile.user_password)?;
        }
        let (updated_by, accessed_by) = actor.resolve(&self.audit.system_user);
        let now = Utc::now();
        profile.audit.stamp_created(updated_by, now);
        profile.audit.stamp_updated(updated_by, now);
        profile.audit.accessed_by = Some(accessed_by.to_string());

        let user_id = profile.user_id.clone();
        let saved = self
            .repository
            .profiles
            .save(profile)
            .await
            .map_err(|e| translate(e, &format!("saving profile '{}'", user_id), UPSERT_FAILED))?;

        tracing::info!("Profile '{}' saved or updated successfully", saved.user_id);
        Ok(saved)
    }

    /// Update the supplied fields; a new password is hashed before storage
    pub async fn update(&self, user_id: &str, data: UpdateProfile, actor: &Actor) -> AppResult<Profile> {
        tracing::debug!("Attempting to update profile '{}'", user_id);
        let mut data = data;
        if let Some(password) = data.user_password.take() {
            data.user_password = Some(hash_password(&password)?);
        }
        let (updated_by, accessed_by) = actor.resolve(&self.audit.system_user);

        let updated = self
            .repository
            .profiles
            .update(user_id, &data, updated_by, accessed_by)
            .await
            .map_err(|e| translate_read(e, &format!("updating profile '{}'", user_id)))?;

        tracing::info!("Profile '{}' updated successfully", user_id);
        Ok(updated)
    }

    pub async fn delete(&self, user_id: &str) -> AppResult<()> {
        tracing::debug!("Attempting to delete profile '{}'", user_id);
        self.repository
            .profiles
            .delete(user_id)
            .await
            .map_err(|e| translate_read(e, &format!("deleting profile '{}'", user_id)))?;

        tracing::info!("Profile '{}' deleted successfully", user_id);
        Ok(())
    }

    pub async fn get(&self, user_id: &str) -> AppResult<Profile> {
        self.repository
            .profiles
            .find_by_id(user_id)
            .await
            .map_err(|e| translate_read(e, &format!("loading profile '{}'", user_id)))
    }

    pub async fn list(&self) -> AppResult<Vec<Profile>> {
        let profiles = self
            .repository
            .profiles
            .find_all()
            .await
            .map_err(|e| translate_read(e, "listing profiles"))?;

        tracing::info!("Fetched {} profiles", profiles.len());
        Ok(profiles)
    }

    /// Check a candidate password against the stored hash
    pub async fn verify_password(&self, user_id: &str, password: &str) -> AppResult<bool> {
        let profile = self.get(user_id).await?;
        verify_password(&profile.user_password, password)
    }
}

/// Whether `value` is already an argon2 PHC hash
fn is_password_hash(value: &str) -> bool {
    match PasswordHash::new(value) {
        Ok(hash) => {
            matches!(hash.algorithm.as_str(), "argon2id" | "argon2i" | "argon2d")
                && hash.salt.is_some()
                && hash.hash.is_some()
        }
        Err(_) => false,
    }
}

/// Hash a password using Argon2
fn hash_password(password: &str) -> AppResult<String> {
    if password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".to_string()));
    }
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
