//! Profile model (games room staff accounts)

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::audit::Audit;
use crate::repository::columns::{Field, Persisted, Record};

/// Staff profile, keyed by login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub user_id: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub user_password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    /// Permission set as a JSON object
    pub permission: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

impl Persisted for Profile {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: Lazy<Vec<Field<Profile>>> = Lazy::new(|| {
            vec![
                Field::key("user_id", |p: &Profile| p.user_id.clone().into()),
                Field::column("user_password", |p: &Profile| p.user_password.clone().into()),
                Field::column("first_name", |p: &Profile| p.first_name.clone().into()),
                Field::column("last_name", |p: &Profile| p.last_name.clone().into()),
                Field::column("role", |p: &Profile| p.role.clone().into()),
                Field::column("permission", |p: &Profile| p.permission.clone().into()),
                Field::inherited::<Audit>("audit", |p: &Profile| &p.audit),
            ]
        });
        &FIELDS
    }
}

impl Record for Profile {
    const TABLE: &'static str = "profile";
}

/// Partial update of a profile
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfile {
    /// New plain-text password, hashed before it is stored
    pub user_password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<String>,
    pub permission: Option<String>,
}
