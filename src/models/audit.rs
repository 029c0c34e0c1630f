//! Audit block shared by every games room record

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::repository::columns::{Field, Persisted};

/// Created / updated / accessed metadata carried by every record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Audit {
    /// Who created the record
    pub created_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub last_updated_by: Option<String>,
    pub last_updated_at: Option<DateTime<Utc>>,
    /// Last user that read or touched the record
    pub accessed_by: Option<String>,
}

impl Audit {
    /// Fill in creation metadata, keeping a creator the caller already set
    pub fn stamp_created(&mut self, actor: &str, now: DateTime<Utc>) {
        if self.created_by.is_none() {
            self.created_by = Some(actor.to_string());
        }
        self.created_at = Some(now);
        self.accessed_by = Some(actor.to_string());
    }

    pub fn stamp_updated(&mut self, actor: &str, now: DateTime<Utc>) {
        self.last_updated_by = Some(actor.to_string());
        self.last_updated_at = Some(now);
        self.accessed_by = Some(actor.to_string());
    }
}

impl Persisted for Audit {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: Lazy<Vec<Field<Audit>>> = Lazy::new(|| {
            vec![
                Field::nullable("created_by", |a: &Audit| a.created_by.clone().into()),
                Field::nullable("created_at", |a: &Audit| a.created_at.into()),
                Field::nullable("last_updated_by", |a: &Audit| a.last_updated_by.clone().into()),
                Field::nullable("last_updated_at", |a: &Audit| a.last_updated_at.into()),
                Field::nullable("accessed_by", |a: &Audit| a.accessed_by.clone().into()),
            ]
        });
        &FIELDS
    }
}

/// Who is performing a write
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Actor {
    pub updated_by: Option<String>,
    pub accessed_by: Option<String>,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            updated_by: Some(name.clone()),
            accessed_by: Some(name),
        }
    }

    /// Resolve the updater and accessor names, falling back to `system_user`
    pub fn resolve<'a>(&'a self, system_user: &'a str) -> (&'a str, &'a str) {
        let updated_by = self.updated_by.as_deref().unwrap_or(system_user);
        let accessed_by = self.accessed_by.as_deref().unwrap_or(updated_by);
        (updated_by, accessed_by)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stamp_created_keeps_creator() {
        let now = Utc.with_ymd_and_hms(2024, 8, 6, 12, 0, 0).unwrap();
        let mut audit = Audit {
            created_by: Some("alice".to_string()),
            ..Default::default()
        };
        audit.stamp_created("system", now);
        assert_eq!(audit.created_by.as_deref(), Some("alice"));
        assert_eq!(audit.created_at, Some(now));
        assert_eq!(audit.accessed_by.as_deref(), Some("system"));
    }

    #[test]
    fn test_actor_resolve() {
        assert_eq!(Actor::default().resolve("system"), ("system", "system"));
        assert_eq!(Actor::new("bob").resolve("system"), ("bob", "bob"));

        let actor = Actor {
            updated_by: Some("bob".to_string()),
            accessed_by: Some("kiosk".to_string()),
        };
        assert_eq!(actor.resolve("system"), ("bob", "kiosk"));
    }
}
