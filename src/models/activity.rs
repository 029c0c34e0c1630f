//! Activity model (pool table, consoles, board games)

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::audit::Audit;
use crate::repository::columns::{Field, Persisted, Record};

/// Activity offered by the games room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Activity {
    pub id: Uuid,
    /// Activity name
    pub activity: String,
    /// Category (pool table, console, board game)
    pub category: String,
    /// Price for 30 minutes
    pub price: Option<i32>,
    /// Location of the activity's image
    pub image_location: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

impl Activity {
    pub fn new(activity: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: Uuid::nil(),
            activity: activity.into(),
            category: category.into(),
            price: None,
            image_location: None,
            audit: Audit::default(),
        }
    }
}

impl Persisted for Activity {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: Lazy<Vec<Field<Activity>>> = Lazy::new(|| {
            vec![
                Field::key("id", |a: &Activity| a.id.into()),
                Field::column("activity", |a: &Activity| a.activity.clone().into()),
                Field::column("category", |a: &Activity| a.category.clone().into()),
                Field::nullable("price", |a: &Activity| a.price.into()),
                Field::nullable("image_location", |a: &Activity| a.image_location.clone().into()),
                Field::inherited::<Audit>("audit", |a: &Activity| &a.audit),
            ]
        });
        &FIELDS
    }
}

impl Record for Activity {
    const TABLE: &'static str = "activity";
}

/// Partial update of an activity
#[derive(Debug, Default, Deserialize)]
pub struct UpdateActivity {
    pub activity: Option<String>,
    pub category: Option<String>,
    pub price: Option<i32>,
    pub image_location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::columns::columns;

    #[test]
    fn test_activity_columns() {
        let names: Vec<_> = columns::<Activity>().iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                "id",
                "activity",
                "category",
                "price",
                "image_location",
                "created_by",
                "created_at",
                "last_updated_by",
                "last_updated_at",
                "accessed_by",
            ]
        );
    }
}
