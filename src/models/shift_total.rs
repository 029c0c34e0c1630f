//! Shift total model (one billed session at the games room desk)

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::audit::Audit;
use crate::repository::columns::{Field, Persisted, Record};

pub const PAYMENT_MODE_CARD: &str = "card";
pub const PAYMENT_MODE_CASH: &str = "cash";

/// Billed session recorded during a shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ShiftTotal {
    pub id: Uuid,
    pub student_name: String,
    pub attendant_name: String,
    pub activity: String,
    pub cost: Decimal,
    /// "card" or "cash"
    pub payment_mode: String,
    pub start_time: NaiveTime,
    pub shift_date: NaiveDate,
    pub duration: String,
    /// "IN" or "OUT"
    pub attendant_status: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

impl Persisted for ShiftTotal {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: Lazy<Vec<Field<ShiftTotal>>> = Lazy::new(|| {
            vec![
                Field::key("id", |s: &ShiftTotal| s.id.into()),
                Field::column("student_name", |s: &ShiftTotal| s.student_name.clone().into()),
                Field::column("attendant_name", |s: &ShiftTotal| s.attendant_name.clone().into()),
                Field::column("activity", |s: &ShiftTotal| s.activity.clone().into()),
                Field::column("cost", |s: &ShiftTotal| s.cost.into()),
                Field::column("payment_mode", |s: &ShiftTotal| s.payment_mode.clone().into()),
                Field::column("start_time", |s: &ShiftTotal| s.start_time.into()),
                Field::column("shift_date", |s: &ShiftTotal| s.shift_date.into()),
                Field::column("duration", |s: &ShiftTotal| s.duration.clone().into()),
                Field::column("attendant_status", |s: &ShiftTotal| s.attendant_status.clone().into()),
                Field::inherited::<Audit>("audit", |s: &ShiftTotal| &s.audit),
            ]
        });
        &FIELDS
    }
}

impl Record for ShiftTotal {
    const TABLE: &'static str = "shift_total";
}

/// Partial update of a shift total
#[derive(Debug, Default, Deserialize)]
pub struct UpdateShiftTotal {
    pub student_name: Option<String>,
    pub attendant_name: Option<String>,
    pub activity: Option<String>,
    pub cost: Option<Decimal>,
    pub payment_mode: Option<String>,
    pub duration: Option<String>,
    pub attendant_status: Option<String>,
}

/// Card, cash and overall takings of one attendant on one day
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct AttendantCostSummary {
    pub attendant_name: String,
    pub total_cost_card: Decimal,
    pub total_cost_cash: Decimal,
    pub total_cost: Decimal,
}
