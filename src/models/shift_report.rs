//! Shift report model (end of shift reconciliation)

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::audit::Audit;
use crate::repository::columns::{Field, Persisted, Record};

/// Closing report signed by the attendant and the reconcilor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ShiftReport {
    pub shift_report_id: Uuid,
    pub closing_shift_date: NaiveDate,
    pub closing_shift_time: NaiveTime,
    pub attendant_name: String,
    pub reconcilor_name: String,
    pub reconcilor_sign: String,
    pub attendant_sign: String,
    pub revenue_in_card: Decimal,
    pub revenue_in_cash: Decimal,
    pub shift_total: Decimal,
    pub opening_balance: Decimal,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: Audit,
}

impl Persisted for ShiftReport {
    fn fields() -> &'static [Field<Self>] {
        static FIELDS: Lazy<Vec<Field<ShiftReport>>> = Lazy::new(|| {
            vec![
                Field::key("shift_report_id", |r: &ShiftReport| r.shift_report_id.into()),
                Field::column("closing_shift_date", |r: &ShiftReport| r.closing_shift_date.into()),
                Field::column("closing_shift_time", |r: &ShiftReport| r.closing_shift_time.into()),
                Field::column("attendant_name", |r: &ShiftReport| r.attendant_name.clone().into()),
                Field::column("reconcilor_name", |r: &ShiftReport| r.reconcilor_name.clone().into()),
                Field::column("reconcilor_sign", |r: &ShiftReport| r.reconcilor_sign.clone().into()),
                Field::column("attendant_sign", |r: &ShiftReport| r.attendant_sign.clone().into()),
                Field::column("revenue_in_card", |r: &ShiftReport| r.revenue_in_card.into()),
                Field::column("revenue_in_cash", |r: &ShiftReport| r.revenue_in_cash.into()),
                Field::column("shift_total", |r: &ShiftReport| r.shift_total.into()),
                Field::column("opening_balance", |r: &ShiftReport| r.opening_balance.into()),
                Field::inherited::<Audit>("audit", |r: &ShiftReport| &r.audit),
            ]
        });
        &FIELDS
    }
}

impl Record for ShiftReport {
    const TABLE: &'static str = "shift_report";
}

/// Partial update of a shift report
#[derive(Debug, Default, Deserialize)]
pub struct UpdateShiftReport {
    pub closing_shift_date: Option<NaiveDate>,
    pub closing_shift_time: Option<NaiveTime>,
    pub attendant_name: Option<String>,
    pub reconcilor_name: Option<String>,
    pub reconcilor_sign: Option<String>,
    pub attendant_sign: Option<String>,
    pub revenue_in_card: Option<Decimal>,
    pub revenue_in_cash: Option<Decimal>,
    pub shift_total: Option<Decimal>,
    pub opening_balance: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::columns::columns;

    #[test]
    fn test_shift_report_columns() {
        let columns = columns::<ShiftReport>();
        let names: Vec<_> = columns.iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                "shift_report_id",
                "closing_shift_date",
                "closing_shift_time",
                "attendant_name",
                "reconcilor_name",
                "reconcilor_sign",
                "attendant_sign",
                "revenue_in_card",
                "revenue_in_cash",
                "shift_total",
                "opening_balance",
                "created_by",
                "created_at",
                "last_updated_by",
                "last_updated_at",
                "accessed_by",
            ]
        );

        let keys: Vec<_> = columns.iter().filter(|c| c.key).map(|c| c.name).collect();
        assert_eq!(keys, vec!["shift_report_id"]);
    }
}
