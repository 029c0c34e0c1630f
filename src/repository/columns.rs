//! Column descriptor tables.
//!
//! Every persisted type declares, once, the ordered list of its columns: the
//! column name, whether it is part of the key, whether it accepts NULL and an
//! accessor reading the value out of a record. Composite identifiers and
//! shared base blocks (the audit block) are declared as nested descriptor
//! tables and expanded in place, the type's own fields first and its base
//! blocks after them.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use uuid::Uuid;

use crate::error::BindError;

/// A single bindable value, typed so that NULLs keep their column type
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(Option<bool>),
    Int(Option<i32>),
    BigInt(Option<i64>),
    Decimal(Option<Decimal>),
    Text(Option<String>),
    Uuid(Option<Uuid>),
    Date(Option<NaiveDate>),
    Time(Option<NaiveTime>),
    Timestamp(Option<DateTime<Utc>>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        match self {
            SqlValue::Bool(v) => v.is_none(),
            SqlValue::Int(v) => v.is_none(),
            SqlValue::BigInt(v) => v.is_none(),
            SqlValue::Decimal(v) => v.is_none(),
            SqlValue::Text(v) => v.is_none(),
            SqlValue::Uuid(v) => v.is_none(),
            SqlValue::Date(v) => v.is_none(),
            SqlValue::Time(v) => v.is_none(),
            SqlValue::Timestamp(v) => v.is_none(),
        }
    }

    /// Append this value to a Postgres query's arguments
    pub fn bind_to<'q>(
        self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Int(v) => query.bind(v),
            SqlValue::BigInt(v) => query.bind(v),
            SqlValue::Decimal(v) => query.bind(v),
            SqlValue::Text(v) => query.bind(v),
            SqlValue::Uuid(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Time(v) => query.bind(v),
            SqlValue::Timestamp(v) => query.bind(v),
        }
    }
}

macro_rules! sql_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::$variant(Some(value))
                }
            }

            impl From<Option<$ty>> for SqlValue {
                fn from(value: Option<$ty>) -> Self {
                    SqlValue::$variant(value)
                }
            }
        )*
    };
}

sql_value_from! {
    bool => Bool,
    i32 => Int,
    i64 => BigInt,
    Decimal => Decimal,
    String => Text,
    Uuid => Uuid,
    NaiveDate => Date,
    NaiveTime => Time,
    DateTime<Utc> => Timestamp,
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(Some(value.to_string()))
    }
}

/// Reads one column's value out of a record
pub type Accessor<T> = fn(&T) -> SqlValue;

/// Role a plain column plays in its table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Part of the primary key
    Key,
    Value,
    /// Holds another table's identifier
    JoinColumn,
}

pub struct Column<T> {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
    read: Accessor<T>,
}

impl<T> Column<T> {
    /// Read the value, enforcing the column's non-null constraint
    pub fn read(&self, record: &T) -> Result<SqlValue, BindError> {
        let value = (self.read)(record);
        if !self.nullable && value.is_null() {
            return Err(BindError::NullValue { column: self.name });
        }
        Ok(value)
    }
}

/// One entry of a descriptor table
pub enum Field<T: 'static> {
    Column(Column<T>),
    /// Composite identifier, expanded into its constituent columns
    EmbeddedId(Box<dyn NestedFields<T>>),
    /// Shared base block whose columns follow the type's own
    Inherited(Box<dyn NestedFields<T>>),
}

impl<T: 'static> Field<T> {
    /// Non-null primary key column
    pub fn key(name: &'static str, read: Accessor<T>) -> Self {
        Field::Column(Column {
            name,
            kind: ColumnKind::Key,
            nullable: false,
            read,
        })
    }

    /// Non-null value column
    pub fn column(name: &'static str, read: Accessor<T>) -> Self {
        Field::Column(Column {
            name,
            kind: ColumnKind::Value,
            nullable: false,
            read,
        })
    }

    pub fn nullable(name: &'static str, read: Accessor<T>) -> Self {
        Field::Column(Column {
            name,
            kind: ColumnKind::Value,
            nullable: true,
            read,
        })
    }

    pub fn join_column(name: &'static str, nullable: bool, read: Accessor<T>) -> Self {
        Field::Column(Column {
            name,
            kind: ColumnKind::JoinColumn,
            nullable,
            read,
        })
    }

    /// Composite identifier stored in `field`; every constituent column is
    /// part of the key.
    pub fn embedded_id<K: Persisted>(field: &'static str, resolve: fn(&T) -> Option<&K>) -> Self {
        Field::EmbeddedId(Box::new(Nested {
            field,
            key: true,
            resolve: Resolve::Optional(resolve),
        }))
    }

    pub fn inherited<K: Persisted>(field: &'static str, resolve: fn(&T) -> &K) -> Self {
        Field::Inherited(Box::new(Nested {
            field,
            key: false,
            resolve: Resolve::Always(resolve),
        }))
    }
}

/// A descriptor table nested inside another type's table
pub trait NestedFields<T>: Send + Sync {
    /// Append the nested columns, flattened, in declaration order
    fn collect_columns(&self, out: &mut Vec<ColumnRef>);

    /// Resolve the nested value from `record` and append its column values
    fn bind(&self, record: &T, out: &mut Vec<SqlValue>) -> Result<(), BindError>;
}

enum Resolve<T, K> {
    Always(fn(&T) -> &K),
    Optional(fn(&T) -> Option<&K>),
}

struct Nested<T, K> {
    field: &'static str,
    key: bool,
    resolve: Resolve<T, K>,
}

impl<T, K> NestedFields<T> for Nested<T, K>
where
    T: 'static,
    K: Persisted,
{
    fn collect_columns(&self, out: &mut Vec<ColumnRef>) {
        let start = out.len();
        collect_columns(K::fields(), out);
        if self.key {
            for column in &mut out[start..] {
                column.key = true;
            }
        }
    }

    fn bind(&self, record: &T, out: &mut Vec<SqlValue>) -> Result<(), BindError> {
        let nested = match &self.resolve {
            Resolve::Always(resolve) => resolve(record),
            Resolve::Optional(resolve) => resolve(record)
                .ok_or(BindError::MissingIdentifier { field: self.field })?,
        };
        bind_fields(K::fields(), nested, out)
    }
}

/// A flattened column as it appears in a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnRef {
    pub name: &'static str,
    pub key: bool,
}

/// A type with a column descriptor table
pub trait Persisted: Sized + Send + Sync + 'static {
    fn fields() -> &'static [Field<Self>];
}

/// A persisted type stored in its own table
pub trait Record: Persisted {
    const TABLE: &'static str;
}

/// Flattened columns of `T`, nested tables expanded in place
pub fn columns<T: Persisted>() -> Vec<ColumnRef> {
    let mut out = Vec::new();
    collect_columns(T::fields(), &mut out);
    out
}

fn collect_columns<T: 'static>(fields: &[Field<T>], out: &mut Vec<ColumnRef>) {
    for field in fields {
        match field {
            Field::Column(column) => out.push(ColumnRef {
                name: column.name,
                key: column.kind == ColumnKind::Key,
            }),
            Field::EmbeddedId(nested) | Field::Inherited(nested) => nested.collect_columns(out),
        }
    }
}

/// Values of one record in the same order as [`columns`]
pub fn bind_row<T: Persisted>(record: &T, out: &mut Vec<SqlValue>) -> Result<(), BindError> {
    bind_fields(T::fields(), record, out)
}

fn bind_fields<T: 'static>(fields: &[Field<T>], record: &T, out: &mut Vec<SqlValue>) -> Result<(), BindError> {
    for field in fields {
        match field {
            Field::Column(column) => out.push(column.read(record)?),
            Field::EmbeddedId(nested) | Field::Inherited(nested) => nested.bind(record, out)?,
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_composite_id_and_base_block_expand_in_order() {
        let names: Vec<_> = columns::<Booking>().iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["console", "slot", "student", "activity_id", "booked_by"]);

        let keys: Vec<_> = columns::<Booking>()
            .iter()
            .filter(|c| c.key)
            .map(|c| c.name)
            .collect();
        assert_eq!(keys, vec!["console", "slot"]);
    }

    #[test]
    fn test_bind_row_follows_column_order() {
        let mut values = Vec::new();
        bind_row(&booking("ps5", 3, "Ana"), &mut values).unwrap();
        assert_eq!(
            values,
            vec![
                SqlValue::from("ps5"),
                SqlValue::Int(Some(3)),
                SqlValue::from("Ana"),
                SqlValue::Uuid(None),
                SqlValue::Text(None),
            ]
        );
    }

    #[test]
    fn test_missing_composite_id() {
        let mut record = booking("ps5", 3, "Ana");
        record.key = None;
        let err = bind_row(&record, &mut Vec::new()).unwrap_err();
        assert_eq!(err, BindError::MissingIdentifier { field: "key" });
    }

    #[test]
    fn test_non_null_column_rejects_null() {
        static FIELDS: once_cell::sync::Lazy<Vec<Field<Stamp>>> = once_cell::sync::Lazy::new(|| {
            vec![Field::column("booked_by", |s: &Stamp| s.booked_by.clone().into())]
        });
        let mut values = Vec::new();
        let err = bind_fields(&FIELDS, &Stamp { booked_by: None }, &mut values).unwrap_err();
        assert_eq!(err, BindError::NullValue { column: "booked_by" });
    }

    #[test]
    fn test_sql_value_nulls() {
        assert!(SqlValue::from(None::<Decimal>).is_null());
        assert!(!SqlValue::from(0_i64).is_null());
        assert_eq!(SqlValue::from("x"), SqlValue::Text(Some("x".to_string())));
    }
}
