//! Batch upsert.
//!
//! Writes N records of one type with a single statement:
//!
//! ```text
//! UPSERT INTO shift_total(id,student_name,...) VALUES (:id_0,:student_name_0,...), (:id_1,...)
//! ```
//!
//! Columns come from the type's descriptor table (see [`columns`]). Every
//! record gets one parenthesised group whose placeholders carry the record's
//! position in the batch. Postgres only understands ordinal parameters, so
//! the statement actually sent uses `$n` with `n = row * columns + column + 1`;
//! the named rendering is kept for logs and tests.

use async_trait::async_trait;
use serde::Deserialize;
use sqlx::{Pool, Postgres};
use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult, DEFINE_ENTITY_COLUMNS, ENTITY_MUST_NOT_BE_EMPTY, UPSERT_FAILED},
    repository::columns::{self, ColumnRef, Record, SqlValue},
};

/// Upper bound on bind parameters in one Postgres statement
pub const MAX_BIND_PARAMS: usize = u16::MAX as usize;

/// SQL form used to express "insert or update"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertDialect {
    /// `UPSERT INTO t(...) VALUES ...` (CockroachDB)
    #[default]
    Cockroach,
    /// `INSERT INTO t(...) VALUES ... ON CONFLICT (keys) DO UPDATE SET ...`
    Postgres,
}

/// Statement template for one batch: table, flattened columns, batch size
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertStatement {
    table: &'static str,
    columns: Vec<ColumnRef>,
    rows: usize,
    dialect: UpsertDialect,
}

impl UpsertStatement {
    pub fn new(
        table: &'static str,
        columns: Vec<ColumnRef>,
        rows: usize,
        dialect: UpsertDialect,
    ) -> AppResult<Self> {
        if rows == 0 {
            return Err(AppError::InvalidArgument(ENTITY_MUST_NOT_BE_EMPTY.to_string()));
        }
        if table.trim().is_empty() || columns.is_empty() {
            return Err(AppError::Schema(format!("{} ({})", DEFINE_ENTITY_COLUMNS, table)));
        }

        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.to_lowercase()) {
                return Err(AppError::Schema(format!(
                    "column {} is declared twice on {}",
                    column.name, table
                )));
            }
        }

        if dialect == UpsertDialect::Postgres && !columns.iter().any(|c| c.key) {
            return Err(AppError::Schema(format!(
                "{} declares no key column, ON CONFLICT needs one",
                table
            )));
        }

        let params = rows.saturating_mul(columns.len());
        if params > MAX_BIND_PARAMS {
            return Err(AppError::InvalidArgument(format!(
                "batch of {} records needs {} parameters, at most {} are allowed",
                rows, params, MAX_BIND_PARAMS
            )));
        }

        Ok(Self {
            table,
            columns,
            rows,
            dialect,
        })
    }

    /// Template for `rows` records of `T`
    pub fn for_record<T: Record>(rows: usize, dialect: UpsertDialect) -> AppResult<Self> {
        Self::new(T::TABLE, columns::columns::<T>(), rows, dialect)
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn columns(&self) -> &[ColumnRef] {
        &self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn param_count(&self) -> usize {
        self.rows * self.columns.len()
    }

    /// Placeholder name for `column` in the record at `row`
    pub fn placeholder(column: &str, row: usize) -> String {
        format!("{}_{}", column.to_lowercase(), row)
    }

    /// Every placeholder name, row by row
    pub fn placeholders(&self) -> Vec<String> {
        (0..self.rows)
            .flat_map(|row| {
                self.columns
                    .iter()
                    .map(move |column| Self::placeholder(column.name, row))
            })
            .collect()
    }

    /// Statement text with `:column_row` placeholders
    pub fn named_sql(&self) -> String {
        self.render(|column, row, _| format!(":{}", Self::placeholder(column.name, row)))
    }

    /// Statement text with `$n` placeholders, as sent to the server
    pub fn sql(&self) -> String {
        let width = self.columns.len();
        self.render(|_, row, index| format!("${}", row * width + index + 1))
    }

    fn render<F>(&self, placeholder: F) -> String
    where
        F: Fn(&ColumnRef, usize, usize) -> String,
    {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name).collect();
        let verb = match self.dialect {
            UpsertDialect::Cockroach => "UPSERT INTO",
            UpsertDialect::Postgres => "INSERT INTO",
        };

        let groups: Vec<String> = (0..self.rows)
            .map(|row| {
                let params: Vec<String> = self
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(index, column)| placeholder(column, row, index))
                    .collect();
                format!("({})", params.join(","))
            })
            .collect();

        let mut sql = format!(
            "{} {}({}) VALUES {}",
            verb,
            self.table,
            names.join(","),
            groups.join(", ")
        );

        if self.dialect == UpsertDialect::Postgres {
            let keys: Vec<&str> = self.columns.iter().filter(|c| c.key).map(|c| c.name).collect();
            let updates: Vec<String> = self
                .columns
                .iter()
                .filter(|c| !c.key)
                .map(|c| format!("{} = EXCLUDED.{}", c.name, c.name))
                .collect();

            sql.push_str(&format!(" ON CONFLICT ({})", keys.join(",")));
            if updates.is_empty() {
                sql.push_str(" DO NOTHING");
            } else {
                sql.push_str(&format!(" DO UPDATE SET {}", updates.join(", ")));
            }
        }

        sql
    }

    /// Read every record's values in placeholder order.
    ///
    /// Nothing is returned unless every record binds, so a failure on any
    /// record fails the whole batch.
    pub fn bind<T: Record>(self, records: &[T]) -> AppResult<BoundStatement> {
        if records.len() != self.rows {
            return Err(AppError::Internal(format!(
                "statement for {} rows bound with {} records",
                self.rows,
                records.len()
            )));
        }

        let mut params = Vec::with_capacity(self.param_count());
        for (row, record) in records.iter().enumerate() {
            columns::bind_row(record, &mut params).map_err(|e| {
                tracing::error!(
                    "Failed to bind record {}/{} for {}: {}",
                    row + 1,
                    records.len(),
                    self.table,
                    e
                );
                AppError::persistence(UPSERT_FAILED, e)
            })?;
        }

        Ok(BoundStatement {
            statement: self,
            params,
        })
    }
}

/// A statement together with its parameter values
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    statement: UpsertStatement,
    params: Vec<SqlValue>,
}

impl BoundStatement {
    pub fn statement(&self) -> &UpsertStatement {
        &self.statement
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }

    /// Parameter bound to a named placeholder
    pub fn param(&self, placeholder: &str) -> Option<&SqlValue> {
        let width = self.statement.columns.len();
        (0..self.statement.rows)
            .flat_map(|row| (0..width).map(move |index| (row, index)))
            .find(|&(row, index)| {
                UpsertStatement::placeholder(self.statement.columns[index].name, row) == placeholder
            })
            .map(|(row, index)| &self.params[row * width + index])
    }

    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.statement.sql(), self.params)
    }
}

/// Sends a bound statement to the store as one write
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Execute the statement, returning the number of rows affected
    async fn execute(&self, statement: BoundStatement) -> AppResult<u64>;
}

/// Executor backed by a Postgres-protocol connection pool
#[derive(Clone)]
pub struct PgExecutor {
    pool: Pool<Postgres>,
}

impl PgExecutor {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatementExecutor for PgExecutor {
    async fn execute(&self, statement: BoundStatement) -> AppResult<u64> {
        let (sql, params) = statement.into_parts();

        let mut query = sqlx::query(&sql);
        for value in params {
            query = value.bind_to(query);
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

/// Generic batch upsert shared by every repository
#[derive(Clone)]
pub struct Upserter {
    executor: Arc<dyn StatementExecutor>,
    dialect: UpsertDialect,
}

impl Upserter {
    pub fn new(executor: Arc<dyn StatementExecutor>, dialect: UpsertDialect) -> Self {
        Self { executor, dialect }
    }

    pub fn dialect(&self) -> UpsertDialect {
        self.dialect
    }

    /// Insert or update every record with one statement.
    ///
    /// Returns the input unchanged and in order; nothing is read back.
    /// Connection-level failures are returned as is, any other store
    /// failure is wrapped as a persistence failure.
    pub async fn upsert_all<T: Record>(&self, records: Vec<T>) -> AppResult<Vec<T>> {
        if records.is_empty() {
            tracing::warn!("Rejected empty upsert batch for {}", T::TABLE);
            return Err(AppError::InvalidArgument(ENTITY_MUST_NOT_BE_EMPTY.to_string()));
        }

        let statement = UpsertStatement::for_record::<T>(records.len(), self.dialect)?;
        tracing::debug!("Upsert statement: {}", statement.named_sql());

        let bound = statement.bind(&records)?;
        let affected = self
            .executor
            .execute(bound)
            .await
            .map_err(|e| {
                tracing::error!("Upsert of {} records into {} failed: {}", records.len(), T::TABLE, e);
                if e.is_data_access_failure() {
                    e
                } else {
                    AppError::persistence(UPSERT_FAILED, e)
                }
            })?;

        tracing::debug!(
            "Upserted {} records into {} ({} rows affected)",
            records.len(),
            T::TABLE,
            affected
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BindError, ErrorCode};
    use crate::repository::columns::fixtures::{booking, Bare, Booking, Tally};
    use std::error::Error as _;
    use tokio_test::{assert_err, assert_ok};

    fn tally(name: &str, count: i32) -> Tally {
        Tally {
            name: name.to_string(),
            count,
        }
    }

    fn upserter(mock: MockStatementExecutor, dialect: UpsertDialect) -> Upserter {
        Upserter::new(Arc::new(mock), dialect)
    }

    #[test]
    fn test_named_sql() {
        let statement = UpsertStatement::for_record::<Tally>(3, UpsertDialect::Cockroach).unwrap();
        assert_eq!(
            statement.named_sql(),
            "UPSERT INTO tally(name,count) VALUES (:name_0,:count_0), (:name_1,:count_1), (:name_2,:count_2)"
        );
    }

    #[test]
    fn test_positional_sql() {
        let statement = UpsertStatement::for_record::<Tally>(2, UpsertDialect::Cockroach).unwrap();
        assert_eq!(
            statement.sql(),
            "UPSERT INTO tally(name,count) VALUES ($1,$2), ($3,$4)"
        );
    }

    #[test]
    fn test_postgres_dialect() {
        let statement = UpsertStatement::for_record::<Booking>(1, UpsertDialect::Postgres).unwrap();
        assert_eq!(
            statement.sql(),
            "INSERT INTO booking(console,slot,student,activity_id,booked_by) VALUES ($1,$2,$3,$4,$5) \
             ON CONFLICT (console,slot) DO UPDATE SET student = EXCLUDED.student, \
             activity_id = EXCLUDED.activity_id, booked_by = EXCLUDED.booked_by"
        );
    }

    #[test]
    fn test_postgres_dialect_all_keys() {
        let columns = vec![
            ColumnRef { name: "a", key: true },
            ColumnRef { name: "b", key: true },
        ];
        let statement = UpsertStatement::new("pair", columns, 1, UpsertDialect::Postgres).unwrap();
        assert_eq!(
            statement.sql(),
            "INSERT INTO pair(a,b) VALUES ($1,$2) ON CONFLICT (a,b) DO NOTHING"
        );
    }

    #[test]
    fn test_postgres_dialect_needs_key() {
        let columns = vec![ColumnRef { name: "a", key: false }];
        let err = UpsertStatement::new("loose", columns, 1, UpsertDialect::Postgres).unwrap_err();
        assert_eq!(err.code(), ErrorCode::SchemaError);
    }

    #[test]
    fn test_placeholders_unique_and_grouped() {
        let statement = UpsertStatement::for_record::<Tally>(3, UpsertDialect::Cockroach).unwrap();
        let placeholders = statement.placeholders();

        assert_eq!(placeholders.len(), 6);
        let distinct: HashSet<_> = placeholders.iter().collect();
        assert_eq!(distinct.len(), 6);

        for (row, group) in placeholders.chunks(2).enumerate() {
            assert_eq!(group[0], format!("name_{}", row));
            assert_eq!(group[1], format!("count_{}", row));
        }
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let columns = vec![
            ColumnRef { name: "ID", key: true },
            ColumnRef { name: "id", key: false },
        ];
        let err = UpsertStatement::new("dup", columns, 1, UpsertDialect::Cockroach).unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));
    }

    #[test]
    fn test_parameter_limit() {
        let statement = UpsertStatement::for_record::<Tally>(MAX_BIND_PARAMS / 2, UpsertDialect::Cockroach);
        assert_ok!(statement);

        let err = UpsertStatement::for_record::<Tally>(MAX_BIND_PARAMS / 2 + 1, UpsertDialect::Cockroach)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_composite_id_expands_in_columns_and_params() {
        let records = vec![booking("ps5", 1, "Ana"), booking("switch", 2, "Ben")];
        let statement = UpsertStatement::for_record::<Booking>(2, UpsertDialect::Cockroach).unwrap();
        assert_eq!(
            statement.named_sql(),
            "UPSERT INTO booking(console,slot,student,activity_id,booked_by) VALUES \
             (:console_0,:slot_0,:student_0,:activity_id_0,:booked_by_0), \
             (:console_1,:slot_1,:student_1,:activity_id_1,:booked_by_1)"
        );

        let bound = statement.bind(&records).unwrap();
        assert_eq!(bound.params().len(), 10);
        assert_eq!(bound.param("console_0"), Some(&SqlValue::from("ps5")));
        assert_eq!(bound.param("slot_0"), Some(&SqlValue::Int(Some(1))));
        assert_eq!(bound.param("console_1"), Some(&SqlValue::from("switch")));
        assert_eq!(bound.param("slot_1"), Some(&SqlValue::Int(Some(2))));
        assert_eq!(bound.param("student_1"), Some(&SqlValue::from("Ben")));
        assert_eq!(bound.param("missing_0"), None);
    }

    #[tokio::test]
    async fn test_upsert_all_issues_one_write_and_returns_input() {
        let mut mock = MockStatementExecutor::new();
        mock.expect_execute()
            .withf(|bound: &BoundStatement| {
                bound.statement().rows() == 3
                    && bound.params().len() == 6
                    && bound.params()[4] == SqlValue::from("c")
            })
            .times(1)
            .returning(|_| Ok(3));

        let records = vec![tally("a", 1), tally("b", 2), tally("c", 3)];
        let result = upserter(mock, UpsertDialect::Cockroach)
            .upsert_all(records.clone())
            .await
            .unwrap();
        assert_eq!(result, records);
    }

    #[tokio::test]
    async fn test_upsert_all_rejects_empty_batch() {
        let mut mock = MockStatementExecutor::new();
        mock.expect_execute().times(0);

        let err = upserter(mock, UpsertDialect::Cockroach)
            .upsert_all(Vec::<Tally>::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
        assert_eq!(err.to_string(), format!("Invalid argument: {}", ENTITY_MUST_NOT_BE_EMPTY));
    }

    #[tokio::test]
    async fn test_upsert_all_rejects_type_without_columns() {
        let mut mock = MockStatementExecutor::new();
        mock.expect_execute().times(0);

        let err = upserter(mock, UpsertDialect::Cockroach)
            .upsert_all(vec![Bare])
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::SchemaError);
    }

    #[tokio::test]
    async fn test_bind_failure_aborts_batch() {
        let mut mock = MockStatementExecutor::new();
        mock.expect_execute().times(0);

        let mut broken = booking("xbox", 2, "Ben");
        broken.key = None;
        let records = vec![booking("ps5", 1, "Ana"), broken, booking("pool", 3, "Cy")];

        let result = upserter(mock, UpsertDialect::Cockroach).upsert_all(records).await;
        let err = assert_err!(result);
        assert_eq!(err.code(), ErrorCode::PersistenceFailure);
        assert_eq!(err.to_string(), UPSERT_FAILED);

        let cause = err.source().unwrap().downcast_ref::<BindError>().unwrap();
        assert_eq!(cause, &BindError::MissingIdentifier { field: "key" });
    }

    #[tokio::test]
    async fn test_store_failure_is_wrapped() {
        let mut mock = MockStatementExecutor::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Err(AppError::Database(sqlx::Error::ColumnNotFound("count".into()))));

        let err = upserter(mock, UpsertDialect::Postgres)
            .upsert_all(vec![tally("a", 1)])
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PersistenceFailure);
        assert_eq!(err.to_string(), UPSERT_FAILED);

        let cause = err.source().unwrap().downcast_ref::<AppError>().unwrap();
        assert!(matches!(cause, AppError::Database(sqlx::Error::ColumnNotFound(_))));
    }

    #[tokio::test]
    async fn test_connection_failure_is_not_wrapped() {
        let mut mock = MockStatementExecutor::new();
        mock.expect_execute()
            .times(1)
            .returning(|_| Err(AppError::Database(sqlx::Error::PoolTimedOut)));

        let err = upserter(mock, UpsertDialect::Cockroach)
            .upsert_all(vec![tally("a", 1)])
            .await
            .unwrap_err();
        assert!(err.is_data_access_failure());
        assert!(matches!(err, AppError::Database(sqlx::Error::PoolTimedOut)));
    }
}
