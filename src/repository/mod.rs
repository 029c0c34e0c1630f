//! Repository layer for database operations

pub mod activities;
pub mod columns;
pub mod profiles;
pub mod shift_reports;
pub mod shift_totals;
pub mod upsert;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

use upsert::{PgExecutor, StatementExecutor, UpsertDialect, Upserter};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub activities: activities::ActivitiesRepository,
    pub profiles: profiles::ProfilesRepository,
    pub shift_totals: shift_totals::ShiftTotalsRepository,
    pub shift_reports: shift_reports::ShiftReportsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>, dialect: UpsertDialect) -> Self {
        let executor = Arc::new(PgExecutor::new(pool.clone()));
        Self::with_executor(pool, executor, dialect)
    }

    /// Create a repository whose batch upserts go through `executor`
    pub fn with_executor(
        pool: Pool<Postgres>,
        executor: Arc<dyn StatementExecutor>,
        dialect: UpsertDialect,
    ) -> Self {
        let upserter = Upserter::new(executor, dialect);
        Self {
            activities: activities::ActivitiesRepository::new(pool.clone(), upserter.clone()),
            profiles: profiles::ProfilesRepository::new(pool.clone(), upserter.clone()),
            shift_totals: shift_totals::ShiftTotalsRepository::new(pool.clone(), upserter.clone()),
            shift_reports: shift_reports::ShiftReportsRepository::new(pool.clone(), upserter),
            pool,
        }
    }
}

/// Audit columns written by every partial update, bound as $1..$3
pub(crate) const AUDIT_SETS: [&str; 3] = [
    "last_updated_by = $1",
    "last_updated_at = $2",
    "accessed_by = $3",
];

/// Appends `column = $n` to `sets` for every field that is present
macro_rules! add_field {
    ($sets:ident, $idx:ident, $($field:expr => $name:expr),* $(,)?) => {
        $(
            if $field.is_some() {
                $sets.push(format!("{} = ${}", $name, $idx));
                $idx += 1;
            }
        )*
    };
}

/// Binds every present field, in the order `add_field!` numbered them
macro_rules! bind_field {
    ($builder:ident, $($field:expr),* $(,)?) => {
        $(
            if let Some(ref val) = $field {
                $builder = $builder.bind(val);
            }
        )*
    };
}

pub(crate) use add_field;
pub(crate) use bind_field;
