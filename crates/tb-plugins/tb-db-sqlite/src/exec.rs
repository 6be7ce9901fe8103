//! Binding and running synthesized statements against a SQLite pool.

use chrono::NaiveDateTime;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqliteQueryResult, SqliteRow};
use sqlx::{ColumnIndex, Row};
use tb_core::error::{AppError, Result};
use tb_core::query::{SqlValue, Statement};

pub(crate) fn db(err: sqlx::Error) -> AppError {
    AppError::Database(err.to_string())
}

fn bind<'q>(stmt: &'q Statement) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    stmt.params.iter().fold(sqlx::query(&stmt.sql), |q, param| match param {
        SqlValue::Null => q.bind(None::<String>),
        SqlValue::Int(n) => q.bind(*n),
        SqlValue::Text(s) => q.bind(s.as_str()),
        SqlValue::Bool(b) => q.bind(*b),
    })
}

pub(crate) async fn execute(
    pool: &SqlitePool,
    stmt: &Statement,
) -> std::result::Result<SqliteQueryResult, sqlx::Error> {
    tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "execute");
    bind(stmt).execute(pool).await
}

pub(crate) async fn fetch_all(pool: &SqlitePool, stmt: &Statement) -> Result<Vec<SqliteRow>> {
    tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "fetch_all");
    bind(stmt).fetch_all(pool).await.map_err(db)
}

pub(crate) async fn fetch_optional(pool: &SqlitePool, stmt: &Statement) -> Result<Option<SqliteRow>> {
    tracing::debug!(sql = %stmt.sql, params = stmt.params.len(), "fetch_optional");
    bind(stmt).fetch_optional(pool).await.map_err(db)
}

/// Runs `primary`; on failure retries once with `fallback` (the same
/// write minus the timestamp columns) unless the two are identical.
pub(crate) async fn execute_with_fallback(
    pool: &SqlitePool,
    primary: &Statement,
    fallback: &Statement,
) -> Result<SqliteQueryResult> {
    match execute(pool, primary).await {
        Ok(done) => Ok(done),
        Err(err) if fallback != primary => {
            tracing::warn!(error = %err, "write with timestamp columns failed, retrying without them");
            execute(pool, fallback).await.map_err(db)
        }
        Err(err) => Err(db(err)),
    }
}

pub(crate) fn text<I: ColumnIndex<SqliteRow>>(row: &SqliteRow, index: I) -> Result<Option<String>> {
    row.try_get::<Option<String>, _>(index).map_err(db)
}

/// Timestamps are read leniently: a value the driver cannot decode is
/// reported as absent instead of failing the whole row.
pub(crate) fn timestamp(row: &SqliteRow, column: &str) -> Option<NaiveDateTime> {
    row.try_get::<Option<NaiveDateTime>, _>(column).ok().flatten()
}
