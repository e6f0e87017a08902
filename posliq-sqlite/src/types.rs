//! Row-mapping helpers for the SQLite implementation.
//!
//! Identifiers, decimals and dates are all stored as TEXT; these helpers
//! centralize the parse-on-read conversions so the repository code stays
//! close to its SQL.

use posliq_core::models::Period;
use rusqlite::Row;
use rusqlite::types::Type;

/// Parse a required TEXT column through `FromStr`.
pub(crate) fn text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    let value: String = row.get(idx)?;
    value
        .parse()
        .map_err(|e: T::Err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

/// Parse an optional TEXT column through `FromStr`.
pub(crate) fn opt_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    let value: Option<String> = row.get(idx)?;
    value
        .map(|v| {
            v.parse().map_err(|e: T::Err| {
                rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
            })
        })
        .transpose()
}

/// Read the (year, month) pair stored by [`period_params`].
pub(crate) fn period(row: &Row<'_>, year_idx: usize, month_idx: usize) -> rusqlite::Result<Period> {
    let year: i32 = row.get(year_idx)?;
    let month: i64 = row.get(month_idx)?;
    Period::new(year, month as u8).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(month_idx, Type::Integer, Box::new(e))
    })
}

/// The (year, month) binding pair for a period.
pub(crate) fn period_params(period: Period) -> (i32, i64) {
    (period.year, period.month as i64)
}
