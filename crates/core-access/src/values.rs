//! # Column Conversions
//!
//! Helpers for moving data between `turso::Value` and plain Rust types. Every
//! table in the marketplace stores booleans as `INTEGER` 0/1 and timestamps as
//! RFC 3339 `TEXT`, so the conversions live in one place.

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use turso::{Error as TursoError, Row, Value};

#[derive(Error, Debug)]
pub enum ValueError {
    #[error("Database error: {0}")]
    Database(#[from] TursoError),
    #[error("Column {index} holds {found}, expected {expected}")]
    UnexpectedType {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
    #[error("Column {index} holds an invalid timestamp '{raw}'")]
    InvalidTimestamp { index: usize, raw: String },
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "NULL",
        Value::Integer(_) => "INTEGER",
        Value::Real(_) => "REAL",
        Value::Text(_) => "TEXT",
        Value::Blob(_) => "BLOB",
    }
}

fn unexpected(index: usize, expected: &'static str, found: &Value) -> ValueError {
    ValueError::UnexpectedType {
        index,
        expected,
        found: kind(found),
    }
}

// --- Rust -> turso ---

pub fn text(value: impl Into<String>) -> Value {
    Value::Text(value.into())
}

pub fn opt_text(value: Option<impl Into<String>>) -> Value {
    value.map(|v| Value::Text(v.into())).unwrap_or(Value::Null)
}

pub fn integer(value: i64) -> Value {
    Value::Integer(value)
}

pub fn opt_integer(value: Option<i64>) -> Value {
    value.map(Value::Integer).unwrap_or(Value::Null)
}

pub fn real(value: f64) -> Value {
    Value::Real(value)
}

pub fn opt_real(value: Option<f64>) -> Value {
    value.map(Value::Real).unwrap_or(Value::Null)
}

pub fn flag(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

/// Formats a timestamp so that lexicographic order matches chronological order.
pub fn timestamp_string(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn timestamp(value: &DateTime<Utc>) -> Value {
    Value::Text(timestamp_string(value))
}

// --- turso -> Rust ---

pub fn get_text(row: &Row, index: usize) -> Result<String, ValueError> {
    match row.get_value(index)? {
        Value::Text(s) => Ok(s),
        Value::Integer(i) => Ok(i.to_string()),
        other => Err(unexpected(index, "TEXT", &other)),
    }
}

pub fn get_opt_text(row: &Row, index: usize) -> Result<Option<String>, ValueError> {
    match row.get_value(index)? {
        Value::Null => Ok(None),
        Value::Text(s) => Ok(Some(s)),
        other => Err(unexpected(index, "TEXT", &other)),
    }
}

pub fn get_i64(row: &Row, index: usize) -> Result<i64, ValueError> {
    match row.get_value(index)? {
        Value::Integer(i) => Ok(i),
        Value::Real(f) => Ok(f as i64),
        other => Err(unexpected(index, "INTEGER", &other)),
    }
}

pub fn get_opt_i64(row: &Row, index: usize) -> Result<Option<i64>, ValueError> {
    match row.get_value(index)? {
        Value::Null => Ok(None),
        Value::Integer(i) => Ok(Some(i)),
        Value::Real(f) => Ok(Some(f as i64)),
        other => Err(unexpected(index, "INTEGER", &other)),
    }
}

pub fn get_f64(row: &Row, index: usize) -> Result<f64, ValueError> {
    match row.get_value(index)? {
        Value::Real(f) => Ok(f),
        Value::Integer(i) => Ok(i as f64),
        other => Err(unexpected(index, "REAL", &other)),
    }
}

pub fn get_opt_f64(row: &Row, index: usize) -> Result<Option<f64>, ValueError> {
    match row.get_value(index)? {
        Value::Null => Ok(None),
        Value::Real(f) => Ok(Some(f)),
        Value::Integer(i) => Ok(Some(i as f64)),
        other => Err(unexpected(index, "REAL", &other)),
    }
}

pub fn get_bool(row: &Row, index: usize) -> Result<bool, ValueError> {
    Ok(get_i64(row, index)? != 0)
}

fn parse_timestamp(index: usize, raw: String) -> Result<DateTime<Utc>, ValueError> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ValueError::InvalidTimestamp { index, raw })
}

pub fn get_datetime(row: &Row, index: usize) -> Result<DateTime<Utc>, ValueError> {
    let raw = get_text(row, index)?;
    parse_timestamp(index, raw)
}

pub fn get_opt_datetime(row: &Row, index: usize) -> Result<Option<DateTime<Utc>>, ValueError> {
    match get_opt_text(row, index)? {
        Some(raw) => parse_timestamp(index, raw).map(Some),
        None => Ok(None),
    }
}
