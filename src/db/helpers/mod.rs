use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn parse_date(value: &str, field: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .with_context(|| format!("failed to parse {field} '{value}'"))
}

pub fn parse_optional_date(value: Option<String>, field: &str) -> Result<Option<NaiveDate>> {
    match value {
        Some(raw) => parse_date(&raw, field).map(Some),
        None => Ok(None),
    }
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .with_context(|| format!("failed to parse {field}")),
        None => Ok(None),
    }
}
