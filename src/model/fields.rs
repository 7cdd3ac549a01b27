//! Canonical field names and the source column aliases accepted for them.
//!
//! Extractors never look up raw column names: every source file is resolved once
//! against its alias table and records are built from canonical names only.

use crate::model::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use indexmap::IndexMap;
use serde_json::{from_str, Value};
use std::collections::HashMap;

pub type RawRow = IndexMap<String, Value>;

/// Identity values written by the anonymisation step when nobody is attributed.
const IDENTITY_PLACEHOLDERS: [&str; 2] = ["P n/a", "Unassigned"];

const NAIVE_DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Copy)]
pub struct FieldAliases {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

const fn field(canonical: &'static str, aliases: &'static [&'static str]) -> FieldAliases {
    FieldAliases { canonical, aliases }
}

pub const TIMESTAMP: &str = "timestamp";
pub const IDENTITY: &str = "identity";
pub const REPOSITORY: &str = "repository";
pub const MESSAGE: &str = "message";
pub const LINES_ADDED: &str = "linesAdded";
pub const LINES_DELETED: &str = "linesDeleted";
pub const FILES_CHANGED: &str = "filesChanged";
pub const STATE: &str = "state";
pub const DURATION_HOURS: &str = "durationHours";
pub const REVIEWERS: &str = "reviewers";
pub const COMPLETED_AT: &str = "completedAt";
pub const STATUS: &str = "status";
pub const RESOLVED_AT: &str = "resolvedAt";
pub const ACCEPTANCE_RATE: &str = "acceptanceRate";
pub const SUGGESTIONS: &str = "suggestions";
pub const ACCEPTANCES: &str = "acceptances";
pub const PROMPTS: &str = "prompts";
pub const YEAR: &str = "year";
pub const MONTH: &str = "month";
pub const CHURN: &str = "churn";

pub const COMMIT_FIELDS: &[FieldAliases] = &[
    field(TIMESTAMP, &["date", "created_at", "created_on"]),
    field(IDENTITY, &["anonymized_name", "author", "author_name"]),
    field(REPOSITORY, &["repository_slug", "repository", "repo"]),
    field(MESSAGE, &["message"]),
    field(LINES_ADDED, &["lines_added", "additions"]),
    field(LINES_DELETED, &["lines_deleted", "deletions"]),
];

pub const MERGE_REQUEST_FIELDS: &[FieldAliases] = &[
    field(TIMESTAMP, &["created_on", "created_at"]),
    field(IDENTITY, &["anonymized_name", "author"]),
    field(STATE, &["pr_state", "state"]),
    field(DURATION_HOURS, &["cycle_time_hours", "duration_hours"]),
    field(REVIEWERS, &["reviewers_count"]),
    field(LINES_ADDED, &["lines_added", "additions"]),
    field(LINES_DELETED, &["lines_deleted", "deletions"]),
    field(FILES_CHANGED, &["files_changed"]),
];

pub const PIPELINE_FIELDS: &[FieldAliases] = &[
    field(TIMESTAMP, &["created_on", "created_at"]),
    field(COMPLETED_AT, &["completed_on", "updated_at", "finished_at"]),
    field(STATUS, &["status", "state", "result", "outcome", "result_name"]),
];

pub const ISSUE_FIELDS: &[FieldAliases] = &[
    field(TIMESTAMP, &["Created", "created", "created_at"]),
    field(RESOLVED_AT, &["Resolved", "resolved", "resolved_at"]),
    field(IDENTITY, &["anonymized_assignee", "assignee"]),
];

pub const AI_USAGE_FIELDS: &[FieldAliases] = &[
    field(TIMESTAMP, &["date", "day"]),
    field(ACCEPTANCE_RATE, &["acceptance_rate", "acceptance_percentage"]),
    field(SUGGESTIONS, &["suggestions", "total_suggestions"]),
    field(ACCEPTANCES, &["acceptances", "total_acceptances"]),
    field(PROMPTS, &["prompts", "total_prompts"]),
];

pub const COMMIT_CHURN_FIELDS: &[FieldAliases] = &[
    field(YEAR, &["year"]),
    field(MONTH, &["month"]),
    field(CHURN, &["total_churn", "net_change", "commits"]),
];

pub const MERGE_REQUEST_CHURN_FIELDS: &[FieldAliases] = &[
    field(YEAR, &["year"]),
    field(MONTH, &["month"]),
    field(CHURN, &["mr_churn", "pr_churn", "churn", "churn_value"]),
];

/// Canonical name -> source column, resolved once per file.
#[derive(Debug, Clone, Default)]
pub struct ResolvedFields {
    columns: HashMap<&'static str, String>,
}

impl ResolvedFields {
    /// Picks, for every canonical field, the first alias present in any row.
    pub fn resolve(table: &[FieldAliases], rows: &[RawRow]) -> Self {
        let columns = table
            .iter()
            .filter_map(|entry| {
                entry.aliases
                    .iter()
                    .find(|alias| rows.iter().any(|row| row.contains_key(**alias)))
                    .map(|alias| (entry.canonical, alias.to_string()))
            })
            .collect();
        Self { columns }
    }

    pub fn column(&self, canonical: &str) -> Option<&str> {
        self.columns.get(canonical).map(String::as_str)
    }

    pub fn row<'a>(&'a self, raw: &'a RawRow) -> Row<'a> {
        Row { raw, fields: self }
    }
}

pub struct Row<'a> {
    raw: &'a RawRow,
    fields: &'a ResolvedFields,
}

impl Row<'_> {
    fn value(&self, canonical: &str) -> Option<&Value> {
        let column = self.fields.column(canonical)?;
        self.raw.get(column).filter(|v| !v.is_null())
    }

    pub fn number(&self, canonical: &str) -> Option<f64> {
        let value = self.value(canonical)?;
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }

    pub fn text(&self, canonical: &str) -> Option<String> {
        match self.value(canonical)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn timestamp(&self, canonical: &str) -> Option<DateTime<Utc>> {
        self.value(canonical)?.as_str().and_then(parse_timestamp)
    }

    /// First day of the calendar month held in two numeric columns.
    pub fn month_start(&self, year: &str, month: &str) -> Option<DateTime<Utc>> {
        let year = self.number(year)?;
        let month = self.number(month)?;
        if year.fract() != 0.0 || month.fract() != 0.0 {
            return None;
        }
        NaiveDate::from_ymd_opt(year as i32, month as u32, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    pub fn identity(&self, canonical: &str) -> Option<String> {
        self.text(canonical)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty() && !IDENTITY_PLACEHOLDERS.contains(&s.as_str()))
    }
}

/// Parses a JSON array of flat objects. `origin` only feeds the error message.
pub fn parse_rows(json_str: &str, origin: &str) -> Result<Vec<RawRow>> {
    let value: Value = from_str(json_str)?;
    let Value::Array(elements) = value else {
        return Err(Error::NotAnArray(origin.to_string()));
    };
    let rows = elements
        .into_iter()
        .filter_map(|element| match element {
            Value::Object(map) => Some(map.into_iter().collect::<RawRow>()),
            _ => None,
        })
        .collect();
    Ok(rows)
}

/// RFC 3339 first, then the naive layouts exported by the extractors (read as UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(s) {
        return Some(datetime.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}
