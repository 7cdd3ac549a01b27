use crate::model::fields::{self, ResolvedFields, MERGE_REQUEST_FIELDS};
use crate::model::{DataSource, Record, Result};
use chrono::{DateTime, Utc};
use std::fs;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeRequest {
    pub created_at: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub state: Option<String>,
    pub duration_hours: Option<f64>,
    pub reviewers: Option<f64>,
    pub insertions: Option<f64>,
    pub deletions: Option<f64>,
    pub files_changed: Option<f64>,
}

impl Record for MergeRequest {
    const SOURCE: DataSource = DataSource::MergeRequests;

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn identity(&self) -> Option<&str> {
        self.author.as_deref()
    }
}

impl MergeRequest {
    pub fn is_merged(&self) -> bool {
        self.state
            .as_deref()
            .is_some_and(|state| state.trim().eq_ignore_ascii_case("merged"))
    }
}

// Create
impl MergeRequest {
    pub fn from_file(path: &str) -> Result<Vec<Self>> {
        let json_str = fs::read_to_string(path)?;
        Self::parse(&json_str, path)
    }

    pub fn at(created_at: DateTime<Utc>, author: impl ToString) -> Self {
        Self {
            created_at: Some(created_at),
            author: Some(author.to_string()),
            ..Self::default()
        }
    }
}

// Parser
impl MergeRequest {
    pub fn parse(json_str: &str, origin: &str) -> Result<Vec<Self>> {
        let rows = fields::parse_rows(json_str, origin)?;
        let columns = ResolvedFields::resolve(MERGE_REQUEST_FIELDS, &rows);
        let merge_requests = rows
            .iter()
            .map(|raw| {
                let row = columns.row(raw);
                Self {
                    created_at: row.timestamp(fields::TIMESTAMP),
                    author: row.identity(fields::IDENTITY),
                    state: row.text(fields::STATE),
                    duration_hours: row.number(fields::DURATION_HOURS),
                    reviewers: row.number(fields::REVIEWERS),
                    insertions: row.number(fields::LINES_ADDED),
                    deletions: row.number(fields::LINES_DELETED),
                    files_changed: row.number(fields::FILES_CHANGED),
                }
            })
            .collect();
        Ok(merge_requests)
    }
}
