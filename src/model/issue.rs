use crate::model::fields::{self, ResolvedFields, ISSUE_FIELDS};
use crate::model::{DataSource, Record, Result};
use chrono::{DateTime, Utc};
use std::fs;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Issue {
    pub created_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub assignee: Option<String>,
}

impl Record for Issue {
    const SOURCE: DataSource = DataSource::Issues;

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn identity(&self) -> Option<&str> {
        self.assignee.as_deref()
    }
}

impl Issue {
    pub fn cycle_time_hours(&self) -> Option<f64> {
        let (created, resolved) = (self.created_at?, self.resolved_at?);
        Some((resolved - created).num_seconds() as f64 / 3600.0)
    }
}

// Create
impl Issue {
    pub fn from_file(path: &str) -> Result<Vec<Self>> {
        let json_str = fs::read_to_string(path)?;
        Self::parse(&json_str, path)
    }

    pub fn at(created_at: DateTime<Utc>, assignee: impl ToString) -> Self {
        Self {
            created_at: Some(created_at),
            resolved_at: None,
            assignee: Some(assignee.to_string()),
        }
    }
}

// Parser
impl Issue {
    pub fn parse(json_str: &str, origin: &str) -> Result<Vec<Self>> {
        let rows = fields::parse_rows(json_str, origin)?;
        let columns = ResolvedFields::resolve(ISSUE_FIELDS, &rows);
        let issues = rows
            .iter()
            .map(|raw| {
                let row = columns.row(raw);
                Self {
                    created_at: row.timestamp(fields::TIMESTAMP),
                    resolved_at: row.timestamp(fields::RESOLVED_AT),
                    assignee: row.identity(fields::IDENTITY),
                }
            })
            .collect();
        Ok(issues)
    }
}
