use crate::model::fields::{self, ResolvedFields, COMMIT_FIELDS};
use crate::model::{DataSource, Record, Result};
use chrono::{DateTime, Utc};
use std::fs;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Commit {
    pub datetime: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub repository: Option<String>,
    pub message: Option<String>,
    pub insertions: Option<f64>,
    pub deletions: Option<f64>,
}

impl Record for Commit {
    const SOURCE: DataSource = DataSource::Commits;

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.datetime
    }

    fn identity(&self) -> Option<&str> {
        self.author.as_deref()
    }
}

// Create
impl Commit {
    pub fn from_file(path: &str) -> Result<Vec<Self>> {
        let json_str = fs::read_to_string(path)?;
        Self::parse(&json_str, path)
    }

    pub fn at(datetime: DateTime<Utc>, author: impl ToString) -> Self {
        Self {
            datetime: Some(datetime),
            author: Some(author.to_string()),
            ..Self::default()
        }
    }
}

// Parser
impl Commit {
    pub fn parse(json_str: &str, origin: &str) -> Result<Vec<Self>> {
        let rows = fields::parse_rows(json_str, origin)?;
        let columns = ResolvedFields::resolve(COMMIT_FIELDS, &rows);
        let commits = rows
            .iter()
            .map(|raw| {
                let row = columns.row(raw);
                Self {
                    datetime: row.timestamp(fields::TIMESTAMP),
                    author: row.identity(fields::IDENTITY),
                    repository: row.text(fields::REPOSITORY),
                    message: row.text(fields::MESSAGE),
                    insertions: row.number(fields::LINES_ADDED),
                    deletions: row.number(fields::LINES_DELETED),
                }
            })
            .collect();
        Ok(commits)
    }
}
