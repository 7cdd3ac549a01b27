use crate::model::fields::{self, ResolvedFields, PIPELINE_FIELDS};
use crate::model::{DataSource, Record, Result};
use chrono::{DateTime, Utc};
use std::fs;

const SUCCESS_STATUSES: [&str; 6] = ["success", "passed", "succeeded", "successful", "ok", "completed"];

/// A CI pipeline execution. Not attributed to an individual.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineRun {
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

impl Record for PipelineRun {
    const SOURCE: DataSource = DataSource::Pipelines;

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl PipelineRun {
    /// Missing status counts as a failure; numeric statuses succeed when positive.
    pub fn is_success(&self) -> bool {
        let Some(status) = self.status.as_deref() else {
            return false;
        };
        let status = status.trim().to_lowercase();
        match status.parse::<f64>() {
            Ok(code) => code > 0.0,
            Err(_) => SUCCESS_STATUSES.contains(&status.as_str()),
        }
    }

    pub fn duration_minutes(&self) -> Option<f64> {
        let (created, completed) = (self.created_at?, self.completed_at?);
        Some((completed - created).num_milliseconds() as f64 / 60_000.0)
    }
}

// Create
impl PipelineRun {
    pub fn from_file(path: &str) -> Result<Vec<Self>> {
        let json_str = fs::read_to_string(path)?;
        Self::parse(&json_str, path)
    }

    pub fn at(created_at: DateTime<Utc>, status: impl ToString) -> Self {
        Self {
            created_at: Some(created_at),
            completed_at: None,
            status: Some(status.to_string()),
        }
    }
}

// Parser
impl PipelineRun {
    pub fn parse(json_str: &str, origin: &str) -> Result<Vec<Self>> {
        let rows = fields::parse_rows(json_str, origin)?;
        let columns = ResolvedFields::resolve(PIPELINE_FIELDS, &rows);
        let runs = rows
            .iter()
            .map(|raw| {
                let row = columns.row(raw);
                Self {
                    created_at: row.timestamp(fields::TIMESTAMP),
                    completed_at: row.timestamp(fields::COMPLETED_AT),
                    status: row.text(fields::STATUS),
                }
            })
            .collect();
        Ok(runs)
    }
}
