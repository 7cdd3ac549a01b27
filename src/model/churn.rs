use crate::model::fields::{self, FieldAliases, ResolvedFields, COMMIT_CHURN_FIELDS, MERGE_REQUEST_CHURN_FIELDS};
use crate::model::{DataSource, Record, Result};
use chrono::{DateTime, Utc};
use std::fs;

/// Commit churn already summed per calendar month by an upstream export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitChurnMonth {
    pub month: Option<DateTime<Utc>>,
    pub churn: Option<f64>,
}

/// Merge-request churn already summed per calendar month by an upstream export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeRequestChurnMonth {
    pub month: Option<DateTime<Utc>>,
    pub churn: Option<f64>,
}

impl Record for CommitChurnMonth {
    const SOURCE: DataSource = DataSource::CommitChurn;

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.month
    }
}

impl Record for MergeRequestChurnMonth {
    const SOURCE: DataSource = DataSource::MergeRequestChurn;

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.month
    }
}

// Create
impl CommitChurnMonth {
    pub fn from_file(path: &str) -> Result<Vec<Self>> {
        let json_str = fs::read_to_string(path)?;
        Self::parse(&json_str, path)
    }

    pub fn at(month: DateTime<Utc>, churn: f64) -> Self {
        Self {
            month: Some(month),
            churn: Some(churn),
        }
    }
}

impl MergeRequestChurnMonth {
    pub fn from_file(path: &str) -> Result<Vec<Self>> {
        let json_str = fs::read_to_string(path)?;
        Self::parse(&json_str, path)
    }

    pub fn at(month: DateTime<Utc>, churn: f64) -> Self {
        Self {
            month: Some(month),
            churn: Some(churn),
        }
    }
}

// Parser
impl CommitChurnMonth {
    pub fn parse(json_str: &str, origin: &str) -> Result<Vec<Self>> {
        let months = parse_months(json_str, origin, COMMIT_CHURN_FIELDS)?
            .into_iter()
            .map(|(month, churn)| Self { month, churn })
            .collect();
        Ok(months)
    }
}

impl MergeRequestChurnMonth {
    pub fn parse(json_str: &str, origin: &str) -> Result<Vec<Self>> {
        let months = parse_months(json_str, origin, MERGE_REQUEST_CHURN_FIELDS)?
            .into_iter()
            .map(|(month, churn)| Self { month, churn })
            .collect();
        Ok(months)
    }
}

fn parse_months(
    json_str: &str,
    origin: &str,
    table: &[FieldAliases],
) -> Result<Vec<(Option<DateTime<Utc>>, Option<f64>)>> {
    let rows = fields::parse_rows(json_str, origin)?;
    let columns = ResolvedFields::resolve(table, &rows);
    Ok(rows
        .iter()
        .map(|raw| {
            let row = columns.row(raw);
            (row.month_start(fields::YEAR, fields::MONTH), row.number(fields::CHURN))
        })
        .collect())
}
