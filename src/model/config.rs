use crate::model::fields::parse_timestamp;
use crate::model::{Error, Result, WorkforceSelection};
use chrono::{DateTime, Utc};

pub const DEFAULT_MIN_SAMPLE_SIZE: usize = 2;
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Everything the aggregator needs besides the records themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub reference: DateTime<Utc>,
    pub workforce: WorkforceSelection,
    /// Fewer observations than this in either arm skips the metric.
    pub min_sample_size: usize,
    /// No multiple-testing adjustment is applied.
    pub significance_level: f64,
}

// Create
impl AnalysisConfig {
    pub fn new(reference: DateTime<Utc>) -> Self {
        Self {
            reference,
            workforce: WorkforceSelection::default(),
            min_sample_size: DEFAULT_MIN_SAMPLE_SIZE,
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }

    pub fn with_workforce(mut self, workforce: WorkforceSelection) -> Self {
        self.workforce = workforce;
        self
    }
}

/// `YYYY-MM-DD` (UTC midnight) or any RFC 3339 instant.
pub fn parse_reference_date(s: &str) -> Result<DateTime<Utc>> {
    let Some(reference) = parse_timestamp(s) else {
        return Err(Error::InvalidReferenceDate(s.to_string()));
    };
    Ok(reference)
}
