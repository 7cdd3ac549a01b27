use crate::model::fields::{self, ResolvedFields, AI_USAGE_FIELDS};
use crate::model::{DataSource, Record, Result};
use chrono::{DateTime, Utc};
use std::fs;

/// One day of AI-assistant usage for the whole organisation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiUsageDay {
    pub date: Option<DateTime<Utc>>,
    pub acceptance_rate: Option<f64>,
    pub suggestions: Option<f64>,
    pub acceptances: Option<f64>,
    pub prompts: Option<f64>,
}

impl Record for AiUsageDay {
    const SOURCE: DataSource = DataSource::AiUsage;

    fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.date
    }
}

impl AiUsageDay {
    /// The reported percentage, or acceptances over suggestions when only counts exist.
    pub fn acceptance_percentage(&self) -> Option<f64> {
        if let Some(rate) = self.acceptance_rate {
            return Some(rate);
        }
        let (suggestions, acceptances) = (self.suggestions?, self.acceptances?);
        (suggestions > 0.0).then(|| acceptances / suggestions * 100.0)
    }
}

// Create
impl AiUsageDay {
    pub fn from_file(path: &str) -> Result<Vec<Self>> {
        let json_str = fs::read_to_string(path)?;
        Self::parse(&json_str, path)
    }
}

// Parser
impl AiUsageDay {
    pub fn parse(json_str: &str, origin: &str) -> Result<Vec<Self>> {
        let rows = fields::parse_rows(json_str, origin)?;
        let columns = ResolvedFields::resolve(AI_USAGE_FIELDS, &rows);
        let days = rows
            .iter()
            .map(|raw| {
                let row = columns.row(raw);
                Self {
                    date: row.timestamp(fields::TIMESTAMP),
                    acceptance_rate: row.number(fields::ACCEPTANCE_RATE),
                    suggestions: row.number(fields::SUGGESTIONS),
                    acceptances: row.number(fields::ACCEPTANCES),
                    prompts: row.number(fields::PROMPTS),
                }
            })
            .collect();
        Ok(days)
    }
}
