use crate::model::{fields, Period, Result};
use chrono::{DateTime, Datelike, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::fs;

/// When an occurrence was observed: a whole calendar year or a dated entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatternWhen {
    Year(i32),
    Date(DateTime<Utc>),
}

impl PatternWhen {
    /// Years before the reference year are pre, the reference year itself is post.
    pub fn period(&self, reference: &DateTime<Utc>) -> Period {
        match self {
            PatternWhen::Year(year) if *year < reference.year() => Period::Pre,
            PatternWhen::Year(_) => Period::Post,
            PatternWhen::Date(date) => Period::of(date, reference),
        }
    }
}

/// One description pattern seen in a year (or on a date), with who wrote it.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternOccurrence {
    pub pattern: String,
    pub count: f64,
    pub contributors: Vec<String>,
    pub when: PatternWhen,
}

impl PatternOccurrence {
    pub fn in_year(year: i32, pattern: &str, count: f64, contributors: &[&str]) -> Self {
        Self {
            pattern: pattern.to_string(),
            count,
            contributors: contributors.iter().map(|c| c.to_string()).collect(),
            when: PatternWhen::Year(year),
        }
    }
}

/// Occurrences of one description-pattern export, per section (`mrs_analysis`, `commits_analysis`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptionPatterns {
    pub sections: IndexMap<String, Vec<PatternOccurrence>>,
}

#[derive(Debug, Deserialize)]
struct PatternFile {
    #[serde(rename = "descriptionPatterns", default)]
    sections: IndexMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawOccurrence {
    pattern: Option<String>,
    count: Option<f64>,
    contributors: Option<RawContributors>,
    date: Option<String>,
}

/// Contributors arrive either as a list or as a JSON-encoded list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawContributors {
    List(Vec<String>),
    Encoded(String),
}

impl RawContributors {
    fn into_vec(self) -> Vec<String> {
        match self {
            RawContributors::List(list) => list,
            RawContributors::Encoded(encoded) => serde_json::from_str(&encoded).unwrap_or_default(),
        }
    }
}

// Create
impl DescriptionPatterns {
    pub fn from_file(path: &str) -> Result<Self> {
        let json_str = fs::read_to_string(path)?;
        Self::parse(&json_str)
    }
}

// Parser
impl DescriptionPatterns {
    /// Sections that are not objects, and entries that do not parse, contribute nothing.
    pub fn parse(json_str: &str) -> Result<Self> {
        let file: PatternFile = serde_json::from_str(json_str)?;
        let sections = file
            .sections
            .into_iter()
            .map(|(name, section)| {
                let occurrences = match section.get("byYear") {
                    Some(by_year) => yearly_occurrences(by_year),
                    None => dated_occurrences(section.get("patterns")),
                };
                (name, occurrences)
            })
            .collect();
        Ok(Self { sections })
    }
}

fn entries(patterns: Option<&Value>) -> impl Iterator<Item = RawOccurrence> + '_ {
    patterns
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|entry| RawOccurrence::deserialize(entry).ok())
}

fn yearly_occurrences(by_year: &Value) -> Vec<PatternOccurrence> {
    let Some(by_year) = by_year.as_object() else {
        return vec![];
    };
    by_year
        .iter()
        .filter_map(|(year, data)| Some((year.trim().parse::<i32>().ok()?, data)))
        .flat_map(|(year, data)| {
            entries(data.get("patterns")).filter_map(move |entry| {
                Some(PatternOccurrence {
                    pattern: entry.pattern.filter(|p| !p.is_empty())?,
                    count: entry.count.unwrap_or(0.0),
                    contributors: entry.contributors.map(RawContributors::into_vec).unwrap_or_default(),
                    when: PatternWhen::Year(year),
                })
            })
        })
        .collect()
}

fn dated_occurrences(patterns: Option<&Value>) -> Vec<PatternOccurrence> {
    entries(patterns)
        .filter_map(|entry| {
            let contributors = entry.contributors?.into_vec();
            if contributors.is_empty() {
                return None;
            }
            Some(PatternOccurrence {
                pattern: entry.pattern.filter(|p| !p.is_empty())?,
                count: entry.count?,
                contributors,
                when: PatternWhen::Date(fields::parse_timestamp(&entry.date?)?),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn yearly_layout_decodes_encoded_contributor_lists() {
        let patterns = DescriptionPatterns::parse(
            r#"{"descriptionPatterns": {
                "commits_analysis": {"byYear": {
                    "2024": {"patterns": [{"pattern": "fix", "count": 3, "contributors": ["P1", "P2"], "latestDate": "2024-05-01"}]},
                    "2025": {"patterns": [{"pattern": "fix", "count": 2, "contributors": "[\"P1\"]"}, {"count": 9}]},
                    "total": {"patterns": []}
                }},
                "summary": 12
            }}"#,
        )
        .unwrap();
        let commits = &patterns.sections["commits_analysis"];
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0], PatternOccurrence::in_year(2024, "fix", 3.0, &["P1", "P2"]));
        assert_eq!(commits[1].contributors, vec!["P1".to_string()]);
        assert!(patterns.sections["summary"].is_empty());
    }

    #[test]
    fn dated_layout_needs_contributors_count_and_date() {
        let patterns = DescriptionPatterns::parse(
            r#"{"descriptionPatterns": {"mrs_analysis": {"patterns": [
                {"pattern": "feat", "count": 1, "date": "2024-03-01", "contributors": ["P1"]},
                {"pattern": "feat", "count": 1, "date": "2024-03-02", "contributors": []},
                {"pattern": "feat", "date": "2024-03-03", "contributors": ["P2"]},
                {"pattern": "feat", "count": 1, "date": "soon", "contributors": ["P3"]}
            ]}}}"#,
        )
        .unwrap();
        let mrs = &patterns.sections["mrs_analysis"];
        assert_eq!(mrs.len(), 1);
        assert_eq!(
            mrs[0].when,
            PatternWhen::Date(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn reference_year_belongs_to_post() {
        let reference = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();
        assert_eq!(PatternWhen::Year(2024).period(&reference), Period::Pre);
        assert_eq!(PatternWhen::Year(2025).period(&reference), Period::Post);
    }
}
