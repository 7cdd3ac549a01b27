use crate::model::{Error, PeriodSplit, Record};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkforceMode {
    /// Every contributor, no identity filtering.
    Full,
    /// Only identities active both before and after the reference instant.
    Common,
}

impl WorkforceMode {
    pub fn suffix(&self) -> &'static str {
        match self {
            WorkforceMode::Full => "full",
            WorkforceMode::Common => "common",
        }
    }
}

/// The workforce modes requested for a run.
#[derive(Debug, Clone, Copy, Default, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkforceSelection {
    Full,
    Common,
    #[default]
    Both,
}

impl WorkforceSelection {
    pub fn modes(&self) -> &'static [WorkforceMode] {
        match self {
            WorkforceSelection::Full => &[WorkforceMode::Full],
            WorkforceSelection::Common => &[WorkforceMode::Common],
            WorkforceSelection::Both => &[WorkforceMode::Full, WorkforceMode::Common],
        }
    }

    /// Report key for a metric: suffixed only when both modes are reported.
    pub fn metric_key(&self, key: &str, mode: WorkforceMode) -> String {
        match self {
            WorkforceSelection::Both => format!("{key}_{}", mode.suffix()),
            _ => key.to_string(),
        }
    }
}

impl FromStr for WorkforceSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(WorkforceSelection::Full),
            "common" => Ok(WorkforceSelection::Common),
            "both" => Ok(WorkforceSelection::Both),
            other => Err(Error::InvalidWorkforceMode(other.to_string())),
        }
    }
}

impl fmt::Display for WorkforceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkforceSelection::Full => "full",
            WorkforceSelection::Common => "common",
            WorkforceSelection::Both => "both",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorSummary {
    pub contributors_pre: usize,
    pub contributors_post: usize,
    pub common_contributors: usize,
}

/// Identities active per period for one data source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workforce {
    pub pre: BTreeSet<String>,
    pub post: BTreeSet<String>,
    pub common: BTreeSet<String>,
    identity_bearing: bool,
}

impl Workforce {
    pub fn classify<R: Record>(split: &PeriodSplit<'_, R>) -> Self {
        fn identities<R: Record>(records: &[&R]) -> BTreeSet<String> {
            records
                .iter()
                .filter_map(|record| record.identity())
                .map(String::from)
                .collect()
        }

        let pre = identities(&split.pre);
        let post = identities(&split.post);
        let common = pre.intersection(&post).cloned().collect();
        Self {
            pre,
            post,
            common,
            identity_bearing: R::SOURCE.is_identity_bearing(),
        }
    }

    /// Under `Common`, identity-bearing sources keep only records of common
    /// identities; other sources pass through untouched.
    pub fn filter<'a, R: Record>(&self, records: &[&'a R], mode: WorkforceMode) -> Vec<&'a R> {
        match mode {
            WorkforceMode::Common if self.identity_bearing => records
                .iter()
                .filter(|record| {
                    record
                        .identity()
                        .is_some_and(|identity| self.common.contains(identity))
                })
                .copied()
                .collect(),
            _ => records.to_vec(),
        }
    }

    pub fn summary(&self) -> Option<ContributorSummary> {
        self.identity_bearing.then(|| ContributorSummary {
            contributors_pre: self.pre.len(),
            contributors_post: self.post.len(),
            common_contributors: self.common.len(),
        })
    }
}
