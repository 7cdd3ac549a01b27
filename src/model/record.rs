use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DataSource {
    Commits,
    MergeRequests,
    Pipelines,
    Issues,
    AiUsage,
    CommitChurn,
    MergeRequestChurn,
}

impl DataSource {
    pub const ALL: [DataSource; 7] = [
        DataSource::Commits,
        DataSource::MergeRequests,
        DataSource::Pipelines,
        DataSource::Issues,
        DataSource::AiUsage,
        DataSource::CommitChurn,
        DataSource::MergeRequestChurn,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            DataSource::Commits => "commits",
            DataSource::MergeRequests => "mergeRequests",
            DataSource::Pipelines => "pipelines",
            DataSource::Issues => "issues",
            DataSource::AiUsage => "aiUsage",
            DataSource::CommitChurn => "commitChurn",
            DataSource::MergeRequestChurn => "mergeRequestChurn",
        }
    }

    /// Workforce filtering only ever applies to these sources.
    pub fn is_identity_bearing(&self) -> bool {
        matches!(
            self,
            DataSource::Commits | DataSource::MergeRequests | DataSource::Issues
        )
    }
}

/// An immutable event row from one data source.
pub trait Record {
    const SOURCE: DataSource;

    /// Primary timestamp; `None` when it was missing or unparsable.
    fn timestamp(&self) -> Option<DateTime<Utc>>;

    fn identity(&self) -> Option<&str> {
        None
    }
}
