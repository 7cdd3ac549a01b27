mod ai_usage;
mod churn;
mod commit;
pub mod config;
mod description_pattern;
pub mod fields;
mod issue;
mod merge_request;
mod period;
mod pipeline;
mod record;
mod report;
mod result;
mod workforce;

pub use ai_usage::AiUsageDay;
pub use churn::{CommitChurnMonth, MergeRequestChurnMonth};
pub use commit::Commit;
pub use config::{parse_reference_date, AnalysisConfig};
pub use description_pattern::{DescriptionPatterns, PatternOccurrence, PatternWhen};
pub use issue::Issue;
pub use merge_request::MergeRequest;
pub use period::{Period, PeriodSplit};
pub use pipeline::PipelineRun;
pub use record::{DataSource, Record};
pub use report::{
    EffectMagnitude, Metadata, MetricResult, MetricResults, PatternResult, PatternResults, Report,
    ResearchQuestion, SkippedMetric, TestResult, YearlyVolume,
};
pub use result::{Error, Result};
pub use workforce::{ContributorSummary, Workforce, WorkforceMode, WorkforceSelection};
