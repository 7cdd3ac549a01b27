//! Metric registry: one pure extractor per metric, mapping a period's records
//! to the sample that gets compared.

use crate::analyze::buckets::{self, counts_per_identity, weekly_counts, weekly_ratios};
use crate::model::{
    AiUsageDay, Commit, CommitChurnMonth, DataSource, Issue, MergeRequest, MergeRequestChurnMonth,
    PipelineRun, Record, ResearchQuestion,
};
use crate::model::ResearchQuestion::{CognitiveLoad, FeedbackLoops, FlowState};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

pub type Sample = Vec<f64>;
pub type Extract<R> = fn(&[&R]) -> Sample;

/// Weight of the linear line volume (added + deleted).
pub const CHURN_VOLUME_WEIGHT: f64 = 1.0;
/// Weight of the number of files changed.
pub const CHURN_FILES_WEIGHT: f64 = 5.0;
/// Weight of the square-root term.
pub const CHURN_DAMPENER_WEIGHT: f64 = 2.0;

/// MR churn score:
/// `α·(added + deleted) + β·files + γ·√(added + deleted + files)` with α=1.0, β=5.0, γ=2.0.
///
/// The square-root term is intentionally nonlinear: it dampens the influence of
/// very large changesets relative to the linear volume and file-count terms.
pub fn churn(lines_added: f64, lines_deleted: f64, files_changed: f64) -> f64 {
    let volume = lines_added + lines_deleted;
    CHURN_VOLUME_WEIGHT * volume
        + CHURN_FILES_WEIGHT * files_changed
        + CHURN_DAMPENER_WEIGHT * (volume + files_changed).sqrt()
}

/// The extractor of a metric, typed by the data source it reads.
#[derive(Debug, Clone, Copy)]
pub enum Extractor {
    Commits(Extract<Commit>),
    MergeRequests(Extract<MergeRequest>),
    Pipelines(Extract<PipelineRun>),
    Issues(Extract<Issue>),
    AiUsage(Extract<AiUsageDay>),
    CommitChurn(Extract<CommitChurnMonth>),
    MergeRequestChurn(Extract<MergeRequestChurnMonth>),
}

impl Extractor {
    pub fn source(&self) -> DataSource {
        match self {
            Extractor::Commits(_) => DataSource::Commits,
            Extractor::MergeRequests(_) => DataSource::MergeRequests,
            Extractor::Pipelines(_) => DataSource::Pipelines,
            Extractor::Issues(_) => DataSource::Issues,
            Extractor::AiUsage(_) => DataSource::AiUsage,
            Extractor::CommitChurn(_) => DataSource::CommitChurn,
            Extractor::MergeRequestChurn(_) => DataSource::MergeRequestChurn,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub question: ResearchQuestion,
    pub extractor: Extractor,
}

impl MetricDescriptor {
    pub fn required_source(&self) -> DataSource {
        self.extractor.source()
    }
}

const fn metric(
    key: &'static str,
    label: &'static str,
    question: ResearchQuestion,
    extractor: Extractor,
) -> MetricDescriptor {
    MetricDescriptor {
        key,
        label,
        question,
        extractor,
    }
}

pub const METRICS: &[MetricDescriptor] = &[
    // RQ1
    metric("buildDuration", "Build Duration (minutes)", FeedbackLoops, Extractor::Pipelines(build_duration)),
    metric("pipelineExecutionFrequency", "Pipeline Execution Frequency (per week)", FeedbackLoops, Extractor::Pipelines(pipeline_execution_frequency)),
    metric("pipelineSuccessRate", "Pipeline Success Rate (weekly %)", FeedbackLoops, Extractor::Pipelines(pipeline_success_rate)),
    metric("mrCreationRate", "MR/PR Creation Rate (per week)", FeedbackLoops, Extractor::MergeRequests(mr_creation_rate)),
    metric("mrReviewTime", "MR/PR Review Time (hours)", FeedbackLoops, Extractor::MergeRequests(mr_review_time)),
    metric("mrMergeTime", "MR/PR Merge Time (hours)", FeedbackLoops, Extractor::MergeRequests(mr_merge_time)),
    metric("codeReviewParticipation", "Code Review Participation (reviewers per MR)", FeedbackLoops, Extractor::MergeRequests(code_review_participation)),
    // RQ2
    metric("commitFrequency", "Commit Frequency (per week)", CognitiveLoad, Extractor::Commits(commit_frequency)),
    metric("commitLevelChurn", "Code Churn (commit-level)", CognitiveLoad, Extractor::Commits(commit_level_churn)),
    metric("commitMessageLength", "Commit Message Length (characters)", CognitiveLoad, Extractor::Commits(commit_message_length)),
    metric("mrLevelChurn", "Code Churn (MR-level)", CognitiveLoad, Extractor::MergeRequests(mr_level_churn)),
    metric("issueCycleTime", "Issue Cycle Time (hours)", CognitiveLoad, Extractor::Issues(issue_cycle_time)),
    metric("operationalTicketVolume", "Operational Ticket Volume (per week)", CognitiveLoad, Extractor::Issues(operational_ticket_volume)),
    metric("ticketsPerPersonPerWeek", "Tickets per Person per Week", CognitiveLoad, Extractor::Issues(tickets_per_person_per_week)),
    metric("ticketsPerPersonPerMonth", "Tickets per Person per Month", CognitiveLoad, Extractor::Issues(tickets_per_person_per_month)),
    metric("commitLevelChurnMonthly", "Code Churn (commit-level, monthly export)", CognitiveLoad, Extractor::CommitChurn(monthly_commit_churn)),
    metric("mrLevelChurnMonthly", "Code Churn (MR-level, monthly export)", CognitiveLoad, Extractor::MergeRequestChurn(monthly_mr_churn)),
    metric("contextSwitching", "Context Switching Frequency (active projects per developer)", CognitiveLoad, Extractor::Commits(context_switching)),
    // RQ3
    metric("commitsPerDeveloper", "Commits per Developer (per week)", FlowState, Extractor::Commits(commits_per_developer)),
    metric("mrsPerDeveloper", "MRs per Developer (per week)", FlowState, Extractor::MergeRequests(mrs_per_developer)),
    metric("aiAcceptanceRate", "AI Suggestion Acceptance Rate (% per day)", FlowState, Extractor::AiUsage(ai_acceptance_rate)),
    metric("aiPromptVolume", "AI Prompts (per day)", FlowState, Extractor::AiUsage(ai_prompt_volume)),
];

pub fn metrics_for(question: ResearchQuestion) -> impl Iterator<Item = &'static MetricDescriptor> {
    METRICS.iter().filter(move |m| m.question == question)
}

pub fn find(key: &str) -> Option<&'static MetricDescriptor> {
    METRICS.iter().find(|m| m.key == key)
}

fn timestamps<'a, R: Record>(records: &'a [&'a R]) -> impl Iterator<Item = DateTime<Utc>> + 'a {
    records.iter().filter_map(|record| record.timestamp())
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

// Pipelines

pub fn build_duration(runs: &[&PipelineRun]) -> Sample {
    runs.iter().filter_map(|run| positive(run.duration_minutes())).collect()
}

pub fn pipeline_execution_frequency(runs: &[&PipelineRun]) -> Sample {
    weekly_counts(timestamps(runs))
}

pub fn pipeline_success_rate(runs: &[&PipelineRun]) -> Sample {
    weekly_ratios(
        runs.iter()
            .filter_map(|run| run.created_at.map(|at| (at, run.is_success()))),
    )
}

// Merge requests

pub fn mr_creation_rate(mrs: &[&MergeRequest]) -> Sample {
    weekly_counts(timestamps(mrs))
}

pub fn mr_review_time(mrs: &[&MergeRequest]) -> Sample {
    mrs.iter().filter_map(|mr| positive(mr.duration_hours)).collect()
}

pub fn mr_merge_time(mrs: &[&MergeRequest]) -> Sample {
    mrs.iter()
        .filter(|mr| mr.is_merged())
        .filter_map(|mr| positive(mr.duration_hours))
        .collect()
}

pub fn code_review_participation(mrs: &[&MergeRequest]) -> Sample {
    mrs.iter()
        .filter_map(|mr| mr.reviewers.filter(|count| *count >= 0.0))
        .collect()
}

pub fn mr_level_churn(mrs: &[&MergeRequest]) -> Sample {
    mrs.iter()
        .filter_map(|mr| Some(churn(mr.insertions?, mr.deletions?, mr.files_changed?)))
        .collect()
}

pub fn mrs_per_developer(mrs: &[&MergeRequest]) -> Sample {
    counts_per_identity(mrs.iter().filter_map(|mr| {
        Some((buckets::week_start(&mr.created_at?), mr.identity()?))
    }))
}

// Commits

pub fn commit_frequency(commits: &[&Commit]) -> Sample {
    weekly_counts(timestamps(commits))
}

pub fn commit_level_churn(commits: &[&Commit]) -> Sample {
    commits
        .iter()
        .filter_map(|commit| Some(commit.insertions? + commit.deletions?))
        .collect()
}

pub fn commit_message_length(commits: &[&Commit]) -> Sample {
    commits
        .iter()
        .filter_map(|commit| commit.message.as_ref())
        .map(|message| message.chars().count() as f64)
        .collect()
}

/// Distinct repositories each developer committed to during the period.
pub fn context_switching(commits: &[&Commit]) -> Sample {
    let mut projects: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for commit in commits {
        if let (Some(author), Some(repository)) = (commit.identity(), commit.repository.as_deref()) {
            projects.entry(author).or_default().insert(repository);
        }
    }
    projects.values().map(|repos| repos.len() as f64).collect()
}

pub fn commits_per_developer(commits: &[&Commit]) -> Sample {
    counts_per_identity(commits.iter().filter_map(|commit| {
        Some((buckets::week_start(&commit.datetime?), commit.identity()?))
    }))
}

// Monthly churn exports

/// Months without activity are exported as zero and carry no churn signal.
pub fn monthly_commit_churn(months: &[&CommitChurnMonth]) -> Sample {
    months.iter().filter_map(|month| positive(month.churn)).collect()
}

pub fn monthly_mr_churn(months: &[&MergeRequestChurnMonth]) -> Sample {
    months.iter().filter_map(|month| month.churn).collect()
}

// Issues

pub fn issue_cycle_time(issues: &[&Issue]) -> Sample {
    issues
        .iter()
        .filter_map(|issue| positive(issue.cycle_time_hours()))
        .collect()
}

pub fn operational_ticket_volume(issues: &[&Issue]) -> Sample {
    weekly_counts(timestamps(issues))
}

pub fn tickets_per_person_per_week(issues: &[&Issue]) -> Sample {
    counts_per_identity(issues.iter().filter_map(|issue| {
        Some((buckets::week_start(&issue.created_at?), issue.identity()?))
    }))
}

pub fn tickets_per_person_per_month(issues: &[&Issue]) -> Sample {
    counts_per_identity(issues.iter().filter_map(|issue| {
        Some((buckets::month(&issue.created_at?), issue.identity()?))
    }))
}

// AI usage

pub fn ai_acceptance_rate(days: &[&AiUsageDay]) -> Sample {
    days.iter().filter_map(|day| day.acceptance_percentage()).collect()
}

pub fn ai_prompt_volume(days: &[&AiUsageDay]) -> Sample {
    days.iter().filter_map(|day| day.prompts).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PeriodSplit, Workforce, WorkforceMode};
    use chrono::{Duration, TimeZone};

    fn monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn churn_uses_fixed_weights() {
        assert!((churn(80.0, 20.0, 4.0) - 140.396).abs() < 1e-3);
        assert_eq!(churn(0.0, 0.0, 0.0), 0.0);
        assert_eq!((CHURN_VOLUME_WEIGHT, CHURN_FILES_WEIGHT, CHURN_DAMPENER_WEIGHT), (1.0, 5.0, 2.0));
    }

    #[test]
    fn mr_churn_excludes_records_missing_a_component() {
        let complete = MergeRequest {
            insertions: Some(80.0),
            deletions: Some(20.0),
            files_changed: Some(4.0),
            ..MergeRequest::at(monday(), "a")
        };
        let partial = MergeRequest {
            insertions: Some(10.0),
            ..MergeRequest::at(monday(), "b")
        };
        let sample = mr_level_churn(&[&complete, &partial]);
        assert_eq!(sample.len(), 1);
        assert!((sample[0] - 140.396).abs() < 1e-3);
    }

    #[test]
    fn merge_time_only_counts_merged_requests_with_positive_duration() {
        let merged = MergeRequest {
            state: Some("MERGED".into()),
            duration_hours: Some(5.0),
            ..MergeRequest::at(monday(), "a")
        };
        let declined = MergeRequest {
            state: Some("declined".into()),
            duration_hours: Some(3.0),
            ..MergeRequest::at(monday(), "a")
        };
        let instant = MergeRequest {
            state: Some("merged".into()),
            duration_hours: Some(0.0),
            ..MergeRequest::at(monday(), "a")
        };
        assert_eq!(mr_merge_time(&[&merged, &declined, &instant]), vec![5.0]);
        assert_eq!(mr_review_time(&[&merged, &declined, &instant]), vec![5.0, 3.0]);
    }

    #[test]
    fn commit_frequency_fills_quiet_weeks() {
        let commits = [
            Commit::at(monday(), "a"),
            Commit::at(monday() + Duration::days(15), "a"),
        ];
        let refs = commits.iter().collect::<Vec<_>>();
        assert_eq!(commit_frequency(&refs), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn per_developer_counts_are_per_week_and_identity() {
        let commits = [
            Commit::at(monday(), "a"),
            Commit::at(monday() + Duration::hours(2), "a"),
            Commit::at(monday(), "b"),
            Commit::at(monday() + Duration::days(7), "a"),
            Commit { author: None, ..Commit::at(monday(), "") },
        ];
        let refs = commits.iter().collect::<Vec<_>>();
        assert_eq!(commits_per_developer(&refs), vec![2.0, 1.0, 1.0]);
    }

    #[test]
    fn context_switching_counts_distinct_repositories() {
        let commit = |author: &str, repo: &str| Commit {
            repository: Some(repo.to_string()),
            ..Commit::at(monday(), author)
        };
        let commits = [commit("a", "api"), commit("a", "web"), commit("a", "api"), commit("b", "web")];
        let refs = commits.iter().collect::<Vec<_>>();
        assert_eq!(context_switching(&refs), vec![2.0, 1.0]);
    }

    #[test]
    fn pipeline_success_rate_is_weekly_percentage() {
        let runs = [
            PipelineRun::at(monday(), "success"),
            PipelineRun::at(monday(), "failed"),
            PipelineRun::at(monday() + Duration::days(7), "passed"),
        ];
        let refs = runs.iter().collect::<Vec<_>>();
        assert_eq!(pipeline_success_rate(&refs), vec![50.0, 100.0]);
        assert_eq!(pipeline_execution_frequency(&refs), vec![2.0, 1.0]);
    }

    fn resolved(created_at: DateTime<Utc>, hours: i64, assignee: &str) -> Issue {
        Issue {
            resolved_at: Some(created_at + Duration::hours(hours)),
            ..Issue::at(created_at, assignee)
        }
    }

    #[test]
    fn issue_cycle_time_needs_a_later_resolution() {
        let issues = [
            resolved(monday(), 24, "a"),
            resolved(monday(), 0, "a"),
            resolved(monday(), -3, "b"),
            Issue::at(monday(), "b"),
        ];
        let refs = issues.iter().collect::<Vec<_>>();
        assert_eq!(issue_cycle_time(&refs), vec![24.0]);
    }

    #[test]
    fn operational_ticket_volume_counts_every_week_in_span() {
        let issues = [
            Issue::at(monday(), "a"),
            Issue::at(monday() + Duration::days(1), "b"),
            Issue::at(monday() + Duration::days(21), "a"),
        ];
        let refs = issues.iter().collect::<Vec<_>>();
        assert_eq!(operational_ticket_volume(&refs), vec![2.0, 0.0, 0.0, 1.0]);
        assert_eq!(operational_ticket_volume(&[]), vec![0.0]);
    }

    #[test]
    fn tickets_per_person_group_by_week_or_calendar_month() {
        let issues = [
            Issue::at(monday(), "a"),
            Issue::at(monday() + Duration::days(8), "a"),
            Issue::at(monday() + Duration::days(9), "b"),
            Issue::at(monday() + Duration::days(40), "a"),
            Issue { assignee: None, ..Issue::at(monday(), "") },
        ];
        let refs = issues.iter().collect::<Vec<_>>();
        assert_eq!(tickets_per_person_per_week(&refs), vec![1.0, 1.0, 1.0, 1.0]);
        // January: a twice, b once; February: a once
        assert_eq!(tickets_per_person_per_month(&refs), vec![2.0, 1.0, 1.0]);
    }

    #[test]
    fn mr_creation_rate_and_per_developer_counts() {
        let mrs = [
            MergeRequest::at(monday(), "a"),
            MergeRequest::at(monday() + Duration::hours(3), "a"),
            MergeRequest::at(monday() + Duration::days(1), "b"),
            MergeRequest::at(monday() + Duration::days(14), "b"),
            MergeRequest { author: None, ..MergeRequest::at(monday() + Duration::days(14), "") },
        ];
        let refs = mrs.iter().collect::<Vec<_>>();
        assert_eq!(mr_creation_rate(&refs), vec![3.0, 0.0, 2.0]);
        assert_eq!(mrs_per_developer(&refs), vec![2.0, 1.0, 1.0]);
    }

    #[test]
    fn ai_usage_falls_back_to_counts_and_skips_missing_prompts() {
        let day = |rate: Option<f64>, suggestions: Option<f64>, acceptances: Option<f64>, prompts: Option<f64>| AiUsageDay {
            date: Some(monday()),
            acceptance_rate: rate,
            suggestions,
            acceptances,
            prompts,
        };
        let days = [
            day(Some(30.0), Some(100.0), Some(90.0), Some(12.0)),
            day(None, Some(200.0), Some(50.0), None),
            day(None, Some(0.0), Some(0.0), Some(4.0)),
            day(None, None, Some(5.0), None),
        ];
        let refs = days.iter().collect::<Vec<_>>();
        assert_eq!(ai_acceptance_rate(&refs), vec![30.0, 25.0]);
        assert_eq!(ai_prompt_volume(&refs), vec![12.0, 4.0]);
    }

    #[test]
    fn monthly_commit_churn_drops_idle_months() {
        let months = [
            CommitChurnMonth::at(monday(), 120.0),
            CommitChurnMonth::at(monday(), 0.0),
            CommitChurnMonth { churn: None, ..CommitChurnMonth::at(monday(), 1.0) },
        ];
        let refs = months.iter().collect::<Vec<_>>();
        assert_eq!(monthly_commit_churn(&refs), vec![120.0]);

        let months = [MergeRequestChurnMonth::at(monday(), 0.0), MergeRequestChurnMonth::at(monday(), 7.5)];
        let refs = months.iter().collect::<Vec<_>>();
        assert_eq!(monthly_mr_churn(&refs), vec![0.0, 7.5]);
    }

    #[test]
    fn common_mode_keeps_issues_and_merge_requests_of_common_identities() {
        let reference = monday() + Duration::weeks(2);
        let issues = [
            Issue::at(monday(), "a"),
            Issue::at(monday(), "b"),
            Issue::at(reference + Duration::days(1), "a"),
            Issue::at(reference + Duration::days(2), "c"),
            Issue { assignee: None, ..Issue::at(reference, "") },
        ];
        let split = PeriodSplit::split(&issues, &reference);
        let workforce = Workforce::classify(&split);
        let post = workforce.filter(&split.post, WorkforceMode::Common);
        assert_eq!(post.len(), 1);
        assert_eq!(tickets_per_person_per_week(&post), vec![1.0]);
        assert_eq!(workforce.filter(&split.post, WorkforceMode::Full).len(), 3);

        let mrs = [
            MergeRequest::at(monday(), "a"),
            MergeRequest::at(monday(), "b"),
            MergeRequest::at(reference, "b"),
            MergeRequest::at(reference, "b"),
            MergeRequest::at(reference, "c"),
        ];
        let split = PeriodSplit::split(&mrs, &reference);
        let workforce = Workforce::classify(&split);
        let pre = workforce.filter(&split.pre, WorkforceMode::Common);
        let post = workforce.filter(&split.post, WorkforceMode::Common);
        assert_eq!(mrs_per_developer(&pre), vec![1.0]);
        assert_eq!(mrs_per_developer(&post), vec![2.0]);
        assert_eq!(mr_creation_rate(&post), vec![2.0]);
    }

    #[test]
    fn registry_covers_every_question_with_unique_keys() {
        for question in ResearchQuestion::ALL {
            assert!(metrics_for(question).count() > 0);
        }
        let keys = METRICS.iter().map(|m| m.key).collect::<BTreeSet<_>>();
        assert_eq!(keys.len(), METRICS.len());
        assert_eq!(find("mrLevelChurn").unwrap().required_source(), DataSource::MergeRequests);
    }
}
