use crate::model::{
    AiUsageDay, AnalysisConfig, Commit, CommitChurnMonth, DataSource, DescriptionPatterns, Issue,
    MergeRequest, MergeRequestChurnMonth, MetricResults, PipelineRun, ResearchQuestion,
    SkippedMetric,
};
use indexmap::IndexMap;

/// Every record supplied for one run, plus the configuration to analyze it with.
#[derive(Debug, Clone)]
pub struct DataAnalysis {
    pub config: AnalysisConfig,
    pub commits: Vec<Commit>,
    pub merge_requests: Vec<MergeRequest>,
    pub pipelines: Vec<PipelineRun>,
    pub issues: Vec<Issue>,
    pub ai_usage: Vec<AiUsageDay>,
    pub commit_churn: Vec<CommitChurnMonth>,
    pub merge_request_churn: Vec<MergeRequestChurnMonth>,
    /// Description-pattern exports by label (usually the platform).
    pub description_patterns: IndexMap<String, DescriptionPatterns>,
}

impl DataAnalysis {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            commits: vec![],
            merge_requests: vec![],
            pipelines: vec![],
            issues: vec![],
            ai_usage: vec![],
            commit_churn: vec![],
            merge_request_churn: vec![],
            description_patterns: IndexMap::new(),
        }
    }

    pub fn insert_commits(&mut self, commits: Vec<Commit>) {
        self.commits.extend(commits);
    }

    pub fn insert_merge_requests(&mut self, merge_requests: Vec<MergeRequest>) {
        self.merge_requests.extend(merge_requests);
    }

    pub fn insert_pipelines(&mut self, pipelines: Vec<PipelineRun>) {
        self.pipelines.extend(pipelines);
    }

    pub fn insert_issues(&mut self, issues: Vec<Issue>) {
        self.issues.extend(issues);
    }

    pub fn insert_ai_usage(&mut self, ai_usage: Vec<AiUsageDay>) {
        self.ai_usage.extend(ai_usage);
    }

    pub fn insert_commit_churn(&mut self, months: Vec<CommitChurnMonth>) {
        self.commit_churn.extend(months);
    }

    pub fn insert_merge_request_churn(&mut self, months: Vec<MergeRequestChurnMonth>) {
        self.merge_request_churn.extend(months);
    }

    pub fn insert_description_patterns(&mut self, label: impl ToString, patterns: DescriptionPatterns) {
        self.description_patterns.insert(label.to_string(), patterns);
    }

    pub fn records_len(&self, source: DataSource) -> usize {
        match source {
            DataSource::Commits => self.commits.len(),
            DataSource::MergeRequests => self.merge_requests.len(),
            DataSource::Pipelines => self.pipelines.len(),
            DataSource::Issues => self.issues.len(),
            DataSource::AiUsage => self.ai_usage.len(),
            DataSource::CommitChurn => self.commit_churn.len(),
            DataSource::MergeRequestChurn => self.merge_request_churn.len(),
        }
    }

    pub fn is_supplied(&self, source: DataSource) -> bool {
        self.records_len(source) > 0
    }

    pub fn data_sources_used(&self) -> IndexMap<DataSource, bool> {
        DataSource::ALL
            .iter()
            .map(|source| (*source, self.is_supplied(*source)))
            .collect()
    }
}

/// Results of one research question, ready to be merged into a report.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionAnalyzed {
    pub question: ResearchQuestion,
    pub results: MetricResults,
    pub skipped: Vec<SkippedMetric>,
}

impl QuestionAnalyzed {
    pub fn new(question: ResearchQuestion) -> Self {
        Self {
            question,
            results: IndexMap::new(),
            skipped: vec![],
        }
    }
}
