use crate::model::{ContributorSummary, DataSource, WorkforceSelection};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize)]
pub enum ResearchQuestion {
    #[serde(rename = "rq1_feedback_loops")]
    FeedbackLoops,
    #[serde(rename = "rq2_cognitive_load")]
    CognitiveLoad,
    #[serde(rename = "rq3_flow_state")]
    FlowState,
}

impl ResearchQuestion {
    pub const ALL: [ResearchQuestion; 3] = [
        ResearchQuestion::FeedbackLoops,
        ResearchQuestion::CognitiveLoad,
        ResearchQuestion::FlowState,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ResearchQuestion::FeedbackLoops => "rq1_feedback_loops",
            ResearchQuestion::CognitiveLoad => "rq2_cognitive_load",
            ResearchQuestion::FlowState => "rq3_flow_state",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ResearchQuestion::FeedbackLoops => "RQ1: Feedback Loops",
            ResearchQuestion::CognitiveLoad => "RQ2: Cognitive Load",
            ResearchQuestion::FlowState => "RQ3: Flow State",
        }
    }
}

/// Conventional buckets over the unsigned effect size.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectMagnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectMagnitude {
    pub fn from_effect_size(r: f64) -> Self {
        let r = r.abs();
        if r < 0.1 {
            EffectMagnitude::Negligible
        } else if r < 0.3 {
            EffectMagnitude::Small
        } else if r < 0.5 {
            EffectMagnitude::Medium
        } else {
            EffectMagnitude::Large
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectMagnitude::Negligible => "negligible",
            EffectMagnitude::Small => "small",
            EffectMagnitude::Medium => "medium",
            EffectMagnitude::Large => "large",
        }
    }
}

/// Outcome of one Mann-Whitney comparison. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// `min(U1, U2)`
    pub statistic: f64,
    pub z_score: f64,
    pub p_value: f64,
    pub significant: bool,
    /// Positive when the post sample is shifted upwards.
    pub effect_size: f64,
    pub effect_size_magnitude: f64,
    pub effect_size_interpretation: EffectMagnitude,
    pub n1: usize,
    pub n2: usize,
    pub median_pre: f64,
    pub median_post: f64,
    pub mean_pre: f64,
    pub mean_post: f64,
    pub std_pre: f64,
    pub std_post: f64,
    /// `None` (JSON `null`) when the pre mean is zero.
    pub percentage_change: Option<f64>,
}

/// A test result as it appears in the report, with the context it was computed in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    pub metric: String,
    #[serde(flatten)]
    pub test: TestResult,
    pub records_pre: usize,
    pub records_post: usize,
    #[serde(flatten)]
    pub contributors: Option<ContributorSummary>,
}

pub type MetricResults = IndexMap<String, MetricResult>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedMetric {
    pub key: String,
    pub question: ResearchQuestion,
    pub n1: usize,
    pub n2: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyVolume {
    pub total_per_year: BTreeMap<i32, usize>,
    pub common_per_year: BTreeMap<i32, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub reference_date: DateTime<Utc>,
    pub workforce_mode: WorkforceSelection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_date: Option<DateTime<Utc>>,
    pub data_sources_used: IndexMap<DataSource, bool>,
    pub total_tests: usize,
    pub skipped_metrics: usize,
    pub skipped: Vec<SkippedMetric>,
    pub yearly_volumes: IndexMap<DataSource, YearlyVolume>,
}

/// A description pattern compared over the contributors who used it in both periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternResult {
    pub metric: String,
    #[serde(flatten)]
    pub test: Option<TestResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub common_identities: Vec<String>,
    pub total_count_pre: f64,
    pub total_count_post: f64,
    #[serde(flatten)]
    pub contributors: ContributorSummary,
}

/// Section -> pattern -> result.
pub type PatternResults = IndexMap<String, IndexMap<String, PatternResult>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub metadata: Metadata,
    pub rq1_feedback_loops: MetricResults,
    pub rq2_cognitive_load: MetricResults,
    pub rq3_flow_state: MetricResults,
    /// Per pattern export label.
    #[serde(rename = "descriptionPatterns", skip_serializing_if = "IndexMap::is_empty")]
    pub description_patterns: IndexMap<String, PatternResults>,
}

impl Report {
    pub fn group(&self, question: ResearchQuestion) -> &MetricResults {
        match question {
            ResearchQuestion::FeedbackLoops => &self.rq1_feedback_loops,
            ResearchQuestion::CognitiveLoad => &self.rq2_cognitive_load,
            ResearchQuestion::FlowState => &self.rq3_flow_state,
        }
    }

    pub fn group_mut(&mut self, question: ResearchQuestion) -> &mut MetricResults {
        match question {
            ResearchQuestion::FeedbackLoops => &mut self.rq1_feedback_loops,
            ResearchQuestion::CognitiveLoad => &mut self.rq2_cognitive_load,
            ResearchQuestion::FlowState => &mut self.rq3_flow_state,
        }
    }

    pub fn total_tests(&self) -> usize {
        ResearchQuestion::ALL
            .iter()
            .map(|question| self.group(*question).len())
            .sum()
    }
}
