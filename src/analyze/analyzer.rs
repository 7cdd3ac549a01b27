use crate::analyze::metrics::{self, Extract, Extractor, MetricDescriptor};
use crate::analyze::patterns::analyze_patterns;
use crate::analyze::stats::{InsufficientData, MannWhitney};
use crate::analyze::{DataAnalysis, QuestionAnalyzed};
use crate::model::{
    AiUsageDay, Commit, CommitChurnMonth, ContributorSummary, DataSource, Error, Issue,
    MergeRequest, MergeRequestChurnMonth, Metadata, MetricResult, PatternResults, PeriodSplit,
    PipelineRun, Record, Report, ResearchQuestion, Result, SkippedMetric, TestResult, Workforce,
    WorkforceMode, YearlyVolume,
};
use chrono::{DateTime, Datelike, Utc};
use indexmap::IndexMap;
use itertools::Itertools;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub trait Analyzer {
    /// Splits every source around the reference instant and classifies its
    /// workforce, once for all research questions.
    fn prepare(&self) -> Result<PreparedSources<'_>>;

    /// Every research question in parallel over one preparation, then the assembled report.
    fn analyze(&self) -> Result<Report> {
        let prepared = self.prepare()?;
        let questions = ResearchQuestion::ALL
            .par_iter()
            .map(|question| prepared.analyze_question(*question))
            .collect();
        prepared.assemble(questions)
    }
}

impl Analyzer for DataAnalysis {
    fn prepare(&self) -> Result<PreparedSources<'_>> {
        self.ensure_supplied()?;
        let prepared = PreparedSources::new(self);
        prepared.warn_dropped();
        Ok(prepared)
    }
}

impl DataAnalysis {
    fn ensure_supplied(&self) -> Result<()> {
        let any_records = DataSource::ALL.iter().any(|source| self.is_supplied(*source));
        if any_records || !self.description_patterns.is_empty() {
            Ok(())
        } else {
            Err(Error::NoDataSources)
        }
    }
}

struct Evaluation {
    test: std::result::Result<TestResult, InsufficientData>,
    records_pre: usize,
    records_post: usize,
    contributors: Option<ContributorSummary>,
}

/// One source split around the reference instant, with its workforce.
struct SourceView<'a, R> {
    split: PeriodSplit<'a, R>,
    workforce: Workforce,
}

impl<'a, R: Record> SourceView<'a, R> {
    fn new(records: &'a [R], reference: &DateTime<Utc>) -> Self {
        let split = PeriodSplit::split(records, reference);
        let workforce = Workforce::classify(&split);
        Self { split, workforce }
    }

    fn evaluate(&self, extract: Extract<R>, mode: WorkforceMode, engine: &MannWhitney) -> Evaluation {
        let pre = self.workforce.filter(&self.split.pre, mode);
        let post = self.workforce.filter(&self.split.post, mode);
        Evaluation {
            test: engine.compare(&extract(&pre), &extract(&post)),
            records_pre: pre.len(),
            records_post: post.len(),
            contributors: self.workforce.summary(),
        }
    }

    fn yearly_volume(&self) -> YearlyVolume {
        let common = [
            self.workforce.filter(&self.split.pre, WorkforceMode::Common),
            self.workforce.filter(&self.split.post, WorkforceMode::Common),
        ];
        YearlyVolume {
            total_per_year: per_year(self.split.pre.iter().chain(&self.split.post).copied()),
            common_per_year: per_year(common.iter().flatten().copied()),
        }
    }
}

fn per_year<'r, R: Record + 'r>(records: impl Iterator<Item = &'r R>) -> BTreeMap<i32, usize> {
    records
        .filter_map(|record| record.timestamp())
        .map(|timestamp| timestamp.year())
        .counts()
        .into_iter()
        .collect()
}

/// Every source of a [`DataAnalysis`] split and classified. Research questions
/// only read it, so they may be evaluated concurrently and handed to
/// [`PreparedSources::assemble`] in any order.
pub struct PreparedSources<'a> {
    data: &'a DataAnalysis,
    engine: MannWhitney,
    commits: SourceView<'a, Commit>,
    merge_requests: SourceView<'a, MergeRequest>,
    pipelines: SourceView<'a, PipelineRun>,
    issues: SourceView<'a, Issue>,
    ai_usage: SourceView<'a, AiUsageDay>,
    commit_churn: SourceView<'a, CommitChurnMonth>,
    merge_request_churn: SourceView<'a, MergeRequestChurnMonth>,
}

impl<'a> PreparedSources<'a> {
    fn new(data: &'a DataAnalysis) -> Self {
        let reference = &data.config.reference;
        Self {
            data,
            engine: MannWhitney::new(data.config.min_sample_size, data.config.significance_level),
            commits: SourceView::new(&data.commits, reference),
            merge_requests: SourceView::new(&data.merge_requests, reference),
            pipelines: SourceView::new(&data.pipelines, reference),
            issues: SourceView::new(&data.issues, reference),
            ai_usage: SourceView::new(&data.ai_usage, reference),
            commit_churn: SourceView::new(&data.commit_churn, reference),
            merge_request_churn: SourceView::new(&data.merge_request_churn, reference),
        }
    }

    pub fn analyze_question(&self, question: ResearchQuestion) -> QuestionAnalyzed {
        let config = &self.data.config;
        let mut analyzed = QuestionAnalyzed::new(question);

        for descriptor in metrics::metrics_for(question) {
            let source = descriptor.required_source();
            if !self.data.is_supplied(source) {
                debug!(metric = descriptor.key, source = source.key(), "source not supplied");
                continue;
            }
            for mode in config.workforce.modes() {
                let key = config.workforce.metric_key(descriptor.key, *mode);
                let evaluation = self.evaluate(descriptor, *mode);
                match evaluation.test {
                    Ok(test) => {
                        info!(metric = %key, p = test.p_value, significant = test.significant, "metric tested");
                        analyzed.results.insert(
                            key,
                            MetricResult {
                                metric: descriptor.label.to_string(),
                                test,
                                records_pre: evaluation.records_pre,
                                records_post: evaluation.records_post,
                                contributors: evaluation.contributors,
                            },
                        );
                    }
                    Err(InsufficientData { n1, n2 }) => {
                        debug!(metric = %key, n1, n2, "insufficient data, metric omitted");
                        analyzed.skipped.push(SkippedMetric {
                            key,
                            question,
                            n1,
                            n2,
                        });
                    }
                }
            }
        }
        analyzed
    }

    pub fn assemble(&self, mut questions: Vec<QuestionAnalyzed>) -> Result<Report> {
        questions.sort_by_key(|analyzed| analyzed.question);
        let config = &self.data.config;

        let mut report = Report {
            metadata: Metadata {
                reference_date: config.reference,
                workforce_mode: config.workforce,
                analysis_date: None,
                data_sources_used: self.data.data_sources_used(),
                total_tests: 0,
                skipped_metrics: 0,
                skipped: vec![],
                yearly_volumes: self.yearly_volumes(),
            },
            rq1_feedback_loops: IndexMap::new(),
            rq2_cognitive_load: IndexMap::new(),
            rq3_flow_state: IndexMap::new(),
            description_patterns: self.description_patterns(),
        };
        for analyzed in questions {
            report.group_mut(analyzed.question).extend(analyzed.results);
            report.metadata.skipped.extend(analyzed.skipped);
        }
        report.metadata.total_tests = report.total_tests();
        report.metadata.skipped_metrics = report.metadata.skipped.len();
        Ok(report)
    }

    fn evaluate(&self, descriptor: &MetricDescriptor, mode: WorkforceMode) -> Evaluation {
        let engine = &self.engine;
        match descriptor.extractor {
            Extractor::Commits(extract) => self.commits.evaluate(extract, mode, engine),
            Extractor::MergeRequests(extract) => self.merge_requests.evaluate(extract, mode, engine),
            Extractor::Pipelines(extract) => self.pipelines.evaluate(extract, mode, engine),
            Extractor::Issues(extract) => self.issues.evaluate(extract, mode, engine),
            Extractor::AiUsage(extract) => self.ai_usage.evaluate(extract, mode, engine),
            Extractor::CommitChurn(extract) => self.commit_churn.evaluate(extract, mode, engine),
            Extractor::MergeRequestChurn(extract) => {
                self.merge_request_churn.evaluate(extract, mode, engine)
            }
        }
    }

    fn description_patterns(&self) -> IndexMap<String, PatternResults> {
        self.data
            .description_patterns
            .iter()
            .map(|(label, patterns)| {
                let results = analyze_patterns(patterns, &self.data.config.reference, &self.engine);
                (label.clone(), results)
            })
            .collect()
    }

    fn dropped(&self) -> [(DataSource, usize); 7] {
        [
            (DataSource::Commits, self.commits.split.dropped),
            (DataSource::MergeRequests, self.merge_requests.split.dropped),
            (DataSource::Pipelines, self.pipelines.split.dropped),
            (DataSource::Issues, self.issues.split.dropped),
            (DataSource::AiUsage, self.ai_usage.split.dropped),
            (DataSource::CommitChurn, self.commit_churn.split.dropped),
            (DataSource::MergeRequestChurn, self.merge_request_churn.split.dropped),
        ]
    }

    fn warn_dropped(&self) {
        for (source, dropped) in self.dropped() {
            if dropped > 0 {
                warn!(source = source.key(), dropped, "records without a usable timestamp were dropped");
            }
        }
    }

    fn yearly_volumes(&self) -> IndexMap<DataSource, YearlyVolume> {
        let volumes = [
            (DataSource::Commits, self.commits.yearly_volume()),
            (DataSource::MergeRequests, self.merge_requests.yearly_volume()),
            (DataSource::Pipelines, self.pipelines.yearly_volume()),
            (DataSource::Issues, self.issues.yearly_volume()),
            (DataSource::AiUsage, self.ai_usage.yearly_volume()),
            (DataSource::CommitChurn, self.commit_churn.yearly_volume()),
            (DataSource::MergeRequestChurn, self.merge_request_churn.yearly_volume()),
        ];
        volumes
            .into_iter()
            .filter(|(source, _)| self.data.is_supplied(*source))
            .collect()
    }
}
