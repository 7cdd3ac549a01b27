use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use devex_impact::analyze::{Analyzer, DataAnalysis};
use devex_impact::model::{
    parse_reference_date, AiUsageDay, AnalysisConfig, Commit, CommitChurnMonth, DataSource,
    DescriptionPatterns, Issue, MergeRequest, MergeRequestChurnMonth, PipelineRun,
    WorkforceSelection,
};
use devex_impact::report::{write_json, write_table, MarkdownReport, PlatformReport};
use devex_impact::utils::{labelled_path, LoadedSource, SourceProgress};
use futures::future;
use indicatif::MultiProgress;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Compare developer-experience metrics before and after an intervention date.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
struct Args {
    /// Intervention instant: `YYYY-MM-DD` (UTC midnight) or RFC 3339.
    #[arg(long = "reference-date")]
    reference_date: String,
    #[arg(long = "workforce-mode", default_value_t = WorkforceSelection::Both)]
    workforce_mode: WorkforceSelection,
    #[arg(long = "commits")]
    commits_path: Option<String>,
    #[arg(long = "mrs")]
    merge_requests_path: Option<String>,
    #[arg(long = "pipelines")]
    pipelines_path: Option<String>,
    #[arg(long = "issues")]
    issues_path: Option<String>,
    #[arg(long = "ai-usage")]
    ai_usage_path: Option<String>,
    /// Monthly commit churn export (`year`, `month`, `total_churn`).
    #[arg(long = "commit-churn")]
    commit_churn_path: Option<String>,
    /// Monthly merge-request churn export (`year`, `month`, `mr_churn`).
    #[arg(long = "mr-churn")]
    merge_request_churn_path: Option<String>,
    /// Description-pattern export, repeatable.
    #[arg(long = "description-patterns", value_name = "LABEL=PATH")]
    description_patterns: Vec<String>,
    #[arg(long = "output", default_value = "mann_whitney_results.json")]
    output_path: String,
    /// Also write a markdown summary to this path.
    #[arg(long = "markdown")]
    markdown_path: Option<String>,
    /// Compare two written reports side by side.
    #[arg(long = "extract-table", num_args = 2, value_names = ["FIRST", "SECOND"])]
    extract_table: Vec<String>,
    #[arg(long = "table-output", default_value = "table_data.csv")]
    table_output: String,
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn has_inputs(&self) -> bool {
        let paths = [
            &self.commits_path,
            &self.merge_requests_path,
            &self.pipelines_path,
            &self.issues_path,
            &self.ai_usage_path,
            &self.commit_churn_path,
            &self.merge_request_churn_path,
        ];
        paths.iter().any(|path| path.is_some()) || !self.description_patterns.is_empty()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    run(&args).await
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: &Args) -> Result<()> {
    if args.has_inputs() || args.extract_table.is_empty() {
        analyze(args).await?;
    }
    if let [first, second] = args.extract_table.as_slice() {
        extract_table(first, second, &args.table_output)?;
    }
    Ok(())
}

async fn analyze(args: &Args) -> Result<()> {
    let reference = parse_reference_date(&args.reference_date)?;
    let config = AnalysisConfig::new(reference).with_workforce(args.workforce_mode);
    let data_analysis = load_sources(args, config).await?;

    let mut report = tokio::task::spawn_blocking(move || data_analysis.analyze())
        .await
        .context("analysis panicked")??;
    report.metadata.analysis_date = Some(Utc::now());
    info!(
        tests = report.metadata.total_tests,
        skipped = report.metadata.skipped_metrics,
        "analysis complete"
    );

    write_json(&report, &args.output_path)
        .with_context(|| format!("failed to write `{}`", args.output_path))?;
    info!(path = %args.output_path, "report written");
    if let Some(path) = &args.markdown_path {
        report
            .report_create(path)
            .with_context(|| format!("failed to write `{path}`"))?;
        info!(path = %path, "markdown summary written");
    }
    Ok(())
}

fn extract_table(first: &str, second: &str, output: &str) -> Result<()> {
    let first = PlatformReport::from_arg(first).with_context(|| format!("failed to read `{first}`"))?;
    let second = PlatformReport::from_arg(second).with_context(|| format!("failed to read `{second}`"))?;
    let latex_path = write_table(&first, &second, output)
        .with_context(|| format!("failed to write `{output}`"))?;
    info!(csv = %output, latex = %latex_path, "comparison table written");
    Ok(())
}

/// Reads one file on the blocking pool, with a progress line for it.
async fn read_blocking<T, F>(
    key: &str,
    path: String,
    multi_progress: &MultiProgress,
    count: fn(&T) -> usize,
    parser: F,
) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&str) -> devex_impact::Result<T> + Send + 'static,
{
    let pb = multi_progress.start_loading(key, &path);
    let loaded = tokio::task::spawn_blocking({
        let path = path.clone();
        move || parser(&path)
    })
    .await
    .with_context(|| format!("reading `{path}` panicked"))?;
    match loaded {
        Ok(value) => {
            pb.finish_loaded(count(&value));
            Ok(value)
        }
        Err(error) => {
            pb.finish_failed();
            Err(error).with_context(|| format!("failed to load {key} from `{path}`"))
        }
    }
}

async fn load_source<T, F>(
    path: Option<&String>,
    source: DataSource,
    multi_progress: &MultiProgress,
    parser: F,
) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: FnOnce(&str) -> devex_impact::Result<Vec<T>> + Send + 'static,
{
    let Some(path) = path else {
        debug!(source = source.key(), "no file supplied");
        return Ok(vec![]);
    };
    read_blocking(source.key(), path.clone(), multi_progress, Vec::len, parser).await
}

async fn load_patterns(
    args: &[String],
    multi_progress: &MultiProgress,
) -> Result<Vec<(String, DescriptionPatterns)>> {
    fn occurrences(patterns: &DescriptionPatterns) -> usize {
        patterns.sections.values().map(Vec::len).sum()
    }

    future::try_join_all(args.iter().map(|arg| async move {
        let (label, path) = labelled_path(arg);
        let patterns = read_blocking(
            "descriptionPatterns",
            path.to_string(),
            multi_progress,
            occurrences,
            DescriptionPatterns::from_file,
        )
        .await?;
        Ok::<_, anyhow::Error>((label, patterns))
    }))
    .await
}

async fn load_sources(args: &Args, config: AnalysisConfig) -> Result<DataAnalysis> {
    let multi_progress = MultiProgress::default();
    let progress = &multi_progress;
    let (commits, merge_requests, pipelines, issues, ai_usage, commit_churn, merge_request_churn, patterns) = futures::join!(
        load_source(args.commits_path.as_ref(), DataSource::Commits, progress, Commit::from_file),
        load_source(args.merge_requests_path.as_ref(), DataSource::MergeRequests, progress, MergeRequest::from_file),
        load_source(args.pipelines_path.as_ref(), DataSource::Pipelines, progress, PipelineRun::from_file),
        load_source(args.issues_path.as_ref(), DataSource::Issues, progress, Issue::from_file),
        load_source(args.ai_usage_path.as_ref(), DataSource::AiUsage, progress, AiUsageDay::from_file),
        load_source(args.commit_churn_path.as_ref(), DataSource::CommitChurn, progress, CommitChurnMonth::from_file),
        load_source(args.merge_request_churn_path.as_ref(), DataSource::MergeRequestChurn, progress, MergeRequestChurnMonth::from_file),
        load_patterns(&args.description_patterns, progress),
    );

    let mut data_analysis = DataAnalysis::new(config);
    data_analysis.insert_commits(commits?);
    data_analysis.insert_merge_requests(merge_requests?);
    data_analysis.insert_pipelines(pipelines?);
    data_analysis.insert_issues(issues?);
    data_analysis.insert_ai_usage(ai_usage?);
    data_analysis.insert_commit_churn(commit_churn?);
    data_analysis.insert_merge_request_churn(merge_request_churn?);
    for (label, patterns) in patterns? {
        data_analysis.insert_description_patterns(label, patterns);
    }
    Ok(data_analysis)
}
