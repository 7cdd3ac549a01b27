//! Side-by-side comparison table of two platforms' reports, written as CSV
//! plus the matching LaTeX table body.

use crate::analyze::metrics;
use crate::model::{ResearchQuestion, Result};
use crate::utils::labelled_path;
use serde_json::Value;
use std::fs;

const NOT_AVAILABLE: &str = "N/A";

const SECTIONS: &[(&str, &[&str])] = &[
    ("Pipeline Metrics", &["pipelineExecutionFrequency", "pipelineSuccessRate", "buildDuration"]),
    ("MR/PR Metrics", &["mrCreationRate", "mrReviewTime", "mrMergeTime", "codeReviewParticipation"]),
    ("Commit Metrics", &["commitFrequency", "commitLevelChurn", "commitMessageLength"]),
    ("Churn Metrics", &["mrLevelChurn"]),
    ("Issue Metrics", &["issueCycleTime", "operationalTicketVolume"]),
    ("Developer Productivity", &["commitsPerDeveloper", "mrsPerDeveloper"]),
];

/// A report document as written by this tool, under a short platform label.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformReport {
    pub label: String,
    report: Value,
}

// Create
impl PlatformReport {
    /// `LABEL=PATH`, or a bare path labelled by its file stem.
    pub fn from_arg(arg: &str) -> Result<Self> {
        let (label, path) = labelled_path(arg);
        let json_str = fs::read_to_string(path)?;
        Self::parse(label, &json_str)
    }

    pub fn parse(label: impl ToString, json_str: &str) -> Result<Self> {
        Ok(Self {
            label: label.to_string(),
            report: serde_json::from_str(json_str)?,
        })
    }
}

impl PlatformReport {
    /// The unsuffixed key first, then its full-workforce variant.
    fn metric(&self, key: &str) -> Option<&Value> {
        let full = format!("{key}_full");
        ResearchQuestion::ALL.iter().find_map(|question| {
            let group = self.report.get(question.key())?;
            group.get(key).or_else(|| group.get(&full))
        })
    }
}

/// The formatted cells of one metric for one platform.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformCells {
    pub median_pre: String,
    pub median_post: String,
    pub delta: String,
    pub n1: String,
    pub n2: String,
    pub p_value: String,
}

impl PlatformCells {
    fn of(metric: Option<&Value>) -> Self {
        let number = |field: &str, precision: usize| {
            metric
                .and_then(|m| m.get(field))
                .and_then(Value::as_f64)
                .map(|v| format!("{v:.precision$}"))
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        let count = |field: &str| {
            metric
                .and_then(|m| m.get(field))
                .and_then(Value::as_u64)
                .map(|n| n.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };
        Self {
            median_pre: number("medianPre", 2),
            median_post: number("medianPost", 2),
            delta: number("percentageChange", 1),
            n1: count("n1"),
            n2: count("n2"),
            p_value: number("pValue", 4),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableRow {
    Section(&'static str),
    Metric {
        label: &'static str,
        first: PlatformCells,
        second: PlatformCells,
    },
}

pub fn comparison_rows(first: &PlatformReport, second: &PlatformReport) -> Vec<TableRow> {
    let mut rows = vec![];
    for (section, keys) in SECTIONS {
        rows.push(TableRow::Section(*section));
        for key in *keys {
            let label = metrics::find(key).map_or(*key, |descriptor| descriptor.label);
            rows.push(TableRow::Metric {
                label,
                first: PlatformCells::of(first.metric(key)),
                second: PlatformCells::of(second.metric(key)),
            });
        }
    }
    rows
}

pub fn render_csv(first: &PlatformReport, second: &PlatformReport, rows: &[TableRow]) -> String {
    let (a, b) = (&first.label, &second.label);
    let mut header = vec!["Section".to_string(), "Metric".to_string()];
    for label in [a, b] {
        header.extend(["pre", "post", "delta", "n1", "n2"].map(|column| format!("{label}_{column}")));
    }
    header.extend([format!("{a}_pValue"), format!("{b}_pValue")]);

    let mut csv = csv_line(&header);
    for row in rows {
        let line = match row {
            TableRow::Section(section) => {
                let mut line = vec![section.to_string()];
                line.resize(header.len(), String::new());
                line
            }
            TableRow::Metric { label, first, second } => {
                let mut line = vec![String::new(), label.to_string()];
                for cells in [first, second] {
                    line.extend([
                        cells.median_pre.clone(),
                        cells.median_post.clone(),
                        cells.delta.clone(),
                        cells.n1.clone(),
                        cells.n2.clone(),
                    ]);
                }
                line.extend([first.p_value.clone(), second.p_value.clone()]);
                line
            }
        };
        csv.push_str(&csv_line(&line));
    }
    csv
}

/// Rows for a seven-column `tabular`: metric, then pre / post / delta per platform.
pub fn render_latex(rows: &[TableRow]) -> String {
    rows.iter()
        .map(|row| match row {
            TableRow::Section(section) => format!(
                "\\midrule\n\\multicolumn{{7}}{{l}}{{\\textit{{{}}}}} \\\\\n\\midrule\n",
                latex_escape(section)
            ),
            TableRow::Metric { label, first, second } => format!(
                "{} & {} & {} & {} & {} & {} & {} \\\\\n",
                latex_escape(label),
                first.median_pre,
                first.median_post,
                first.delta,
                second.median_pre,
                second.median_post,
                second.delta,
            ),
        })
        .collect()
}

/// Writes the CSV to `csv_path` and the LaTeX rows next to it; returns the LaTeX path.
pub fn write_table(first: &PlatformReport, second: &PlatformReport, csv_path: &str) -> Result<String> {
    let rows = comparison_rows(first, second);
    fs::write(csv_path, render_csv(first, second, &rows))?;
    let latex_path = latex_path(csv_path);
    fs::write(&latex_path, render_latex(&rows))?;
    Ok(latex_path)
}

fn latex_path(csv_path: &str) -> String {
    let stem = csv_path.strip_suffix(".csv").unwrap_or(csv_path);
    format!("{stem}_latex.txt")
}

fn csv_line(fields: &[String]) -> String {
    let mut line = fields
        .iter()
        .map(|field| {
            if field.contains(&[',', '"', '\n'][..]) {
                format!("\"{}\"", field.replace('"', "\"\""))
            } else {
                field.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

fn latex_escape(text: &str) -> String {
    text.chars().fold(String::new(), |mut out, c| {
        if matches!(c, '%' | '&' | '_' | '#' | '$') {
            out.push('\\');
        }
        out.push(c);
        out
    })
}
