use crate::model::{
    Error, MetricResult, MetricResults, PatternResult, PatternResults, Report, ResearchQuestion,
    Result,
};
use markdown_builder::Markdown;
use markdown_table::{Heading, HeadingAlignment, MarkdownTable};
use std::fs;

/// Table columns; every column after the key is centered.
const COLUMNS: [&str; 11] = [
    "Metric",
    "Key",
    "n1",
    "n2",
    "Median pre",
    "Median post",
    "Change",
    "U",
    "p",
    "r",
    "Effect",
];

const PATTERN_COLUMNS: [&str; 6] = ["Section", "Pattern", "Common", "Median pre", "Median post", "p"];

pub trait MarkdownReport {
    fn report_markdown(&self) -> Result<String>;

    fn report_create(&self, path: &str) -> Result<()> {
        fs::write(path, self.report_markdown()?)?;
        Ok(())
    }
}

impl MarkdownReport for Report {
    fn report_markdown(&self) -> Result<String> {
        let mut doc = Markdown::new();
        let metadata = &self.metadata;

        doc.header1("Mann-Whitney U: pre vs post".to_string());
        doc.paragraph(format!(
            "Reference date **{}**, workforce mode **{}**. {} tests, {} metrics skipped for insufficient data.",
            metadata.reference_date.format("%Y-%m-%d"),
            metadata.workforce_mode,
            metadata.total_tests,
            metadata.skipped_metrics,
        ));
        let sources = metadata
            .data_sources_used
            .iter()
            .map(|(source, used)| format!("{} {}", if *used { "✅" } else { "❌" }, source.key()))
            .collect::<Vec<_>>()
            .join(", ");
        doc.paragraph(format!("Data sources: {sources}"));

        for question in ResearchQuestion::ALL {
            doc.add_question(question, self.group(question))?;
        }
        for (label, patterns) in &self.description_patterns {
            doc.add_patterns(label, patterns)?;
        }
        Ok(doc.render())
    }
}

trait MarkdownExt {
    fn add_question(&mut self, question: ResearchQuestion, results: &MetricResults) -> Result<()>;
    fn add_patterns(&mut self, label: &str, patterns: &PatternResults) -> Result<()>;
    fn add_table(&mut self, columns: &[&str], rows: Vec<Vec<String>>) -> Result<()>;
}

impl MarkdownExt for Markdown {
    fn add_question(&mut self, question: ResearchQuestion, results: &MetricResults) -> Result<()> {
        self.header2(question.title().to_string());
        if results.is_empty() {
            self.paragraph("*No metric could be tested.*".to_string());
            return Ok(());
        }

        let rows = results
            .iter()
            .map(|(key, result)| result_row(key, result))
            .collect();
        self.add_table(&COLUMNS, rows)
    }

    fn add_patterns(&mut self, label: &str, patterns: &PatternResults) -> Result<()> {
        self.header2(format!("Description patterns: {label}"));
        let rows = patterns
            .iter()
            .flat_map(|(section, results)| {
                results
                    .iter()
                    .map(move |(pattern, result)| pattern_row(section, pattern, result))
            })
            .collect::<Vec<_>>();
        if rows.is_empty() {
            self.paragraph("*No pattern found.*".to_string());
            return Ok(());
        }
        self.add_table(&PATTERN_COLUMNS, rows)
    }

    fn add_table(&mut self, columns: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        let header = columns
            .iter()
            .enumerate()
            .map(|(i, title)| {
                let alignment = (i > 1).then_some(HeadingAlignment::Center);
                Heading::new(title.to_string(), alignment)
            })
            .collect::<Vec<_>>();

        let mut md_table = MarkdownTable::new(rows);
        md_table.with_headings(header);
        let rendered = md_table
            .as_markdown()
            .map_err(|e| Error::Markdown(format!("{e:?}")))?;
        self.paragraph(rendered);
        Ok(())
    }
}

fn result_row(key: &str, result: &MetricResult) -> Vec<String> {
    let test = &result.test;
    let marker = if test.significant { " **\\***" } else { "" };
    vec![
        result.metric.clone(),
        format!("`{key}`"),
        format!("{}", test.n1),
        format!("{}", test.n2),
        format!("{:.2}", test.median_pre),
        format!("{:.2}", test.median_post),
        match test.percentage_change {
            Some(change) => format!("{change:+.1}%"),
            None => "n/a".to_string(),
        },
        format!("{:.1}", test.statistic),
        format!("{:.4}{marker}", test.p_value),
        format!("{:+.3}", test.effect_size),
        test.effect_size_interpretation.as_str().to_string(),
    ]
}

fn pattern_row(section: &str, pattern: &str, result: &PatternResult) -> Vec<String> {
    let common = result.contributors.common_contributors.to_string();
    match (&result.test, &result.error) {
        (Some(test), _) => vec![
            section.to_string(),
            format!("`{pattern}`"),
            common,
            format!("{:.2}", test.median_pre),
            format!("{:.2}", test.median_post),
            format!("{:.4}", test.p_value),
        ],
        (None, error) => vec![
            section.to_string(),
            format!("`{pattern}`"),
            common,
            "n/a".to_string(),
            "n/a".to_string(),
            error.clone().unwrap_or_default(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::stats::compare;

    #[test]
    fn rows_format_sentinel_change_and_significance() {
        let result = MetricResult {
            metric: "Commit Frequency (per week)".to_string(),
            test: compare(&[0.0, 0.0, 0.0], &[4.0, 5.0, 6.0]).unwrap(),
            records_pre: 0,
            records_post: 15,
            contributors: None,
        };
        let row = result_row("commitFrequency", &result);
        assert_eq!(row.len(), COLUMNS.len());
        assert_eq!(row[1], "`commitFrequency`");
        assert_eq!(row[6], "n/a");
        assert_eq!(row[10], "large");
        assert!(row[9].starts_with('+'));
    }

    #[test]
    fn untested_patterns_show_why() {
        let result = PatternResult {
            metric: "mrs_analysis:fix - common contributors".to_string(),
            test: None,
            error: Some("no common contributors between pre and post".to_string()),
            common_identities: vec![],
            total_count_pre: 3.0,
            total_count_post: 1.0,
            contributors: crate::model::ContributorSummary {
                contributors_pre: 2,
                contributors_post: 1,
                common_contributors: 0,
            },
        };
        let row = pattern_row("mrs_analysis", "fix", &result);
        assert_eq!(row.len(), PATTERN_COLUMNS.len());
        assert_eq!(row[2], "0");
        assert_eq!(row[5], "no common contributors between pre and post");
    }
}
