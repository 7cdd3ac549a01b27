//! Description patterns compared per contributor: for every pattern, each
//! contributor active with it in both periods yields one pre and one post count.

use crate::analyze::stats::MannWhitney;
use crate::model::{ContributorSummary, DescriptionPatterns, PatternOccurrence, PatternResult, PatternResults, Period};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

const NO_COMMON_CONTRIBUTORS: &str = "no common contributors between pre and post";

#[derive(Debug, Default)]
struct PeriodTally<'a> {
    total_count: f64,
    /// Occurrences listing each contributor.
    per_contributor: BTreeMap<&'a str, usize>,
}

pub fn analyze_patterns(
    patterns: &DescriptionPatterns,
    reference: &DateTime<Utc>,
    engine: &MannWhitney,
) -> PatternResults {
    patterns
        .sections
        .iter()
        .map(|(section, occurrences)| {
            let by_pattern = occurrences.iter().fold(
                IndexMap::<&str, Vec<&PatternOccurrence>>::new(),
                |mut acc, occurrence| {
                    acc.entry(occurrence.pattern.as_str()).or_default().push(occurrence);
                    acc
                },
            );
            let results = by_pattern
                .into_iter()
                .map(|(pattern, occurrences)| {
                    let metric = format!("{section}:{pattern} - common contributors");
                    (pattern.to_string(), compare_pattern(metric, &occurrences, reference, engine))
                })
                .collect();
            (section.clone(), results)
        })
        .collect()
}

fn compare_pattern(
    metric: String,
    occurrences: &[&PatternOccurrence],
    reference: &DateTime<Utc>,
    engine: &MannWhitney,
) -> PatternResult {
    let (mut pre, mut post) = (PeriodTally::default(), PeriodTally::default());
    for occurrence in occurrences {
        let tally = match occurrence.when.period(reference) {
            Period::Pre => &mut pre,
            Period::Post => &mut post,
        };
        tally.total_count += occurrence.count;
        for contributor in &occurrence.contributors {
            *tally.per_contributor.entry(contributor.as_str()).or_default() += 1;
        }
    }

    let common = pre
        .per_contributor
        .keys()
        .filter(|contributor| post.per_contributor.contains_key(*contributor))
        .copied()
        .collect::<BTreeSet<_>>();
    let counts = |tally: &PeriodTally| {
        common
            .iter()
            .map(|contributor| tally.per_contributor[contributor] as f64)
            .collect::<Vec<_>>()
    };

    let (test, error) = if common.is_empty() {
        debug!(metric = %metric, "pattern has no common contributors");
        (None, Some(NO_COMMON_CONTRIBUTORS.to_string()))
    } else {
        match engine.compare(&counts(&pre), &counts(&post)) {
            Ok(test) => {
                info!(metric = %metric, p = test.p_value, "pattern tested");
                (Some(test), None)
            }
            Err(insufficient) => {
                debug!(metric = %metric, %insufficient, "pattern not tested");
                (None, Some(insufficient.to_string()))
            }
        }
    };

    PatternResult {
        metric,
        test,
        error,
        common_identities: common.iter().map(|c| c.to_string()).collect(),
        total_count_pre: pre.total_count,
        total_count_post: post.total_count,
        contributors: ContributorSummary {
            contributors_pre: pre.per_contributor.len(),
            contributors_post: post.per_contributor.len(),
            common_contributors: common.len(),
        },
    }
}
