use crate::model::{Report, Result};
use std::fs;

/// Pretty-printed, camelCase report document.
pub fn to_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn write_json(report: &Report, path: &str) -> Result<()> {
    fs::write(path, to_json(report)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::{Analyzer, DataAnalysis};
    use crate::model::{AnalysisConfig, Commit, WorkforceSelection};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::Value;

    #[test]
    fn report_shape_is_stable() {
        let reference = Utc.with_ymd_and_hms(2024, 10, 7, 0, 0, 0).unwrap();
        let config = AnalysisConfig::new(reference).with_workforce(WorkforceSelection::Full);
        let mut data = DataAnalysis::new(config);
        data.insert_commits(
            (1..=6)
                .flat_map(|week| {
                    [
                        Commit::at(reference - Duration::weeks(week), "alice"),
                        Commit::at(reference + Duration::weeks(week - 1), "alice"),
                        Commit::at(reference + Duration::weeks(week - 1) + Duration::hours(1), "alice"),
                    ]
                })
                .collect(),
        );
        let report = data.analyze().unwrap();
        let json: Value = serde_json::from_str(&to_json(&report).unwrap()).unwrap();

        for key in ["rq1_feedback_loops", "rq2_cognitive_load", "rq3_flow_state", "metadata"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        let metadata = &json["metadata"];
        assert_eq!(metadata["workforceMode"], "full");
        assert_eq!(metadata["dataSourcesUsed"]["commits"], true);
        assert_eq!(metadata["dataSourcesUsed"]["aiUsage"], false);
        assert!(metadata.get("analysisDate").is_none());
        assert!(json.get("descriptionPatterns").is_none());

        let frequency = &json["rq2_cognitive_load"]["commitFrequency"];
        assert_eq!(frequency["medianPre"], 1.0);
        assert_eq!(frequency["medianPost"], 2.0);
        assert_eq!(frequency["percentageChange"], 100.0);
        assert_eq!(frequency["effectSizeInterpretation"], "large");
        assert_eq!(frequency["commonContributors"], 1);
        assert_eq!(frequency["recordsPost"], 12);
    }
}
