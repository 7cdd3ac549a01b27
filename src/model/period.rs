use crate::model::Record;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Pre,
    Post,
}

impl Period {
    /// Half-open split: the reference instant itself belongs to `Post`.
    pub fn of(timestamp: &DateTime<Utc>, reference: &DateTime<Utc>) -> Self {
        if timestamp < reference {
            Period::Pre
        } else {
            Period::Post
        }
    }
}

/// Records of one source partitioned around the reference instant.
#[derive(Debug)]
pub struct PeriodSplit<'a, R> {
    pub pre: Vec<&'a R>,
    pub post: Vec<&'a R>,
    /// Records without a usable timestamp, kept out of both periods.
    pub dropped: usize,
}

impl<'a, R: Record> PeriodSplit<'a, R> {
    pub fn split(records: &'a [R], reference: &DateTime<Utc>) -> Self {
        let mut split = Self {
            pre: Vec::new(),
            post: Vec::new(),
            dropped: 0,
        };
        for record in records {
            match record.timestamp() {
                Some(timestamp) => match Period::of(&timestamp, reference) {
                    Period::Pre => split.pre.push(record),
                    Period::Post => split.post.push(record),
                },
                None => split.dropped += 1,
            }
        }
        split
    }

    pub fn records(&self, period: Period) -> &[&'a R] {
        match period {
            Period::Pre => &self.pre,
            Period::Post => &self.post,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Commit;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 8, 0, 0, 0).unwrap()
    }

    #[test]
    fn reference_instant_belongs_to_post() {
        let commits = vec![
            Commit::at(reference() - chrono::Duration::seconds(1), "a"),
            Commit::at(reference(), "b"),
            Commit::at(reference() + chrono::Duration::days(3), "c"),
        ];
        let split = PeriodSplit::split(&commits, &reference());
        assert_eq!(split.pre.len(), 1);
        assert_eq!(split.post.len(), 2);
        assert_eq!(split.post[0].author.as_deref(), Some("b"));
    }

    #[test]
    fn records_without_timestamp_are_dropped_from_both_periods() {
        let commits = vec![
            Commit::default(),
            Commit::at(reference(), "b"),
            Commit::default(),
        ];
        let split = PeriodSplit::split(&commits, &reference());
        assert_eq!(split.dropped, 2);
        assert_eq!(split.pre.len() + split.post.len(), 1);
    }

    #[test]
    fn split_is_stable_across_runs() {
        let commits = (0..10)
            .map(|day| Commit::at(reference() + chrono::Duration::days(day - 5), day))
            .collect::<Vec<_>>();
        let first = PeriodSplit::split(&commits, &reference());
        let second = PeriodSplit::split(&commits, &reference());
        assert_eq!(first.pre, second.pre);
        assert_eq!(first.post, second.post);
        assert_eq!(first.records(Period::Pre).len(), 5);
    }
}
