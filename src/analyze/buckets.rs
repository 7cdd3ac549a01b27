use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use itertools::Itertools;
use std::collections::BTreeMap;

/// Monday of the ISO week containing `timestamp`.
pub fn week_start(timestamp: &DateTime<Utc>) -> NaiveDate {
    let date = timestamp.date_naive();
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn month(timestamp: &DateTime<Utc>) -> (i32, u32) {
    (timestamp.year(), timestamp.month())
}

/// Events per ISO week from the first to the last week seen, empty weeks as zero.
/// No events at all still yields one (zero) bucket.
pub fn weekly_counts(timestamps: impl IntoIterator<Item = DateTime<Utc>>) -> Vec<f64> {
    let counts = timestamps
        .into_iter()
        .map(|timestamp| week_start(&timestamp))
        .counts();
    let Some((first, last)) = counts.keys().copied().minmax().into_option() else {
        return vec![0.0];
    };
    let mut week = first;
    let mut sample = Vec::new();
    while week <= last {
        sample.push(counts.get(&week).copied().unwrap_or(0) as f64);
        week += Duration::weeks(1);
    }
    sample
}

/// Percentage of positive outcomes per ISO week; weeks without events have no ratio.
pub fn weekly_ratios(outcomes: impl IntoIterator<Item = (DateTime<Utc>, bool)>) -> Vec<f64> {
    let mut weeks: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for (timestamp, positive) in outcomes {
        let (hits, total) = weeks.entry(week_start(&timestamp)).or_default();
        *hits += usize::from(positive);
        *total += 1;
    }
    weeks
        .values()
        .map(|(hits, total)| *hits as f64 / *total as f64 * 100.0)
        .collect()
}

/// One observation per (bucket, identity) pair that saw at least one event,
/// ordered by bucket then identity.
pub fn counts_per_identity<'a, K: Ord>(events: impl IntoIterator<Item = (K, &'a str)>) -> Vec<f64> {
    let counts: BTreeMap<(K, &str), usize> = events
        .into_iter()
        .fold(BTreeMap::new(), |mut acc, key| {
            *acc.entry(key).or_default() += 1;
            acc
        });
    counts.into_values().map(|count| count as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn weeks_start_on_monday() {
        // 2024-10-10 is a Thursday
        assert_eq!(week_start(&day(2024, 10, 10)), NaiveDate::from_ymd_opt(2024, 10, 7).unwrap());
        assert_eq!(week_start(&day(2024, 10, 7)), NaiveDate::from_ymd_opt(2024, 10, 7).unwrap());
        assert_eq!(week_start(&day(2024, 10, 13)), NaiveDate::from_ymd_opt(2024, 10, 7).unwrap());
    }

    #[test]
    fn empty_weeks_inside_the_span_count_as_zero() {
        let sample = weekly_counts(vec![day(2024, 1, 1), day(2024, 1, 2), day(2024, 1, 22)]);
        assert_eq!(sample, vec![2.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn no_events_is_a_single_zero_week() {
        assert_eq!(weekly_counts(Vec::new()), vec![0.0]);
    }

    #[test]
    fn ratios_skip_weeks_without_events() {
        let sample = weekly_ratios(vec![
            (day(2024, 1, 1), true),
            (day(2024, 1, 2), false),
            (day(2024, 1, 22), true),
        ]);
        assert_eq!(sample, vec![50.0, 100.0]);
    }

    #[test]
    fn identity_counts_are_per_bucket_and_person() {
        let w1 = week_start(&day(2024, 1, 1));
        let w2 = week_start(&day(2024, 1, 8));
        let sample = counts_per_identity(vec![(w1, "a"), (w1, "a"), (w1, "b"), (w2, "a")]);
        assert_eq!(sample, vec![2.0, 1.0, 1.0]);
    }
}
