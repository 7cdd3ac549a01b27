//! Mann-Whitney U test (two-sided, normal approximation with tie and
//! continuity correction) plus the descriptive fields reported with it.

use crate::model::config::{DEFAULT_MIN_SAMPLE_SIZE, DEFAULT_SIGNIFICANCE_LEVEL};
use crate::model::{EffectMagnitude, TestResult};
use statrs::function::erf::erfc;
use thiserror::Error;

/// Either arm is too small to test; the metric is omitted from the report.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("insufficient data (n1 = {n1}, n2 = {n2})")]
pub struct InsufficientData {
    pub n1: usize,
    pub n2: usize,
}

/// Rank-sum outcome for a pair of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankSums {
    pub r1: f64,
    pub u1: f64,
    pub u2: f64,
    /// `Σ(t³ - t)` over every group of tied values in the pooled sample.
    pub tie_term: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MannWhitney {
    pub min_sample_size: usize,
    pub significance_level: f64,
}

impl Default for MannWhitney {
    fn default() -> Self {
        Self {
            min_sample_size: DEFAULT_MIN_SAMPLE_SIZE,
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }
}

impl MannWhitney {
    pub fn new(min_sample_size: usize, significance_level: f64) -> Self {
        Self {
            min_sample_size: min_sample_size.max(1),
            significance_level,
        }
    }

    pub fn compare(&self, pre: &[f64], post: &[f64]) -> Result<TestResult, InsufficientData> {
        let pre = finite(pre);
        let post = finite(post);
        let (n1, n2) = (pre.len(), post.len());
        if n1 < self.min_sample_size || n2 < self.min_sample_size {
            return Err(InsufficientData { n1, n2 });
        }

        let sums = rank_sums(&pre, &post);
        let (nf1, nf2) = (n1 as f64, n2 as f64);
        let mean_u = nf1 * nf2 / 2.0;
        let variance = null_variance(n1, n2, sums.tie_term);
        let statistic = sums.u1.min(sums.u2);

        let deviation = statistic - mean_u;
        let z_score = if variance > 0.0 {
            (deviation - 0.5 * sign(deviation)) / variance.sqrt()
        } else {
            0.0
        };
        let p_value = two_sided_p_value(z_score);

        // U1 counts pairs where the pre value wins; below its mean the post arm is higher.
        let direction = -sign(sums.u1 - mean_u);
        let magnitude = z_score.abs() / ((n1 + n2) as f64).sqrt();

        let mean_pre = mean(&pre);
        let mean_post = mean(&post);
        Ok(TestResult {
            statistic,
            z_score,
            p_value,
            significant: p_value < self.significance_level,
            effect_size: direction * magnitude,
            effect_size_magnitude: magnitude,
            effect_size_interpretation: EffectMagnitude::from_effect_size(magnitude),
            n1,
            n2,
            median_pre: median(&pre),
            median_post: median(&post),
            mean_pre,
            mean_post,
            std_pre: sample_std(&pre),
            std_post: sample_std(&post),
            percentage_change: percentage_change(mean_pre, mean_post),
        })
    }
}

/// `compare` with the default minimum sample size (2) and alpha (0.05).
pub fn compare(pre: &[f64], post: &[f64]) -> Result<TestResult, InsufficientData> {
    MannWhitney::default().compare(pre, post)
}

/// Pools both samples, assigns mid-ranks to ties and sums the ranks of `pre`.
pub fn rank_sums(pre: &[f64], post: &[f64]) -> RankSums {
    let mut pooled = pre
        .iter()
        .map(|v| (*v, true))
        .chain(post.iter().map(|v| (*v, false)))
        .collect::<Vec<_>>();
    pooled.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut r1 = 0.0;
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < pooled.len() {
        let mut end = start;
        while end + 1 < pooled.len() && pooled[end + 1].0 == pooled[start].0 {
            end += 1;
        }
        // 1-based ranks start+1 ..= end+1 share their average.
        let mid_rank = (start + end + 2) as f64 / 2.0;
        r1 += pooled[start..=end].iter().filter(|(_, is_pre)| *is_pre).count() as f64 * mid_rank;
        let t = (end - start + 1) as f64;
        tie_term += t * t * t - t;
        start = end + 1;
    }

    let (n1, n2) = (pre.len() as f64, post.len() as f64);
    let u1 = r1 - n1 * (n1 + 1.0) / 2.0;
    RankSums {
        r1,
        u1,
        u2: n1 * n2 - u1,
        tie_term,
    }
}

/// Tie-corrected variance of U under the null hypothesis.
pub fn null_variance(n1: usize, n2: usize, tie_term: f64) -> f64 {
    let (nf1, nf2) = (n1 as f64, n2 as f64);
    let n = nf1 + nf2;
    let correction = if n > 1.0 { tie_term / (n * (n - 1.0)) } else { 0.0 };
    nf1 * nf2 / 12.0 * ((n + 1.0) - correction)
}

/// `P(|Z| >= |z|)` for a standard normal `Z`.
pub fn two_sided_p_value(z: f64) -> f64 {
    erfc(z.abs() / std::f64::consts::SQRT_2).clamp(0.0, 1.0)
}

pub fn mean(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    sample.iter().sum::<f64>() / sample.len() as f64
}

pub fn median(sample: &[f64]) -> f64 {
    if sample.is_empty() {
        return 0.0;
    }
    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (n - 1 denominator); 0 below two observations.
pub fn sample_std(sample: &[f64]) -> f64 {
    if sample.len() < 2 {
        return 0.0;
    }
    let m = mean(sample);
    let sum_sq = sample.iter().map(|v| (v - m).powi(2)).sum::<f64>();
    (sum_sq / (sample.len() - 1) as f64).sqrt()
}

/// `(post - pre) / pre * 100`, sign preserved; `None` when `pre` is zero.
pub fn percentage_change(mean_pre: f64, mean_post: f64) -> Option<f64> {
    if mean_pre == 0.0 {
        return None;
    }
    Some((mean_post - mean_pre) / mean_pre * 100.0)
}

/// Drops NaN and infinities; `-0.0` becomes `0.0` so signed zeros rank as one tie.
fn finite(sample: &[f64]) -> Vec<f64> {
    sample
        .iter()
        .filter(|v| v.is_finite())
        .map(|v| v + 0.0)
        .collect()
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    #[test]
    fn separated_samples_match_reference_values() {
        let result = compare(&[1.0, 2.0, 3.0, 4.0, 5.0], &[6.0, 7.0, 8.0, 9.0, 10.0]).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert!((result.z_score + 2.506_718_245_762).abs() < EPS);
        assert!((result.p_value - 0.012_185_780_355).abs() < EPS);
        assert!(result.significant);
        assert!((result.effect_size - 0.792_693_910_891).abs() < EPS);
        assert_eq!(result.effect_size_interpretation, EffectMagnitude::Large);
        assert_eq!(result.median_pre, 3.0);
        assert_eq!(result.mean_post, 8.0);
    }

    #[test]
    fn ties_use_mid_ranks() {
        let sums = rank_sums(&[1.0, 2.0, 2.0, 3.0, 5.0], &[2.0, 4.0, 4.0, 6.0]);
        assert_eq!(sums.u1, 5.0);
        assert_eq!(sums.u2, 15.0);
        // one triple of 2s and one pair of 4s
        assert_eq!(sums.tie_term, 24.0 + 6.0);
        assert!((null_variance(5, 4, sums.tie_term) - 15.972_222_222).abs() < EPS);

        let result = compare(&[1.0, 2.0, 2.0, 3.0, 5.0], &[2.0, 4.0, 4.0, 6.0]).unwrap();
        assert!((result.p_value - 0.260_174_900_984).abs() < EPS);
        assert!(!result.significant);
        assert_eq!(result.effect_size_interpretation, EffectMagnitude::Medium);
    }

    #[test]
    fn u_statistics_partition_all_pairs_without_ties() {
        let sums = rank_sums(&[0.5, 1.5, 9.0], &[2.0, 3.0, 4.0, 5.0]);
        assert_eq!(sums.u1 + sums.u2, 12.0);
        assert_eq!(sums.tie_term, 0.0);
    }

    #[test]
    fn tie_correction_lowers_variance() {
        let tied = rank_sums(&[3.0; 4], &[3.0; 5]);
        let corrected = null_variance(4, 5, tied.tie_term);
        let uncorrected = null_variance(4, 5, 0.0);
        assert!(corrected < uncorrected);
    }

    #[test]
    fn identical_constant_samples_do_not_fault() {
        let result = compare(&[7.0, 7.0, 7.0], &[7.0, 7.0]).unwrap();
        assert_eq!(result.z_score, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert_eq!(result.effect_size, 0.0);
        assert!(!result.significant);
    }

    #[test]
    fn swapping_arms_keeps_u_and_flips_effect_sign() {
        let a = [12.0, 15.0, 11.0, 19.0, 15.0];
        let b = [22.0, 18.0, 25.0, 15.0];
        let forward = compare(&a, &b).unwrap();
        let backward = compare(&b, &a).unwrap();
        assert_eq!(forward.statistic, backward.statistic);
        assert!(forward.effect_size > 0.0);
        assert!((forward.effect_size + backward.effect_size).abs() < 1e-12);
        assert!((forward.p_value - backward.p_value).abs() < 1e-12);
    }

    #[test]
    fn percentage_change_preserves_sign() {
        assert_eq!(percentage_change(100.0, 150.0), Some(50.0));
        assert_eq!(percentage_change(100.0, 50.0), Some(-50.0));
        assert_eq!(percentage_change(0.0, 50.0), None);

        let result = compare(&[0.0, 0.0], &[1.0, 2.0]).unwrap();
        assert_eq!(result.percentage_change, None);
    }

    #[test]
    fn small_or_empty_arms_are_insufficient() {
        assert_eq!(compare(&[], &[5.0, 6.0]), Err(InsufficientData { n1: 0, n2: 2 }));
        assert_eq!(compare(&[1.0], &[5.0, 6.0]), Err(InsufficientData { n1: 1, n2: 2 }));
        assert_eq!(compare(&[], &[]), Err(InsufficientData { n1: 0, n2: 0 }));
    }

    #[test]
    fn non_finite_values_are_ignored() {
        let result = compare(&[1.0, f64::NAN, 2.0], &[3.0, 4.0, f64::INFINITY]).unwrap();
        assert_eq!((result.n1, result.n2), (2, 2));
    }

    #[test]
    fn descriptive_helpers() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
        assert!((sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.138_089_935).abs() < EPS);
        assert_eq!(sample_std(&[3.0]), 0.0);
    }

    #[test]
    fn p_value_follows_the_standard_normal_tail() {
        assert_eq!(two_sided_p_value(0.0), 1.0);
        assert!((two_sided_p_value(1.959_964) - 0.05).abs() < EPS);
        assert!((two_sided_p_value(-2.575_829) - 0.01).abs() < EPS);
        assert!(two_sided_p_value(40.0) >= 0.0);
    }

    #[test]
    fn signed_zeros_are_one_tie_group() {
        let sums = rank_sums(&[0.0, 1.0], &[-0.0, 2.0]);
        assert_eq!(sums.tie_term, 6.0);
        assert_eq!(sums.u1, 1.5);

        let signed = compare(&[0.0, 0.0, 3.0], &[-0.0, -0.0, 4.0]).unwrap();
        let unsigned = compare(&[0.0, 0.0, 3.0], &[0.0, 0.0, 4.0]).unwrap();
        assert_eq!(signed.statistic, 4.0);
        assert_eq!(signed.statistic, unsigned.statistic);
        assert_eq!(signed.p_value, unsigned.p_value);
    }
}
