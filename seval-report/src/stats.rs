//! Descriptive statistics and the paired significance test
//!
//! The paired comparison is a Wilcoxon signed-rank test over per-item score
//! differences (fine-tuned minus zero-shot), using the normal approximation
//! with tie correction and a two-sided p-value. Zero differences are
//! dropped before ranking, per the standard formulation.

use serde::{Deserialize, Serialize};

/// Mean and dispersion of one set of scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub n: usize,
    pub mean: f64,
    /// Sample standard deviation (n-1 denominator); `None` when n < 2
    pub std_dev: Option<f64>,
}

/// Summarize a set of values; `None` when empty
pub fn summarize(values: &[f64]) -> Option<SummaryStats> {
    if values.is_empty() {
        return None;
    }
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std_dev = (n >= 2).then(|| {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    });
    Some(SummaryStats { n, mean, std_dev })
}

/// Result of one Wilcoxon signed-rank test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedTest {
    /// Matched pairs supplied (including zero differences)
    pub n_pairs: usize,
    /// Pairs with a nonzero difference, the ones actually ranked
    pub n_nonzero: usize,
    /// Sum of ranks of positive differences (W+)
    pub w_statistic: f64,
    pub z: f64,
    /// Two-sided p-value from the normal approximation
    pub p_value: f64,
}

/// Wilcoxon signed-rank test over paired differences.
///
/// With no nonzero differences there is no evidence either way; the test
/// degenerates to z = 0, p = 1.
pub fn wilcoxon_signed_rank(diffs: &[f64]) -> PairedTest {
    let n_pairs = diffs.len();
    let mut nonzero: Vec<f64> = diffs.iter().copied().filter(|d| *d != 0.0).collect();
    let n = nonzero.len();
    if n == 0 {
        return PairedTest {
            n_pairs,
            n_nonzero: 0,
            w_statistic: 0.0,
            z: 0.0,
            p_value: 1.0,
        };
    }

    nonzero.sort_by(|a, b| a.abs().total_cmp(&b.abs()));

    // Average ranks within tie groups on |d|; accumulate the tie correction.
    let mut w_plus = 0.0;
    let mut tie_correction = 0.0;
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && nonzero[end].abs() == nonzero[start].abs() {
            end += 1;
        }
        let group = (end - start) as f64;
        // ranks are 1-based; the group shares the average of its span
        let rank = (start + 1 + end) as f64 / 2.0;
        for value in &nonzero[start..end] {
            if *value > 0.0 {
                w_plus += rank;
            }
        }
        tie_correction += group.powi(3) - group;
        start = end;
    }

    let nf = n as f64;
    let mean = nf * (nf + 1.0) / 4.0;
    let variance = nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - tie_correction / 48.0;
    if variance <= 0.0 {
        return PairedTest {
            n_pairs,
            n_nonzero: n,
            w_statistic: w_plus,
            z: 0.0,
            p_value: 1.0,
        };
    }
    let z = (w_plus - mean) / variance.sqrt();
    let p_value = (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0);
    PairedTest {
        n_pairs,
        n_nonzero: n,
        w_statistic: w_plus,
        z,
        p_value,
    }
}

/// Standard normal CDF via the Abramowitz & Stegun 7.1.26 erf approximation
/// (absolute error below 1.5e-7, ample for a significance indicator)
fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn test_summarize_single_value_has_no_std_dev() {
        let stats = summarize(&[4.0]).unwrap();
        assert_eq!(stats.n, 1);
        assert_eq!(stats.mean, 4.0);
        assert_eq!(stats.std_dev, None);
    }

    #[test]
    fn test_summarize_known_values() {
        let stats = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.n, 8);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        // sample std dev of this classic vector is sqrt(32/7)
        let expected = (32.0f64 / 7.0).sqrt();
        assert!((stats.std_dev.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_normal_cdf_reference_points() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-7);
        assert!((normal_cdf(1.96) - 0.975).abs() < 1e-3);
        assert!((normal_cdf(-1.96) - 0.025).abs() < 1e-3);
    }

    #[test]
    fn test_wilcoxon_all_positive_differences() {
        let test = wilcoxon_signed_rank(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(test.n_nonzero, 5);
        assert_eq!(test.w_statistic, 15.0);
        // z = (15 - 7.5) / sqrt(13.75)
        assert!((test.z - 2.0226).abs() < 1e-3);
        assert!(test.p_value < 0.05 && test.p_value > 0.02);
    }

    #[test]
    fn test_wilcoxon_symmetric_differences_not_significant() {
        let test = wilcoxon_signed_rank(&[1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
        assert!(test.p_value > 0.9);
    }

    #[test]
    fn test_wilcoxon_zero_differences_dropped() {
        let test = wilcoxon_signed_rank(&[0.0, 0.0, 1.0, 2.0]);
        assert_eq!(test.n_pairs, 4);
        assert_eq!(test.n_nonzero, 2);
    }

    #[test]
    fn test_wilcoxon_degenerate_all_ties() {
        let test = wilcoxon_signed_rank(&[0.0, 0.0]);
        assert_eq!(test.n_nonzero, 0);
        assert_eq!(test.p_value, 1.0);
    }
}
