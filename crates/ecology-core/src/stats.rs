//! Small descriptive-statistics helpers used by the aggregation layer.
//!
//! All functions return `None` instead of `NaN` when the input cannot
//! support the statistic.

use crate::models::LinearFit;

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// `part / whole * 100`, or `None` when `whole` is zero.
pub fn percent(part: usize, whole: usize) -> Option<f64> {
    if whole == 0 {
        return None;
    }
    Some(part as f64 / whole as f64 * 100.0)
}

/// Sample means and centered sums: `(mean_x, mean_y, sxx, syy, sxy)`.
fn centered_sums(pairs: &[(f64, f64)]) -> Option<(f64, f64, f64, f64, f64)> {
    let n = pairs.len() as f64;
    if pairs.is_empty() {
        return None;
    }
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for &(x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    Some((mean_x, mean_y, sxx, syy, sxy))
}

/// Pearson correlation coefficient of `(x, y)` pairs.
///
/// Requires at least two pairs and non-zero variance on both axes. The
/// result is clamped to `[-1, 1]` to absorb rounding drift.
pub fn pearson(pairs: &[(f64, f64)]) -> Option<f64> {
    if pairs.len() < 2 {
        return None;
    }
    let (_, _, sxx, syy, sxy) = centered_sums(pairs)?;
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Ordinary least-squares line through `(x, y)` pairs.
///
/// Requires at least two pairs and non-zero variance in `x`.
pub fn linear_fit(pairs: &[(f64, f64)]) -> Option<LinearFit> {
    if pairs.len() < 2 {
        return None;
    }
    let (mean_x, mean_y, sxx, _, sxy) = centered_sums(pairs)?;
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── mean / percent ────────────────────────────────────────────────────────

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[4.0]), Some(4.0));
        assert_eq!(mean(&[1.0, 2.0, 3.0, 6.0]), Some(3.0));
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 4), Some(25.0));
        assert_eq!(percent(0, 3), Some(0.0));
        assert_eq!(percent(3, 3), Some(100.0));
        assert_eq!(percent(0, 0), None);
    }

    // ── pearson ───────────────────────────────────────────────────────────────

    #[test]
    fn test_pearson_perfect_positive() {
        let pairs = [(1.0, 2.0), (2.0, 4.0), (3.0, 6.0)];
        let r = pearson(&pairs).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_perfect_negative() {
        let pairs = [(0.0, 10.0), (1.0, 8.0), (2.0, 6.0), (3.0, 4.0)];
        let r = pearson(&pairs).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pearson_undefined_cases() {
        assert_eq!(pearson(&[]), None);
        assert_eq!(pearson(&[(1.0, 1.0)]), None);
        // Constant y.
        assert_eq!(pearson(&[(1.0, 5.0), (2.0, 5.0), (3.0, 5.0)]), None);
        // Constant x.
        assert_eq!(pearson(&[(2.0, 1.0), (2.0, 3.0)]), None);
    }

    #[test]
    fn test_pearson_known_value() {
        // x = 1..5, y = [2, 4, 5, 4, 5] → r ≈ 0.7746
        let pairs = [(1.0, 2.0), (2.0, 4.0), (3.0, 5.0), (4.0, 4.0), (5.0, 5.0)];
        let r = pearson(&pairs).unwrap();
        assert!((r - 0.774_596_669).abs() < 1e-6);
    }

    // ── linear_fit ────────────────────────────────────────────────────────────

    #[test]
    fn test_linear_fit_exact_line() {
        let pairs = [(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)];
        let fit = linear_fit(&pairs).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_fit_known_value() {
        let pairs = [(1.0, 2.0), (2.0, 4.0), (3.0, 5.0), (4.0, 4.0), (5.0, 5.0)];
        let fit = linear_fit(&pairs).unwrap();
        assert!((fit.slope - 0.6).abs() < 1e-12);
        assert!((fit.intercept - 2.2).abs() < 1e-12);
    }

    #[test]
    fn test_linear_fit_constant_y_is_flat() {
        let fit = linear_fit(&[(1.0, 5.0), (2.0, 5.0)]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 5.0);
    }

    #[test]
    fn test_linear_fit_undefined_cases() {
        assert_eq!(linear_fit(&[(1.0, 2.0)]), None);
        assert_eq!(linear_fit(&[(3.0, 1.0), (3.0, 9.0)]), None);
    }
}
