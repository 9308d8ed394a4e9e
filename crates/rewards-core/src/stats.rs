// ── Percentile helper ─────────────────────────────────────────────────────────

/// The `p`-th percentile of an already-sorted slice, linearly interpolated
/// between the neighbouring ranks.
///
/// An empty slice yields `0.0`; callers that need to treat "no data"
/// explicitly should go through [`percentile_of`] instead.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return 0.0;
    }
    let len = sorted_data.len();
    if len == 1 {
        return sorted_data[0];
    }
    let rank = (p / 100.0) * (len as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted_data[lo];
    }
    let frac = rank - lo as f64;
    sorted_data[lo] + frac * (sorted_data[hi] - sorted_data[lo])
}

/// Sort a copy of `values` and compute the `p`-th percentile.
///
/// Returns `None` for an empty slice; NaN values are rejected by returning
/// `None` as well, since they have no defined rank.
pub fn percentile_of(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || values.iter().any(|v| v.is_nan()) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Some(percentile(&sorted, p))
}

/// Median of `values` (50th percentile). `None` for an empty slice.
pub fn median_of(values: &[f64]) -> Option<f64> {
    percentile_of(values, 50.0)
}

// ── IQR fences ────────────────────────────────────────────────────────────────

/// Lower and upper outlier fences derived from the interquartile range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrFences {
    pub lower: f64,
    pub upper: f64,
}

impl IqrFences {
    /// Whether `value` lies inside the fences (inclusive).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Compute Tukey fences at Q1 − `multiplier`·IQR and Q3 + `multiplier`·IQR.
///
/// The conventional multiplier is 1.5. Returns `None` for an empty slice.
pub fn iqr_fences(values: &[f64], multiplier: f64) -> Option<IqrFences> {
    let q1 = percentile_of(values, 25.0)?;
    let q3 = percentile_of(values, 75.0)?;
    let iqr = q3 - q1;
    Some(IqrFences {
        lower: q1 - multiplier * iqr,
        upper: q3 + multiplier * iqr,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── percentile ───────────────────────────────────────────────────────────

    #[test]
    fn test_percentile_empty_returns_zero() {
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_percentile_single_element() {
        assert_eq!(percentile(&[42.0], 1.0), 42.0);
        assert_eq!(percentile(&[42.0], 99.0), 42.0);
    }

    #[test]
    fn test_percentile_p50_even() {
        let data = vec![1.0, 2.0, 3.0, 4.0];
        // rank = 0.5 * 3 = 1.5 → interpolate between data[1]=2 and data[2]=3
        assert!((percentile(&data, 50.0) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_endpoints() {
        let data = vec![10.0, 20.0, 30.0];
        assert!((percentile(&data, 0.0) - 10.0).abs() < 1e-9);
        assert!((percentile(&data, 100.0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_p99_hundred_elements() {
        // 1..=100 sorted: rank = 0.99 * 99 = 98.01 → 99 + 0.01*(100-99) = 99.01
        let data: Vec<f64> = (1..=100).map(|x| x as f64).collect();
        let p99 = percentile(&data, 99.0);
        assert!((p99 - 99.01).abs() < 1e-9, "p99 = {p99}");
    }

    // ── percentile_of / median_of ────────────────────────────────────────────

    #[test]
    fn test_percentile_of_unsorted_input() {
        let data = vec![30.0, 10.0, 20.0];
        assert_eq!(percentile_of(&data, 50.0), Some(20.0));
    }

    #[test]
    fn test_percentile_of_empty_returns_none() {
        assert_eq!(percentile_of(&[], 50.0), None);
    }

    #[test]
    fn test_percentile_of_rejects_nan() {
        assert_eq!(percentile_of(&[1.0, f64::NAN], 50.0), None);
    }

    #[test]
    fn test_median_of_odd_count() {
        assert_eq!(median_of(&[5.0, 1.0, 3.0]), Some(3.0));
    }

    #[test]
    fn test_median_of_even_count_interpolates() {
        assert_eq!(median_of(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
    }

    // ── iqr_fences ───────────────────────────────────────────────────────────

    #[test]
    fn test_iqr_fences_basic() {
        // 1..=5: Q1 = 2, Q3 = 4, IQR = 2 → fences at -1 and 7.
        let data: Vec<f64> = (1..=5).map(|x| x as f64).collect();
        let fences = iqr_fences(&data, 1.5).unwrap();
        assert!((fences.lower - (-1.0)).abs() < 1e-9);
        assert!((fences.upper - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_iqr_fences_contains() {
        let fences = IqrFences {
            lower: 0.0,
            upper: 10.0,
        };
        assert!(fences.contains(0.0));
        assert!(fences.contains(10.0));
        assert!(!fences.contains(-0.1));
        assert!(!fences.contains(10.1));
    }

    #[test]
    fn test_iqr_fences_empty_returns_none() {
        assert!(iqr_fences(&[], 1.5).is_none());
    }

    #[test]
    fn test_iqr_fences_flag_extreme_outlier() {
        let mut data: Vec<f64> = (1..=20).map(|x| x as f64 * 1_000.0).collect();
        data.push(1_000_000.0);
        let fences = iqr_fences(&data, 1.5).unwrap();
        assert!(!fences.contains(1_000_000.0));
        assert!(fences.contains(10_000.0));
    }
}
