//! Small statistics used across the metric catalog.
//!
//! All functions work on their own sorted copy, the input is never reordered.

/// Mass difference between the first two isotopes of a peptide (13C - 12C).
pub const ISOTOPE_UNIT_MASS: f64 = 1.00335483;

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Median of `values`, 0 for an empty slice.
///
/// Even counts average the two central elements.
///
/// ```
/// use smaqc::utils::stats::median;
/// assert_eq!(median(&[]), 0.0);
/// assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
/// ```
pub fn median(values: &[f64]) -> f64 {
    match values.len() {
        0 => 0.0,
        1 => values[0],
        n => {
            let sorted = sorted_copy(values);
            let mid = n / 2;
            if n % 2 == 1 {
                sorted[mid]
            } else {
                (sorted[mid - 1] + sorted[mid]) / 2.0
            }
        }
    }
}

/// Elements of `items`, in their given order, whose zero-based
/// `rank / len` lies in `[lo_frac, hi_frac]`.
pub fn rank_window<T: Clone>(items: &[T], lo_frac: f64, hi_frac: f64) -> Vec<T> {
    let n = items.len() as f64;
    items
        .iter()
        .enumerate()
        .filter(|(i, _)| {
            let frac = *i as f64 / n;
            frac >= lo_frac && frac <= hi_frac
        })
        .map(|(_, x)| x.clone())
        .collect()
}

/// Sort ascending and keep the elements whose rank fraction lies in
/// `[lo_frac, hi_frac]`, both bounds inclusive.
pub fn percentile_trim(values: &[f64], lo_frac: f64, hi_frac: f64) -> Vec<f64> {
    rank_window(&sorted_copy(values), lo_frac, hi_frac)
}

/// Quartile (1..=4) of the zero-based `rank` out of `total` items.
///
/// A rank falling exactly on a boundary belongs to the higher quartile.
pub fn quartile_for(rank: usize, total: usize) -> u8 {
    if total == 0 {
        return 1;
    }
    let frac = rank as f64 / total as f64;
    if frac < 0.25 {
        1
    } else if frac < 0.50 {
        2
    } else if frac < 0.75 {
        3
    } else {
        4
    }
}

/// Index of the `frac` quantile in a sorted collection of `len` items,
/// rounded to the nearest rank and clamped to the last element.
pub fn rounded_index(len: usize, frac: f64) -> usize {
    debug_assert!(len > 0);
    let idx = (len as f64 * frac).round() as usize;
    idx.min(len.saturating_sub(1))
}

/// Fold a precursor mass error back towards zero by whole isotope steps.
///
/// Equivalent to adding `unit_mass` while the error is below -0.5 and then
/// subtracting it while above 0.5, computed without iterating so large
/// inputs finish in constant time. Non-finite inputs are returned unchanged.
pub fn correct_mass_error(delta: f64, unit_mass: f64) -> f64 {
    debug_assert!(unit_mass > 1.0, "unit mass must exceed 1 Da");
    if !delta.is_finite() {
        return delta;
    }
    let mut x = delta;
    if x < -0.5 {
        x = (x + 0.5).rem_euclid(unit_mass) - 0.5;
    }
    if x > 0.5 {
        x = 0.5 - (0.5 - x).rem_euclid(unit_mass);
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert_eq!(median(&[]), 0.0);
        assert_eq!(median(&[5.0]), 5.0);
        assert_eq!(median(&[1.0, 3.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(median(&[9.0, -1.0, 3.0]), 3.0);
    }

    #[test]
    fn test_median_does_not_reorder_input() {
        let vals = vec![3.0, 1.0, 2.0];
        let _ = median(&vals);
        assert_eq!(vals, vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_percentile_trim_bounds_are_inclusive() {
        // Descending input to make sure the trim sorts first.
        let vals: Vec<f64> = (1..=100).rev().map(|x| x as f64).collect();
        let trimmed = percentile_trim(&vals, 0.05, 0.95);
        // Ranks 5..=95 of 100 survive: rank 5 is exactly 0.05, rank 95 exactly 0.95.
        assert_eq!(trimmed.len(), 91);
        assert_eq!(trimmed.first(), Some(&6.0));
        assert_eq!(trimmed.last(), Some(&96.0));
        assert!(!trimmed.contains(&5.0));
        assert!(!trimmed.contains(&97.0));
    }

    #[test]
    fn test_percentile_trim_empty() {
        assert!(percentile_trim(&[], 0.05, 0.95).is_empty());
    }

    #[test]
    fn test_rank_window_keeps_given_order() {
        let items = vec!['d', 'a', 'c', 'b'];
        assert_eq!(rank_window(&items, 0.25, 0.5), vec!['a', 'c']);
        assert_eq!(rank_window(&items, 0.0, 1.0), items);
    }

    #[test]
    fn test_quartile_boundaries() {
        assert_eq!(quartile_for(0, 4), 1);
        assert_eq!(quartile_for(1, 4), 2);
        assert_eq!(quartile_for(2, 4), 3);
        assert_eq!(quartile_for(3, 4), 4);
        assert_eq!(quartile_for(24, 100), 1);
        assert_eq!(quartile_for(25, 100), 2);
        assert_eq!(quartile_for(75, 100), 4);
    }

    #[test]
    fn test_quartiles_monotone_and_non_empty() {
        for total in 4..60 {
            let assigned: Vec<u8> = (0..total).map(|r| quartile_for(r, total)).collect();
            assert!(assigned.windows(2).all(|w| w[0] <= w[1]), "{assigned:?}");
            for q in 1..=4u8 {
                assert!(assigned.contains(&q), "total {total}: {assigned:?}");
            }
        }
    }

    #[test]
    fn test_rounded_index() {
        assert_eq!(rounded_index(10, 0.25), 3);
        assert_eq!(rounded_index(10, 0.75), 8);
        assert_eq!(rounded_index(1, 0.75), 0);
        assert_eq!(rounded_index(2, 0.75), 1);
    }

    #[test]
    fn test_mass_error_correction_matches_isotope_steps() {
        let unit = ISOTOPE_UNIT_MASS;
        for offset in [-0.31, -0.02, 0.0, 0.17, 0.42] {
            for k in -4..=4 {
                let delta = offset + k as f64 * unit;
                let corrected = correct_mass_error(delta, unit);
                assert!(
                    (corrected - offset).abs() < 1e-9,
                    "{delta} -> {corrected}, expected {offset}"
                );
            }
        }
    }

    #[test]
    fn test_mass_error_correction_range() {
        let unit = ISOTOPE_UNIT_MASS;
        let mut x = -25.0;
        while x < 25.0 {
            let corrected = correct_mass_error(x, unit);
            assert!(corrected <= 0.5, "{x} -> {corrected}");
            assert!(corrected > 0.5 - unit, "{x} -> {corrected}");
            x += 0.0137;
        }
    }

    #[test]
    fn test_mass_error_correction_extreme_inputs() {
        let unit = ISOTOPE_UNIT_MASS;
        let huge = correct_mass_error(1e300, unit);
        assert!(huge.is_finite() && huge.abs() <= unit);
        let tiny = correct_mass_error(-1e18, unit);
        assert!(tiny.is_finite() && tiny.abs() <= unit);
        assert!(correct_mass_error(f64::NAN, unit).is_nan());
        assert_eq!(correct_mass_error(0.5, unit), 0.5);
    }
}
