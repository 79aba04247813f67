use core_types::ReturnSeries;

/// Pearson correlation over the dates both series observe.
///
/// `None` when fewer than two dates overlap or either side has zero variance
/// on the overlap. The result is clamped into `[-1, 1]`.
pub fn pearson(x: &ReturnSeries, y: &ReturnSeries) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .filter_map(|(date, a)| y.get(date).map(|b| (*a, b)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (a, b) in &pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::PnlSeries;

    fn returns(id: &str, cumulative: &[f64]) -> ReturnSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = cumulative
            .iter()
            .enumerate()
            .map(|(i, v)| (start + chrono::Days::new(i as u64), *v))
            .collect();
        PnlSeries::new(id, points).returns(4)
    }

    #[test]
    fn identical_series_correlate_perfectly() {
        let a = returns("A", &[0.0, 1.0, 3.0, 2.0, 6.0]);
        let b = returns("B", &[10.0, 11.0, 13.0, 12.0, 16.0]);
        let r = pearson(&a, &b).unwrap();
        assert!((r - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mirrored_series_anticorrelate() {
        let a = returns("A", &[0.0, 1.0, 3.0, 2.0]);
        let b = returns("B", &[0.0, -1.0, -3.0, -2.0]);
        assert!((pearson(&a, &b).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn flat_series_is_undefined() {
        let a = returns("A", &[0.0, 1.0, 3.0, 2.0]);
        let flat = returns("F", &[5.0, 5.0, 5.0, 5.0]);
        assert_eq!(pearson(&a, &flat), None);
    }

    #[test]
    fn needs_two_overlapping_dates() {
        let a = returns("A", &[0.0, 1.0]);
        let b = returns("B", &[0.0, 2.0]);
        assert_eq!(pearson(&a, &b), None);
    }
}
