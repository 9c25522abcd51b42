//! Column statistics over `f64` slices. Callers pass finite values only.

/// Sorted copy of `values`.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_unstable_by(f64::total_cmp);
    v
}

/// Median of already sorted values; the mean of the two middle values for
/// an even count.
pub fn median_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2]),
        _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
    }
}

pub fn median(values: &[f64]) -> Option<f64> {
    median_sorted(&sorted(values))
}

/// Median absolute deviation about `center`.
pub fn mad(values: &[f64], center: f64) -> Option<f64> {
    let deviations = values.iter().map(|x| (x - center).abs()).collect::<Vec<_>>();
    median(&deviations)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by n).
pub fn population_std(values: &[f64], mean: f64) -> Option<f64> {
    (!values.is_empty()).then(|| {
        let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / values.len() as f64;
        var.sqrt()
    })
}

/// Quantile `q` of sorted values by linear interpolation between the order
/// statistics around position `q·(n−1)`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() { return None }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let (lo, hi) = (pos.floor() as usize, pos.ceil() as usize);
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
