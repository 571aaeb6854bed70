//! Signal statistics over short, possibly gappy series. Non-finite values
//! are skipped; degenerate inputs resolve to 0 instead of NaN.

use crate::consts::MIN_CORRELATION_SAMPLES;

/// Pearson correlation over index-aligned pairs where both values are finite.
///
/// Returns 0 with fewer than three valid pairs or zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (x, y))
        .collect();
    if pairs.len() < MIN_CORRELATION_SAMPLES {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sab, mut saa, mut sbb) = (0.0, 0.0, 0.0);
    for &(x, y) in &pairs {
        let dx = x - mean_a;
        let dy = y - mean_b;
        sab += dx * dy;
        saa += dx * dx;
        sbb += dy * dy;
    }

    let den = (saa * sbb).sqrt();
    if den <= 0.0 || !den.is_finite() {
        return 0.0;
    }
    let r = sab / den;
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fn finite_mean(values: &[f64]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Zero-mean cross-correlation `sum_i (a[i] - mean_a) * (b[i + k] - mean_b)`
/// over indices where both terms are finite.
pub fn cross_correlation_at(a: &[f64], b: &[f64], k: i64, mean_a: f64, mean_b: f64) -> f64 {
    let mut sum = 0.0;
    for (i, &x) in a.iter().enumerate() {
        let j = i as i64 + k;
        if j < 0 || j as usize >= b.len() {
            continue;
        }
        let y = b[j as usize];
        if x.is_finite() && y.is_finite() {
            sum += (x - mean_a) * (y - mean_b);
        }
    }
    sum
}

/// Shift `k` in `[-(n-1), n-1]` maximising the zero-mean cross-correlation of
/// `a` against `b`. Positive `k` means `b` lags `a`.
///
/// Exhaustive search, smallest `|k|` first; a later shift replaces the best
/// only when strictly greater, so ties resolve towards zero (negative first).
pub fn cross_correlation_lag(a: &[f64], b: &[f64]) -> i64 {
    let n = a.len().min(b.len());
    let (a, b) = (&a[..n], &b[..n]);
    let (Some(mean_a), Some(mean_b)) = (finite_mean(a), finite_mean(b)) else {
        return 0;
    };

    let max_shift = n as i64 - 1;
    let mut best_k = 0;
    let mut best = cross_correlation_at(a, b, 0, mean_a, mean_b);
    for magnitude in 1..=max_shift {
        for k in [-magnitude, magnitude] {
            let value = cross_correlation_at(a, b, k, mean_a, mean_b);
            if value > best {
                best = value;
                best_k = k;
            }
        }
    }
    best_k
}

/// Interior indices `i` with `v[i] >= v[i-1]` and `v[i] >= v[i+1]`.
pub fn local_peaks(values: &[f64]) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }
    (1..values.len() - 1)
        .filter(|&i| values[i] >= values[i - 1] && values[i] >= values[i + 1])
        .collect()
}

/// Number of `primary` peaks within `tolerance` samples of any `reference` peak.
pub fn simultaneous_peak_count(primary: &[usize], reference: &[usize], tolerance: usize) -> usize {
    primary
        .iter()
        .filter(|&&p| reference.iter().any(|&q| p.abs_diff(q) <= tolerance))
        .count()
}
