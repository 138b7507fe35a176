//! Small numeric helpers shared by the indicators

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by n)
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Discrete convolution keeping only fully overlapping positions
///
/// The kernel is flipped, so the output has `max(n, m) - min(n, m) + 1`
/// points. Empty when either input is empty.
pub fn convolve_valid(a: &[f64], v: &[f64]) -> Vec<f64> {
    if a.is_empty() || v.is_empty() {
        return Vec::new();
    }
    let (signal, kernel) = if a.len() >= v.len() { (a, v) } else { (v, a) };
    signal
        .windows(kernel.len())
        .map(|w| w.iter().zip(kernel.iter().rev()).map(|(x, k)| x * k).sum())
        .collect()
}

/// Minimum and maximum of a slice, `None` when empty
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
    )
}

/// Natural log returns of consecutive values
pub fn log_returns(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
}

/// The last `n` elements (or all of them when shorter)
pub fn tail(values: &[f64], n: usize) -> &[f64] {
    &values[values.len().saturating_sub(n)..]
}

/// `n` evenly spaced points over `[start, end]`, inclusive
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}
