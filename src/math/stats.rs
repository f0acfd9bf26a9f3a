//! Summary statistics shared by the scaler and the fit diagnostics.

use crate::domain::FitQuality;

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divisor `n`).
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Median; `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some(0.5 * (sorted[mid - 1] + sorted[mid]))
    } else {
        Some(sorted[mid])
    }
}

/// SSE / RMSE / R² of predictions against observations.
///
/// R² is reported as 1.0 when the observations are constant and matched exactly,
/// and 0.0 when they are constant but missed.
pub fn fit_quality(observed: &[f64], predicted: &[f64]) -> FitQuality {
    let n = observed.len().min(predicted.len());
    let sse: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p) * (y - p))
        .sum();
    let rmse = if n > 0 { (sse / n as f64).sqrt() } else { 0.0 };

    let y_mean = mean(&observed[..n]).unwrap_or(0.0);
    let sst: f64 = observed[..n].iter().map(|y| (y - y_mean) * (y - y_mean)).sum();
    let r2 = if sst > 0.0 {
        1.0 - sse / sst
    } else if sse == 0.0 {
        1.0
    } else {
        0.0
    };

    FitQuality { sse, rmse, r2, n }
}

/// Mean absolute error; 0.0 for empty input.
pub fn mean_abs_error(observed: &[f64], predicted: &[f64]) -> f64 {
    let n = observed.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    observed
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).abs())
        .sum::<f64>()
        / n as f64
}
