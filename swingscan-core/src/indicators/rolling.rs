//! Trailing fixed-size window reductions.
//!
//! Output at index i covers values[i+1-window..=i]. Indices before
//! window-1 are NaN, as is any window containing a NaN.

fn rolling<F>(values: &[f64], window: usize, reduce: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if window == 0 || n < window {
        return result;
    }

    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = reduce(slice);
    }

    result
}

fn mean(slice: &[f64]) -> f64 {
    slice.iter().sum::<f64>() / slice.len() as f64
}

pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, mean)
}

/// Sample standard deviation (n-1). A window of 1 is undefined.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    if window < 2 {
        return vec![f64::NAN; values.len()];
    }
    rolling(values, window, |slice| {
        let m = mean(slice);
        let var = slice.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (slice.len() - 1) as f64;
        var.sqrt()
    })
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, |slice| {
        slice.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, |slice| {
        slice.iter().copied().fold(f64::INFINITY, f64::min)
    })
}
