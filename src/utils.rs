use crate::errors::CalibrationError;
use std::collections::VecDeque;

/// Check that a working point lies strictly between 0 and 1.
pub fn validate_quantile(quantile: f64) -> Result<(), CalibrationError> {
    if quantile.is_finite() && quantile > 0.0 && quantile < 1.0 {
        Ok(())
    } else {
        Err(CalibrationError::InvalidQuantile(quantile))
    }
}

pub fn validate_positive_float_parameter(value: f64, parameter: &str) -> Result<(), CalibrationError> {
    validate_float_parameter(value, 0.0, f64::INFINITY, parameter)
}

/// Check a float parameter lies in `(min, max]`.
pub fn validate_float_parameter(value: f64, min: f64, max: f64, parameter: &str) -> Result<(), CalibrationError> {
    let mut msg = String::new();
    if value.is_nan() || value <= min || value > max {
        msg.push_str(&format!("a value in ({}, {}]", min, max));
        Err(CalibrationError::InvalidParameter(
            parameter.to_string(),
            msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Weighted quantile of a slice.
///
/// Returns the first value, in sorted order, for which the cumulative weight
/// reaches `quantile` times the total weight. Returns NaN on an empty slice.
///
/// * `v` - Values to find the quantile of.
/// * `sample_weight` - Optional weights, one per value.
/// * `quantile` - Target fraction in `[0, 1]`.
pub fn weighted_quantile(v: &[f64], sample_weight: Option<&[f64]>, quantile: f64) -> f64 {
    if v.is_empty() {
        return f64::NAN;
    }
    let mut idx: Vec<usize> = (0..v.len()).collect();
    idx.sort_unstable_by(|a, b| v[*a].total_cmp(&v[*b]));
    let w_tot = match sample_weight {
        Some(w) => w.iter().sum::<f64>(),
        None => v.len() as f64,
    };
    let w_target = w_tot * quantile;
    let mut w_cum = 0.0_f64;
    for i in idx.iter() {
        w_cum += sample_weight.map_or(1.0, |w| w[*i]);
        if w_cum >= w_target {
            return v[*i];
        }
    }
    v[idx[idx.len() - 1]]
}

/// Percentiles calculation, sorting the data once.
///
/// * `v` - A slice of which to find percentiles for.
/// * `percentiles` - Percentiles to look for in the data. This should be
///     values from 0 to 1, and in sorted order.
pub fn percentiles(v: &[f64], percentiles: &[f64]) -> Vec<f64> {
    if v.is_empty() || percentiles.is_empty() {
        return Vec::new();
    }
    let mut sorted = v.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));

    let mut pcts = VecDeque::from_iter(percentiles.iter());
    let mut p = Vec::with_capacity(percentiles.len());
    let total = sorted.len() as f64;
    let mut current_pct = match pcts.pop_front() {
        Some(c) => *c,
        None => return p,
    };
    for (i, value) in sorted.iter().enumerate() {
        let cuml_pct = (i + 1) as f64 / total;
        // The same value can satisfy several percentiles.
        while cuml_pct >= current_pct {
            p.push(*value);
            match pcts.pop_front() {
                Some(p_) => current_pct = *p_,
                None => return p,
            }
        }
    }
    p
}

/// Calculate the gain of a node given the sum of the gradients and the count
/// of records in it.
#[inline]
pub fn gain_const_hess(gradient_sum: f64, count_sum: usize) -> f64 {
    (gradient_sum * gradient_sum) / (count_sum as f64) // no -0.5 multiplier term!
}

/// Partition an index slice in place so that rows whose bin is at most
/// `split_bin` come first. Returns the number of rows in the left part.
///
/// * `index` - Row indices of the node.
/// * `feature` - Bin codes of the split feature, indexed by row.
/// * `split_bin` - Last bin that goes left.
pub fn pivot_on_split(index: &mut [usize], feature: &[u16], split_bin: u16) -> usize {
    let mut low = 0;
    let mut high = index.len();
    while low < high {
        if feature[index[low]] <= split_bin {
            low += 1;
        } else {
            high -= 1;
            index.swap(low, high);
        }
    }
    low
}
