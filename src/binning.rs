use crate::data::Matrix;
use crate::errors::CalibrationError;
use crate::utils::percentiles;

// Each feature is bucketed into discrete bins before training.
// For a column with cut values [c_0, c_1, ..., c_{m-1}], a value v gets the
// bin equal to the number of cuts that are <= v, so bins run from 0 to m.
// A split on bin k sends left every value with bin <= k, which is exactly
// the values v < c_k, so a trained tree can use c_k as a raw threshold.
#[derive(Debug)]
pub struct BinnedData {
    /// Column major bin codes, same shape as the source matrix.
    pub binned_data: Vec<u16>,
    /// Cut values for each column.
    pub cuts: Vec<Vec<f64>>,
}

impl BinnedData {
    /// Number of bins in a column.
    pub fn n_bins(&self, col: usize) -> usize {
        self.cuts[col].len() + 1
    }
}

/// Candidate thresholds of a column.
///
/// If the column has no more unique values than `max_bin`, every unique value
/// except the smallest is a cut. Otherwise cuts are the column percentiles.
fn column_cuts(v: &[f64], max_bin: u16) -> Vec<f64> {
    let mut v_u = v.to_owned();
    v_u.sort_unstable_by(|a, b| a.total_cmp(b));
    v_u.dedup();
    if v_u.len() <= usize::from(max_bin) {
        return v_u.into_iter().skip(1).collect();
    }
    let min = v_u[0];
    let nbins = f64::from(max_bin);
    let pcts: Vec<f64> = (1..max_bin).map(|i| f64::from(i) / nbins).collect();
    let mut cuts = percentiles(v, &pcts);
    cuts.retain(|c| *c > min);
    cuts.dedup();
    cuts
}

/// Map a value to its bin given sorted cut values.
#[inline]
pub fn map_bin(cuts: &[f64], v: f64) -> u16 {
    cuts.partition_point(|c| *c <= v) as u16
}

/// Bin a numeric matrix.
///
/// * `data` - A numeric matrix, of data to be binned.
/// * `max_bin` - The maximum number of bins each column should be binned into.
pub fn bin_matrix(data: &Matrix<f64>, max_bin: u16) -> Result<BinnedData, CalibrationError> {
    if max_bin < 2 {
        return Err(CalibrationError::InvalidParameter(
            "max_bin".to_string(),
            "a value of at least 2".to_string(),
            max_bin.to_string(),
        ));
    }
    let cuts: Vec<Vec<f64>> = (0..data.cols).map(|j| column_cuts(data.get_col(j), max_bin)).collect();
    let binned_data = data
        .data
        .iter()
        .enumerate()
        .map(|(i, v)| map_bin(&cuts[i / data.rows], *v))
        .collect();
    Ok(BinnedData { binned_data, cuts })
}
