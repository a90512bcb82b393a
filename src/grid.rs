//! Grid
//!
//! Dense lookup tables over fixed binnings, and the helper that samples a
//! function of two variables at bin centers.
use crate::registry::BinningSpec;
use serde::{Deserialize, Serialize};

/// One titled axis of a lookup grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Axis {
    pub title: String,
    pub binning: BinningSpec,
}

impl Axis {
    pub fn new(title: &str, binning: BinningSpec) -> Self {
        Axis {
            title: title.to_string(),
            binning,
        }
    }
}

/// Dense N dimensional table of values, one per cell.
///
/// Cells are stored with the last axis varying fastest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LookupGrid {
    pub name: String,
    pub title: String,
    pub axes: Vec<Axis>,
    values: Vec<f64>,
}

impl LookupGrid {
    /// A grid with every cell set to zero.
    pub fn new(name: &str, title: &str, axes: Vec<Axis>) -> Self {
        let n_cells = axes.iter().map(|a| a.binning.n_bins).product();
        LookupGrid {
            name: name.to_string(),
            title: title.to_string(),
            axes,
            values: vec![0.0; n_cells],
        }
    }

    pub fn dim(&self) -> usize {
        self.axes.len()
    }

    /// Number of bins along each axis.
    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(|a| a.binning.n_bins).collect()
    }

    pub fn n_cells(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    fn flat_index(&self, bins: &[usize]) -> Option<usize> {
        if bins.len() != self.axes.len() {
            return None;
        }
        let mut idx = 0;
        for (b, axis) in bins.iter().zip(self.axes.iter()) {
            if *b >= axis.binning.n_bins {
                return None;
            }
            idx = idx * axis.binning.n_bins + b;
        }
        Some(idx)
    }

    /// Value of a cell, `None` if the bins are out of range.
    pub fn get(&self, bins: &[usize]) -> Option<f64> {
        self.flat_index(bins).map(|i| self.values[i])
    }

    /// Set the value of a cell. Returns false if the bins are out of range.
    pub fn set(&mut self, bins: &[usize], value: f64) -> bool {
        match self.flat_index(bins) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    /// Bin coordinates of a point, `None` if it lies outside the grid.
    pub fn find_bins(&self, coords: &[f64]) -> Option<Vec<usize>> {
        if coords.len() != self.axes.len() {
            return None;
        }
        coords
            .iter()
            .zip(self.axes.iter())
            .map(|(x, axis)| axis.binning.find_bin(*x))
            .collect()
    }

    /// Value of the cell holding a point.
    pub fn value_at(&self, coords: &[f64]) -> Option<f64> {
        self.find_bins(coords).and_then(|bins| self.get(&bins))
    }
}

/// Sample a function of two variables at the bin centers of two binnings.
///
/// * `name` - Name of the returned grid, also used as its title.
/// * `f` - Function evaluated at `[x, y]`.
/// * `x` - Title and binning of the first axis.
/// * `y` - Title and binning of the second axis.
pub fn function_to_grid2d<F>(name: &str, f: F, x: (&str, BinningSpec), y: (&str, BinningSpec)) -> LookupGrid
where
    F: Fn(&[f64]) -> f64,
{
    let mut grid = LookupGrid::new(name, name, vec![Axis::new(x.0, x.1), Axis::new(y.0, y.1)]);
    let y_centers = y.1.centers();
    for (bx, xc) in x.1.centers().into_iter().enumerate() {
        for (by, yc) in y_centers.iter().enumerate() {
            grid.set(&[bx, by], f(&[xc, *yc]));
        }
    }
    grid
}
