//! Binning Registry
//!
//! Fixed axis binnings, keyed by variable name, used to store a fitted model
//! as a lookup table.
use crate::errors::CalibrationError;
use crate::model::JsonIO;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

/// `n_bins` equal width bins spanning `[low, high)`.
///
/// Bins are numbered from 0: bin `i` covers `[low + i * w, low + (i + 1) * w)`
/// where `w = (high - low) / n_bins`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BinningSpec {
    pub n_bins: usize,
    pub low: f64,
    pub high: f64,
}

impl BinningSpec {
    pub fn new(n_bins: usize, low: f64, high: f64) -> Result<Self, CalibrationError> {
        if n_bins == 0 {
            return Err(CalibrationError::InvalidParameter(
                "n_bins".to_string(),
                "a positive integer".to_string(),
                n_bins.to_string(),
            ));
        }
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(CalibrationError::InvalidParameter(
                "binning range".to_string(),
                "finite edges with low < high".to_string(),
                format!("[{}, {}]", low, high),
            ));
        }
        Ok(BinningSpec { n_bins, low, high })
    }

    #[inline]
    pub fn width(&self) -> f64 {
        (self.high - self.low) / self.n_bins as f64
    }

    #[inline]
    pub fn bin_low_edge(&self, bin: usize) -> f64 {
        self.low + bin as f64 * self.width()
    }

    #[inline]
    pub fn bin_center(&self, bin: usize) -> f64 {
        self.low + (bin as f64 + 0.5) * self.width()
    }

    /// Bin holding `x`, or `None` below `low`, at or above `high`, or for NaN.
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        if !(x >= self.low && x < self.high) {
            return None;
        }
        let bin = ((x - self.low) / self.width()).floor() as usize;
        Some(bin.min(self.n_bins - 1))
    }

    /// Every bin center, in bin order.
    pub fn centers(&self) -> Vec<f64> {
        (0..self.n_bins).map(|b| self.bin_center(b)).collect()
    }
}

/// Mapping from variable name to its binning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BinningRegistry {
    specs: HashMap<String, BinningSpec>,
}

impl Default for BinningRegistry {
    /// The registry of the default calibration variables.
    fn default() -> Self {
        let mut registry = BinningRegistry::empty();
        registry.insert("abs(ieta)", BinningSpec { n_bins: 30, low: 0.5, high: 30.5 });
        registry.insert("et", BinningSpec { n_bins: 400, low: 0.5, high: 400.5 });
        registry.insert("rho", BinningSpec { n_bins: 500, low: 0.0, high: 50.0 });
        registry.insert("ntt", BinningSpec { n_bins: 81, low: -0.5, high: 80.5 });
        registry
    }
}

impl BinningRegistry {
    pub fn empty() -> Self {
        BinningRegistry { specs: HashMap::new() }
    }

    fn insert(&mut self, name: &str, spec: BinningSpec) {
        self.specs.insert(name.to_string(), spec);
    }

    /// Add or replace the binning of a variable.
    pub fn register(&mut self, name: &str, n_bins: usize, low: f64, high: f64) -> Result<(), CalibrationError> {
        let spec = BinningSpec::new(n_bins, low, high)?;
        self.insert(name, spec);
        Ok(())
    }

    pub fn spec_for(&self, name: &str) -> Option<&BinningSpec> {
        self.specs.get(name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Registered variable names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.specs.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl JsonIO for BinningRegistry {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_registry() {
        let r = BinningRegistry::default();
        assert_eq!(r.len(), 4);
        assert_eq!(
            r.spec_for("abs(ieta)"),
            Some(&BinningSpec {
                n_bins: 30,
                low: 0.5,
                high: 30.5
            })
        );
        assert_eq!(r.spec_for("et").unwrap().n_bins, 400);
        assert_eq!(r.spec_for("rho").unwrap().high, 50.0);
        assert_eq!(r.spec_for("ntt").unwrap().low, -0.5);
        assert!(r.spec_for("iso").is_none());
        assert_eq!(r.names(), vec!["abs(ieta)", "et", "ntt", "rho"]);
    }

    #[test]
    fn test_register() {
        let mut r = BinningRegistry::empty();
        assert!(r.is_empty());
        r.register("x", 10, 0.0, 10.0).unwrap();
        assert_eq!(r.spec_for("x").unwrap().width(), 1.0);
        assert!(r.register("y", 0, 0.0, 1.0).is_err());
        assert!(r.register("y", 5, 1.0, 1.0).is_err());
        assert!(r.spec_for("y").is_none());
    }

    #[test]
    fn test_bin_centers() {
        let ieta = BinningRegistry::default().spec_for("abs(ieta)").copied().unwrap();
        assert_eq!(ieta.bin_center(0), 1.0);
        assert_eq!(ieta.bin_center(29), 30.0);
        assert_eq!(ieta.bin_low_edge(1), 1.5);
        let ntt = BinningSpec::new(81, -0.5, 80.5).unwrap();
        assert_eq!(ntt.centers()[0], 0.0);
        assert_eq!(ntt.centers()[80], 80.0);
    }

    #[test]
    fn test_find_bin() {
        let spec = BinningSpec::new(4, 0.0, 2.0).unwrap();
        assert_eq!(spec.find_bin(0.0), Some(0));
        assert_eq!(spec.find_bin(0.49), Some(0));
        assert_eq!(spec.find_bin(0.5), Some(1));
        assert_eq!(spec.find_bin(1.99), Some(3));
        assert_eq!(spec.find_bin(2.0), None);
        assert_eq!(spec.find_bin(-0.1), None);
        assert_eq!(spec.find_bin(f64::NAN), None);
        for b in 0..4 {
            assert_eq!(spec.find_bin(spec.bin_center(b)), Some(b));
        }
    }

    #[test]
    fn test_registry_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("binning.json");
        let mut r = BinningRegistry::default();
        r.register("x", 10, 0.0, 10.0).unwrap();
        r.save_json(&path).unwrap();
        assert_eq!(BinningRegistry::load_json(&path).unwrap(), r);
    }
}
