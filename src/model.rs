//! Model
//!
//! The interfaces downstream code needs from a fitted model: point
//! predictions, and a way to write it to and read it back from disk.
use crate::data::Matrix;
use crate::errors::CalibrationError;
use rayon::prelude::*;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::Path;

/// A fitted function from an input vector to a scalar prediction.
pub trait RegressionModel: Sync {
    /// Number of inputs the model expects.
    fn n_features(&self) -> usize;

    /// Predict a single record.
    fn predict_row(&self, row: &[f64]) -> f64;

    /// Predict every row of a matrix.
    ///
    /// * `data` - Column major input data.
    /// * `parallel` - Predict in parallel.
    fn predict(&self, data: &Matrix<f64>, parallel: bool) -> Vec<f64> {
        if parallel {
            data.index.par_iter().map(|i| self.predict_row(&data.get_row(*i))).collect()
        } else {
            data.index.iter().map(|i| self.predict_row(&data.get_row(*i))).collect()
        }
    }
}

/// JSON persistence of models and configuration.
pub trait JsonIO: Serialize + DeserializeOwned + Sized {
    /// Save as a json object to a file.
    ///
    /// * `path` - Path to save to.
    fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), CalibrationError> {
        let path = path.as_ref();
        fs::write(path, self.json_dump()?)
            .map_err(|e| CalibrationError::Serialization(format!("{}: {}", path.display(), e)))
    }

    /// Dump as a json object
    fn json_dump(&self) -> Result<String, CalibrationError> {
        serde_json::to_string(self).map_err(|e| CalibrationError::Serialization(e.to_string()))
    }

    /// Load from Json string
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self, CalibrationError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| CalibrationError::UnableToRead(e.to_string()))
    }

    /// Load from a path to a json object.
    ///
    /// * `path` - Path to load from.
    fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, CalibrationError> {
        let path = path.as_ref();
        let json_str = fs::read_to_string(path)
            .map_err(|e| CalibrationError::UnableToRead(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Plane {
        a: f64,
        b: f64,
    }

    impl RegressionModel for Plane {
        fn n_features(&self) -> usize {
            2
        }
        fn predict_row(&self, row: &[f64]) -> f64 {
            self.a * row[0] + self.b * row[1]
        }
    }

    impl JsonIO for Plane {}

    #[test]
    fn test_predict_default() {
        let m = Plane { a: 1.0, b: 10.0 };
        let data_vec = vec![1.0, 2.0, 3.0, 0.0, 1.0, 2.0];
        let data = Matrix::new(&data_vec, 3, 2);
        assert_eq!(m.predict(&data, false), vec![1.0, 12.0, 23.0]);
        assert_eq!(m.predict(&data, true), vec![1.0, 12.0, 23.0]);
    }

    #[test]
    fn test_model_io_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plane.json");
        let m = Plane { a: 0.25, b: -3.0 };
        m.save_json(&path).unwrap();
        assert_eq!(Plane::load_json(&path).unwrap(), m);
    }

    #[test]
    fn test_model_io_errors() {
        let dir = tempdir().unwrap();
        let missing_dir = dir.path().join("missing").join("plane.json");
        let m = Plane { a: 0.25, b: -3.0 };
        assert!(matches!(m.save_json(&missing_dir), Err(CalibrationError::Serialization(_))));
        assert!(matches!(
            Plane::load_json(&missing_dir),
            Err(CalibrationError::UnableToRead(_))
        ));
        assert!(Plane::from_json("{").is_err());
    }
}
