//! Persist
//!
//! Write a fitted model next to the output container and its lookup grid into
//! the container.
use crate::container::{Container, Entry};
use crate::errors::CalibrationError;
use crate::materialize::{materialize, Materialized, SkipReason};
use crate::model::{JsonIO, RegressionModel};
use crate::registry::BinningRegistry;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// What `persist` wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistReport {
    pub model_path: PathBuf,
    /// Name of the grid entry, if one was written.
    pub grid_entry: Option<String>,
    pub skipped: Option<SkipReason>,
}

/// Directory holding the model files of a container: its path without the
/// extension, so `out/results.json` gives `out/results`.
pub fn result_directory(container_path: &Path) -> PathBuf {
    container_path.with_extension("")
}

/// Save `model` as `<result dir>/<name>.json` and store its lookup grid as the
/// entry `name` of `container`.
///
/// The model file is kept if writing the grid fails afterwards.
///
/// * `model` - Fitted model.
/// * `name` - Name of the model file and of the grid entry.
/// * `variables` - Model input names, used to pick the grid binnings.
/// * `container` - Open output container.
/// * `registry` - Binnings of the input variables.
pub fn persist<M: RegressionModel + JsonIO>(
    model: &M,
    name: &str,
    variables: &[String],
    container: &mut Container,
    registry: &BinningRegistry,
) -> Result<PersistReport, CalibrationError> {
    let dir = result_directory(container.path());
    fs::create_dir_all(&dir)
        .map_err(|e| CalibrationError::Serialization(format!("{}: {}", dir.display(), e)))?;
    let model_path = dir.join(format!("{}.json", name));
    model.save_json(&model_path)?;
    info!("Saved model to {}", model_path.display());

    let (grid_entry, skipped) = match materialize(model, variables, registry, name)? {
        Materialized::Grid(grid) => {
            container.write(name, Entry::Grid(grid))?;
            info!("Wrote grid '{}' to {}", name, container.path().display());
            (Some(name.to_string()), None)
        }
        Materialized::Skipped(reason) => (None, Some(reason)),
    };
    Ok(PersistReport {
        model_path,
        grid_entry,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::OpenMode;
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Sum {
        n: usize,
    }

    impl RegressionModel for Sum {
        fn n_features(&self) -> usize {
            self.n
        }
        fn predict_row(&self, row: &[f64]) -> f64 {
            row.iter().sum()
        }
    }

    impl JsonIO for Sum {}

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_result_directory() {
        assert_eq!(result_directory(Path::new("out/results.json")), PathBuf::from("out/results"));
        assert_eq!(result_directory(Path::new("results")), PathBuf::from("results"));
    }

    #[test]
    fn test_persist_writes_model_and_grid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        let registry = BinningRegistry::default();
        let model = Sum { n: 2 };

        let mut c = Container::open(&path, OpenMode::Recreate).unwrap();
        let report = persist(&model, "regression", &names(&["abs(ieta)", "ntt"]), &mut c, &registry).unwrap();
        c.close().unwrap();

        assert_eq!(report.model_path, dir.path().join("results").join("regression.json"));
        assert_eq!(Sum::load_json(&report.model_path).unwrap(), model);
        assert_eq!(report.grid_entry, Some("regression".to_string()));
        let c = Container::open(&path, OpenMode::Read).unwrap();
        match c.get("regression") {
            Some(Entry::Grid(g)) => {
                assert_eq!(g.shape(), vec![30, 81]);
                assert_eq!(g.value_at(&[3.0, 10.0]), Some(13.0));
            }
            _ => panic!("expected a grid entry"),
        }
    }

    #[test]
    fn test_persist_is_rerunnable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        let registry = BinningRegistry::default();
        for _ in 0..2 {
            let mut c = Container::open(&path, OpenMode::Recreate).unwrap();
            persist(&Sum { n: 2 }, "regression", &names(&["et", "rho"]), &mut c, &registry).unwrap();
            c.close().unwrap();
        }
        assert!(dir.path().join("results").join("regression.json").exists());
    }

    #[test]
    fn test_persist_skips_grid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        let registry = BinningRegistry::default();
        let mut c = Container::open(&path, OpenMode::Recreate).unwrap();

        let report = persist(
            &Sum { n: 4 },
            "four",
            &names(&["abs(ieta)", "et", "rho", "ntt"]),
            &mut c,
            &registry,
        )
        .unwrap();
        assert_eq!(report.skipped, Some(SkipReason::UnsupportedDimensionality(4)));
        assert!(report.model_path.exists());

        let report = persist(&Sum { n: 2 }, "iso", &names(&["et", "iso"]), &mut c, &registry).unwrap();
        assert_eq!(report.skipped, Some(SkipReason::MissingBinningSpec("iso".to_string())));
        assert!(report.grid_entry.is_none());
        assert!(c.is_empty());
    }

    #[test]
    fn test_model_write_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.json");
        let registry = BinningRegistry::default();
        let mut c = Container::open(&path, OpenMode::Recreate).unwrap();
        // a regular file where the result directory should be
        fs::write(dir.path().join("results"), "").unwrap();
        assert!(matches!(
            persist(&Sum { n: 2 }, "regression", &names(&["et", "rho"]), &mut c, &registry),
            Err(CalibrationError::Serialization(_))
        ));
    }
}
