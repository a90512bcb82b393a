//! Pipeline
//!
//! A full calibration run: read the samples, fit the working point, save the
//! model and its lookup grid.
use crate::booster::QuantileBooster;
use crate::container::{Container, OpenMode, CONTAINER_EXTENSION};
use crate::errors::CalibrationError;
use crate::fitter::Fitter;
use crate::persist::persist;
use crate::registry::BinningRegistry;
use crate::table::read_table;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings of one calibration run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    /// File holding the samples, a csv file or a container.
    pub input_file: PathBuf,
    /// Table inside the input container.
    pub tree: String,
    pub inputs: Vec<String>,
    pub target: String,
    /// Working point.
    pub eff: f64,
    pub output_file: PathBuf,
    /// Name of the saved model and of its grid entry.
    pub name: String,
    /// Hold out rows and report the efficiency on them.
    pub test: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            input_file: PathBuf::from("tree.root"),
            tree: "tree".to_string(),
            inputs: vec!["x".to_string(), "y".to_string()],
            target: "target".to_string(),
            eff: 0.9,
            output_file: PathBuf::from("results.root"),
            name: "regression".to_string(),
            test: false,
        }
    }
}

/// Give the output path the container extension, appending it when the path
/// has another one: `results.root` becomes `results.root.json`.
pub fn normalize_output_path(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext == CONTAINER_EXTENSION => path.to_path_buf(),
        _ => {
            let mut s = path.as_os_str().to_owned();
            s.push(".");
            s.push(CONTAINER_EXTENSION);
            PathBuf::from(s)
        }
    }
}

/// Run a calibration and return the fitted model.
///
/// The model is saved under the result directory of the output container even
/// if writing the container fails afterwards.
pub fn run(config: &RunConfig, registry: &BinningRegistry) -> Result<QuantileBooster, CalibrationError> {
    let mut columns = config.inputs.clone();
    columns.push(config.target.clone());
    let samples = read_table(&config.input_file, &config.tree, &columns)?;
    info!(
        "Read {} rows of {:?} from {}",
        samples.rows(),
        columns,
        config.input_file.display()
    );

    let fitter = Fitter::default().with_registry(registry.clone());
    let booster = fitter.fit(&samples, &config.inputs, &config.target, config.eff, config.test)?;

    let output = normalize_output_path(&config.output_file);
    let mut container = Container::open(&output, OpenMode::Recreate)?;
    persist(&booster, &config.name, &config.inputs, &mut container, registry)?;
    container.close()?;
    Ok(booster)
}
