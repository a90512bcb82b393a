mod node;

// Modules
pub mod binning;
pub mod booster;
pub mod container;
pub mod data;
pub mod errors;
pub mod fitter;
pub mod grid;
pub mod histogram;
pub mod materialize;
pub mod metric;
pub mod model;
pub mod objective;
pub mod persist;
pub mod pipeline;
pub mod registry;
pub mod sampler;
pub mod splitter;
pub mod table;
pub mod tree;
pub mod utils;

// Individual classes, and functions
pub use booster::{BoosterConfig, QuantileBooster};
pub use container::{Container, Entry, OpenMode};
pub use data::Matrix;
pub use errors::CalibrationError;
pub use fitter::{FitResult, Fitter, ValidationReport};
pub use grid::{function_to_grid2d, LookupGrid};
pub use materialize::{materialize, Materialized, SkipReason};
pub use model::{JsonIO, RegressionModel};
pub use persist::persist;
pub use pipeline::{run, RunConfig};
pub use registry::{BinningRegistry, BinningSpec};
pub use table::{read_table, SampleTable};
