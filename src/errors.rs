//! Errors
//!
//! Custom error types used throughout the `quantile_calib` crate.
use thiserror::Error;

/// Errors that can occur while fitting, materializing or persisting a calibration.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// A requested column is missing, the table is empty, or a value is malformed.
    #[error("Data shape error: {0}")]
    DataShape(String),
    /// The working point is not strictly between 0 and 1.
    #[error("Invalid quantile {0}, expected a value strictly between 0 and 1.")]
    InvalidQuantile(f64),
    /// Unable to write model to file.
    #[error("Unable to write model to file: {0}")]
    Serialization(String),
    /// The output container cannot be opened, written or closed.
    #[error("Unable to write output container: {0}")]
    ContainerWrite(String),
    /// Unable to read a model, table or container from a file.
    #[error("Unable to read {0}")]
    UnableToRead(String),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
}
