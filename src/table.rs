//! Table
//!
//! In-memory sample tables and their ingestion from CSV files or from a named
//! table entry of a container file.
use crate::container::{Container, OpenMode};
use crate::data::Matrix;
use crate::errors::CalibrationError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A column request: either a plain column name or `abs(<column>)`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnExpr {
    Plain(String),
    Abs(String),
}

impl ColumnExpr {
    /// Parse a column request. Names that match a column as written always win,
    /// so this is only consulted when no such column exists.
    pub fn parse(expr: &str) -> Self {
        let trimmed = expr.trim();
        match trimmed.strip_prefix("abs(").and_then(|s| s.strip_suffix(')')) {
            Some(inner) => ColumnExpr::Abs(inner.trim().to_string()),
            None => ColumnExpr::Plain(trimmed.to_string()),
        }
    }

    fn source(&self) -> &str {
        match self {
            ColumnExpr::Plain(s) | ColumnExpr::Abs(s) => s,
        }
    }

    fn apply(&self, v: f64) -> f64 {
        match self {
            ColumnExpr::Plain(_) => v,
            ColumnExpr::Abs(_) => v.abs(),
        }
    }
}

/// Column major table of floating point samples with named columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SampleTable {
    columns: Vec<String>,
    rows: usize,
    data: Vec<f64>,
}

impl SampleTable {
    /// Create a table from named columns of equal length.
    ///
    /// Fails on ragged columns and on NaN or infinite values.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self, CalibrationError> {
        let rows = columns.first().map_or(0, |(_, c)| c.len());
        let mut names = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(rows * columns.len());
        for (name, values) in columns {
            if values.len() != rows {
                return Err(CalibrationError::DataShape(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    values.len(),
                    rows
                )));
            }
            if let Some(r) = values.iter().position(|v| !v.is_finite()) {
                return Err(CalibrationError::DataShape(format!(
                    "column '{}' row {} holds the non-finite value {}",
                    name, r, values[r]
                )));
            }
            names.push(name);
            data.extend(values);
        }
        Ok(SampleTable {
            columns: names,
            rows,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// Values of a column stored under exactly this name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|j| &self.data[j * self.rows..(j + 1) * self.rows])
    }

    /// Values of a column request, evaluating `abs(...)` when needed.
    pub fn resolve(&self, expr: &str) -> Result<Vec<f64>, CalibrationError> {
        if let Some(c) = self.column(expr) {
            return Ok(c.to_vec());
        }
        let parsed = ColumnExpr::parse(expr);
        match self.column(parsed.source()) {
            Some(c) => Ok(c.iter().map(|v| parsed.apply(*v)).collect()),
            None => Err(CalibrationError::DataShape(format!(
                "column '{}' not found, available columns: {}",
                expr,
                self.columns.join(", ")
            ))),
        }
    }

    /// A new table holding the requested columns, in the requested order.
    pub fn select(&self, names: &[String]) -> Result<SampleTable, CalibrationError> {
        let columns = names
            .iter()
            .map(|n| Ok((n.clone(), self.resolve(n)?)))
            .collect::<Result<Vec<_>, CalibrationError>>()?;
        SampleTable::from_columns(columns)
    }

    /// Column major view of the whole table.
    pub fn matrix(&self) -> Matrix<'_, f64> {
        Matrix::new(&self.data, self.rows, self.columns.len())
    }
}

/// Read the requested columns of a table.
///
/// `.csv` files are read directly (the table name is not used), anything else
/// is opened as a container and the table entry `table_name` is read from it.
///
/// * `path` - File to read from.
/// * `table_name` - Name of the table inside a container.
/// * `columns` - Column requests, in output order.
pub fn read_table(path: &Path, table_name: &str, columns: &[String]) -> Result<SampleTable, CalibrationError> {
    let is_csv = path
        .extension()
        .map_or(false, |e| e.eq_ignore_ascii_case("csv"));
    let table = if is_csv {
        debug!("Reading columns {:?} from csv file {}", columns, path.display());
        read_csv(path, columns)?
    } else {
        debug!(
            "Reading columns {:?} from table '{}' of {}",
            columns,
            table_name,
            path.display()
        );
        let container = Container::open(path, OpenMode::Read)?;
        container.get_table(table_name)?.select(columns)?
    };
    if table.is_empty() {
        return Err(CalibrationError::DataShape(format!(
            "table '{}' in {} has no rows",
            table_name,
            path.display()
        )));
    }
    Ok(table)
}

fn read_csv(path: &Path, columns: &[String]) -> Result<SampleTable, CalibrationError> {
    let file = File::open(path).map_err(|e| CalibrationError::UnableToRead(format!("{}: {}", path.display(), e)))?;
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));
    let headers = csv_reader
        .headers()
        .map_err(|e| CalibrationError::UnableToRead(format!("{}: {}", path.display(), e)))?
        .clone();

    let mut sources = Vec::with_capacity(columns.len());
    for name in columns {
        let (expr, idx) = match headers.iter().position(|h| h == name) {
            Some(idx) => (ColumnExpr::Plain(name.clone()), Some(idx)),
            None => {
                let expr = ColumnExpr::parse(name);
                let idx = headers.iter().position(|h| h == expr.source());
                (expr, idx)
            }
        };
        match idx {
            Some(idx) => sources.push((expr, idx)),
            None => {
                return Err(CalibrationError::DataShape(format!(
                    "column '{}' not found in {}",
                    name,
                    path.display()
                )))
            }
        }
    }

    let mut data_columns: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];
    for (row, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| CalibrationError::DataShape(format!("{}: {}", path.display(), e)))?;
        for (j, (expr, idx)) in sources.iter().enumerate() {
            let field = record.get(*idx).unwrap_or("");
            let value = field.parse::<f64>().map_err(|_| {
                CalibrationError::DataShape(format!(
                    "column '{}' row {}: cannot parse '{}' as a number",
                    columns[j], row, field
                ))
            })?;
            data_columns[j].push(expr.apply(value));
        }
    }
    SampleTable::from_columns(columns.iter().cloned().zip(data_columns).collect())
}
