//! Container
//!
//! A file holding named entries (lookup grids and sample tables), organised in
//! directories. The document is kept in memory while open and written as JSON
//! on `close`.
use crate::errors::CalibrationError;
use crate::grid::LookupGrid;
use crate::table::SampleTable;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

/// Extension of container files.
pub const CONTAINER_EXTENSION: &str = "json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read existing entries, writing is refused.
    Read,
    /// Start from an empty document, replacing the file on close.
    Recreate,
    /// Keep existing entries if the file exists, create it otherwise.
    Update,
}

/// A named object stored in a container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Entry {
    Grid(LookupGrid),
    Table(SampleTable),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    entries: BTreeMap<String, Entry>,
}

#[derive(Debug)]
pub struct Container {
    path: PathBuf,
    mode: OpenMode,
    directory: String,
    document: Document,
}

impl Container {
    /// Open a container file.
    ///
    /// * `path` - Location of the container file.
    /// * `mode` - How to open it. `Recreate` and `Update` check up front that
    ///   the file can be written.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self, CalibrationError> {
        let path = path.as_ref().to_path_buf();
        let document = match mode {
            OpenMode::Read => read_document(&path)?,
            OpenMode::Recreate => {
                check_writable(&path, true)?;
                Document::default()
            }
            OpenMode::Update => {
                if path.exists() {
                    let document = read_document(&path)?;
                    check_writable(&path, false)?;
                    document
                } else {
                    check_writable(&path, true)?;
                    Document::default()
                }
            }
        };
        debug!("Opened container {} in {:?} mode", path.display(), mode);
        Ok(Container {
            path,
            mode,
            directory: String::new(),
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Set the directory that later `write` and `get` calls are relative to.
    /// An empty string is the top level.
    pub fn cd(&mut self, directory: &str) {
        self.directory = directory.trim_matches('/').to_string();
    }

    pub fn current_directory(&self) -> &str {
        &self.directory
    }

    fn full_name(&self, name: &str) -> String {
        if self.directory.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.directory, name)
        }
    }

    /// Store an entry under `name` in the current directory, replacing any
    /// entry with the same name.
    pub fn write(&mut self, name: &str, entry: Entry) -> Result<(), CalibrationError> {
        if self.mode == OpenMode::Read {
            return Err(CalibrationError::ContainerWrite(format!(
                "{} is open read only",
                self.path.display()
            )));
        }
        let key = self.full_name(name);
        debug!("Writing entry '{}' to {}", key, self.path.display());
        self.document.entries.insert(key, entry);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.document.entries.get(&self.full_name(name))
    }

    /// The table entry `name` in the current directory.
    pub fn get_table(&self, name: &str) -> Result<&SampleTable, CalibrationError> {
        match self.get(name) {
            Some(Entry::Table(t)) => Ok(t),
            Some(Entry::Grid(_)) => Err(CalibrationError::DataShape(format!(
                "entry '{}' in {} is a grid, not a table",
                name,
                self.path.display()
            ))),
            None => Err(CalibrationError::UnableToRead(format!(
                "table '{}' not found in {}",
                name,
                self.path.display()
            ))),
        }
    }

    /// Full names of every entry, sorted.
    pub fn keys(&self) -> Vec<&str> {
        self.document.entries.keys().map(|k| k.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.document.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.entries.is_empty()
    }

    /// Write the document to disk. Nothing is written in `Read` mode.
    pub fn close(self) -> Result<(), CalibrationError> {
        if self.mode == OpenMode::Read {
            return Ok(());
        }
        let json = serde_json::to_string(&self.document)
            .map_err(|e| CalibrationError::ContainerWrite(format!("{}: {}", self.path.display(), e)))?;
        fs::write(&self.path, json)
            .map_err(|e| CalibrationError::ContainerWrite(format!("{}: {}", self.path.display(), e)))?;
        debug!(
            "Closed container {} with {} entries",
            self.path.display(),
            self.document.entries.len()
        );
        Ok(())
    }
}

fn read_document(path: &Path) -> Result<Document, CalibrationError> {
    let json =
        fs::read_to_string(path).map_err(|e| CalibrationError::UnableToRead(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&json).map_err(|e| CalibrationError::UnableToRead(format!("{}: {}", path.display(), e)))
}

fn check_writable(path: &Path, truncate: bool) -> Result<(), CalibrationError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(truncate)
        .open(path)
        .map(|_| ())
        .map_err(|e| CalibrationError::ContainerWrite(format!("{}: {}", path.display(), e)))
}
