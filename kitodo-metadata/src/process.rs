//! Lookup of separately stored processes
//!
//! Divisions may link to another process instead of holding their own
//! structure. Resolving such links needs the linked process's base type,
//! title and logical structure, which come from a [`ProcessLookup`].

use crate::error::{MetadataError, Result};
use crate::model::Division;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Access to linked processes by id
pub trait ProcessLookup {
    /// Division type of the process's logical root
    fn base_type(&self, id: u32) -> Result<String>;

    /// Logical structure of the process
    fn logical_structure(&self, id: u32) -> Result<Division>;

    fn title(&self, id: u32) -> Result<String>;
}

/// A process document as stored by [`ProcessDirectory`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDocument {
    pub title: String,
    pub base_type: String,
    #[serde(default)]
    pub logical: Division,
}

/// Processes stored as `<id>.json` files in one directory
#[derive(Debug, Clone)]
pub struct ProcessDirectory {
    root: PathBuf,
}

impl ProcessDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load(&self, id: u32) -> Result<ProcessDocument> {
        let path = self.root.join(format!("{}.json", id));
        debug!("Loading process {} from {}", id, path.display());
        let failure = |reason: String| MetadataError::LinkedProcess {
            uri: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(&path).map_err(|e| failure(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| failure(e.to_string()))
    }
}

impl ProcessLookup for ProcessDirectory {
    fn base_type(&self, id: u32) -> Result<String> {
        Ok(self.load(id)?.base_type)
    }

    fn logical_structure(&self, id: u32) -> Result<Division> {
        Ok(self.load(id)?.logical)
    }

    fn title(&self, id: u32) -> Result<String> {
        Ok(self.load(id)?.title)
    }
}

/// Lookup that knows no processes
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProcesses;

impl ProcessLookup for NoProcesses {
    fn base_type(&self, id: u32) -> Result<String> {
        Err(unknown(id))
    }

    fn logical_structure(&self, id: u32) -> Result<Division> {
        Err(unknown(id))
    }

    fn title(&self, id: u32) -> Result<String> {
        Err(unknown(id))
    }
}

fn unknown(id: u32) -> MetadataError {
    MetadataError::LinkedProcess {
        uri: format!("process {}", id),
        reason: "no process directory configured".to_string(),
    }
}
