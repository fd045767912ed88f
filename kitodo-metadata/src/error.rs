//! Error types for metadata editing
//!
//! Three kinds of failure reach callers of the fielded metadata tree:
//! - user input that the ruleset rejects (`InvalidValue`), reported with the
//!   field label and the chain of enclosing groups
//! - structure fields the division does not have (`NoSuchStructureField`)
//! - inconsistencies between data and ruleset (`IllegalState`), which abort
//!   the current operation

use std::fmt;
use thiserror::Error;

/// Result type for metadata operations
pub type Result<T> = std::result::Result<T, MetadataError>;

/// A field value the ruleset does not accept
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMetadataValue {
    /// Label of the offending field
    pub label: String,
    /// The rejected value
    pub value: String,
    /// Keys of the enclosing groups, outermost first
    pub parents: Vec<String>,
}

impl InvalidMetadataValue {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            parents: Vec::new(),
        }
    }

    /// Record an enclosing group; called from the inside out
    pub fn add_parent(&mut self, key: impl Into<String>) {
        self.parents.insert(0, key.into());
    }
}

impl fmt::Display for InvalidMetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value \"{}\" for {}", self.value, self.label)?;
        if !self.parents.is_empty() {
            write!(f, " (in {})", self.parents.join(" > "))?;
        }
        Ok(())
    }
}

/// Metadata error type
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A field value failed the ruleset's validity check
    #[error("Invalid metadata value: {0}")]
    InvalidValue(InvalidMetadataValue),

    /// The ruleset names a structure attribute the division does not have
    #[error("No such structure field: {0}")]
    NoSuchStructureField(String),

    /// Data and ruleset disagree (cardinality, complex/simple mismatch)
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// Row index out of range
    #[error("No row at index {0}")]
    NoSuchRow(usize),

    /// Adding another row would exceed the field's maximum occurrence
    #[error("Field \"{key}\" allows at most {max_occurs} occurrence(s)")]
    Cardinality { key: String, max_occurs: usize },

    /// A linked process could not be resolved
    #[error("Linked process {uri}: {reason}")]
    LinkedProcess { uri: String, reason: String },

    /// No position in the logical structure accepts the new division
    #[error("No insertion position for division type \"{0}\"")]
    NoInsertionPosition(String),

    /// The ruleset could not be loaded or is inconsistent
    #[error("Ruleset error: {0}")]
    Ruleset(String),
}

impl From<InvalidMetadataValue> for MetadataError {
    fn from(value: InvalidMetadataValue) -> Self {
        MetadataError::InvalidValue(value)
    }
}
