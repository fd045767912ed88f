//! # Kitodo Process Metadata
//!
//! Schema-driven editing of process metadata:
//! - Metadata entity model (entries, groups, structural divisions)
//! - Ruleset view traits consulted for field definitions, plus a ruleset
//!   declared in TOML
//! - The fielded metadata tree: reconciles stored metadata with the ruleset
//!   into editable rows and writes edits back
//! - Insertion position resolution for linking a new division into an
//!   existing logical structure

pub mod error;
pub mod fielded;
pub mod insertion;
pub mod model;
pub mod process;
pub mod rows;
pub mod ruleset;

pub use error::{InvalidMetadataValue, MetadataError, Result};
pub use fielded::{Attachment, FieldedMetadataNode};
pub use insertion::{InsertionPosition, InsertionPositionResolver, InsertionPositions, InsertionTreeNode};
pub use model::{Division, Domain, Link, MdSec, Metadata, MetadataEntry, MetadataGroup, StructureField};
pub use rows::{BooleanRow, LeadingFields, Row, SelectRow, SimpleRow, TextRow};
