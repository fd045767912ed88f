//! Metadata entity model

mod division;
mod metadata;

pub use division::{Division, Link, StructureField};
pub use metadata::{section_for, Domain, MdSec, Metadata, MetadataEntry, MetadataGroup};
