//! Metadata entities and their classification
//!
//! Stored metadata is untyped: an entry is a key with a string value, a group
//! is a key with an ordered list of nested entities. Meaning comes from the
//! ruleset, which assigns each key a [`Domain`]; the domain decides the
//! metadata section ([`MdSec`]) an entity is written to.

use serde::{Deserialize, Serialize};

/// Where a field belongs according to the ruleset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    Description,
    DigitalProvenance,
    Rights,
    Source,
    Technical,
    /// Not metadata at all: an attribute of the structural division itself
    #[serde(alias = "mets-div")]
    StructureAttribute,
}

impl Domain {
    /// Metadata section that stores fields of this domain
    ///
    /// Structure attributes are written to the division, never to a section.
    pub fn md_sec(self) -> Option<MdSec> {
        match self {
            Domain::Description => Some(MdSec::DmdSec),
            Domain::DigitalProvenance => Some(MdSec::DigiprovMd),
            Domain::Rights => Some(MdSec::RightsMd),
            Domain::Source => Some(MdSec::SourceMd),
            Domain::Technical => Some(MdSec::TechMd),
            Domain::StructureAttribute => None,
        }
    }
}

/// Section of the metadata file an entity is stored in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MdSec {
    #[default]
    #[serde(rename = "dmdSec")]
    DmdSec,
    #[serde(rename = "digiprovMD")]
    DigiprovMd,
    #[serde(rename = "rightsMD")]
    RightsMd,
    #[serde(rename = "sourceMD")]
    SourceMd,
    #[serde(rename = "techMD")]
    TechMd,
}

/// Section for a field of an optional domain; fields without domain are descriptive
pub fn section_for(domain: Option<Domain>) -> MdSec {
    domain
        .unwrap_or(Domain::Description)
        .md_sec()
        .unwrap_or_default()
}

/// A simple key/value metadata entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    #[serde(default)]
    pub domain: MdSec,
    pub value: String,
}

/// A metadata group with nested entities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataGroup {
    pub key: String,
    #[serde(default)]
    pub domain: MdSec,
    #[serde(default)]
    pub group: Vec<Metadata>,
}

/// A stored metadata entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metadata {
    Entry(MetadataEntry),
    Group(MetadataGroup),
}

impl Metadata {
    /// Create a descriptive entry
    pub fn entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        Metadata::Entry(MetadataEntry {
            key: key.into(),
            domain: MdSec::DmdSec,
            value: value.into(),
        })
    }

    /// Create a descriptive group
    pub fn group(key: impl Into<String>, group: Vec<Metadata>) -> Self {
        Metadata::Group(MetadataGroup {
            key: key.into(),
            domain: MdSec::DmdSec,
            group,
        })
    }

    pub fn key(&self) -> &str {
        match self {
            Metadata::Entry(entry) => &entry.key,
            Metadata::Group(group) => &group.key,
        }
    }

    pub fn domain(&self) -> MdSec {
        match self {
            Metadata::Entry(entry) => entry.domain,
            Metadata::Group(group) => group.domain,
        }
    }

    /// Value of an entry, `None` for groups
    pub fn value(&self) -> Option<&str> {
        match self {
            Metadata::Entry(entry) => Some(&entry.value),
            Metadata::Group(_) => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Metadata::Group(_))
    }
}
