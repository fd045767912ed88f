//! Structural divisions and their attributes

use super::metadata::Metadata;
use serde::{Deserialize, Serialize};

/// A node of the logical or physical structure of a workpiece
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Division {
    /// Division type as declared in the ruleset (e.g. "Monograph", "Chapter")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub division_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orderlabel: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metadata: Vec<Metadata>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Division>,
    /// Set when this division stands for another, separately stored process
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

impl Division {
    pub fn new(division_type: impl Into<String>) -> Self {
        Self {
            division_type: Some(division_type.into()),
            ..Default::default()
        }
    }

    /// Value of the first entry with the given key
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .filter(|metadata| metadata.key() == key)
            .find_map(Metadata::value)
    }
}

/// Reference from a division to a separately stored process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub uri: String,
}

impl Link {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// Process id from the `process.id=` query parameter of the link URI
    ///
    /// Example: `database://?process.id=42` → `Some(42)`
    pub fn process_id(&self) -> Option<u32> {
        let query = self.uri.split_once('?').map_or(self.uri.as_str(), |(_, q)| q);
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| *name == "process.id")
            .and_then(|(_, id)| id.parse().ok())
    }
}

/// Division attribute that the ruleset may expose as a field
///
/// Fields of the structure-attribute domain are not stored as metadata; their
/// values are written to these attributes instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureField {
    Label,
    OrderLabel,
    ContentIds,
}

impl StructureField {
    pub const ALL: [StructureField; 3] = [
        StructureField::Label,
        StructureField::OrderLabel,
        StructureField::ContentIds,
    ];

    /// Ruleset key of the attribute
    pub fn key(self) -> &'static str {
        match self {
            StructureField::Label => "LABEL",
            StructureField::OrderLabel => "ORDERLABEL",
            StructureField::ContentIds => "CONTENTIDS",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Write a value to the division
    ///
    /// Blank labels clear the attribute. Content ids accumulate: the value is
    /// split on whitespace and each id is appended.
    pub fn apply(self, division: &mut Division, value: &str) {
        let value = value.trim();
        match self {
            StructureField::Label => {
                division.label = (!value.is_empty()).then(|| value.to_string());
            }
            StructureField::OrderLabel => {
                division.orderlabel = (!value.is_empty()).then(|| value.to_string());
            }
            StructureField::ContentIds => {
                division
                    .content_ids
                    .extend(value.split_whitespace().map(str::to_string));
            }
        }
    }
}
