//! Ruleset view traits
//!
//! The ruleset is the schema of the metadata: which fields a division or a
//! group may carry, in which order, how often, and which values are legal.
//! The fielded metadata tree never interprets the ruleset itself; it asks
//! these views. [`declared::DeclaredRuleset`] implements them for rulesets
//! written in TOML.

pub mod declared;
mod undefined;

pub use undefined::UndefinedView;

use crate::model::Domain;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Current values of the leading fields of one group level, by key
///
/// A list of these (innermost level first) is passed to every option-set and
/// validity query, so fields can depend on the values of their siblings.
pub type LeadingFields = BTreeMap<String, Vec<String>>;

/// Kind of input a simple field uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputType {
    MultipleSelection,
    MultiLineSingleSelection,
    OneLineSingleSelection,
    Boolean,
    Date,
    Integer,
    MultiLineText,
    OneLineText,
}

impl InputType {
    pub fn is_selection(self) -> bool {
        matches!(
            self,
            InputType::MultipleSelection
                | InputType::MultiLineSingleSelection
                | InputType::OneLineSingleSelection
        )
    }
}

/// One option of a selection field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectItem {
    pub value: String,
    pub label: String,
}

/// Metadata roles the application attaches special meaning to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionalMetadata {
    /// Keys shown as summary of a linked process
    DisplaySummary,
}

/// Properties shared by all field definitions
pub trait MetadataView: Send + Sync + fmt::Debug {
    /// Metadata key
    fn id(&self) -> &str;

    /// Translated label
    fn label(&self) -> &str;

    fn min_occurs(&self) -> usize;

    fn max_occurs(&self) -> usize;

    fn domain(&self) -> Option<Domain>;

    fn is_editable(&self) -> bool {
        true
    }

    /// True when the ruleset has no definition for this key
    fn is_undefined(&self) -> bool {
        false
    }
}

/// Definition of a single-valued field
pub trait SimpleMetadataView: MetadataView {
    fn input_type(&self) -> InputType;

    /// Options available given the current leading field values
    fn select_items(&self, leading: &[LeadingFields]) -> Vec<SelectItem>;

    /// Stored value for a boolean input, `None` when nothing is stored
    fn convert_boolean(&self, value: bool) -> Option<String>;

    fn is_valid(&self, value: &str, leading: &[LeadingFields]) -> bool;

    fn default_value(&self) -> Option<&str>;

    /// Whether other fields' options or validity depend on this field
    fn is_leading(&self) -> bool {
        false
    }
}

/// Definition of a group, or of the fields of a division
pub trait ComplexMetadataView: MetadataView {
    /// Arrange the given entries into display rows
    ///
    /// `keys` holds the key of every entry by position. The returned rows
    /// reference entries by position; rows without view hold entries the
    /// ruleset does not show. Keys in `additionally_selected` get a row even
    /// without data.
    fn sorted_visible_metadata(
        &self,
        keys: &[&str],
        additionally_selected: &[String],
    ) -> Vec<MetadataViewWithValues>;

    /// Fields that may still be added next to the given entries
    fn addable_metadata(&self, keys: &[&str], additionally_selected: &[String]) -> Vec<MetadataViewKind>;
}

/// Definition of a division type
pub trait StructuralElementView: ComplexMetadataView {
    /// Division types allowed as children, id to label
    fn allowed_substructural_elements(&self) -> BTreeMap<String, String>;
}

/// Access to a ruleset
pub trait Ruleset {
    fn structural_element_view(
        &self,
        division_type: &str,
        acquisition_stage: &str,
        priority: &[String],
    ) -> Arc<dyn StructuralElementView>;

    fn functional_keys(&self, function: FunctionalMetadata) -> Vec<String>;

    fn translation_for_key(&self, key: &str, priority: &[String]) -> Option<String>;
}

/// A field definition, simple or complex
#[derive(Debug, Clone)]
pub enum MetadataViewKind {
    Simple(Arc<dyn SimpleMetadataView>),
    Complex(Arc<dyn ComplexMetadataView>),
}

impl MetadataViewKind {
    pub fn id(&self) -> &str {
        match self {
            MetadataViewKind::Simple(view) => view.id(),
            MetadataViewKind::Complex(view) => view.id(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MetadataViewKind::Simple(view) => view.label(),
            MetadataViewKind::Complex(view) => view.label(),
        }
    }

    pub fn max_occurs(&self) -> usize {
        match self {
            MetadataViewKind::Simple(view) => view.max_occurs(),
            MetadataViewKind::Complex(view) => view.max_occurs(),
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, MetadataViewKind::Complex(_))
    }
}

/// One display row proposed by the ruleset
#[derive(Debug, Clone)]
pub struct MetadataViewWithValues {
    /// `None` for entries the ruleset does not display
    pub view: Option<MetadataViewKind>,
    /// Positions of the entries shown in this row
    pub values: Vec<usize>,
}
