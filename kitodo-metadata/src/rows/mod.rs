//! Rows of a fielded metadata table
//!
//! A row is either a nested group (a [`FieldedMetadataNode`]) or a leaf bound
//! to one simple field definition. Leaves share the [`SimpleRow`] behaviour:
//! they turn their current input into metadata entries, or into a value for
//! an attribute of the division when the field belongs to the
//! structure-attribute domain.

mod boolean;
mod select;
mod text;

pub use boolean::BooleanRow;
pub use select::SelectRow;
pub use text::TextRow;

pub use crate::ruleset::LeadingFields;

use crate::error::{InvalidMetadataValue, MetadataError, Result};
use crate::fielded::FieldedMetadataNode;
use crate::model::{Domain, MdSec, Metadata, MetadataEntry, StructureField};
use crate::ruleset::{MetadataView, SimpleMetadataView};
use std::sync::Arc;

/// Behaviour shared by all leaf rows
pub trait SimpleRow {
    fn view(&self) -> &Arc<dyn SimpleMetadataView>;

    /// Section the row's entries are written to
    fn section(&self) -> MdSec;

    /// Values to store, checked against the ruleset
    fn stored_values(&self, leading: &[LeadingFields]) -> Result<Vec<String>>;

    fn is_valid(&self, leading: &[LeadingFields]) -> bool;

    /// True when the row holds no input
    fn is_empty(&self) -> bool;

    /// Printable current value
    fn display_value(&self) -> String;

    fn metadata_id(&self) -> &str {
        self.view().id()
    }

    fn label(&self) -> &str {
        self.view().label()
    }

    /// Metadata entries for the row's values
    ///
    /// Structure attributes are not metadata and yield nothing here.
    fn metadata(&self, leading: &[LeadingFields]) -> Result<Vec<Metadata>> {
        if self.view().domain() == Some(Domain::StructureAttribute) {
            return Ok(Vec::new());
        }
        Ok(self
            .stored_values(leading)?
            .into_iter()
            .map(|value| {
                Metadata::Entry(MetadataEntry {
                    key: self.metadata_id().to_string(),
                    domain: self.section(),
                    value,
                })
            })
            .collect())
    }

    /// Division attribute and value, for structure-attribute fields only
    fn structure_field_value(&self, leading: &[LeadingFields]) -> Result<Option<(StructureField, String)>> {
        if self.view().domain() != Some(Domain::StructureAttribute) {
            return Ok(None);
        }
        let field = StructureField::from_key(self.metadata_id())
            .ok_or_else(|| MetadataError::NoSuchStructureField(self.metadata_id().to_string()))?;
        Ok(Some((field, self.stored_values(leading)?.join(" "))))
    }

    /// `container_exempt`: the enclosing group is optional and has no content
    fn is_required(&self, container_exempt: bool) -> bool {
        self.view().min_occurs() > 0 && !container_exempt
    }

    fn is_undefined(&self) -> bool {
        self.view().is_undefined()
    }
}

/// Reject a value the view does not accept
pub(crate) fn check_value(view: &dyn SimpleMetadataView, value: &str, leading: &[LeadingFields]) -> Result<()> {
    if view.is_valid(value, leading) {
        Ok(())
    } else {
        Err(InvalidMetadataValue::new(view.label(), value).into())
    }
}

/// One row of a fielded metadata table
#[derive(Debug, Clone)]
pub enum Row {
    Group(FieldedMetadataNode),
    Text(TextRow),
    Boolean(BooleanRow),
    Select(SelectRow),
}

impl Row {
    /// The row as leaf, `None` for groups
    pub fn as_simple(&self) -> Option<&dyn SimpleRow> {
        match self {
            Row::Group(_) => None,
            Row::Text(row) => Some(row),
            Row::Boolean(row) => Some(row),
            Row::Select(row) => Some(row),
        }
    }

    pub fn as_group(&self) -> Option<&FieldedMetadataNode> {
        match self {
            Row::Group(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_group_mut(&mut self) -> Option<&mut FieldedMetadataNode> {
        match self {
            Row::Group(node) => Some(node),
            _ => None,
        }
    }

    pub fn metadata_id(&self) -> &str {
        match self {
            Row::Group(node) => node.metadata_id(),
            Row::Text(row) => row.metadata_id(),
            Row::Boolean(row) => row.metadata_id(),
            Row::Select(row) => row.metadata_id(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Row::Group(node) => node.label(),
            Row::Text(row) => row.label(),
            Row::Boolean(row) => row.label(),
            Row::Select(row) => row.label(),
        }
    }

    /// Maximum occurrence of the row's field
    pub fn max_occurs(&self) -> usize {
        match self {
            Row::Group(node) => node.max_occurs(),
            Row::Text(row) => row.view().max_occurs(),
            Row::Boolean(row) => row.view().max_occurs(),
            Row::Select(row) => row.view().max_occurs(),
        }
    }

    pub fn is_valid(&self, leading: &[LeadingFields]) -> bool {
        match self {
            Row::Group(node) => node.is_valid(leading),
            Row::Text(row) => row.is_valid(leading),
            Row::Boolean(row) => row.is_valid(leading),
            Row::Select(row) => row.is_valid(leading),
        }
    }

    pub fn is_required(&self, container_exempt: bool) -> bool {
        match self {
            Row::Group(node) => node.min_occurs() > 0 && !container_exempt,
            Row::Text(row) => row.is_required(container_exempt),
            Row::Boolean(row) => row.is_required(container_exempt),
            Row::Select(row) => row.is_required(container_exempt),
        }
    }

    /// Whether the ruleset lets the user change the row
    pub fn is_editable(&self) -> bool {
        match self {
            Row::Group(node) => node.is_editable(),
            Row::Text(row) => row.view().is_editable(),
            Row::Boolean(row) => row.view().is_editable(),
            Row::Select(row) => row.view().is_editable(),
        }
    }

    pub fn is_undefined(&self) -> bool {
        match self {
            Row::Group(node) => node.is_undefined(),
            Row::Text(row) => row.is_undefined(),
            Row::Boolean(row) => row.is_undefined(),
            Row::Select(row) => row.is_undefined(),
        }
    }

    /// Whether the row holds any input, looking into groups
    pub fn has_content(&self) -> bool {
        match self {
            Row::Group(node) => node.has_content(),
            Row::Text(row) => !row.is_empty(),
            Row::Boolean(row) => !row.is_empty(),
            Row::Select(row) => !row.is_empty(),
        }
    }

    /// Printable value; empty for groups
    pub fn display_value(&self) -> String {
        match self {
            Row::Group(_) => String::new(),
            Row::Text(row) => row.display_value(),
            Row::Boolean(row) => row.display_value(),
            Row::Select(row) => row.display_value(),
        }
    }

    /// Current values when the row is a leading field
    pub(crate) fn leading_values(&self) -> Option<Vec<String>> {
        match self {
            Row::Boolean(row) if row.view().is_leading() => {
                Some(row.view().convert_boolean(row.is_active()).into_iter().collect())
            }
            Row::Select(row) if row.view().is_leading() => Some(row.selected().to_vec()),
            _ => None,
        }
    }

    pub(crate) fn is_leading(&self) -> bool {
        match self {
            Row::Group(_) => false,
            Row::Text(row) => row.view().is_leading(),
            Row::Boolean(row) => row.view().is_leading(),
            Row::Select(row) => row.view().is_leading(),
        }
    }
}
