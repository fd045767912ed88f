//! Fielded metadata tree
//!
//! A [`FieldedMetadataNode`] reconciles stored metadata with the ruleset. The
//! root node stands for a structural division, nested nodes for metadata
//! groups. Building asks the ruleset to arrange the stored entities into
//! rows; entities it does not show are kept aside and written back
//! unchanged, so editing never loses data.
//!
//! ```text
//! Division.metadata ──► sorted_visible_metadata ──► rows ──► edits
//!        ▲                                                     │
//!        └──────────────────── preserve ◄──────────────────────┘
//! ```

mod preserve;
mod table;

use crate::error::{MetadataError, Result};
use crate::model::{Division, MdSec, Metadata};
use crate::rows::{LeadingFields, Row};
use crate::ruleset::{ComplexMetadataView, MetadataView, MetadataViewKind, StructuralElementView};
use std::sync::Arc;
use tracing::debug;

/// Whether a node's entities are already part of its container's collection
///
/// Preserving rebuilds the container's collection from all of its rows, so a
/// pending node is written on the container's next preserve like any other.
/// Until then it has no stored entities: [`FieldedMetadataNode::group_metadata`]
/// returns `None` for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    Attached,
    /// Created by copying; becomes part of the container on its next preserve
    PendingAttach,
}

/// Storage the node edits
#[derive(Debug, Clone)]
enum Holder {
    Division(Division),
    Group(Vec<Metadata>),
}

#[derive(Debug, Clone)]
enum NodeView {
    Division(Arc<dyn StructuralElementView>),
    Group(Arc<dyn ComplexMetadataView>),
    /// A plain entry where the ruleset expected a group
    Undefined { key: String },
}

/// Node of the fielded metadata tree
#[derive(Debug, Clone)]
pub struct FieldedMetadataNode {
    holder: Holder,
    view: NodeView,
    /// Section a group node is written to
    section: MdSec,
    rows: Vec<Row>,
    /// Entities the ruleset does not display
    hidden: Vec<Metadata>,
    additionally_selected: Vec<String>,
    attachment: Attachment,
}

impl FieldedMetadataNode {
    /// Build the metadata table of a division
    pub fn root(division: Division, view: Arc<dyn StructuralElementView>) -> Result<Self> {
        let mut node = Self {
            holder: Holder::Division(division),
            view: NodeView::Division(view),
            section: MdSec::default(),
            rows: Vec::new(),
            hidden: Vec::new(),
            additionally_selected: Vec::new(),
            attachment: Attachment::Attached,
        };
        node.create_metadata_table()?;
        Ok(node)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows for editing in place; use [`copy`](Self::copy) and
    /// [`remove`](Self::remove) to change the row list itself
    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    pub fn row(&self, index: usize) -> Result<&Row> {
        self.rows.get(index).ok_or(MetadataError::NoSuchRow(index))
    }

    /// Entities kept aside because the ruleset does not display them
    pub fn hidden_metadata(&self) -> &[Metadata] {
        &self.hidden
    }

    pub fn additionally_selected(&self) -> &[String] {
        &self.additionally_selected
    }

    pub fn attachment(&self) -> Attachment {
        self.attachment
    }

    pub fn is_pending_attach(&self) -> bool {
        self.attachment == Attachment::PendingAttach
    }

    /// The division of a root node
    pub fn division(&self) -> Option<&Division> {
        match &self.holder {
            Holder::Division(division) => Some(division),
            Holder::Group(_) => None,
        }
    }

    pub fn into_division(self) -> Option<Division> {
        match self.holder {
            Holder::Division(division) => Some(division),
            Holder::Group(_) => None,
        }
    }

    /// Stored entities of a group node, as of the last preserve
    ///
    /// `None` for roots and for copies not yet attached to their container.
    pub fn group_metadata(&self) -> Option<&[Metadata]> {
        match (&self.holder, self.attachment) {
            (Holder::Group(entities), Attachment::Attached) => Some(entities),
            _ => None,
        }
    }

    /// Key of the group, or division type of a root
    pub fn metadata_id(&self) -> &str {
        match &self.view {
            NodeView::Division(view) => view.id(),
            NodeView::Group(view) => view.id(),
            NodeView::Undefined { key } => key,
        }
    }

    pub fn label(&self) -> &str {
        match &self.view {
            NodeView::Division(view) => view.label(),
            NodeView::Group(view) => view.label(),
            NodeView::Undefined { key } => key,
        }
    }

    pub fn min_occurs(&self) -> usize {
        match &self.view {
            NodeView::Division(_) | NodeView::Undefined { .. } => 0,
            NodeView::Group(view) => view.min_occurs(),
        }
    }

    pub fn max_occurs(&self) -> usize {
        match &self.view {
            NodeView::Division(_) | NodeView::Undefined { .. } => usize::MAX,
            NodeView::Group(view) => view.max_occurs(),
        }
    }

    pub fn is_required(&self) -> bool {
        self.min_occurs() > 0
    }

    pub fn is_editable(&self) -> bool {
        match &self.view {
            NodeView::Group(view) => view.is_editable(),
            NodeView::Division(_) | NodeView::Undefined { .. } => true,
        }
    }

    /// True for undefined fallbacks and for groups the ruleset does not know
    pub fn is_undefined(&self) -> bool {
        match &self.view {
            NodeView::Division(view) => view.is_undefined(),
            NodeView::Group(view) => view.is_undefined(),
            NodeView::Undefined { .. } => true,
        }
    }

    fn is_root(&self) -> bool {
        matches!(self.holder, Holder::Division(_))
    }

    /// Whether any row, at any depth, holds input
    pub fn has_content(&self) -> bool {
        !self.hidden.is_empty() || self.rows.iter().any(Row::has_content)
    }

    /// Rows are not required while their optional group is still empty
    fn exempts_required(&self) -> bool {
        !self.is_root() && self.min_occurs() == 0 && !self.has_content()
    }

    /// Whether the row at `index` must be filled in
    pub fn is_row_required(&self, index: usize) -> Result<bool> {
        Ok(self.row(index)?.is_required(self.exempts_required()))
    }

    /// Whether every row holds a value the ruleset accepts
    ///
    /// `outer` holds the leading fields of the enclosing levels, innermost
    /// first, as returned by [`leading_levels`](Self::leading_levels) of the
    /// parent; empty for a root.
    pub fn is_valid(&self, outer: &[LeadingFields]) -> bool {
        let leading = self.leading_levels(outer);
        self.rows.iter().all(|row| row.is_valid(&leading))
    }

    /// Current values of this node's leading rows
    pub fn leading_fields(&self) -> LeadingFields {
        let mut fields = LeadingFields::new();
        for row in &self.rows {
            if let Some(values) = row.leading_values() {
                fields
                    .entry(row.metadata_id().to_string())
                    .or_default()
                    .extend(values);
            }
        }
        fields
    }

    /// Leading field levels seen by this node's rows, innermost first
    pub fn leading_levels(&self, outer: &[LeadingFields]) -> Vec<LeadingFields> {
        let mut levels = Vec::with_capacity(outer.len() + 1);
        levels.push(self.leading_fields());
        levels.extend_from_slice(outer);
        levels
    }

    /// Duplicate a row directly after the original
    ///
    /// A copied group is attached to this node's collection on the next
    /// preserve.
    pub fn copy(&mut self, index: usize) -> Result<()> {
        let row = self.row(index)?;
        let key = row.metadata_id();
        let max_occurs = row.max_occurs();
        let siblings = self.rows.iter().filter(|r| r.metadata_id() == key).count();
        if siblings >= max_occurs {
            return Err(MetadataError::Cardinality {
                key: key.to_string(),
                max_occurs,
            });
        }

        let mut clone = row.clone();
        if let Row::Group(node) = &mut clone {
            node.attachment = Attachment::PendingAttach;
        }
        debug!("Copied row {} ({})", index, clone.metadata_id());
        self.rows.insert(index + 1, clone);
        Ok(())
    }

    /// Take a row out of the table; its entities vanish on the next preserve
    pub fn remove(&mut self, index: usize) -> Result<Row> {
        if index >= self.rows.len() {
            return Err(MetadataError::NoSuchRow(index));
        }
        Ok(self.rows.remove(index))
    }

    /// Edit a row in place
    ///
    /// Editing a leading row re-arranges the table, so that rows depending
    /// on it are shown for the new value. When the current input does not
    /// validate yet, the table is left as it is. `outer` as for
    /// [`is_valid`](Self::is_valid).
    pub fn edit_row<F>(&mut self, index: usize, outer: &[LeadingFields], edit: F) -> Result<()>
    where
        F: FnOnce(&mut Row),
    {
        let row = self.rows.get_mut(index).ok_or(MetadataError::NoSuchRow(index))?;
        edit(row);
        if !row.is_leading() {
            return Ok(());
        }
        match self.collect(outer, preserve::UnknownStructureField::Skip) {
            Ok(collected) => {
                self.commit(collected);
                self.create_metadata_table()
            }
            Err(MetadataError::InvalidValue(invalid)) => {
                debug!("Table not rearranged: {}", invalid);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Show a field that has no data yet
    ///
    /// The current input is preserved first. Invalid input fails the call
    /// and leaves the table unchanged; structure fields the division does not
    /// have are skipped. `outer` as for [`is_valid`](Self::is_valid).
    pub fn add_additionally_selected_field(&mut self, key: &str, outer: &[LeadingFields]) -> Result<()> {
        let collected = self.collect(outer, preserve::UnknownStructureField::Skip)?;
        if !self.additionally_selected.iter().any(|k| k == key) {
            self.additionally_selected.push(key.to_string());
        }
        self.commit(collected);
        self.create_metadata_table()
    }

    /// Fields the ruleset allows to add here
    pub fn addable_fields(&self) -> Vec<MetadataViewKind> {
        let keys = self.current_keys();
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        match &self.view {
            NodeView::Division(view) => view.addable_metadata(&keys, &self.additionally_selected),
            NodeView::Group(view) => view.addable_metadata(&keys, &self.additionally_selected),
            NodeView::Undefined { .. } => Vec::new(),
        }
    }

    /// Key of every entity the table currently stands for
    fn current_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        for row in &self.rows {
            let count = match row {
                Row::Group(_) => 1,
                Row::Select(select) => select.selected().len(),
                other => usize::from(other.has_content()),
            };
            keys.extend(std::iter::repeat(row.metadata_id().to_string()).take(count));
        }
        keys.extend(self.hidden.iter().map(|m| m.key().to_string()));
        keys
    }

    /// Change the division type and rebuild the table for it
    ///
    /// Current input is preserved first. On failure the node is unchanged.
    pub fn retype(&mut self, division_type: &str, view: Arc<dyn StructuralElementView>) -> Result<()> {
        if !self.is_root() {
            return Err(MetadataError::IllegalState(format!(
                "group \"{}\" has no division type",
                self.metadata_id()
            )));
        }
        let collected = self.collect(&[], preserve::UnknownStructureField::Fail)?;
        let mut retyped = self.clone();
        retyped.commit(collected);
        let mut division = retyped
            .into_division()
            .ok_or_else(|| MetadataError::IllegalState("root without division".to_string()))?;
        division.division_type = Some(division_type.to_string());
        *self = Self::root(division, view)?;
        Ok(())
    }
}
