//! Writing rows back into the entity model
//!
//! Preserving runs in two passes. [`collect`](FieldedMetadataNode::collect)
//! computes the new entities and structure attributes of the whole subtree
//! without touching anything; only when every row produced its values does
//! [`commit`](FieldedMetadataNode::commit) store them. A rejected value
//! therefore leaves both the tree and the stored metadata as they were.

use super::{Attachment, FieldedMetadataNode, Holder, NodeView};
use crate::error::{MetadataError, Result};
use crate::model::{Metadata, MetadataGroup, StructureField};
use crate::rows::{LeadingFields, Row, SimpleRow};
use tracing::{debug, warn};

/// Handling of structure fields the division does not have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum UnknownStructureField {
    Fail,
    Skip,
}

/// Result of the collect pass for one node
#[derive(Debug)]
pub(super) struct Collected {
    /// New entities of the node, hidden ones included
    metadata: Vec<Metadata>,
    /// Division attributes to set, root only
    structure: Vec<(StructureField, String)>,
    /// Results of group rows, by row index
    children: Vec<Option<Collected>>,
}

impl FieldedMetadataNode {
    /// Write all rows back to the division or group
    ///
    /// Fails with `InvalidValue` when a value is rejected (annotated with the
    /// enclosing groups) and with `NoSuchStructureField` when a row writes to
    /// an attribute the division does not have. Nothing is changed then.
    pub fn preserve(&mut self) -> Result<()> {
        let collected = self.collect(&[], UnknownStructureField::Fail)?;
        self.commit(collected);
        Ok(())
    }

    pub(super) fn collect(&self, outer: &[LeadingFields], unknown: UnknownStructureField) -> Result<Collected> {
        self.collect_rows(outer, unknown).map_err(|e| match e {
            MetadataError::InvalidValue(mut invalid) if !self.is_root() => {
                invalid.add_parent(self.metadata_id());
                MetadataError::InvalidValue(invalid)
            }
            other => other,
        })
    }

    fn collect_rows(&self, outer: &[LeadingFields], unknown: UnknownStructureField) -> Result<Collected> {
        let leading = self.leading_levels(outer);
        let mut metadata = Vec::new();
        let mut structure = Vec::new();
        let mut children = Vec::with_capacity(self.rows.len());

        for row in &self.rows {
            let Some(simple) = row.as_simple() else {
                if let Row::Group(node) = row {
                    let child = node.collect(&leading, unknown)?;
                    metadata.extend(node.output(&child));
                    children.push(Some(child));
                }
                continue;
            };
            children.push(None);

            match simple.structure_field_value(&leading) {
                Ok(Some(field_value)) => {
                    if !self.is_root() {
                        return Err(MetadataError::IllegalState(format!(
                            "structure field \"{}\" inside group \"{}\"",
                            simple.metadata_id(),
                            self.metadata_id()
                        )));
                    }
                    structure.push(field_value);
                }
                Ok(None) => metadata.extend(simple.metadata(&leading)?),
                Err(MetadataError::NoSuchStructureField(key)) if unknown == UnknownStructureField::Skip => {
                    warn!("Division has no structure field \"{}\"; value not saved", key);
                }
                Err(e) => return Err(e),
            }
        }

        metadata.extend(self.hidden.iter().cloned());
        Ok(Collected {
            metadata,
            structure,
            children,
        })
    }

    /// Entities this node contributes to its container
    fn output(&self, collected: &Collected) -> Vec<Metadata> {
        match &self.view {
            NodeView::Undefined { .. } => collected.metadata.clone(),
            NodeView::Group(_) | NodeView::Division(_) => vec![Metadata::Group(MetadataGroup {
                key: self.metadata_id().to_string(),
                domain: self.section(),
                group: collected.metadata.clone(),
            })],
        }
    }

    pub(super) fn commit(&mut self, collected: Collected) {
        let Collected {
            metadata,
            structure,
            children,
        } = collected;

        for (row, child) in self.rows.iter_mut().zip(children) {
            if let (Row::Group(node), Some(child)) = (row, child) {
                if node.attachment == Attachment::PendingAttach {
                    debug!("Attaching copied group \"{}\"", node.metadata_id());
                }
                node.commit(child);
            }
        }

        match &mut self.holder {
            Holder::Division(division) => {
                if structure.iter().any(|(field, _)| *field == StructureField::ContentIds) {
                    division.content_ids.clear();
                }
                for (field, value) in structure {
                    field.apply(division, &value);
                }
                division.metadata = metadata;
            }
            Holder::Group(entities) => *entities = metadata,
        }
        self.attachment = Attachment::Attached;
    }
}
