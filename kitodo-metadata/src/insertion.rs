//! Insertion positions for linking a new division into a logical structure
//!
//! When a new process is created as child of an existing one, the user picks
//! where in the parent's logical structure it goes. Every division whose
//! type allows the new document type as child offers a position before its
//! first child and after each child. Positions are addressed by the child
//! indexes along the way, joined with [`INSERTION_POSITION_SEPARATOR`]:
//!
//! ```text
//! Periodical            "0"          before the first volume
//! ├── Volume 1848       "1¶0", "1¶1" inside the first volume
//! │                     "1"          after the first volume
//! └── Volume 1849       ...
//! ```

use crate::error::{MetadataError, Result};
use crate::model::{Division, Link};
use crate::process::ProcessLookup;
use crate::ruleset::{FunctionalMetadata, MetadataView, Ruleset, StructuralElementView};
use serde::Serialize;
use tracing::debug;

/// Separator between the levels of an insertion position
pub const INSERTION_POSITION_SEPARATOR: &str = "¶";

/// One selectable insertion position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertionPosition {
    /// Child indexes from the root, see [`INSERTION_POSITION_SEPARATOR`]
    pub path: String,
    /// Label of the division the position belongs to
    pub label: String,
    pub tooltip: Vec<String>,
}

/// Selection tree shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InsertionTreeNode {
    Label {
        label: String,
        tooltip: Vec<String>,
        children: Vec<InsertionTreeNode>,
    },
    /// Index into [`InsertionPositions::positions`]
    Position { index: usize },
}

/// Result of [`InsertionPositionResolver::resolve`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertionPositions {
    pub doc_type: String,
    /// Positions in document order
    pub positions: Vec<InsertionPosition>,
    pub tree: InsertionTreeNode,
}

impl InsertionPositions {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Position preselected for the user: the last one
    pub fn default_selection(&self) -> Option<&InsertionPosition> {
        self.positions.last()
    }

    /// Fail when the structure offers no position at all
    pub fn require_any(self) -> Result<Self> {
        if self.is_empty() {
            Err(MetadataError::NoInsertionPosition(self.doc_type))
        } else {
            Ok(self)
        }
    }
}

/// Walks a logical structure and collects insertion positions
pub struct InsertionPositionResolver<'a> {
    ruleset: &'a dyn Ruleset,
    processes: &'a dyn ProcessLookup,
    acquisition_stage: &'a str,
    priority: &'a [String],
}

impl<'a> InsertionPositionResolver<'a> {
    pub fn new(ruleset: &'a dyn Ruleset, processes: &'a dyn ProcessLookup) -> Self {
        Self {
            ruleset,
            processes,
            acquisition_stage: "",
            priority: &[],
        }
    }

    pub fn with_acquisition_stage(mut self, acquisition_stage: &'a str) -> Self {
        self.acquisition_stage = acquisition_stage;
        self
    }

    /// Language priority for labels and tooltips
    pub fn with_priority(mut self, priority: &'a [String]) -> Self {
        self.priority = priority;
        self
    }

    /// Collect the positions where a division of `doc_type` may be linked
    pub fn resolve(&self, logical_root: &Division, doc_type: &str) -> Result<InsertionPositions> {
        let mut positions = Vec::new();
        let tree = self.walk("", logical_root, doc_type, &mut positions)?;
        debug!(
            "{} insertion position(s) for \"{}\"",
            positions.len(),
            doc_type
        );
        Ok(InsertionPositions {
            doc_type: doc_type.to_string(),
            positions,
            tree,
        })
    }

    fn walk(
        &self,
        prefix: &str,
        division: &Division,
        doc_type: &str,
        positions: &mut Vec<InsertionPosition>,
    ) -> Result<InsertionTreeNode> {
        let (division_type, tooltip) = match &division.link {
            None => (division.division_type.clone().unwrap_or_default(), Vec::new()),
            Some(link) => {
                let id = process_id(link)?;
                (self.processes.base_type(id)?, self.tooltip(id)?)
            }
        };
        let view = self
            .ruleset
            .structural_element_view(&division_type, self.acquisition_stage, self.priority);
        let label = view.label().to_string();
        let linking_allowed =
            division.link.is_none() && view.allowed_substructural_elements().contains_key(doc_type);

        let mut children = Vec::new();
        if linking_allowed {
            offer(positions, &mut children, format!("{}0", prefix), &label, &tooltip);
        }
        for (index, child) in division.children.iter().enumerate() {
            let child_prefix = format!("{}{}{}", prefix, index + 1, INSERTION_POSITION_SEPARATOR);
            children.push(self.walk(&child_prefix, child, doc_type, positions)?);
            if linking_allowed {
                offer(positions, &mut children, format!("{}{}", prefix, index + 1), &label, &tooltip);
            }
        }

        Ok(InsertionTreeNode::Label {
            label,
            tooltip,
            children,
        })
    }

    /// Summary lines of a linked process, or its title
    fn tooltip(&self, id: u32) -> Result<Vec<String>> {
        let keys = self.ruleset.functional_keys(FunctionalMetadata::DisplaySummary);
        let mut lines = Vec::new();
        if !keys.is_empty() {
            let logical = self.processes.logical_structure(id)?;
            for key in &keys {
                if let Some(value) = logical.metadata_value(key) {
                    let label = self
                        .ruleset
                        .translation_for_key(key, self.priority)
                        .unwrap_or_else(|| key.clone());
                    lines.push(format!("{}: {}", label, value));
                }
            }
        }
        if lines.is_empty() {
            lines.push(self.processes.title(id)?);
        }
        Ok(lines)
    }
}

fn offer(
    positions: &mut Vec<InsertionPosition>,
    children: &mut Vec<InsertionTreeNode>,
    path: String,
    label: &str,
    tooltip: &[String],
) {
    children.push(InsertionTreeNode::Position {
        index: positions.len(),
    });
    positions.push(InsertionPosition {
        path,
        label: label.to_string(),
        tooltip: tooltip.to_vec(),
    });
}

fn process_id(link: &Link) -> Result<u32> {
    link.process_id().ok_or_else(|| MetadataError::LinkedProcess {
        uri: link.uri.clone(),
        reason: "no process id in link".to_string(),
    })
}
