use super::{Attachment, FieldedMetadataNode, Holder, NodeView};
use crate::error::{MetadataError, Result};
use crate::model::{section_for, Domain, MdSec, Metadata, MetadataEntry, MetadataGroup, StructureField};
use crate::rows::{BooleanRow, Row, SelectRow, TextRow};
use crate::ruleset::{
    ComplexMetadataView, InputType, MetadataView, MetadataViewKind, MetadataViewWithValues,
    SimpleMetadataView, UndefinedView,
};
use std::sync::Arc;
use tracing::{debug, warn};

impl FieldedMetadataNode {
    fn group(view: Arc<dyn ComplexMetadataView>, group: Option<&MetadataGroup>) -> Result<Self> {
        let (section, entities) = match group {
            Some(group) => (group.domain, group.group.clone()),
            None => (section_for(view.domain()), Vec::new()),
        };
        let mut node = Self {
            holder: Holder::Group(entities),
            view: NodeView::Group(view),
            section,
            rows: Vec::new(),
            hidden: Vec::new(),
            additionally_selected: Vec::new(),
            attachment: Attachment::Attached,
        };
        node.create_metadata_table()?;
        Ok(node)
    }

    /// Plain entry found where the ruleset expected a group
    fn undefined(entry: MetadataEntry) -> Result<Self> {
        warn!(
            "Entry \"{}\" is declared as group in the ruleset; shown as plain value",
            entry.key
        );
        let mut node = Self {
            view: NodeView::Undefined {
                key: entry.key.clone(),
            },
            section: entry.domain,
            holder: Holder::Group(vec![Metadata::Entry(entry)]),
            rows: Vec::new(),
            hidden: Vec::new(),
            additionally_selected: Vec::new(),
            attachment: Attachment::Attached,
        };
        node.create_metadata_table()?;
        Ok(node)
    }

    /// Entities shown by this node, followed by the synthesized
    /// structure-attribute entries of a root
    ///
    /// Returns the entities and the number of stored ones among them.
    fn table_entities(&self) -> (Vec<Metadata>, usize) {
        match &self.holder {
            Holder::Division(division) => {
                let mut entities = division.metadata.clone();
                let stored = entities.len();
                if let Some(label) = &division.label {
                    entities.push(Metadata::entry(StructureField::Label.key(), label.clone()));
                }
                if let Some(orderlabel) = &division.orderlabel {
                    entities.push(Metadata::entry(StructureField::OrderLabel.key(), orderlabel.clone()));
                }
                (entities, stored)
            }
            Holder::Group(entities) => (entities.clone(), entities.len()),
        }
    }

    /// Rebuild the rows from the stored entities
    ///
    /// Rows are only replaced when the whole table could be built.
    pub(super) fn create_metadata_table(&mut self) -> Result<()> {
        let (entities, stored) = self.table_entities();
        let table = {
            let keys: Vec<&str> = entities.iter().map(Metadata::key).collect();
            match &self.view {
                NodeView::Division(view) => view.sorted_visible_metadata(&keys, &self.additionally_selected),
                NodeView::Group(view) => view.sorted_visible_metadata(&keys, &self.additionally_selected),
                NodeView::Undefined { .. } => UndefinedView::rows_for(&keys, 0..keys.len()),
            }
        };

        let mut rows = Vec::with_capacity(table.len());
        let mut hidden = Vec::new();
        for MetadataViewWithValues { view, values } in table {
            if let Some(position) = values.iter().find(|p| **p >= entities.len()) {
                return Err(MetadataError::IllegalState(format!(
                    "ruleset referenced entry {} of {} in \"{}\"",
                    position,
                    entities.len(),
                    self.metadata_id()
                )));
            }
            let values = Self::without_synthesized(view.as_ref(), values, stored);

            match view {
                None => hidden.extend(values.iter().map(|p| entities[*p].clone())),
                Some(MetadataViewKind::Complex(view)) => {
                    if matches!(self.view, NodeView::Undefined { .. }) {
                        rows.push(self.undefined_row(&entities, &values)?);
                    } else {
                        rows.push(Self::group_row(view, &entities, &values)?);
                    }
                }
                Some(MetadataViewKind::Simple(view)) => {
                    rows.push(Self::simple_row(view, &entities, &values)?);
                }
            }
        }

        debug!(
            "Table for \"{}\": {} row(s), {} hidden",
            self.metadata_id(),
            rows.len(),
            hidden.len()
        );
        self.rows = rows;
        self.hidden = hidden;
        Ok(())
    }

    /// Drop synthesized entries unless a structure-attribute field takes them
    fn without_synthesized(view: Option<&MetadataViewKind>, values: Vec<usize>, stored: usize) -> Vec<usize> {
        let takes_synthesized = matches!(
            view,
            Some(MetadataViewKind::Simple(simple)) if simple.domain() == Some(Domain::StructureAttribute)
        );
        if takes_synthesized {
            values
        } else {
            values.into_iter().filter(|p| *p < stored).collect()
        }
    }

    /// Rows of an undefined node show each entry as unchecked text
    fn undefined_row(&self, entities: &[Metadata], values: &[usize]) -> Result<Row> {
        let position = match values {
            [position] => *position,
            _ => {
                return Err(MetadataError::IllegalState(format!(
                    "{} entries in one undefined row of \"{}\"",
                    values.len(),
                    self.metadata_id()
                )))
            }
        };
        match &entities[position] {
            Metadata::Entry(entry) => Ok(Row::Text(TextRow::new(
                Arc::new(UndefinedView::new(entry.key.clone())),
                Some(entry),
            ))),
            Metadata::Group(group) => Ok(Row::Group(Self::group(
                Arc::new(UndefinedView::new(group.key.clone())),
                Some(group),
            )?)),
        }
    }

    fn group_row(view: Arc<dyn ComplexMetadataView>, entities: &[Metadata], values: &[usize]) -> Result<Row> {
        let node = match values {
            [] => Self::group(view, None)?,
            [position] => match &entities[*position] {
                Metadata::Group(group) => Self::group(view, Some(group))?,
                Metadata::Entry(entry) => Self::undefined(entry.clone())?,
            },
            _ => {
                return Err(MetadataError::IllegalState(format!(
                    "{} groups \"{}\" in one row, at most one allowed",
                    values.len(),
                    view.id()
                )))
            }
        };
        Ok(Row::Group(node))
    }

    fn simple_row(view: Arc<dyn SimpleMetadataView>, entities: &[Metadata], values: &[usize]) -> Result<Row> {
        let entries = values
            .iter()
            .map(|position| match &entities[*position] {
                Metadata::Entry(entry) => Ok(entry),
                Metadata::Group(group) => Err(MetadataError::IllegalState(format!(
                    "group \"{}\" is not declared as group in the ruleset",
                    group.key
                ))),
            })
            .collect::<Result<Vec<&MetadataEntry>>>()?;

        let input_type = view.input_type();
        if input_type.is_selection() {
            return Ok(Row::Select(SelectRow::new(view, &entries)));
        }
        let entry = match entries.as_slice() {
            [] => None,
            [entry] => Some(*entry),
            _ => {
                return Err(MetadataError::IllegalState(format!(
                    "{} entries \"{}\" in one row, at most one allowed",
                    entries.len(),
                    view.id()
                )))
            }
        };
        Ok(match input_type {
            InputType::Boolean => Row::Boolean(BooleanRow::new(view, entry)),
            _ => Row::Text(TextRow::new(view, entry)),
        })
    }

    /// Section new group entities of this node are written to
    pub(super) fn section(&self) -> MdSec {
        self.section
    }
}
