use super::{check_value, LeadingFields, SimpleRow};
use crate::error::Result;
use crate::model::{section_for, MdSec, MetadataEntry};
use crate::ruleset::{MetadataView, SelectItem, SimpleMetadataView};
use std::sync::Arc;

/// Selection from the options the ruleset offers
///
/// Holds all entries of its key; single selections simply hold at most one.
#[derive(Debug, Clone)]
pub struct SelectRow {
    view: Arc<dyn SimpleMetadataView>,
    section: MdSec,
    selected: Vec<String>,
}

impl SelectRow {
    pub fn new(view: Arc<dyn SimpleMetadataView>, entries: &[&MetadataEntry]) -> Self {
        let section = entries
            .first()
            .map_or_else(|| section_for(view.domain()), |entry| entry.domain);
        Self {
            view,
            section,
            selected: entries.iter().map(|entry| entry.value.clone()).collect(),
        }
    }

    /// Options available in the given leading context
    pub fn items(&self, leading: &[LeadingFields]) -> Vec<SelectItem> {
        self.view.select_items(leading)
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn set_selected(&mut self, selected: Vec<String>) {
        self.selected = selected;
    }
}

impl SimpleRow for SelectRow {
    fn view(&self) -> &Arc<dyn SimpleMetadataView> {
        &self.view
    }

    fn section(&self) -> MdSec {
        self.section
    }

    fn stored_values(&self, leading: &[LeadingFields]) -> Result<Vec<String>> {
        for value in &self.selected {
            check_value(self.view.as_ref(), value, leading)?;
        }
        Ok(self.selected.clone())
    }

    fn is_valid(&self, leading: &[LeadingFields]) -> bool {
        self.selected
            .iter()
            .all(|value| self.view.is_valid(value, leading))
    }

    fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    fn display_value(&self) -> String {
        self.selected.join(" ")
    }
}
