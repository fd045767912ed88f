use super::{check_value, LeadingFields, SimpleRow};
use crate::error::Result;
use crate::model::{section_for, MdSec, MetadataEntry};
use crate::ruleset::declared::DEFAULT_NOW;
use crate::ruleset::{InputType, MetadataView, SimpleMetadataView};
use chrono::NaiveDate;
use kitodo_common::time;
use once_cell::unsync::OnceCell;
use std::sync::Arc;
use tracing::warn;

/// Free text input; also used for dates and integers
#[derive(Debug, Clone)]
pub struct TextRow {
    view: Arc<dyn SimpleMetadataView>,
    section: MdSec,
    value: String,
    date: OnceCell<Option<NaiveDate>>,
}

impl TextRow {
    /// Row for a stored entry, or for the field's default when there is none
    pub fn new(view: Arc<dyn SimpleMetadataView>, entry: Option<&MetadataEntry>) -> Self {
        let (section, value) = match entry {
            Some(entry) => (entry.domain, entry.value.clone()),
            None => (section_for(view.domain()), Self::initial_value(view.as_ref())),
        };
        Self {
            view,
            section,
            value,
            date: OnceCell::new(),
        }
    }

    fn initial_value(view: &dyn SimpleMetadataView) -> String {
        match view.default_value() {
            Some(DEFAULT_NOW) if view.input_type() == InputType::Date => time::format_date(time::today()),
            Some(default) => default.to_string(),
            None => String::new(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.date = OnceCell::new();
    }

    pub fn is_date(&self) -> bool {
        self.view.input_type() == InputType::Date
    }

    /// Parsed value of a date field
    ///
    /// Unparsable input is logged and gives `None`; validation reports it
    /// when the row is preserved.
    pub fn date(&self) -> Option<NaiveDate> {
        if !self.is_date() {
            return None;
        }
        *self.date.get_or_init(|| {
            let value = self.value.trim();
            if value.is_empty() {
                return None;
            }
            match time::parse_date(value) {
                Ok(date) => Some(date),
                Err(e) => {
                    warn!("Cannot parse date \"{}\" of {}: {}", value, self.view.id(), e);
                    None
                }
            }
        })
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.set_value(date.map(time::format_date).unwrap_or_default());
    }
}

impl SimpleRow for TextRow {
    fn view(&self) -> &Arc<dyn SimpleMetadataView> {
        &self.view
    }

    fn section(&self) -> MdSec {
        self.section
    }

    fn stored_values(&self, leading: &[LeadingFields]) -> Result<Vec<String>> {
        let value = self.value.trim();
        if value.is_empty() {
            return Ok(Vec::new());
        }
        check_value(self.view.as_ref(), value, leading)?;
        Ok(vec![value.to_string()])
    }

    fn is_valid(&self, leading: &[LeadingFields]) -> bool {
        let value = self.value.trim();
        value.is_empty() || self.view.is_valid(value, leading)
    }

    fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    fn display_value(&self) -> String {
        self.value.clone()
    }
}
