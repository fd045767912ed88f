use super::{LeadingFields, SimpleRow};
use crate::error::Result;
use crate::model::{section_for, MdSec, MetadataEntry};
use crate::ruleset::{MetadataView, SimpleMetadataView};
use std::sync::Arc;

/// Switch input; active exactly when an entry is stored
#[derive(Debug, Clone)]
pub struct BooleanRow {
    view: Arc<dyn SimpleMetadataView>,
    section: MdSec,
    active: bool,
}

impl BooleanRow {
    pub fn new(view: Arc<dyn SimpleMetadataView>, entry: Option<&MetadataEntry>) -> Self {
        let section = entry.map_or_else(|| section_for(view.domain()), |entry| entry.domain);
        Self {
            view,
            section,
            active: entry.is_some(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl SimpleRow for BooleanRow {
    fn view(&self) -> &Arc<dyn SimpleMetadataView> {
        &self.view
    }

    fn section(&self) -> MdSec {
        self.section
    }

    fn stored_values(&self, _leading: &[LeadingFields]) -> Result<Vec<String>> {
        Ok(self.view.convert_boolean(self.active).into_iter().collect())
    }

    fn is_valid(&self, _leading: &[LeadingFields]) -> bool {
        true
    }

    fn is_empty(&self) -> bool {
        !self.active
    }

    fn display_value(&self) -> String {
        self.active.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metadata;
    use crate::ruleset::UndefinedView;

    #[test]
    fn test_stored_entry_means_active() {
        let view: Arc<dyn SimpleMetadataView> = Arc::new(UndefinedView::new("Digitized"));
        let entry = MetadataEntry {
            key: "Digitized".to_string(),
            domain: MdSec::RightsMd,
            value: "true".to_string(),
        };

        let row = BooleanRow::new(Arc::clone(&view), Some(&entry));
        assert!(row.is_active());
        assert_eq!(
            row.metadata(&[]).unwrap(),
            vec![Metadata::Entry(entry.clone())]
        );

        let row = BooleanRow::new(view, None);
        assert!(!row.is_active());
        assert!(row.metadata(&[]).unwrap().is_empty());
        assert_eq!(row.display_value(), "false");
    }

    #[test]
    fn test_switching_off_removes_entry() {
        let view: Arc<dyn SimpleMetadataView> = Arc::new(UndefinedView::new("Digitized"));
        let mut row = BooleanRow::new(view, None);
        row.set_active(true);
        assert_eq!(row.metadata(&[]).unwrap().len(), 1);
        row.set_active(false);
        assert!(row.metadata(&[]).unwrap().is_empty());
    }
}
