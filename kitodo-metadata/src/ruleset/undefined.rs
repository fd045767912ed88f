use super::{
    ComplexMetadataView, InputType, LeadingFields, MetadataView, MetadataViewKind,
    MetadataViewWithValues, SelectItem, SimpleMetadataView,
};
use crate::model::Domain;
use std::sync::Arc;

/// Stand-in definition for a key the ruleset does not define
///
/// As a simple view it shows the value as one-line text and accepts
/// anything. As a complex view it shows every nested entry, each again with
/// an undefined view. Since the ruleset only sees keys, an undefined key is
/// offered as complex; the fielded metadata tree falls back to a plain row
/// when the entity turns out to be a simple entry.
#[derive(Debug, Clone)]
pub struct UndefinedView {
    key: String,
}

impl UndefinedView {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// One row per entry, each with its own undefined view
    pub fn rows_for(keys: &[&str], positions: impl IntoIterator<Item = usize>) -> Vec<MetadataViewWithValues> {
        positions
            .into_iter()
            .filter_map(|position| {
                let key = keys.get(position)?;
                Some(MetadataViewWithValues {
                    view: Some(MetadataViewKind::Complex(Arc::new(UndefinedView::new(*key)))),
                    values: vec![position],
                })
            })
            .collect()
    }
}

impl MetadataView for UndefinedView {
    fn id(&self) -> &str {
        &self.key
    }

    fn label(&self) -> &str {
        &self.key
    }

    fn min_occurs(&self) -> usize {
        0
    }

    fn max_occurs(&self) -> usize {
        usize::MAX
    }

    fn domain(&self) -> Option<Domain> {
        None
    }

    fn is_undefined(&self) -> bool {
        true
    }
}

impl SimpleMetadataView for UndefinedView {
    fn input_type(&self) -> InputType {
        InputType::OneLineText
    }

    fn select_items(&self, _leading: &[LeadingFields]) -> Vec<SelectItem> {
        Vec::new()
    }

    fn convert_boolean(&self, value: bool) -> Option<String> {
        value.then(|| "true".to_string())
    }

    fn is_valid(&self, _value: &str, _leading: &[LeadingFields]) -> bool {
        true
    }

    fn default_value(&self) -> Option<&str> {
        None
    }
}

impl ComplexMetadataView for UndefinedView {
    fn sorted_visible_metadata(
        &self,
        keys: &[&str],
        _additionally_selected: &[String],
    ) -> Vec<MetadataViewWithValues> {
        Self::rows_for(keys, 0..keys.len())
    }

    fn addable_metadata(&self, _keys: &[&str], _additionally_selected: &[String]) -> Vec<MetadataViewKind> {
        Vec::new()
    }
}
