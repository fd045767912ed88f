//! Ruleset declared in a TOML file
//!
//! ```toml
//! show-undefined = true
//!
//! [functional]
//! display-summary = ["TitleDocMain"]
//!
//! [[division]]
//! id = "Monograph"
//! label = "Monograph"
//! labels = { de = "Monographie" }
//! allowed-children = ["Chapter"]
//! fields = ["TitleDocMain", "Place", "LABEL"]
//!
//! [[key]]
//! id = "TitleDocMain"
//! label = "Main title"
//! min-occurs = 1
//! max-occurs = 1
//!
//! [[key]]
//! id = "LABEL"
//! domain = "structure-attribute"
//! ```
//!
//! Fields are shown in declaration order. Text, date, integer and boolean
//! fields get one row per stored entry; selection fields collect all their
//! entries in one row. A key with `keys = [...]` is a group.
//!
//! An option may declare `requires = { Key = "value" }`; it is only offered
//! while one of the leading field levels holds that value for that key.

use super::{
    ComplexMetadataView, FunctionalMetadata, InputType, LeadingFields, MetadataView, MetadataViewKind,
    MetadataViewWithValues, Ruleset, SelectItem, SimpleMetadataView, StructuralElementView,
    UndefinedView,
};
use crate::error::{MetadataError, Result};
use crate::model::{Domain, StructureField};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Date default token meaning "today"
pub const DEFAULT_NOW: &str = "now";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct RulesetFile {
    #[serde(default)]
    show_undefined: bool,
    #[serde(default)]
    functional: FunctionalKeys,
    #[serde(default, rename = "division")]
    divisions: Vec<DivisionDefinition>,
    #[serde(default, rename = "key")]
    keys: Vec<KeyDefinition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FunctionalKeys {
    #[serde(default)]
    display_summary: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct DivisionDefinition {
    id: String,
    label: Option<String>,
    #[serde(default)]
    labels: BTreeMap<String, String>,
    #[serde(default)]
    allowed_children: Vec<String>,
    #[serde(default)]
    fields: Vec<String>,
}

/// Definition of one metadata key
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct KeyDefinition {
    pub id: String,
    pub label: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default = "default_input")]
    pub input: InputType,
    #[serde(default)]
    pub min_occurs: usize,
    /// Unbounded when absent
    pub max_occurs: Option<usize>,
    pub domain: Option<Domain>,
    #[serde(rename = "default")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub leading: bool,
    #[serde(default = "default_editable")]
    pub editable: bool,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
    /// Nested keys; present for groups
    pub keys: Option<Vec<String>>,
}

fn default_input() -> InputType {
    InputType::OneLineText
}

fn default_editable() -> bool {
    true
}

/// One option of a selection key
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OptionDefinition {
    pub value: String,
    pub label: Option<String>,
    /// Leading field values this option depends on
    #[serde(default)]
    pub requires: BTreeMap<String, String>,
}

impl OptionDefinition {
    fn is_available(&self, leading: &[LeadingFields]) -> bool {
        self.requires.iter().all(|(key, value)| {
            leading
                .iter()
                .filter_map(|level| level.get(key))
                .any(|values| values.iter().any(|v| v == value))
        })
    }
}

impl KeyDefinition {
    fn is_complex(&self) -> bool {
        self.keys.is_some()
    }

    fn label_for(&self, priority: &[String]) -> String {
        translate(&self.labels, priority)
            .or_else(|| self.label.clone())
            .unwrap_or_else(|| self.id.clone())
    }

    fn max(&self) -> usize {
        self.max_occurs.unwrap_or(usize::MAX)
    }
}

/// Label for the first matching language; `de-AT` also matches `de`
fn translate(labels: &BTreeMap<String, String>, priority: &[String]) -> Option<String> {
    priority.iter().find_map(|language| {
        let language = language.to_ascii_lowercase();
        labels.get(&language).or_else(|| {
            language
                .split_once('-')
                .and_then(|(primary, _)| labels.get(primary))
        })
    })
    .cloned()
}

#[derive(Debug)]
struct RulesetData {
    show_undefined: bool,
    functional: FunctionalKeys,
    divisions: BTreeMap<String, DivisionDefinition>,
    keys: BTreeMap<String, Arc<KeyDefinition>>,
}

impl RulesetData {
    fn view_for(self: &Arc<Self>, definition: &Arc<KeyDefinition>, priority: &Arc<[String]>) -> MetadataViewKind {
        let label = definition.label_for(priority);
        if definition.is_complex() {
            MetadataViewKind::Complex(Arc::new(DeclaredGroupView {
                data: Arc::clone(self),
                definition: Arc::clone(definition),
                label,
                priority: Arc::clone(priority),
            }))
        } else {
            MetadataViewKind::Simple(Arc::new(DeclaredSimpleView {
                definition: Arc::clone(definition),
                label,
            }))
        }
    }

    /// Arrange entries along the declared field order
    fn sorted_visible(
        self: &Arc<Self>,
        fields: &[String],
        keys: &[&str],
        additionally_selected: &[String],
        priority: &Arc<[String]>,
    ) -> Vec<MetadataViewWithValues> {
        let mut rows = Vec::new();
        let mut used = vec![false; keys.len()];

        for field in fields {
            let Some(definition) = self.keys.get(field) else {
                continue;
            };
            let positions: Vec<usize> = keys
                .iter()
                .enumerate()
                .filter(|(_, key)| **key == field.as_str())
                .map(|(position, _)| position)
                .collect();
            for &position in &positions {
                used[position] = true;
            }

            let wanted = definition.min_occurs > 0 || additionally_selected.contains(field);
            let view = self.view_for(definition, priority);
            if !definition.is_complex() && definition.input.is_selection() {
                if !positions.is_empty() || wanted {
                    rows.push(MetadataViewWithValues {
                        view: Some(view),
                        values: positions,
                    });
                }
            } else if positions.is_empty() {
                if wanted {
                    rows.push(MetadataViewWithValues {
                        view: Some(view),
                        values: Vec::new(),
                    });
                }
            } else {
                rows.extend(positions.into_iter().map(|position| MetadataViewWithValues {
                    view: Some(view.clone()),
                    values: vec![position],
                }));
            }
        }

        let unused = used
            .iter()
            .enumerate()
            .filter(|(_, used)| !**used)
            .map(|(position, _)| position);
        if self.show_undefined {
            rows.extend(UndefinedView::rows_for(keys, unused));
        } else {
            let hidden: Vec<usize> = unused.collect();
            if !hidden.is_empty() {
                debug!("{} entries not shown by the ruleset", hidden.len());
                rows.push(MetadataViewWithValues {
                    view: None,
                    values: hidden,
                });
            }
        }
        rows
    }

    fn addable(self: &Arc<Self>, fields: &[String], keys: &[&str], priority: &Arc<[String]>) -> Vec<MetadataViewKind> {
        fields
            .iter()
            .filter_map(|field| self.keys.get(field))
            .filter(|definition| {
                let count = keys.iter().filter(|key| **key == definition.id).count();
                count < definition.max()
            })
            .map(|definition| self.view_for(definition, priority))
            .collect()
    }
}

/// Ruleset loaded from TOML
#[derive(Debug, Clone)]
pub struct DeclaredRuleset {
    data: Arc<RulesetData>,
}

impl DeclaredRuleset {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MetadataError::Ruleset(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse and check a ruleset
    ///
    /// Fails on duplicate ids, references to undeclared keys or divisions,
    /// and structure-attribute keys the division does not have.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RulesetFile =
            toml::from_str(content).map_err(|e| MetadataError::Ruleset(e.to_string()))?;

        let mut keys = BTreeMap::new();
        for definition in file.keys {
            if definition.domain == Some(Domain::StructureAttribute) {
                if StructureField::from_key(&definition.id).is_none() {
                    return Err(MetadataError::NoSuchStructureField(definition.id));
                }
                if definition.is_complex() {
                    return Err(MetadataError::Ruleset(format!(
                        "structure attribute \"{}\" cannot be a group",
                        definition.id
                    )));
                }
            }
            let id = definition.id.clone();
            if keys.insert(id.clone(), Arc::new(definition)).is_some() {
                return Err(MetadataError::Ruleset(format!("duplicate key \"{}\"", id)));
            }
        }

        let mut divisions = BTreeMap::new();
        for division in file.divisions {
            let id = division.id.clone();
            if divisions.insert(id.clone(), division).is_some() {
                return Err(MetadataError::Ruleset(format!("duplicate division \"{}\"", id)));
            }
        }

        for division in divisions.values() {
            check_references(&division.id, &division.fields, &keys)?;
            if let Some(child) = division
                .allowed_children
                .iter()
                .find(|child| !divisions.contains_key(*child))
            {
                return Err(MetadataError::Ruleset(format!(
                    "division \"{}\" allows undeclared division \"{}\"",
                    division.id, child
                )));
            }
        }
        for definition in keys.values() {
            if let Some(nested) = &definition.keys {
                check_references(&definition.id, nested, &keys)?;
            }
        }

        Ok(Self {
            data: Arc::new(RulesetData {
                show_undefined: file.show_undefined,
                functional: file.functional,
                divisions,
                keys,
            }),
        })
    }
}

fn check_references(owner: &str, fields: &[String], keys: &BTreeMap<String, Arc<KeyDefinition>>) -> Result<()> {
    let mut seen = HashSet::new();
    for field in fields {
        if !keys.contains_key(field) {
            return Err(MetadataError::Ruleset(format!(
                "\"{}\" references undeclared key \"{}\"",
                owner, field
            )));
        }
        if !seen.insert(field) {
            return Err(MetadataError::Ruleset(format!(
                "\"{}\" lists key \"{}\" twice",
                owner, field
            )));
        }
    }
    Ok(())
}

impl Ruleset for DeclaredRuleset {
    fn structural_element_view(
        &self,
        division_type: &str,
        _acquisition_stage: &str,
        priority: &[String],
    ) -> Arc<dyn StructuralElementView> {
        let priority: Arc<[String]> = priority.into();
        let view = match self.data.divisions.get(division_type) {
            Some(division) => DeclaredDivisionView {
                data: Arc::clone(&self.data),
                id: division.id.clone(),
                label: translate(&division.labels, &priority)
                    .or_else(|| division.label.clone())
                    .unwrap_or_else(|| division.id.clone()),
                fields: division.fields.clone(),
                allowed_children: division.allowed_children.clone(),
                undefined: false,
                priority,
            },
            None => {
                debug!("Division type \"{}\" is not declared", division_type);
                DeclaredDivisionView {
                    data: Arc::clone(&self.data),
                    id: division_type.to_string(),
                    label: division_type.to_string(),
                    fields: Vec::new(),
                    allowed_children: Vec::new(),
                    undefined: true,
                    priority,
                }
            }
        };
        Arc::new(view)
    }

    fn functional_keys(&self, function: FunctionalMetadata) -> Vec<String> {
        match function {
            FunctionalMetadata::DisplaySummary => self.data.functional.display_summary.clone(),
        }
    }

    fn translation_for_key(&self, key: &str, priority: &[String]) -> Option<String> {
        self.data
            .keys
            .get(key)
            .map(|definition| definition.label_for(priority))
    }
}

#[derive(Debug)]
struct DeclaredSimpleView {
    definition: Arc<KeyDefinition>,
    label: String,
}

impl MetadataView for DeclaredSimpleView {
    fn id(&self) -> &str {
        &self.definition.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn min_occurs(&self) -> usize {
        self.definition.min_occurs
    }

    fn max_occurs(&self) -> usize {
        self.definition.max()
    }

    fn domain(&self) -> Option<Domain> {
        self.definition.domain
    }

    fn is_editable(&self) -> bool {
        self.definition.editable
    }
}

impl SimpleMetadataView for DeclaredSimpleView {
    fn input_type(&self) -> InputType {
        self.definition.input
    }

    fn select_items(&self, leading: &[LeadingFields]) -> Vec<SelectItem> {
        self.definition
            .options
            .iter()
            .filter(|option| option.is_available(leading))
            .map(|option| SelectItem {
                value: option.value.clone(),
                label: option.label.clone().unwrap_or_else(|| option.value.clone()),
            })
            .collect()
    }

    fn convert_boolean(&self, value: bool) -> Option<String> {
        value.then(|| {
            self.definition
                .options
                .first()
                .map_or_else(|| "true".to_string(), |option| option.value.clone())
        })
    }

    fn is_valid(&self, value: &str, leading: &[LeadingFields]) -> bool {
        match self.definition.input {
            InputType::MultipleSelection
            | InputType::MultiLineSingleSelection
            | InputType::OneLineSingleSelection => {
                self.select_items(leading).iter().any(|item| item.value == value)
            }
            InputType::Boolean => self.convert_boolean(true).as_deref() == Some(value),
            InputType::Integer => value.trim().parse::<i64>().is_ok(),
            InputType::Date => kitodo_common::time::parse_date(value).is_ok(),
            InputType::MultiLineText | InputType::OneLineText => true,
        }
    }

    fn default_value(&self) -> Option<&str> {
        self.definition.default_value.as_deref()
    }

    fn is_leading(&self) -> bool {
        self.definition.leading
    }
}

#[derive(Debug)]
struct DeclaredGroupView {
    data: Arc<RulesetData>,
    definition: Arc<KeyDefinition>,
    label: String,
    priority: Arc<[String]>,
}

impl DeclaredGroupView {
    fn fields(&self) -> &[String] {
        self.definition.keys.as_deref().unwrap_or(&[])
    }
}

impl MetadataView for DeclaredGroupView {
    fn id(&self) -> &str {
        &self.definition.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn min_occurs(&self) -> usize {
        self.definition.min_occurs
    }

    fn max_occurs(&self) -> usize {
        self.definition.max()
    }

    fn domain(&self) -> Option<Domain> {
        self.definition.domain
    }

    fn is_editable(&self) -> bool {
        self.definition.editable
    }
}

impl ComplexMetadataView for DeclaredGroupView {
    fn sorted_visible_metadata(
        &self,
        keys: &[&str],
        additionally_selected: &[String],
    ) -> Vec<MetadataViewWithValues> {
        self.data
            .sorted_visible(self.fields(), keys, additionally_selected, &self.priority)
    }

    fn addable_metadata(&self, keys: &[&str], _additionally_selected: &[String]) -> Vec<MetadataViewKind> {
        self.data.addable(self.fields(), keys, &self.priority)
    }
}

#[derive(Debug)]
struct DeclaredDivisionView {
    data: Arc<RulesetData>,
    id: String,
    label: String,
    fields: Vec<String>,
    allowed_children: Vec<String>,
    undefined: bool,
    priority: Arc<[String]>,
}

impl MetadataView for DeclaredDivisionView {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
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
        self.undefined
    }
}

impl ComplexMetadataView for DeclaredDivisionView {
    fn sorted_visible_metadata(
        &self,
        keys: &[&str],
        additionally_selected: &[String],
    ) -> Vec<MetadataViewWithValues> {
        self.data
            .sorted_visible(&self.fields, keys, additionally_selected, &self.priority)
    }

    fn addable_metadata(&self, keys: &[&str], _additionally_selected: &[String]) -> Vec<MetadataViewKind> {
        self.data.addable(&self.fields, keys, &self.priority)
    }
}

impl StructuralElementView for DeclaredDivisionView {
    fn allowed_substructural_elements(&self) -> BTreeMap<String, String> {
        self.allowed_children
            .iter()
            .map(|child| {
                let label = self
                    .data
                    .divisions
                    .get(child)
                    .and_then(|division| {
                        translate(&division.labels, &self.priority).or_else(|| division.label.clone())
                    })
                    .unwrap_or_else(|| child.clone());
                (child.clone(), label)
            })
            .collect()
    }
}
