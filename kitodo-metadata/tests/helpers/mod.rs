//! Test Helper Utilities
//!
//! Shared ruleset fixture and table accessors for the integration tests

#![allow(dead_code)]

pub mod log_capture;

pub use log_capture::{capture_logs, LogCapture};

use kitodo_metadata::ruleset::declared::DeclaredRuleset;
use kitodo_metadata::ruleset::{Ruleset, StructuralElementView};
use kitodo_metadata::{Division, FieldedMetadataNode, Metadata, Row};
use std::sync::Arc;

/// Ruleset used by most tests
///
/// Monograph fields, in display order: main title (required, once), places,
/// year (integer), languages (multiple selection), digitized flag,
/// publication type (leading), persons (group), label, order label and a
/// read-only record identifier.
pub const RULESET: &str = r#"
show-undefined = false

[functional]
display-summary = ["TitleDocMain", "PublicationYear"]

[[division]]
id = "Monograph"
label = "Monograph"
labels = { de = "Monographie" }
allowed-children = ["Chapter"]
fields = [
    "TitleDocMain",
    "PlaceOfPublication",
    "PublicationYear",
    "DocLanguage",
    "Digitized",
    "PublicationType",
    "Person",
    "LABEL",
    "ORDERLABEL",
    "CatalogIDDigital",
]

[[division]]
id = "Periodical"
label = "Periodical"
allowed-children = ["Volume"]
fields = ["TitleDocMain"]

[[division]]
id = "Volume"
label = "Volume"
allowed-children = ["Chapter"]
fields = ["TitleDocMain", "CurrentNo"]

[[division]]
id = "Chapter"
label = "Chapter"
fields = ["TitleDocMain", "LABEL"]

[[key]]
id = "TitleDocMain"
label = "Main title"
labels = { de = "Haupttitel" }
min-occurs = 1
max-occurs = 1

[[key]]
id = "PlaceOfPublication"
label = "Place of publication"

[[key]]
id = "PublicationYear"
label = "Year of publication"
input = "integer"
max-occurs = 1

[[key]]
id = "CurrentNo"
label = "Number"
input = "integer"
max-occurs = 1

[[key]]
id = "DocLanguage"
label = "Language"
input = "multiple-selection"
options = [
    { value = "ger", label = "German" },
    { value = "lat", label = "Latin" },
    { value = "eng", label = "English" },
]

[[key]]
id = "Digitized"
input = "boolean"
max-occurs = 1
domain = "digital-provenance"

[[key]]
id = "PublicationType"
label = "Type of publication"
input = "one-line-single-selection"
max-occurs = 1
leading = true
options = [{ value = "print" }, { value = "manuscript" }]

[[key]]
id = "Person"
label = "Person"
keys = ["Role", "RoleDetail", "LastName", "FirstName"]

[[key]]
id = "Role"
input = "one-line-single-selection"
max-occurs = 1
leading = true
options = [
    { value = "aut", label = "Author" },
    { value = "edt", label = "Editor" },
    { value = "scr", label = "Scribe", requires = { PublicationType = "manuscript" } },
]

[[key]]
id = "RoleDetail"
input = "one-line-single-selection"
max-occurs = 1
options = [
    { value = "primary", requires = { Role = "aut" } },
    { value = "guest", requires = { Role = "edt" } },
]

[[key]]
id = "LastName"
label = "Last name"
min-occurs = 1
max-occurs = 1

[[key]]
id = "FirstName"
label = "First name"
max-occurs = 1

[[key]]
id = "CatalogIDDigital"
label = "Record identifier"
max-occurs = 1
editable = false

[[key]]
id = "LABEL"
label = "Label"
domain = "structure-attribute"
max-occurs = 1

[[key]]
id = "ORDERLABEL"
label = "Order label"
domain = "structure-attribute"
max-occurs = 1
"#;

pub fn ruleset() -> DeclaredRuleset {
    DeclaredRuleset::from_toml_str(RULESET).expect("fixture ruleset loads")
}

pub fn priority() -> Vec<String> {
    vec!["en".to_string()]
}

pub fn view(division_type: &str) -> Arc<dyn StructuralElementView> {
    ruleset().structural_element_view(division_type, "create", &priority())
}

pub fn monograph(metadata: Vec<Metadata>) -> Division {
    let mut division = Division::new("Monograph");
    division.metadata = metadata;
    division
}

/// Build the table of a division against the fixture ruleset
pub fn build(division: Division) -> FieldedMetadataNode {
    let division_type = division.division_type.clone().unwrap_or_default();
    FieldedMetadataNode::root(division, view(&division_type)).expect("table builds")
}

/// `(key, value)` of every row; groups show an empty value
pub fn summary(node: &FieldedMetadataNode) -> Vec<(String, String)> {
    node.rows()
        .iter()
        .map(|row| (row.metadata_id().to_string(), row.display_value()))
        .collect()
}

/// Index of the first row with the given key
pub fn row_index(node: &FieldedMetadataNode, key: &str) -> usize {
    node.rows()
        .iter()
        .position(|row| row.metadata_id() == key)
        .unwrap_or_else(|| panic!("no row {} in {:?}", key, summary(node)))
}

pub fn set_text(node: &mut FieldedMetadataNode, index: usize, value: &str) {
    match &mut node.rows_mut()[index] {
        Row::Text(row) => row.set_value(value),
        other => panic!("row {} is not a text row: {:?}", index, other.metadata_id()),
    }
}

pub fn set_selected(node: &mut FieldedMetadataNode, index: usize, values: &[&str]) {
    match &mut node.rows_mut()[index] {
        Row::Select(row) => row.set_selected(values.iter().map(|v| v.to_string()).collect()),
        other => panic!("row {} is not a select row: {:?}", index, other.metadata_id()),
    }
}

pub fn group_mut(node: &mut FieldedMetadataNode, index: usize) -> &mut FieldedMetadataNode {
    node.rows_mut()[index]
        .as_group_mut()
        .unwrap_or_else(|| panic!("row {} is not a group", index))
}

pub fn person(role: &str, last_name: &str) -> Metadata {
    Metadata::group(
        "Person",
        vec![
            Metadata::entry("Role", role),
            Metadata::entry("LastName", last_name),
        ],
    )
}
