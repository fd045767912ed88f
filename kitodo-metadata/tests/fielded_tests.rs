//! Fielded metadata tree: building, editing and preserving against the
//! fixture ruleset

mod helpers;

use helpers::*;
use kitodo_metadata::ruleset::declared::DeclaredRuleset;
use kitodo_metadata::ruleset::Ruleset;
use kitodo_metadata::{
    Division, FieldedMetadataNode, MdSec, Metadata, MetadataEntry, MetadataError, Row,
};

fn entry_in(key: &str, value: &str, domain: MdSec) -> Metadata {
    Metadata::Entry(MetadataEntry {
        key: key.to_string(),
        domain,
        value: value.to_string(),
    })
}

fn full_record() -> Vec<Metadata> {
    vec![
        Metadata::entry("TitleDocMain", "Faust"),
        entry_in("PlaceOfPublication", "Leipzig", MdSec::SourceMd),
        Metadata::entry("PublicationYear", "1808"),
        Metadata::entry("DocLanguage", "ger"),
        Metadata::entry("DocLanguage", "lat"),
        entry_in("Digitized", "true", MdSec::DigiprovMd),
        Metadata::entry("PublicationType", "print"),
        person("aut", "Goethe"),
        person("edt", "Riemer"),
        Metadata::entry("Shelfmark", "A 12"),
        Metadata::group("Provenance", vec![Metadata::entry("Owner", "Weimar")]),
    ]
}

#[test]
fn test_title_and_two_places_are_reproduced() {
    let metadata = vec![
        Metadata::entry("TitleDocMain", "Faust"),
        Metadata::entry("PlaceOfPublication", "Leipzig"),
        Metadata::entry("PlaceOfPublication", "Weimar"),
    ];
    let mut node = build(monograph(metadata.clone()));

    assert_eq!(
        summary(&node),
        vec![
            ("TitleDocMain".to_string(), "Faust".to_string()),
            ("PlaceOfPublication".to_string(), "Leipzig".to_string()),
            ("PlaceOfPublication".to_string(), "Weimar".to_string()),
        ]
    );
    assert!(node.hidden_metadata().is_empty());

    node.preserve().unwrap();
    assert_eq!(node.division().unwrap().metadata, metadata);
}

#[test]
fn test_round_trip_keeps_every_entity() {
    let metadata = full_record();
    let mut node = build(monograph(metadata.clone()));
    let rows_before = summary(&node);

    node.preserve().unwrap();
    let division = node.into_division().unwrap();
    assert_eq!(division.metadata, metadata);

    let rebuilt = build(division);
    assert_eq!(summary(&rebuilt), rows_before);
}

#[test]
fn test_selection_values_share_one_row() {
    let node = build(monograph(full_record()));
    let index = row_index(&node, "DocLanguage");
    assert_eq!(node.rows()[index].display_value(), "ger lat");
    assert_eq!(
        node.rows()
            .iter()
            .filter(|row| row.metadata_id() == "DocLanguage")
            .count(),
        1
    );
}

#[test]
fn test_hidden_metadata_survives_edits() {
    let mut node = build(monograph(full_record()));
    assert_eq!(
        node.hidden_metadata(),
        &[
            Metadata::entry("Shelfmark", "A 12"),
            Metadata::group("Provenance", vec![Metadata::entry("Owner", "Weimar")]),
        ]
    );

    let title = row_index(&node, "TitleDocMain");
    set_text(&mut node, title, "Faust II");
    node.preserve().unwrap();

    let metadata = &node.division().unwrap().metadata;
    assert_eq!(metadata[0], Metadata::entry("TitleDocMain", "Faust II"));
    assert!(metadata.contains(&Metadata::entry("Shelfmark", "A 12")));
    assert!(metadata.iter().any(|m| m.key() == "Provenance"));
}

#[test]
fn test_copy_beyond_max_occurs_is_refused() {
    let mut node = build(monograph(full_record()));
    let title = row_index(&node, "TitleDocMain");
    match node.copy(title) {
        Err(MetadataError::Cardinality { key, max_occurs }) => {
            assert_eq!(key, "TitleDocMain");
            assert_eq!(max_occurs, 1);
        }
        other => panic!("expected cardinality error, got {:?}", other),
    }
    let year = row_index(&node, "PublicationYear");
    assert!(node.copy(year).is_err());
}

#[test]
fn test_copied_group_is_attached_once() {
    let metadata = vec![Metadata::entry("TitleDocMain", "Faust"), person("aut", "Goethe")];
    let mut node = build(monograph(metadata));
    let index = row_index(&node, "Person");

    node.copy(index).unwrap();
    let copy = node.rows()[index + 1].as_group().unwrap();
    assert!(copy.is_pending_attach());
    assert_eq!(copy.group_metadata(), None);
    assert_eq!(summary(copy), summary(node.rows()[index].as_group().unwrap()));

    node.preserve().unwrap();
    let copy = node.rows()[index + 1].as_group().unwrap();
    assert!(!copy.is_pending_attach());
    assert_eq!(
        copy.group_metadata().unwrap(),
        &[Metadata::entry("Role", "aut"), Metadata::entry("LastName", "Goethe")]
    );
    assert_eq!(
        node.division().unwrap().metadata,
        vec![
            Metadata::entry("TitleDocMain", "Faust"),
            person("aut", "Goethe"),
            person("aut", "Goethe"),
        ]
    );

    node.preserve().unwrap();
    assert_eq!(node.division().unwrap().metadata.len(), 3);
}

#[test]
fn test_copied_leaf_adds_one_entry() {
    let metadata = vec![
        Metadata::entry("TitleDocMain", "Faust"),
        Metadata::entry("PlaceOfPublication", "Leipzig"),
    ];
    let mut node = build(monograph(metadata));
    let place = row_index(&node, "PlaceOfPublication");

    node.copy(place).unwrap();
    set_text(&mut node, place + 1, "Weimar");
    node.preserve().unwrap();

    assert_eq!(
        node.division().unwrap().metadata,
        vec![
            Metadata::entry("TitleDocMain", "Faust"),
            Metadata::entry("PlaceOfPublication", "Leipzig"),
            Metadata::entry("PlaceOfPublication", "Weimar"),
        ]
    );
}

#[test]
fn test_removed_row_disappears_on_preserve() {
    let metadata = vec![
        Metadata::entry("TitleDocMain", "Faust"),
        Metadata::entry("PlaceOfPublication", "Leipzig"),
    ];
    let mut node = build(monograph(metadata.clone()));
    let place = row_index(&node, "PlaceOfPublication");

    let removed = node.remove(place).unwrap();
    assert_eq!(removed.metadata_id(), "PlaceOfPublication");
    assert_eq!(node.division().unwrap().metadata, metadata);

    node.preserve().unwrap();
    assert_eq!(
        node.division().unwrap().metadata,
        vec![Metadata::entry("TitleDocMain", "Faust")]
    );
}

#[test]
fn test_required_fields_of_empty_optional_group() {
    let mut node = build(monograph(vec![Metadata::entry("TitleDocMain", "Faust")]));
    assert!(node.is_row_required(0).unwrap());

    node.add_additionally_selected_field("Person", &[]).unwrap();
    let index = row_index(&node, "Person");
    let person = group_mut(&mut node, index);
    let last_name = row_index(person, "LastName");
    assert!(!person.is_row_required(last_name).unwrap());

    set_text(person, last_name, "Goethe");
    assert!(person.is_row_required(last_name).unwrap());

    node.preserve().unwrap();
    assert_eq!(
        node.division().unwrap().metadata[1],
        Metadata::group("Person", vec![Metadata::entry("LastName", "Goethe")])
    );
}

#[test]
fn test_invalid_value_leaves_division_untouched() {
    let metadata = full_record();
    let mut node = build(monograph(metadata.clone()));
    let year = row_index(&node, "PublicationYear");
    set_text(&mut node, year, "18o8");
    assert!(!node.is_valid(&[]));

    match node.preserve() {
        Err(MetadataError::InvalidValue(invalid)) => {
            assert_eq!(invalid.label, "Year of publication");
            assert_eq!(invalid.value, "18o8");
            assert!(invalid.parents.is_empty());
        }
        other => panic!("expected invalid value, got {:?}", other),
    }
    assert_eq!(node.division().unwrap().metadata, metadata);
}

#[test]
fn test_invalid_value_in_group_names_the_group() {
    let metadata = vec![
        Metadata::entry("TitleDocMain", "Faust"),
        Metadata::group(
            "Person",
            vec![
                Metadata::entry("Role", "aut"),
                Metadata::entry("RoleDetail", "guest"),
                Metadata::entry("LastName", "Goethe"),
            ],
        ),
    ];
    let mut node = build(monograph(metadata.clone()));

    match node.preserve() {
        Err(MetadataError::InvalidValue(invalid)) => {
            assert_eq!(invalid.label, "RoleDetail");
            assert_eq!(invalid.parents, vec!["Person"]);
        }
        other => panic!("expected invalid value, got {:?}", other),
    }
    assert_eq!(node.division().unwrap().metadata, metadata);
}

#[test]
fn test_options_follow_leading_fields() {
    let metadata = vec![
        Metadata::entry("TitleDocMain", "Faust"),
        Metadata::entry("PublicationType", "print"),
        Metadata::group(
            "Person",
            vec![
                Metadata::entry("Role", "aut"),
                Metadata::entry("RoleDetail", "primary"),
                Metadata::entry("LastName", "Goethe"),
            ],
        ),
    ];
    let mut node = build(monograph(metadata));
    assert!(node.is_valid(&[]));

    let item_values = |node: &FieldedMetadataNode, key: &str| -> Vec<String> {
        let index = row_index(node, "Person");
        let person = node.rows()[index].as_group().unwrap();
        let levels = person.leading_levels(&[node.leading_fields()]);
        match &person.rows()[row_index(person, key)] {
            Row::Select(row) => row.items(&levels).into_iter().map(|item| item.value).collect(),
            _ => panic!("{} is not a selection", key),
        }
    };
    assert_eq!(item_values(&node, "Role"), vec!["aut", "edt"]);
    assert_eq!(item_values(&node, "RoleDetail"), vec!["primary"]);

    let person_index = row_index(&node, "Person");
    let outer = node.leading_levels(&[]);
    let person = group_mut(&mut node, person_index);
    let role = row_index(person, "Role");
    person
        .edit_row(role, &outer, |row| {
            if let Row::Select(select) = row {
                select.set_selected(vec!["edt".to_string()]);
            }
        })
        .unwrap();
    assert_eq!(item_values(&node, "RoleDetail"), vec!["guest"]);
    assert!(!node.is_valid(&[]));

    let person = group_mut(&mut node, person_index);
    let detail = row_index(person, "RoleDetail");
    set_selected(person, detail, &["guest"]);
    assert!(node.is_valid(&[]));

    let publication_type = row_index(&node, "PublicationType");
    node.edit_row(publication_type, &[], |row| {
        if let Row::Select(select) = row {
            select.set_selected(vec!["manuscript".to_string()]);
        }
    })
    .unwrap();
    assert_eq!(item_values(&node, "Role"), vec!["aut", "edt", "scr"]);
    assert_eq!(
        node.division().unwrap().metadata_value("PublicationType"),
        Some("manuscript")
    );
}

#[test]
fn test_group_operations_see_enclosing_leading_fields() {
    let metadata = vec![
        Metadata::entry("TitleDocMain", "Faust"),
        Metadata::entry("PublicationType", "manuscript"),
        person("scr", "Goethe"),
    ];
    let mut node = build(monograph(metadata));
    assert!(node.is_valid(&[]));

    let index = row_index(&node, "Person");
    let outer = node.leading_levels(&[]);
    let person = group_mut(&mut node, index);
    assert!(person.is_valid(&outer));
    assert!(!person.is_valid(&[]));

    person.add_additionally_selected_field("FirstName", &outer).unwrap();
    let first_name = row_index(person, "FirstName");
    set_text(person, first_name, "Johann Wolfgang");

    let role = row_index(person, "Role");
    person
        .edit_row(role, &outer, |row| {
            if let Row::Select(select) = row {
                select.set_selected(vec!["scr".to_string()]);
            }
        })
        .unwrap();
    assert_eq!(
        person.group_metadata().unwrap(),
        &[
            Metadata::entry("Role", "scr"),
            Metadata::entry("LastName", "Goethe"),
            Metadata::entry("FirstName", "Johann Wolfgang"),
        ]
    );

    node.preserve().unwrap();
    assert_eq!(
        node.division().unwrap().metadata[2],
        Metadata::group(
            "Person",
            vec![
                Metadata::entry("Role", "scr"),
                Metadata::entry("LastName", "Goethe"),
                Metadata::entry("FirstName", "Johann Wolfgang"),
            ]
        )
    );
}

#[test]
fn test_plain_entry_for_group_key_falls_back_to_undefined() {
    let metadata = vec![
        Metadata::entry("TitleDocMain", "Faust"),
        Metadata::entry("Person", "Goethe"),
    ];
    let (mut node, logs) = capture_logs(|| build(monograph(metadata.clone())));
    logs.assert_warned("declared as group");

    let index = row_index(&node, "Person");
    let fallback = node.rows()[index].as_group().unwrap();
    assert!(fallback.is_undefined());
    assert_eq!(fallback.rows().len(), 1);
    assert!(fallback.rows()[0].is_undefined());
    assert_eq!(fallback.rows()[0].display_value(), "Goethe");

    node.preserve().unwrap();
    assert_eq!(node.division().unwrap().metadata, metadata);

    let fallback = group_mut(&mut node, index);
    set_text(fallback, 0, "Schiller");
    node.preserve().unwrap();
    assert_eq!(
        node.division().unwrap().metadata[1],
        Metadata::entry("Person", "Schiller")
    );
}

#[test]
fn test_label_fields_write_to_division() {
    let mut division = monograph(vec![Metadata::entry("TitleDocMain", "Faust")]);
    division.label = Some("Vol. 1".to_string());
    division.orderlabel = Some("1".to_string());
    let mut node = build(division);

    let label = row_index(&node, "LABEL");
    let orderlabel = row_index(&node, "ORDERLABEL");
    assert_eq!(node.rows()[label].display_value(), "Vol. 1");
    assert_eq!(node.rows()[orderlabel].display_value(), "1");

    set_text(&mut node, label, "Volume 1");
    set_text(&mut node, orderlabel, " ");
    node.preserve().unwrap();

    let division = node.division().unwrap();
    assert_eq!(division.label.as_deref(), Some("Volume 1"));
    assert_eq!(division.orderlabel, None);
    assert_eq!(
        division.metadata,
        vec![Metadata::entry("TitleDocMain", "Faust")]
    );
}

#[test]
fn test_adding_field_with_invalid_input_changes_nothing() {
    let mut node = build(monograph(vec![
        Metadata::entry("TitleDocMain", "Faust"),
        Metadata::entry("PublicationYear", "1808"),
    ]));
    let year = row_index(&node, "PublicationYear");
    set_text(&mut node, year, "soon");

    let result = node.add_additionally_selected_field("DocLanguage", &[]);
    assert!(matches!(result, Err(MetadataError::InvalidValue(_))));
    assert!(node.additionally_selected().is_empty());
    assert!(node.rows().iter().all(|row| row.metadata_id() != "DocLanguage"));
    assert_eq!(node.rows()[year].display_value(), "soon");
}

#[test]
fn test_added_field_gets_empty_row() {
    let mut node = build(monograph(vec![Metadata::entry("TitleDocMain", "Faust")]));
    let addable: Vec<String> = node
        .addable_fields()
        .iter()
        .map(|view| view.id().to_string())
        .collect();
    assert!(!addable.contains(&"TitleDocMain".to_string()));
    assert!(addable.contains(&"DocLanguage".to_string()));

    node.add_additionally_selected_field("DocLanguage", &[]).unwrap();
    node.add_additionally_selected_field("DocLanguage", &[]).unwrap();
    assert_eq!(node.additionally_selected(), &["DocLanguage".to_string()]);
    let index = row_index(&node, "DocLanguage");
    set_selected(&mut node, index, &["eng"]);
    node.preserve().unwrap();
    assert_eq!(
        node.division().unwrap().metadata_value("DocLanguage"),
        Some("eng")
    );
}

#[test]
fn test_unknown_entries_shown_as_undefined_rows() {
    let ruleset = DeclaredRuleset::from_toml_str(
        r#"
        show-undefined = true

        [[division]]
        id = "Monograph"
        fields = ["TitleDocMain"]

        [[key]]
        id = "TitleDocMain"
        "#,
    )
    .unwrap();
    let metadata = vec![
        Metadata::entry("TitleDocMain", "Faust"),
        Metadata::entry("Shelfmark", "A 12"),
        Metadata::group("Provenance", vec![Metadata::entry("Owner", "Weimar")]),
    ];
    let view = ruleset.structural_element_view("Monograph", "", &[]);
    let mut node = FieldedMetadataNode::root(monograph(metadata.clone()), view).unwrap();

    assert_eq!(node.rows().len(), 3);
    assert!(node.hidden_metadata().is_empty());
    assert!(node.rows()[1].is_undefined());
    assert!(node.rows()[2].is_undefined());

    node.preserve().unwrap();
    assert_eq!(node.division().unwrap().metadata, metadata);
}

#[test]
fn test_group_stored_for_simple_key_is_illegal_state() {
    let division = monograph(vec![Metadata::group(
        "TitleDocMain",
        vec![Metadata::entry("Part", "1")],
    )]);
    let result = FieldedMetadataNode::root(division, view("Monograph"));
    assert!(matches!(result, Err(MetadataError::IllegalState(_))));
}

#[test]
fn test_undeclared_division_type_hides_everything() {
    let mut division = Division::new("Newspaper");
    division.metadata = vec![Metadata::entry("TitleDocMain", "Gazette")];
    let mut node = build(division);

    assert!(node.is_undefined());
    assert!(node.rows().is_empty());
    node.preserve().unwrap();
    assert_eq!(
        node.division().unwrap().metadata,
        vec![Metadata::entry("TitleDocMain", "Gazette")]
    );
}

#[test]
fn test_read_only_field_is_kept_on_preserve() {
    let metadata = vec![
        Metadata::entry("TitleDocMain", "Faust"),
        Metadata::entry("CatalogIDDigital", "PPN123"),
    ];
    let mut node = build(monograph(metadata.clone()));

    let record = row_index(&node, "CatalogIDDigital");
    assert!(!node.rows()[record].is_editable());
    assert!(node.rows()[0].is_editable());

    node.preserve().unwrap();
    assert_eq!(node.division().unwrap().metadata, metadata);
}
