//! Tests for catalog loading and the built-in Chaingraph catalog.

use std::io::Write;

use chaingraph_explorer::{Catalog, CatalogError, Example, OperationKind};
use tempfile::NamedTempFile;

const CHAINGRAPH_TOML: &str = include_str!("../src/catalog/chaingraph.toml");

#[test]
fn test_chaingraph_catalog_shape() {
    let catalog = Catalog::chaingraph().expect("built-in catalog is valid");

    assert_eq!(catalog.len(), 16);
    assert_eq!(
        catalog
            .iter()
            .filter(|example| example.kind == OperationKind::Subscription)
            .count(),
        3
    );
    assert_eq!(catalog.iter().filter(|example| example.is_mocked()).count(), 4);

    assert_eq!(catalog.names()[0], "Monitor Mempools");
    assert_eq!(catalog.position("Get Raw Blocks"), Some(7));
    assert_eq!(
        catalog.position("Aggregate Transaction Stats Between Two Dates"),
        Some(15)
    );
}

#[test]
fn test_chaingraph_subscriptions_lead_the_catalog() {
    let catalog = Catalog::chaingraph().expect("built-in catalog is valid");

    for index in 0..3 {
        let example = catalog.get(index).expect("valid index");
        assert_eq!(example.kind, OperationKind::Subscription);
        assert!(example.source.starts_with("subscription"));
        assert!(!example.is_mocked());
    }
}

#[test]
fn test_chaingraph_entries_are_complete() {
    let catalog = Catalog::chaingraph().expect("built-in catalog is valid");

    for example in catalog.iter() {
        assert!(!example.name.is_empty());
        assert!(!example.description.is_empty(), "{} lacks a description", example.name);
        assert!(!example.source.trim().is_empty());
        assert_eq!(example.source.trim_end(), example.source);
    }
}

#[test]
fn test_chaingraph_mocks_are_json() {
    let catalog = Catalog::chaingraph().expect("built-in catalog is valid");

    for example in catalog.iter().filter(|example| example.is_mocked()) {
        let mock = example.mock.as_deref().unwrap_or_default();
        serde_json::from_str::<serde_json::Value>(mock)
            .unwrap_or_else(|e| panic!("mock of {} is not JSON: {e}", example.name));
    }

    let count = catalog
        .get(catalog.position("Count CashAccounts").expect("present"))
        .expect("valid index");
    let value: serde_json::Value =
        serde_json::from_str(count.mock.as_deref().expect("mocked")).expect("valid json");
    assert!(value.to_string().contains("25923"));
}

#[test]
fn test_from_file_matches_builtin() {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(CHAINGRAPH_TOML.as_bytes()).expect("write catalog");

    let loaded = Catalog::from_file(file.path()).expect("catalog loads");
    assert_eq!(loaded, Catalog::chaingraph().expect("built-in catalog is valid"));
}

#[test]
fn test_from_file_missing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = Catalog::from_file(dir.path().join("missing.toml"));
    assert!(matches!(result, Err(CatalogError::Parse(_))));
}

#[test]
fn test_explicit_kind_wins() {
    let catalog = Catalog::from_toml_str(
        r#"
        [[example]]
        name = "Forced"
        kind = "subscription"
        source = "{ block { hash } }"
        "#,
    )
    .expect("valid catalog");

    assert_eq!(catalog.get(0).expect("valid index").kind, OperationKind::Subscription);
}

#[test]
fn test_invalid_documents_are_rejected() {
    assert!(matches!(Catalog::from_toml_str(""), Err(CatalogError::Empty)));
    assert!(matches!(
        Catalog::from_toml_str("[[example]]\nname = 3"),
        Err(CatalogError::Parse(_))
    ));
    assert!(matches!(
        Catalog::from_toml_str(
            "[[example]]\nname = \"Bad\"\nsource = \"{ a }\"\nmock = \"{ nope\"\n"
        ),
        Err(CatalogError::InvalidMock { .. })
    ));
    assert!(matches!(
        Catalog::new([Example::query("Same", "{ a }"), Example::query("Same", "{ b }")]),
        Err(CatalogError::DuplicateName(name)) if name == "Same"
    ));
}
