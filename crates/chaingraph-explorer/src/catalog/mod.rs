//! The example catalog.
//!
//! A [`Catalog`] is the ordered, read-only list of [`Example`]s the explorer
//! navigates. Order defines previous/next navigation and the index space of
//! direct selection.
//!
//! Catalogs are built from code with [`Catalog::new`] or loaded from TOML:
//!
//! ```toml
//! [[example]]
//! name = "Get Raw Blocks"
//! description = "<p>Get all known genesis blocks.</p>"
//! source = '''
//! query GenesisBlockInfo {
//!   block(where: { height: { _eq: "0" } }) { hash encoded_hex }
//! }
//! '''
//! ```
//!
//! `kind` may be given explicitly (`"query"` or `"subscription"`); when it is
//! omitted it is inferred from the leading keyword of `source`.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use chaingraph_explorer_core::logging::targets;
use chaingraph_explorer_net::graphql::OperationType;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, ExplorerError};

const CHAINGRAPH_CATALOG: &str = include_str!("chaingraph.toml");

/// How an example is executed when it is not mocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// One-shot request/response.
    Query,
    /// Long-lived stream of results.
    Subscription,
}

impl From<OperationType> for OperationKind {
    fn from(operation: OperationType) -> Self {
        match operation {
            OperationType::Query => Self::Query,
            OperationType::Subscription => Self::Subscription,
        }
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
    /// Short label, unique within its catalog.
    pub name: String,
    /// Explanation shown next to the example. Opaque rich text (HTML).
    #[serde(default)]
    pub description: String,
    /// Execution strategy when no mock is present.
    pub kind: OperationKind,
    /// GraphQL operation text.
    pub source: String,
    /// Pre-captured JSON result. When present it is shown instead of
    /// executing the operation, whatever the `kind`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock: Option<String>,
}

impl Example {
    /// Create an example, inferring its kind from `source`.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let kind = OperationType::infer(&source).into();
        Self {
            name: name.into(),
            description: String::new(),
            kind,
            source,
            mock: None,
        }
    }

    /// Create a query example.
    pub fn query(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Query,
            ..Self::new(name, source)
        }
    }

    /// Create a subscription example.
    pub fn subscription(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Subscription,
            ..Self::new(name, source)
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach a canned JSON result.
    pub fn with_mock(mut self, mock: impl Into<String>) -> Self {
        self.mock = Some(mock.into());
        self
    }

    /// Whether a canned result replaces live execution.
    pub fn is_mocked(&self) -> bool {
        self.mock.is_some()
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.source.trim().is_empty() {
            return Err(CatalogError::EmptySource(self.name.clone()));
        }
        if let Some(mock) = &self.mock
            && let Err(err) = serde_json::from_str::<serde_json::Value>(mock)
        {
            return Err(CatalogError::invalid_mock(&self.name, err.to_string()));
        }
        Ok(())
    }
}

/// A catalog entry as written in TOML, before kind inference.
#[derive(Deserialize)]
struct ExampleEntry {
    name: String,
    #[serde(default)]
    description: String,
    kind: Option<OperationKind>,
    source: String,
    mock: Option<String>,
}

impl From<ExampleEntry> for Example {
    fn from(entry: ExampleEntry) -> Self {
        let source = entry.source.trim_end().to_string();
        let kind = entry
            .kind
            .unwrap_or_else(|| OperationType::infer(&source).into());
        Self {
            name: entry.name,
            description: entry.description.trim().to_string(),
            kind,
            source,
            mock: entry.mock.map(|mock| mock.trim_end().to_string()),
        }
    }
}

#[derive(Deserialize)]
struct CatalogDocument {
    #[serde(default, rename = "example")]
    examples: Vec<ExampleEntry>,
}

/// An ordered, non-empty, read-only list of examples.
///
/// Cloning is cheap; clones share the examples.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    examples: Arc<[Arc<Example>]>,
}

impl Catalog {
    /// Build a catalog, validating every entry.
    ///
    /// Fails if the list is empty, names repeat, a source is blank, or a
    /// mock is not valid JSON.
    pub fn new(examples: impl IntoIterator<Item = Example>) -> Result<Self, CatalogError> {
        let examples: Vec<Example> = examples.into_iter().collect();
        if examples.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut names = HashSet::with_capacity(examples.len());
        for example in &examples {
            if !names.insert(example.name.as_str()) {
                return Err(CatalogError::DuplicateName(example.name.clone()));
            }
            example.validate()?;
        }

        tracing::debug!(target: targets::CATALOG, len = examples.len(), "catalog built");
        Ok(Self {
            examples: examples.into_iter().map(Arc::new).collect(),
        })
    }

    /// Parse a catalog from a TOML document of `[[example]]` tables.
    pub fn from_toml_str(document: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument =
            toml::from_str(document).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(document.examples.into_iter().map(Example::from))
    }

    /// Load a catalog from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&document)
    }

    /// The examples of the public Chaingraph demo.
    pub fn chaingraph() -> Result<Self, CatalogError> {
        Self::from_toml_str(CHAINGRAPH_CATALOG)
    }

    /// Get the example at `index`.
    pub fn get(&self, index: usize) -> Result<&Example, ExplorerError> {
        self.examples
            .get(index)
            .map(Arc::as_ref)
            .ok_or_else(|| ExplorerError::out_of_range(index, self.len()))
    }

    /// Shared handle to the example at `index`, clamped to the last one.
    pub(crate) fn shared(&self, index: usize) -> Arc<Example> {
        let last = self.examples.len().saturating_sub(1);
        Arc::clone(&self.examples[index.min(last)])
    }

    /// Number of examples. Always at least one.
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    /// Iterate examples in navigation order.
    pub fn iter(&self) -> impl Iterator<Item = &Example> {
        self.examples.iter().map(Arc::as_ref)
    }

    /// Example names in navigation order, for a selection list.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|example| example.name.as_str()).collect()
    }

    /// Index of the example called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.iter().position(|example| example.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_catalog_rejected() {
        assert_eq!(Catalog::new(Vec::new()), Err(CatalogError::Empty));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Catalog::new([
            Example::query("A", "{ ping }"),
            Example::query("A", "{ pong }"),
        ]);
        assert_eq!(result, Err(CatalogError::DuplicateName("A".into())));
    }

    #[test]
    fn test_blank_source_rejected() {
        let result = Catalog::new([Example::query("A", "  \n ")]);
        assert_eq!(result, Err(CatalogError::EmptySource("A".into())));
    }

    #[test]
    fn test_malformed_mock_rejected() {
        let result = Catalog::new([Example::query("A", "{ ping }").with_mock("{ \"data\": ")]);
        assert!(matches!(result, Err(CatalogError::InvalidMock { ref name, .. }) if name == "A"));
    }

    #[test]
    fn test_get_out_of_range() {
        let catalog = Catalog::new([Example::query("A", "{ ping }")]).unwrap();
        assert_eq!(catalog.get(0).unwrap().name, "A");
        assert_eq!(catalog.get(1), Err(ExplorerError::out_of_range(1, 1)));
    }

    #[test]
    fn test_kind_inference() {
        assert_eq!(Example::new("A", "{ ping }").kind, OperationKind::Query);
        assert_eq!(
            Example::new("B", "subscription { tick }").kind,
            OperationKind::Subscription
        );
    }

    #[test]
    fn test_toml_kind_defaults_to_inferred() {
        let catalog = Catalog::from_toml_str(
            r#"
            [[example]]
            name = "Tick"
            source = "subscription { tick }"

            [[example]]
            name = "Forced"
            kind = "query"
            source = "subscription { tick }"
            "#,
        )
        .unwrap();

        assert_eq!(catalog.get(0).unwrap().kind, OperationKind::Subscription);
        assert_eq!(catalog.get(1).unwrap().kind, OperationKind::Query);
        assert_eq!(catalog.get(0).unwrap().description, "");
    }

    #[test]
    fn test_toml_errors() {
        assert_eq!(Catalog::from_toml_str(""), Err(CatalogError::Empty));
        assert!(matches!(
            Catalog::from_toml_str("[[example]]\nname = 3"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_names_and_position() {
        let catalog = Catalog::new([
            Example::query("A", "{ ping }"),
            Example::subscription("B", "subscription { tick }"),
        ])
        .unwrap();

        assert_eq!(catalog.names(), vec!["A", "B"]);
        assert_eq!(catalog.position("B"), Some(1));
        assert_eq!(catalog.position("C"), None);
        assert!(!catalog.is_empty());
    }
}
