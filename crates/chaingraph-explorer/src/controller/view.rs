//! Read-only projections of the controller for a UI layer.

use std::sync::Arc;

use crate::catalog::{Catalog, Example};
use crate::render::{Language, RenderedLine, SyntaxHighlighter};

use super::state::{DisplayPayload, SelectionState};

/// What the explorer shows for the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorerView {
    /// Index of the selected example.
    pub index: usize,
    /// The selected example.
    pub example: Arc<Example>,
    /// Result pane contents.
    pub display_payload: DisplayPayload,
    /// A query for this selection is outstanding.
    pub is_loading: bool,
    /// The selection is an un-mocked subscription that has not been armed.
    pub is_armable: bool,
    /// Previous navigation is possible.
    pub has_previous: bool,
    /// Next navigation is possible.
    pub has_next: bool,
}

impl ExplorerView {
    pub(crate) fn project(state: &SelectionState, catalog: &Catalog) -> Self {
        let index = state.selected_index();
        Self {
            index,
            example: catalog.shared(index),
            display_payload: state.live_result().clone(),
            is_loading: state.is_loading(),
            is_armable: state.is_armable(catalog),
            has_previous: index > 0,
            has_next: index + 1 < catalog.len(),
        }
    }

    /// Highlight the example source and the payload.
    pub fn render(&self, highlighter: &dyn SyntaxHighlighter) -> RenderedView {
        RenderedView {
            source: highlighter.highlight(&self.example.source, Language::GraphQL),
            payload: self
                .display_payload
                .text()
                .map(|text| highlighter.highlight(text, Language::Json)),
        }
    }
}

/// An [`ExplorerView`] run through a highlighter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    /// The GraphQL source.
    pub source: Vec<RenderedLine>,
    /// The JSON payload, when there is one.
    pub payload: Option<Vec<RenderedLine>>,
}
