//! Example explorer for the Chaingraph GraphQL API.
//!
//! The explorer lets a user browse a curated [`Catalog`] of GraphQL queries
//! and subscriptions, run the selected one against a live or mocked backend,
//! and display the (possibly streaming) result.
//!
//! - **Catalog**: ordered, validated examples; the Chaingraph demo set ships
//!   built in via [`Catalog::chaingraph`].
//! - **Controller**: [`ExplorerController`] decides between mock, query and
//!   subscription, tracks selection epochs so stale results are dropped, and
//!   keeps at most one subscription open.
//! - **Rendering**: [`render::DefaultHighlighter`] tokenizes GraphQL and JSON
//!   into styled lines.
//! - **Configuration**: [`ExplorerConfig`] builds a
//!   [`GraphQLClient`](chaingraph_explorer_net::graphql::GraphQLClient) for
//!   the configured endpoint.
//!
//! # Example
//!
//! ```ignore
//! use chaingraph_explorer::{Catalog, ExplorerConfig, ExplorerController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ExplorerConfig::default().build_client()?;
//!     let mut explorer = ExplorerController::new(Catalog::chaingraph()?, client);
//!
//!     explorer.select_index(3)?;
//!     explorer.next_event().await;
//!     for line in explorer.rendered_view().payload.unwrap_or_default() {
//!         println!("{}", line.text());
//!     }
//!     Ok(())
//! }
//! ```

pub mod catalog;
mod config;
pub mod controller;
mod error;
pub mod render;

pub use catalog::{Catalog, Example, OperationKind};
pub use config::{DEFAULT_HOST, DEFAULT_PATH, EndpointConfig, ExplorerConfig, TimeoutConfig};
pub use controller::{DisplayPayload, ExplorerController, ExplorerView, RenderedView};
pub use error::{CatalogError, ConfigError, ExplorerError, Result};

pub use chaingraph_explorer_net::{
    SubscriptionChannel, SubscriptionEvent, SubscriptionHandle, Transport, TransportError,
};

static_assertions::assert_impl_all!(Catalog: Send, Sync);
static_assertions::assert_impl_all!(ExplorerView: Send, Sync);
static_assertions::assert_impl_all!(
    ExplorerController<chaingraph_explorer_net::graphql::GraphQLClient>: Send
);
