//! Networking for the Chaingraph example explorer.
//!
//! - **GraphQL client**: queries over HTTP POST and subscriptions over a
//!   shared graphql-transport-ws connection.
//! - **Transport**: the [`Transport`] trait the explorer controller drives,
//!   implemented by [`GraphQLClient`](graphql::GraphQLClient).
//!
//! ```ignore
//! use chaingraph_explorer_net::{Transport, graphql::GraphQLClient};
//!
//! let client = GraphQLClient::builder("https://demo.chaingraph.cash/v1/graphql").build()?;
//! let data = client.execute_query("{ node { name } }").await?;
//! ```

mod error;
pub mod graphql;
pub mod transport;

pub use error::{NetworkError, Result};
pub use transport::{
    SubscriptionChannel, SubscriptionEvent, SubscriptionHandle, Transport, TransportError,
};
