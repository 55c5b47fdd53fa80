//! GraphQL client for queries and subscriptions.
//!
//! This module provides a GraphQL client that supports:
//! - Query execution over HTTP POST
//! - Variables via JSON
//! - Subscriptions over WebSocket (graphql-transport-ws protocol)
//!
//! # Example
//!
//! ```ignore
//! use chaingraph_explorer_net::graphql::{GraphQLClient, GraphQLRequest};
//!
//! let client = GraphQLClient::builder("https://demo.chaingraph.cash/v1/graphql").build()?;
//!
//! let request = GraphQLRequest::query(r#"
//!     query GetBlock($height: bigint!) {
//!         block(where: { height: { _eq: $height } }) {
//!             hash
//!             transaction_count
//!         }
//!     }
//! "#)
//! .variable("height", 0);
//!
//! let response = client.execute(request).await?;
//! ```
//!
//! # Subscriptions
//!
//! ```ignore
//! let subscription = GraphQLRequest::subscription(r#"
//!     subscription MonitorMempools {
//!         node { name unconfirmed_transaction_count }
//!     }
//! "#);
//!
//! let mut stream = client.subscribe(subscription).await?;
//! while let Some(message) = stream.next().await {
//!     match message {
//!         SubscriptionMessage::Data(response) => println!("{:?}", response.data),
//!         SubscriptionMessage::Error(errors) => eprintln!("{:?}", errors),
//!         SubscriptionMessage::Complete | SubscriptionMessage::Closed(_) => break,
//!     }
//! }
//! ```

mod client;
mod request;
mod response;
mod subscription;

pub use client::{GraphQLClient, GraphQLClientBuilder};
pub use request::{GraphQLRequest, OperationType};
pub use response::{GraphQLError, GraphQLLocation, GraphQLResponse, PathSegment};
pub use subscription::{GRAPHQL_TRANSPORT_WS, SubscriptionMessage, SubscriptionStream};
