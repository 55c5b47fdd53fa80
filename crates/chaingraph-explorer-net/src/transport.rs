//! The transport seam between the explorer controller and a GraphQL backend.
//!
//! [`Transport`] is what the controller drives: one-shot queries, and
//! subscriptions delivered over a cancellable channel. [`GraphQLClient`]
//! implements it with HTTP POST for queries and the shared graphql-transport-ws
//! connection for subscriptions.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use chaingraph_explorer_core::logging::targets;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::error::NetworkError;
use crate::graphql::{
    GraphQLClient, GraphQLError, GraphQLRequest, GraphQLResponse, SubscriptionMessage,
};

/// A failure surfaced by a transport.
///
/// Every variant is recoverable from the controller's point of view: it is
/// displayed in place of a result and never ends the session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The request could not be delivered or the response could not be read.
    #[error(transparent)]
    Network(NetworkError),
    /// The server answered with GraphQL `errors`.
    #[error("GraphQL error: {}", join_messages(.0))]
    GraphQL(Vec<GraphQLError>),
    /// The subscription's connection closed underneath it.
    #[error("Subscription closed: {0}")]
    Closed(String),
    /// The server broke the graphql-transport-ws protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl From<NetworkError> for TransportError {
    fn from(error: NetworkError) -> Self {
        match error {
            NetworkError::Protocol(message) => Self::Protocol(message),
            other => Self::Network(other),
        }
    }
}

fn join_messages(errors: &[GraphQLError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl TransportError {
    /// The JSON shown in place of a result.
    ///
    /// GraphQL errors keep the array the server sent; anything else becomes
    /// `{"message": "..."}`.
    pub fn to_payload(&self) -> Value {
        match self {
            Self::GraphQL(errors) => {
                serde_json::to_value(errors).unwrap_or_else(|_| json!({ "message": self.to_string() }))
            }
            other => json!({ "message": other.to_string() }),
        }
    }
}

/// Convert a GraphQL response into the data payload or its errors.
pub fn response_outcome(response: GraphQLResponse) -> Result<Value, TransportError> {
    if response.has_errors() {
        Err(TransportError::GraphQL(response.errors))
    } else {
        Ok(response.data.unwrap_or(Value::Null))
    }
}

/// Identifies one open subscription for [`Transport::close_subscription`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    /// Allocate a process-unique handle.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw handle number.
    pub fn id(self) -> u64 {
        self.0
    }
}

/// One inbound item on a subscription channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionEvent {
    /// A complete result snapshot.
    Data(Value),
    /// An error; the subscription is not closed by it.
    Error(TransportError),
    /// The server finished the operation. No more events follow.
    Complete,
}

/// An open subscription: its handle and the ordered message channel.
#[derive(Debug)]
pub struct SubscriptionChannel {
    /// Pass to [`Transport::close_subscription`] to tear the subscription down.
    pub handle: SubscriptionHandle,
    /// Events in arrival order.
    pub messages: mpsc::UnboundedReceiver<SubscriptionEvent>,
}

/// Executes GraphQL operations for the explorer.
///
/// Futures are `'static` so the controller can run them as detached tasks.
pub trait Transport: Send + Sync + 'static {
    /// Run a one-shot query, resolving to the response `data` or an error.
    fn execute_query(
        &self,
        source: &str,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send + 'static;

    /// Open a subscription.
    fn open_subscription(
        &self,
        source: &str,
    ) -> impl Future<Output = Result<SubscriptionChannel, TransportError>> + Send + 'static;

    /// Tear down a subscription. Closing an unknown or already closed handle
    /// is a no-op.
    fn close_subscription(&self, handle: SubscriptionHandle);
}

/// Pump tasks of the subscriptions opened through a [`GraphQLClient`].
#[derive(Default)]
pub(crate) struct SubscriptionRegistry {
    pumps: Mutex<HashMap<SubscriptionHandle, AbortHandle>>,
}

impl SubscriptionRegistry {
    fn insert(&self, handle: SubscriptionHandle, pump: AbortHandle) {
        self.pumps.lock().insert(handle, pump);
    }

    fn remove(&self, handle: SubscriptionHandle) -> Option<AbortHandle> {
        self.pumps.lock().remove(&handle)
    }

    pub(crate) fn len(&self) -> usize {
        self.pumps.lock().len()
    }
}

fn subscription_event(message: SubscriptionMessage) -> SubscriptionEvent {
    match message {
        SubscriptionMessage::Data(response) => match response_outcome(response) {
            Ok(data) => SubscriptionEvent::Data(data),
            Err(error) => SubscriptionEvent::Error(error),
        },
        SubscriptionMessage::Error(errors) => {
            SubscriptionEvent::Error(TransportError::GraphQL(errors))
        }
        SubscriptionMessage::Complete => SubscriptionEvent::Complete,
        SubscriptionMessage::Closed(reason) => {
            SubscriptionEvent::Error(TransportError::Closed(reason))
        }
    }
}

impl GraphQLClient {
    /// Number of subscriptions opened through [`Transport`] and not yet closed.
    pub fn active_subscriptions(&self) -> usize {
        self.inner.subscriptions.len()
    }
}

impl Transport for GraphQLClient {
    fn execute_query(
        &self,
        source: &str,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send + 'static {
        let client = self.clone();
        let request = GraphQLRequest::query(source);
        async move {
            let response = client.execute(request).await?;
            response_outcome(response)
        }
    }

    fn open_subscription(
        &self,
        source: &str,
    ) -> impl Future<Output = Result<SubscriptionChannel, TransportError>> + Send + 'static {
        let client = self.clone();
        let request = GraphQLRequest::subscription(source);
        async move {
            let mut stream = client.subscribe(request).await?;
            let handle = SubscriptionHandle::next();
            let (tx, rx) = mpsc::unbounded_channel();

            // Dropping the stream at the end of the pump sends `complete`.
            let pump = tokio::spawn(async move {
                while let Some(message) = stream.next().await {
                    if tx.send(subscription_event(message)).is_err() {
                        break;
                    }
                }
            });
            client.inner.subscriptions.insert(handle, pump.abort_handle());
            tracing::debug!(target: targets::GRAPHQL, handle = handle.id(), "subscription opened");

            Ok(SubscriptionChannel {
                handle,
                messages: rx,
            })
        }
    }

    fn close_subscription(&self, handle: SubscriptionHandle) {
        if let Some(pump) = self.inner.subscriptions.remove(handle) {
            pump.abort();
            tracing::debug!(target: targets::GRAPHQL, handle = handle.id(), "subscription closed");
        }
    }
}
