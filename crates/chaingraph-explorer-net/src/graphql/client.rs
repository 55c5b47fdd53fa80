//! GraphQL client implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chaingraph_explorer_core::logging::targets;
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;

use super::request::GraphQLRequest;
use super::response::GraphQLResponse;
use super::subscription::{SubscriptionConfig, SubscriptionConnection, SubscriptionStream};
use crate::error::{NetworkError, Result};
use crate::transport::SubscriptionRegistry;

/// Builder for creating a GraphQL client.
pub struct GraphQLClientBuilder {
    http_url: String,
    websocket_url: Option<String>,
    default_headers: HashMap<String, String>,
    auth_token: Option<String>,
    request_timeout: Option<Duration>,
    connection_timeout: Option<Duration>,
    keep_alive_interval: Option<Duration>,
}

impl GraphQLClientBuilder {
    /// Create a new builder with the specified GraphQL endpoint URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http_url: url.into(),
            websocket_url: None,
            default_headers: HashMap::new(),
            auth_token: None,
            request_timeout: None,
            connection_timeout: Some(Duration::from_secs(30)),
            keep_alive_interval: Some(Duration::from_secs(30)),
        }
    }

    /// Set a separate WebSocket URL for subscriptions.
    ///
    /// If not set, the HTTP URL will be converted to WebSocket protocol
    /// (http:// -> ws://, https:// -> wss://).
    pub fn websocket_url(mut self, url: impl Into<String>) -> Self {
        self.websocket_url = Some(url.into());
        self
    }

    /// Set bearer token authentication.
    ///
    /// This adds the Authorization header and includes the token
    /// in the WebSocket connection init payload.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = Some(token.clone());
        self.default_headers
            .insert("Authorization".into(), format!("Bearer {}", token));
        self
    }

    /// Set the request timeout for HTTP operations.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the timeout for the WebSocket handshake and `connection_ack`.
    ///
    /// A zero duration disables the timeout.
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Set the keep-alive interval for WebSocket connections.
    ///
    /// `None` or a zero duration disables keep-alive pings.
    pub fn keep_alive_interval(mut self, interval: Option<Duration>) -> Self {
        self.keep_alive_interval = interval.filter(|interval| !interval.is_zero());
        self
    }

    /// Build the GraphQL client.
    ///
    /// Fails with [`NetworkError::InvalidUrl`] if either endpoint does not
    /// parse, or uses a scheme that does not match its role.
    pub fn build(self) -> Result<GraphQLClient> {
        let http = url::Url::parse(&self.http_url)?;
        if !matches!(http.scheme(), "http" | "https") {
            return Err(NetworkError::InvalidUrl(format!(
                "expected an http(s) endpoint, got '{}'",
                self.http_url
            )));
        }

        let websocket_url = self
            .websocket_url
            .unwrap_or_else(|| Self::http_to_ws_url(&self.http_url));
        let ws = url::Url::parse(&websocket_url)?;
        if !matches!(ws.scheme(), "ws" | "wss") {
            return Err(NetworkError::InvalidUrl(format!(
                "expected a ws(s) endpoint, got '{}'",
                websocket_url
            )));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let init_payload = self.auth_token.as_ref().map(|token| {
            serde_json::json!({
                "headers": { "Authorization": format!("Bearer {}", token) }
            })
        });

        Ok(GraphQLClient {
            inner: Arc::new(GraphQLClientInner {
                http_client,
                http_url: self.http_url,
                websocket_url,
                default_headers: self.default_headers,
                connection_timeout: self.connection_timeout,
                keep_alive_interval: self.keep_alive_interval,
                init_payload,
                subscription_connection: AsyncMutex::new(None),
                subscriptions: SubscriptionRegistry::default(),
            }),
        })
    }

    fn http_to_ws_url(url: &str) -> String {
        if let Some(rest) = url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            url.to_string()
        }
    }
}

pub(crate) struct GraphQLClientInner {
    http_client: reqwest::Client,
    http_url: String,
    websocket_url: String,
    default_headers: HashMap<String, String>,
    connection_timeout: Option<Duration>,
    keep_alive_interval: Option<Duration>,
    init_payload: Option<Value>,
    subscription_connection: AsyncMutex<Option<Arc<SubscriptionConnection>>>,
    pub(crate) subscriptions: SubscriptionRegistry,
}

/// A GraphQL client for queries and subscriptions.
///
/// Clones share the HTTP connection pool and the single WebSocket
/// connection used for every subscription.
///
/// # Example
///
/// ```ignore
/// use chaingraph_explorer_net::graphql::{GraphQLClient, GraphQLRequest};
///
/// let client = GraphQLClient::builder("https://demo.chaingraph.cash/v1/graphql").build()?;
///
/// let request = GraphQLRequest::query("{ node { name user_agent } }");
/// let response = client.execute(request).await?;
///
/// let subscription = GraphQLRequest::subscription("subscription { node { name } }");
/// let mut stream = client.subscribe(subscription).await?;
/// ```
#[derive(Clone)]
pub struct GraphQLClient {
    pub(crate) inner: Arc<GraphQLClientInner>,
}

impl GraphQLClient {
    /// Create a new builder for configuring a GraphQL client.
    pub fn builder(url: impl Into<String>) -> GraphQLClientBuilder {
        GraphQLClientBuilder::new(url)
    }

    /// Get the HTTP endpoint URL.
    pub fn url(&self) -> &str {
        &self.inner.http_url
    }

    /// Get the WebSocket URL for subscriptions.
    pub fn websocket_url(&self) -> &str {
        &self.inner.websocket_url
    }

    /// Execute a query over HTTP.
    ///
    /// For subscriptions, use `subscribe()` instead.
    pub async fn execute(&self, request: GraphQLRequest) -> Result<GraphQLResponse> {
        if request.is_subscription() {
            return Err(NetworkError::Request(
                "Use subscribe() for subscription operations".into(),
            ));
        }

        let mut req = self
            .inner
            .http_client
            .post(&self.inner.http_url)
            .header("Accept", "application/json")
            .json(&request);

        for (name, value) in &self.inner.default_headers {
            req = req.header(name.as_str(), value.as_str());
        }

        tracing::debug!(target: targets::GRAPHQL, url = %self.inner.http_url, "executing query");
        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetworkError::HttpStatus {
                status: status.as_u16(),
                message: (!body.is_empty()).then_some(body),
            });
        }

        let graphql_response: GraphQLResponse = response.json().await?;
        Ok(graphql_response)
    }

    /// Subscribe to a GraphQL subscription.
    ///
    /// This establishes the shared WebSocket connection if it is not already
    /// open and returns a stream of subscription messages.
    pub async fn subscribe(&self, request: GraphQLRequest) -> Result<SubscriptionStream> {
        if !request.is_subscription() {
            return Err(NetworkError::Request(
                "Expected a subscription operation".into(),
            ));
        }

        let connection = self.subscription_connection().await?;
        connection.subscribe(request).await
    }

    /// Get the open subscription connection, reconnecting if it has closed.
    async fn subscription_connection(&self) -> Result<Arc<SubscriptionConnection>> {
        let mut guard = self.inner.subscription_connection.lock().await;
        if let Some(connection) = guard.as_ref()
            && connection.is_open()
        {
            return Ok(connection.clone());
        }

        let config = SubscriptionConfig {
            url: self.inner.websocket_url.clone(),
            init_payload: self.inner.init_payload.clone(),
            connection_timeout: self.inner.connection_timeout,
            keep_alive_interval: self.inner.keep_alive_interval,
            headers: self.inner.default_headers.clone(),
        };

        let connection = Arc::new(SubscriptionConnection::connect(config).await?);
        *guard = Some(connection.clone());
        Ok(connection)
    }
}

impl std::fmt::Debug for GraphQLClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQLClient")
            .field("http_url", &self.inner.http_url)
            .field("websocket_url", &self.inner.websocket_url)
            .finish()
    }
}
