//! GraphQL subscription support over WebSocket.
//!
//! Implements the graphql-transport-ws protocol (graphql-ws).
//! See: https://github.com/enisdenjo/graphql-ws/blob/master/PROTOCOL.md

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use chaingraph_explorer_core::logging::targets;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue, header};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::request::GraphQLRequest;
use super::response::{GraphQLError, GraphQLResponse};
use crate::error::{NetworkError, Result};

/// WebSocket sub-protocol negotiated with the server.
pub const GRAPHQL_TRANSPORT_WS: &str = "graphql-transport-ws";

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// WebSocket message types for graphql-transport-ws protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum WsMessage {
    /// Client -> Server: Initialize connection
    ConnectionInit {
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    /// Server -> Client: Connection acknowledged
    ConnectionAck {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    /// Bidirectional: Ping
    Ping {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    /// Bidirectional: Pong
    Pong {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    /// Client -> Server: Subscribe to operation
    Subscribe { id: String, payload: GraphQLRequest },
    /// Server -> Client: Operation result
    Next { id: String, payload: GraphQLResponse },
    /// Server -> Client: Operation error
    Error {
        id: String,
        payload: Vec<GraphQLError>,
    },
    /// Bidirectional: Operation complete
    Complete { id: String },
}

/// A message received from a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionMessage {
    /// A `next` result. May itself carry GraphQL `errors`.
    Data(GraphQLResponse),
    /// The server rejected or aborted the operation.
    Error(Vec<GraphQLError>),
    /// The subscription completed normally.
    Complete,
    /// The underlying WebSocket connection closed.
    Closed(String),
}

/// A stream of subscription messages.
///
/// Dropping the stream sends `complete` for the operation to the server,
/// unless the server already finished it.
pub struct SubscriptionStream {
    receiver: mpsc::UnboundedReceiver<SubscriptionMessage>,
    subscription_id: String,
    complete_sender: Option<mpsc::Sender<String>>,
}

impl SubscriptionStream {
    /// Get the next message from the subscription.
    pub async fn next(&mut self) -> Option<SubscriptionMessage> {
        self.receiver.recv().await
    }
}

impl Drop for SubscriptionStream {
    fn drop(&mut self) {
        if let Some(sender) = self.complete_sender.take()
            && sender.try_send(self.subscription_id.clone()).is_err()
        {
            tracing::debug!(
                target: targets::SUBSCRIPTION,
                id = %self.subscription_id,
                "connection gone, complete not sent"
            );
        }
    }
}

impl std::fmt::Debug for SubscriptionStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionStream")
            .field("id", &self.subscription_id)
            .finish()
    }
}

/// Configuration for the subscription connection.
#[derive(Debug, Clone)]
pub(crate) struct SubscriptionConfig {
    /// WebSocket URL for subscriptions.
    pub url: String,
    /// Connection initialization payload (e.g., auth tokens).
    pub init_payload: Option<Value>,
    /// Timeout for the WebSocket handshake and for `connection_ack`.
    /// `None` waits indefinitely.
    pub connection_timeout: Option<Duration>,
    /// Keep-alive interval. `None` or zero sends no pings.
    pub keep_alive_interval: Option<Duration>,
    /// Additional headers for the WebSocket upgrade request.
    pub headers: HashMap<String, String>,
}

/// Await `future`, failing with [`NetworkError::Timeout`] after `limit`.
async fn within<F: Future>(limit: Option<Duration>, future: F) -> Result<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| NetworkError::Timeout),
        None => Ok(future.await),
    }
}

/// Routing table shared by the read and write tasks.
struct SubscriptionState {
    subscriptions: HashMap<String, mpsc::UnboundedSender<SubscriptionMessage>>,
    ack: Option<oneshot::Sender<()>>,
}

/// A connected graphql-transport-ws session multiplexing subscriptions.
pub(crate) struct SubscriptionConnection {
    state: Arc<Mutex<SubscriptionState>>,
    write_tx: mpsc::Sender<WsMessage>,
    complete_tx: mpsc::Sender<String>,
    open: Arc<AtomicBool>,
    next_id: AtomicU64,
}

impl SubscriptionConnection {
    /// Connect to the server and wait for `connection_ack`.
    pub async fn connect(config: SubscriptionConfig) -> Result<Self> {
        let mut request = config.url.as_str().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(
            header::SEC_WEBSOCKET_PROTOCOL,
            HeaderValue::from_static(GRAPHQL_TRANSPORT_WS),
        );
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| NetworkError::WebSocket(e.to_string()))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| NetworkError::WebSocket(e.to_string()))?;
            headers.insert(name, value);
        }

        let connect_future = tokio_tungstenite::connect_async(request);
        let (ws_stream, _) = within(config.connection_timeout, connect_future).await??;
        tracing::debug!(target: targets::SUBSCRIPTION, url = %config.url, "websocket connected");

        let (write, read) = ws_stream.split();
        let (write_tx, write_rx) = mpsc::channel::<WsMessage>(32);
        let (complete_tx, complete_rx) = mpsc::channel::<String>(32);
        let (ack_tx, ack_rx) = oneshot::channel();

        let state = Arc::new(Mutex::new(SubscriptionState {
            subscriptions: HashMap::new(),
            ack: Some(ack_tx),
        }));
        let open = Arc::new(AtomicBool::new(true));

        tokio::spawn(Self::write_task(write, write_rx, complete_rx, state.clone()));
        tokio::spawn(Self::read_task(
            read,
            state.clone(),
            write_tx.clone(),
            open.clone(),
        ));

        write_tx
            .send(WsMessage::ConnectionInit {
                payload: config.init_payload.clone(),
            })
            .await
            .map_err(|_| NetworkError::Connection("connection closed during init".into()))?;

        if within(config.connection_timeout, ack_rx).await?.is_err() {
            return Err(NetworkError::Protocol(
                "connection closed before connection_ack".into(),
            ));
        }

        if let Some(interval) = config.keep_alive_interval.filter(|i| !i.is_zero()) {
            let write_tx = write_tx.clone();
            let open = open.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(interval);
                interval.tick().await;
                loop {
                    interval.tick().await;
                    if !open.load(Ordering::SeqCst) {
                        break;
                    }
                    if write_tx.send(WsMessage::Ping { payload: None }).await.is_err() {
                        break;
                    }
                }
            });
        }

        Ok(Self {
            state,
            write_tx,
            complete_tx,
            open,
            next_id: AtomicU64::new(1),
        })
    }

    /// Whether the underlying socket is still open.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Subscribe to a GraphQL operation.
    pub async fn subscribe(&self, request: GraphQLRequest) -> Result<SubscriptionStream> {
        if !self.is_open() {
            return Err(NetworkError::Connection("subscription connection closed".into()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().subscriptions.insert(id.clone(), tx);

        let subscribe_msg = WsMessage::Subscribe {
            id: id.clone(),
            payload: request,
        };
        if let Err(e) = self.write_tx.send(subscribe_msg).await {
            self.state.lock().subscriptions.remove(&id);
            return Err(NetworkError::WebSocket(e.to_string()));
        }
        tracing::debug!(target: targets::SUBSCRIPTION, %id, "subscribed");

        Ok(SubscriptionStream {
            receiver: rx,
            subscription_id: id,
            complete_sender: Some(self.complete_tx.clone()),
        })
    }

    async fn write_task(
        mut write: WsSink,
        mut write_rx: mpsc::Receiver<WsMessage>,
        mut complete_rx: mpsc::Receiver<String>,
        state: Arc<Mutex<SubscriptionState>>,
    ) {
        loop {
            tokio::select! {
                msg = write_rx.recv() => {
                    let Some(ws_msg) = msg else { break };
                    if let Ok(json) = serde_json::to_string(&ws_msg)
                        && write.send(Message::Text(json.into())).await.is_err()
                    {
                        break;
                    }
                }
                id = complete_rx.recv() => {
                    // Closed once the connection and every stream are gone.
                    let Some(id) = id else { break };
                    // Only operations the server has not finished get a complete.
                    let was_active = state.lock().subscriptions.remove(&id).is_some();
                    if was_active
                        && let Ok(json) = serde_json::to_string(&WsMessage::Complete { id })
                    {
                        let _ = write.send(Message::Text(json.into())).await;
                    }
                }
            }
        }
        let _ = write.close().await;
    }

    async fn read_task(
        mut read: WsSource,
        state: Arc<Mutex<SubscriptionState>>,
        write_tx: mpsc::Sender<WsMessage>,
        open: Arc<AtomicBool>,
    ) {
        let mut reason = String::from("Connection closed");
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<WsMessage>(&text) {
                    Ok(ws_msg) => Self::handle_message(ws_msg, &state, &write_tx),
                    Err(e) => {
                        tracing::warn!(target: targets::SUBSCRIPTION, error = %e, "unparseable frame");
                    }
                },
                Ok(Message::Close(frame)) => {
                    if let Some(frame) = frame {
                        reason = format!("Connection closed ({}): {}", frame.code, frame.reason);
                    }
                    break;
                }
                Err(e) => {
                    reason = e.to_string();
                    break;
                }
                _ => {}
            }
        }

        open.store(false, Ordering::SeqCst);
        tracing::debug!(target: targets::SUBSCRIPTION, %reason, "websocket closed");

        let mut state = state.lock();
        state.ack = None;
        for (_, tx) in state.subscriptions.drain() {
            let _ = tx.send(SubscriptionMessage::Closed(reason.clone()));
        }
    }

    fn handle_message(
        msg: WsMessage,
        state: &Arc<Mutex<SubscriptionState>>,
        write_tx: &mpsc::Sender<WsMessage>,
    ) {
        match msg {
            WsMessage::Next { id, payload } => {
                let state = state.lock();
                if let Some(tx) = state.subscriptions.get(&id) {
                    let _ = tx.send(SubscriptionMessage::Data(payload));
                }
            }
            WsMessage::Error { id, payload } => {
                let mut state = state.lock();
                if let Some(tx) = state.subscriptions.remove(&id) {
                    let _ = tx.send(SubscriptionMessage::Error(payload));
                }
            }
            WsMessage::Complete { id } => {
                let mut state = state.lock();
                if let Some(tx) = state.subscriptions.remove(&id) {
                    let _ = tx.send(SubscriptionMessage::Complete);
                }
            }
            WsMessage::ConnectionAck { .. } => {
                tracing::debug!(target: targets::SUBSCRIPTION, "connection acknowledged");
                if let Some(ack) = state.lock().ack.take() {
                    let _ = ack.send(());
                }
            }
            WsMessage::Ping { .. } => {
                let _ = write_tx.try_send(WsMessage::Pong { payload: None });
            }
            WsMessage::Pong { .. } => {}
            WsMessage::ConnectionInit { .. } | WsMessage::Subscribe { .. } => {
                tracing::warn!(target: targets::SUBSCRIPTION, "server sent a client-only message");
            }
        }
    }
}
