//! Tests for the explorer controller against a recording transport.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chaingraph_explorer::{
    Catalog, DisplayPayload, Example, ExplorerController, ExplorerView, SubscriptionChannel,
    SubscriptionEvent, SubscriptionHandle, Transport, TransportError,
};
use chaingraph_explorer_net::NetworkError;
use chaingraph_explorer_net::graphql::GraphQLError;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::{mpsc, oneshot};

type QueryReply = oneshot::Sender<Result<Value, TransportError>>;
type OpenReply = oneshot::Sender<Result<SubscriptionChannel, TransportError>>;

/// Records every call and lets the test decide when and how each completes.
#[derive(Default)]
struct RecordingTransport {
    queries: Mutex<Vec<String>>,
    query_replies: Mutex<VecDeque<QueryReply>>,
    opens: Mutex<Vec<String>>,
    open_replies: Mutex<VecDeque<OpenReply>>,
    closes: Mutex<Vec<SubscriptionHandle>>,
}

impl RecordingTransport {
    fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }

    fn opens(&self) -> Vec<String> {
        self.opens.lock().clone()
    }

    fn closes(&self) -> Vec<SubscriptionHandle> {
        self.closes.lock().clone()
    }

    fn reply_query(&self, result: Result<Value, TransportError>) {
        let reply = self
            .query_replies
            .lock()
            .pop_front()
            .expect("no pending query");
        let _ = reply.send(result);
    }

    fn accept_subscription(&self) -> (SubscriptionHandle, mpsc::UnboundedSender<SubscriptionEvent>) {
        let reply = self
            .open_replies
            .lock()
            .pop_front()
            .expect("no pending subscription");
        let handle = SubscriptionHandle::next();
        let (tx, messages) = mpsc::unbounded_channel();
        let _ = reply.send(Ok(SubscriptionChannel { handle, messages }));
        (handle, tx)
    }

    fn reject_subscription(&self, error: TransportError) {
        let reply = self
            .open_replies
            .lock()
            .pop_front()
            .expect("no pending subscription");
        let _ = reply.send(Err(error));
    }
}

impl Transport for RecordingTransport {
    fn execute_query(
        &self,
        source: &str,
    ) -> impl Future<Output = Result<Value, TransportError>> + Send + 'static {
        self.queries.lock().push(source.to_string());
        let (tx, rx) = oneshot::channel();
        self.query_replies.lock().push_back(tx);
        async move {
            rx.await
                .unwrap_or_else(|_| Err(TransportError::Closed("reply dropped".into())))
        }
    }

    fn open_subscription(
        &self,
        source: &str,
    ) -> impl Future<Output = Result<SubscriptionChannel, TransportError>> + Send + 'static {
        self.opens.lock().push(source.to_string());
        let (tx, rx) = oneshot::channel();
        self.open_replies.lock().push_back(tx);
        async move {
            rx.await
                .unwrap_or_else(|_| Err(TransportError::Closed("reply dropped".into())))
        }
    }

    fn close_subscription(&self, handle: SubscriptionHandle) {
        self.closes.lock().push(handle);
    }
}

fn scenario_catalog() -> Catalog {
    Catalog::new([
        Example::query("A", "{ping}"),
        Example::subscription("B", "subscription{tick}"),
    ])
    .expect("valid catalog")
}

fn mixed_catalog() -> Catalog {
    Catalog::new([
        Example::query("A", "{ping}"),
        Example::subscription("B", "subscription{tick}"),
        Example::query("C", "{ count }").with_mock("{\"count\": 25923}"),
        Example::subscription("D", "subscription{mocked}").with_mock("{\"tick\": 0}"),
    ])
    .expect("valid catalog")
}

fn mount(catalog: Catalog) -> (ExplorerController<RecordingTransport>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::default());
    let controller = ExplorerController::with_transport(catalog, Arc::clone(&transport));
    (controller, transport)
}

async fn settle(controller: &mut ExplorerController<RecordingTransport>) {
    tokio::time::timeout(Duration::from_secs(2), controller.next_event())
        .await
        .expect("no event arrived");
}

async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

fn data(text: &str) -> DisplayPayload {
    let value: Value = serde_json::from_str(text).expect("valid json");
    DisplayPayload::Data(serde_json::to_string_pretty(&value).expect("serializable"))
}

#[tokio::test]
async fn test_select_index_projects_catalog_entry() {
    let catalog = mixed_catalog();
    let (mut controller, _transport) = mount(catalog.clone());

    for index in 0..catalog.len() {
        controller.select_index(index).expect("valid index");
        let view = controller.current_view();
        assert_eq!(view.index, index);
        assert_eq!(&*view.example, catalog.get(index).expect("valid index"));
    }
}

#[tokio::test]
async fn test_out_of_range_selection_is_rejected() {
    let (mut controller, transport) = mount(mixed_catalog());

    let error = controller.select_index(4).expect_err("index 4 is out of range");
    assert_eq!(error.to_string(), "Example index 4 is out of range (catalog has 4 examples)");
    assert_eq!(controller.current_view().index, 0);
    assert_eq!(transport.queries().len(), 1);
}

#[tokio::test]
async fn test_navigation_boundaries() {
    let (mut controller, transport) = mount(mixed_catalog());

    controller.select_previous();
    let view = controller.current_view();
    assert_eq!(view.index, 0);
    assert!(!view.has_previous);
    assert!(view.has_next);
    assert_eq!(transport.queries().len(), 1);

    controller.select_index(3).expect("valid index");
    controller.select_next();
    let view = controller.current_view();
    assert_eq!(view.index, 3);
    assert!(view.has_previous);
    assert!(!view.has_next);
}

#[tokio::test]
async fn test_mocked_examples_never_touch_transport() {
    let (mut controller, transport) = mount(mixed_catalog());
    let seen: Arc<Mutex<Vec<ExplorerView>>> = Arc::default();
    let sink = Arc::clone(&seen);
    controller.view_changed.connect(move |view| sink.lock().push(view.clone()));

    controller.select_index(2).expect("valid index");
    let view = controller.current_view();
    assert_eq!(view.display_payload, DisplayPayload::Mock("{\"count\": 25923}".into()));
    assert!(!view.is_loading);
    assert!(!view.is_armable);

    controller.select_index(3).expect("valid index");
    controller.arm_subscription();
    let view = controller.current_view();
    assert_eq!(view.display_payload, DisplayPayload::Mock("{\"tick\": 0}".into()));

    assert_eq!(transport.queries(), vec!["{ping}".to_string()]);
    assert!(transport.opens().is_empty());
    assert!(seen.lock().iter().all(|view| !view.is_loading));
}

#[tokio::test]
async fn test_query_runs_exactly_once() {
    let (mut controller, transport) = mount(mixed_catalog());

    assert_eq!(transport.queries(), vec!["{ping}".to_string()]);
    let view = controller.current_view();
    assert!(view.is_loading);
    assert!(view.display_payload.is_empty());

    transport.reply_query(Ok(json!({ "ping": true })));
    settle(&mut controller).await;

    let view = controller.current_view();
    assert!(!view.is_loading);
    assert_eq!(view.display_payload, data(r#"{"ping": true}"#));
    assert_eq!(transport.queries().len(), 1);
}

#[tokio::test]
async fn test_stale_query_response_is_discarded() {
    let (mut controller, transport) = mount(mixed_catalog());

    controller.select_index(2).expect("valid index");
    transport.reply_query(Ok(json!({ "ping": "stale" })));
    settle(&mut controller).await;

    assert_eq!(
        controller.current_view().display_payload,
        DisplayPayload::Mock("{\"count\": 25923}".into())
    );
}

#[tokio::test]
async fn test_reselecting_reruns_and_ignores_first_reply() {
    let (mut controller, transport) = mount(mixed_catalog());

    controller.select_index(0).expect("valid index");
    assert_eq!(transport.queries().len(), 2);

    transport.reply_query(Ok(json!({ "ping": "first" })));
    settle(&mut controller).await;
    assert!(controller.current_view().is_loading);
    assert!(controller.current_view().display_payload.is_empty());

    transport.reply_query(Ok(json!({ "ping": "second" })));
    settle(&mut controller).await;
    assert_eq!(
        controller.current_view().display_payload,
        data(r#"{"ping": "second"}"#)
    );
}

#[tokio::test]
async fn test_query_errors_render_as_payload() {
    let (mut controller, transport) = mount(mixed_catalog());

    transport.reply_query(Err(TransportError::GraphQL(vec![GraphQLError::new(
        "field \"pong\" not found in type: 'query_root'",
    )])));
    settle(&mut controller).await;

    let view = controller.current_view();
    assert!(!view.is_loading);
    assert_eq!(
        view.display_payload,
        DisplayPayload::Error(
            "[\n  {\n    \"message\": \"field \\\"pong\\\" not found in type: 'query_root'\"\n  }\n]"
                .into()
        )
    );

    // Not retried.
    assert_eq!(transport.queries().len(), 1);
}

#[tokio::test]
async fn test_subscription_waits_for_arming() {
    let (mut controller, transport) = mount(mixed_catalog());

    controller.select_next();
    let view = controller.current_view();
    assert!(view.is_armable);
    assert!(!view.is_loading);
    assert!(view.display_payload.is_empty());
    assert!(transport.opens().is_empty());

    controller.arm_subscription();
    controller.arm_subscription();
    assert_eq!(transport.opens(), vec!["subscription{tick}".to_string()]);
    assert!(!controller.current_view().is_armable);
}

#[tokio::test]
async fn test_subscription_messages_replace_payload() {
    let (mut controller, transport) = mount(mixed_catalog());
    controller.select_next();
    controller.arm_subscription();

    let (_handle, messages) = transport.accept_subscription();
    settle(&mut controller).await;

    messages
        .send(SubscriptionEvent::Data(json!({ "a": 1 })))
        .expect("controller listening");
    settle(&mut controller).await;
    messages
        .send(SubscriptionEvent::Data(json!({ "b": 2 })))
        .expect("controller listening");
    settle(&mut controller).await;

    assert_eq!(controller.current_view().display_payload, data(r#"{"b": 2}"#));
}

#[tokio::test]
async fn test_subscription_error_does_not_close() {
    let (mut controller, transport) = mount(mixed_catalog());
    controller.select_next();
    controller.arm_subscription();

    let (_handle, messages) = transport.accept_subscription();
    settle(&mut controller).await;

    messages
        .send(SubscriptionEvent::Error(TransportError::GraphQL(vec![GraphQLError::new(
            "transient",
        )])))
        .expect("controller listening");
    settle(&mut controller).await;
    assert!(controller.current_view().display_payload.is_error());
    assert!(transport.closes().is_empty());

    messages
        .send(SubscriptionEvent::Data(json!({ "tick": 2 })))
        .expect("controller listening");
    settle(&mut controller).await;
    assert_eq!(controller.current_view().display_payload, data(r#"{"tick": 2}"#));
}

#[tokio::test]
async fn test_subscription_open_failure_allows_rearming() {
    let (mut controller, transport) = mount(mixed_catalog());
    controller.select_next();
    controller.arm_subscription();

    transport.reject_subscription(TransportError::Network(NetworkError::Timeout));
    settle(&mut controller).await;

    let view = controller.current_view();
    assert!(view.is_armable);
    assert_eq!(
        view.display_payload,
        DisplayPayload::Error("{\n  \"message\": \"Request timed out\"\n}".into())
    );

    controller.arm_subscription();
    assert_eq!(transport.opens().len(), 2);
}

#[tokio::test]
async fn test_selection_change_closes_previous_subscription() {
    let (mut controller, transport) = mount(mixed_catalog());
    controller.select_next();
    controller.arm_subscription();
    let (handle, _messages) = transport.accept_subscription();
    settle(&mut controller).await;

    controller.select_index(2).expect("valid index");
    assert_eq!(transport.closes(), vec![handle]);

    controller.select_index(0).expect("valid index");
    assert_eq!(transport.closes(), vec![handle]);
}

#[tokio::test]
async fn test_late_subscription_is_closed_on_arrival() {
    let (mut controller, transport) = mount(mixed_catalog());
    controller.select_next();
    controller.arm_subscription();
    controller.select_previous();

    let (handle, messages) = transport.accept_subscription();
    settle(&mut controller).await;
    assert_eq!(transport.closes(), vec![handle]);

    messages
        .send(SubscriptionEvent::Data(json!({ "tick": 9 })))
        .expect("forwarder still running");
    settle(&mut controller).await;

    let view = controller.current_view();
    assert_eq!(view.index, 0);
    assert!(view.is_loading);
    assert!(view.display_payload.is_empty());
}

#[tokio::test]
async fn test_unmount_closes_subscription() {
    let (mut controller, transport) = mount(mixed_catalog());
    controller.select_next();
    controller.arm_subscription();
    let (handle, _messages) = transport.accept_subscription();
    settle(&mut controller).await;

    controller.unmount();
    assert_eq!(transport.closes(), vec![handle]);
}

#[tokio::test]
async fn test_drop_closes_subscription() {
    let (mut controller, transport) = mount(mixed_catalog());
    controller.select_next();
    controller.arm_subscription();
    let (handle, _messages) = transport.accept_subscription();
    settle(&mut controller).await;

    drop(controller);
    assert_eq!(transport.closes(), vec![handle]);
}

#[tokio::test]
async fn test_subscription_opened_after_unmount_is_closed() {
    let (mut controller, transport) = mount(mixed_catalog());
    controller.select_next();
    controller.arm_subscription();
    controller.unmount();

    let (handle, _messages) = transport.accept_subscription();
    let recorder = Arc::clone(&transport);
    wait_until(move || recorder.closes() == vec![handle]).await;
}

#[tokio::test]
async fn test_view_changed_signal() {
    let (mut controller, transport) = mount(mixed_catalog());
    let seen: Arc<Mutex<Vec<ExplorerView>>> = Arc::default();
    let sink = Arc::clone(&seen);
    let connection = controller
        .view_changed
        .connect(move |view| sink.lock().push(view.clone()));

    transport.reply_query(Ok(json!({ "ping": true })));
    settle(&mut controller).await;
    controller.select_previous();

    {
        let seen = seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].display_payload, data(r#"{"ping": true}"#));
    }

    assert!(controller.view_changed.disconnect(connection));
    controller.select_next();
    assert_eq!(controller.current_view().index, 1);
    assert_eq!(seen.lock().len(), 1);
}

#[tokio::test]
async fn test_rendered_view_highlights_source_and_payload() {
    let (mut controller, transport) = mount(mixed_catalog());
    assert!(controller.rendered_view().payload.is_none());

    transport.reply_query(Ok(json!({ "ping": true })));
    settle(&mut controller).await;

    let rendered = controller.rendered_view();
    assert_eq!(rendered.source.len(), 1);
    assert_eq!(rendered.source[0].text(), "{ping}");
    let payload = rendered.payload.expect("payload present");
    assert_eq!(payload.len(), 3);
    assert_eq!(payload[1].text(), "  \"ping\": true");
}

#[tokio::test]
async fn test_end_to_end_scenario() {
    let (mut controller, transport) = mount(scenario_catalog());

    // Start at index 0.
    assert_eq!(transport.queries(), vec!["{ping}".to_string()]);

    controller.select_next();
    let view = controller.current_view();
    assert_eq!(view.index, 1);
    assert!(view.is_armable);
    assert_eq!(transport.queries().len(), 1);
    assert!(transport.opens().is_empty());

    controller.arm_subscription();
    assert_eq!(transport.opens(), vec!["subscription{tick}".to_string()]);

    let (handle, messages) = transport.accept_subscription();
    settle(&mut controller).await;
    messages
        .send(SubscriptionEvent::Data(json!({ "tick": 1 })))
        .expect("controller listening");
    settle(&mut controller).await;
    assert_eq!(controller.current_view().display_payload, data(r#"{"tick": 1}"#));

    controller.select_previous();
    assert_eq!(transport.closes(), vec![handle]);
    assert_eq!(
        transport.queries(),
        vec!["{ping}".to_string(), "{ping}".to_string()]
    );
}
