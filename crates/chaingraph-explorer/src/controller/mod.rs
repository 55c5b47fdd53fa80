//! The explorer controller.
//!
//! [`ExplorerController`] owns one view's [`SelectionState`], runs the
//! commands it produces against a [`Transport`] as tokio tasks, and feeds
//! their completions back in as events. It never blocks: completions queue
//! on a channel until [`process_pending`](ExplorerController::process_pending)
//! or [`next_event`](ExplorerController::next_event) applies them.
//!
//! # Example
//!
//! ```ignore
//! use chaingraph_explorer::{Catalog, ExplorerConfig, ExplorerController};
//!
//! let client = ExplorerConfig::default().with_env_overrides()?.build_client()?;
//! let mut explorer = ExplorerController::new(Catalog::chaingraph()?, client);
//!
//! explorer.view_changed.connect(|view| {
//!     println!("{}: loading={}", view.example.name, view.is_loading);
//! });
//!
//! explorer.select_index(3)?;
//! explorer.next_event().await;
//! ```

mod state;
mod view;

use std::sync::Arc;

use chaingraph_explorer_core::Signal;
use chaingraph_explorer_core::logging::targets;
use chaingraph_explorer_net::{SubscriptionChannel, Transport};
use tokio::sync::mpsc;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::render::{DefaultHighlighter, SyntaxHighlighter};

pub use state::{Command, DisplayPayload, Epoch, Event, ExecutionPolicy, SelectionState};
pub use view::{ExplorerView, RenderedView};

/// Drives the explorer for one mounted view.
///
/// Must be created inside a tokio runtime. Dropping the controller unmounts
/// it, closing any open subscription.
pub struct ExplorerController<T: Transport> {
    catalog: Catalog,
    transport: Arc<T>,
    state: SelectionState,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    highlighter: Box<dyn SyntaxHighlighter>,
    last_view: Option<ExplorerView>,

    /// Emitted with the new view after every change to it.
    pub view_changed: Signal<ExplorerView>,
}

impl<T: Transport> ExplorerController<T> {
    /// Mount a controller on `catalog`, selecting the first example.
    pub fn new(catalog: Catalog, transport: T) -> Self {
        Self::with_transport(catalog, Arc::new(transport))
    }

    /// Mount a controller sharing an existing transport.
    pub fn with_transport(catalog: Catalog, transport: Arc<T>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut controller = Self {
            catalog,
            transport,
            state: SelectionState::new(),
            events_tx,
            events_rx,
            highlighter: Box::new(DefaultHighlighter),
            last_view: None,
            view_changed: Signal::new(),
        };
        tracing::debug!(target: targets::CONTROLLER, len = controller.catalog.len(), "mounting explorer");
        controller.handle(Event::Mount);
        controller
    }

    /// Replace the highlighter used by [`rendered_view`](Self::rendered_view).
    pub fn with_highlighter(mut self, highlighter: impl SyntaxHighlighter + 'static) -> Self {
        self.highlighter = Box::new(highlighter);
        self
    }

    /// The catalog being explored.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The selection state.
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Select the next example. No-op at the end of the catalog.
    pub fn select_next(&mut self) {
        self.handle(Event::SelectNext);
    }

    /// Select the previous example. No-op at the start of the catalog.
    pub fn select_previous(&mut self) {
        self.handle(Event::SelectPrevious);
    }

    /// Select the example at `index`, re-running it if it is already selected.
    pub fn select_index(&mut self, index: usize) -> Result<()> {
        self.try_handle(Event::SelectIndex(index))
    }

    /// Open the selected subscription. No-op unless the selection is an
    /// un-mocked subscription that is not armed yet.
    pub fn arm_subscription(&mut self) {
        self.handle(Event::ArmSubscription);
    }

    /// Project the current state.
    pub fn current_view(&self) -> ExplorerView {
        ExplorerView::project(&self.state, &self.catalog)
    }

    /// The current view with source and payload highlighted.
    pub fn rendered_view(&self) -> RenderedView {
        self.current_view().render(self.highlighter.as_ref())
    }

    /// Apply every completion that has already arrived, without waiting.
    ///
    /// Returns the number of events applied.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle(event);
            applied += 1;
        }
        applied
    }

    /// Wait for the next completion and apply it, along with any others
    /// already queued.
    pub async fn next_event(&mut self) {
        if let Some(event) = self.events_rx.recv().await {
            self.handle(event);
        }
        self.process_pending();
    }

    /// Unmount the view, closing any open subscription.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if !self.state.is_mounted() {
            return;
        }
        tracing::debug!(target: targets::CONTROLLER, "unmounting explorer");
        self.handle(Event::Unmount);

        // Subscriptions that opened after unmount are closed as they drain.
        self.events_rx.close();
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle(event);
        }
    }

    fn handle(&mut self, event: Event) {
        if let Err(error) = self.try_handle(event) {
            tracing::warn!(target: targets::CONTROLLER, %error, "event rejected");
        }
    }

    fn try_handle(&mut self, event: Event) -> Result<()> {
        let commands = self.state.apply(&self.catalog, event)?;
        for command in commands {
            self.dispatch(command);
        }
        self.notify();
        Ok(())
    }

    fn dispatch(&self, command: Command) {
        tracing::trace!(target: targets::CONTROLLER, ?command, "dispatching");
        match command {
            Command::ExecuteQuery { epoch, source } => {
                let pending = self.transport.execute_query(&source);
                let events = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = pending.await;
                    // The controller may be gone; its result no longer matters.
                    let _ = events.send(Event::QueryCompleted { epoch, result });
                });
            }
            Command::OpenSubscription { epoch, source } => {
                let pending = self.transport.open_subscription(&source);
                let events = self.events_tx.clone();
                let transport = Arc::clone(&self.transport);
                tokio::spawn(async move {
                    match pending.await {
                        Ok(SubscriptionChannel {
                            handle,
                            mut messages,
                        }) => {
                            if events.send(Event::SubscriptionOpened { epoch, handle }).is_err() {
                                transport.close_subscription(handle);
                                return;
                            }
                            while let Some(event) = messages.recv().await {
                                if events
                                    .send(Event::SubscriptionMessage { handle, event })
                                    .is_err()
                                {
                                    transport.close_subscription(handle);
                                    return;
                                }
                            }
                        }
                        Err(error) => {
                            let _ = events.send(Event::SubscriptionFailed { epoch, error });
                        }
                    }
                });
            }
            Command::CloseSubscription { handle } => {
                self.transport.close_subscription(handle);
            }
        }
    }

    fn notify(&mut self) {
        if !self.state.is_mounted() {
            return;
        }
        let view = self.current_view();
        if self.last_view.as_ref() == Some(&view) {
            return;
        }
        self.last_view = Some(view.clone());
        self.view_changed.emit(view);
    }
}

impl<T: Transport> Drop for ExplorerController<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<T: Transport> std::fmt::Debug for ExplorerController<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplorerController")
            .field("catalog_len", &self.catalog.len())
            .field("state", &self.state)
            .finish()
    }
}
