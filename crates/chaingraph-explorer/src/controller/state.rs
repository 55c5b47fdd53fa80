//! Selection state and the execution policy as a pure transition function.
//!
//! [`SelectionState::apply`] takes one [`Event`] and returns the
//! [`Command`]s the driver must perform against the transport. Nothing here
//! touches the network or a runtime, so every ordering of events can be
//! reproduced in a unit test.

use chaingraph_explorer_core::logging::targets;
use chaingraph_explorer_net::{SubscriptionEvent, SubscriptionHandle, TransportError};
use serde_json::Value;

use crate::catalog::{Catalog, Example, OperationKind};
use crate::error::{ExplorerError, Result};

/// Selection generation. Bumped on every reset; executions are tagged with
/// the epoch current when they were dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Epoch(u64);

impl Epoch {
    fn bump(&mut self) {
        self.0 += 1;
    }

    /// The raw generation number.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// How the selected example produces its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPolicy {
    /// Show the canned result; never call the transport.
    Mock,
    /// Run once, immediately on selection.
    Query,
    /// Open a stream once the user arms it.
    Subscription,
}

impl ExecutionPolicy {
    /// The policy for `example`. A mock wins over the operation kind.
    pub fn of(example: &Example) -> Self {
        if example.is_mocked() {
            return Self::Mock;
        }
        match example.kind {
            OperationKind::Query => Self::Query,
            OperationKind::Subscription => Self::Subscription,
        }
    }
}

/// What the results pane shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DisplayPayload {
    /// Nothing yet.
    #[default]
    Empty,
    /// The example's canned result, verbatim.
    Mock(String),
    /// Pretty-printed result data.
    Data(String),
    /// Pretty-printed error.
    Error(String),
}

impl DisplayPayload {
    /// The JSON text to render, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Empty => None,
            Self::Mock(text) | Self::Data(text) | Self::Error(text) => Some(text),
        }
    }

    /// Whether nothing is shown.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Whether an error is shown.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    fn data(value: &Value) -> Self {
        Self::Data(pretty(value))
    }

    fn error(error: &TransportError) -> Self {
        Self::Error(pretty(&error.to_payload()))
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The view appeared; select the first example.
    Mount,
    /// Move to the next example.
    SelectNext,
    /// Move to the previous example.
    SelectPrevious,
    /// Jump to an example, re-running it if already selected.
    SelectIndex(usize),
    /// Authorize opening the selected subscription.
    ArmSubscription,
    /// A query dispatched at `epoch` finished.
    QueryCompleted {
        epoch: Epoch,
        result: std::result::Result<Value, TransportError>,
    },
    /// A subscription requested at `epoch` is open.
    SubscriptionOpened {
        epoch: Epoch,
        handle: SubscriptionHandle,
    },
    /// A subscription requested at `epoch` could not be opened.
    SubscriptionFailed { epoch: Epoch, error: TransportError },
    /// An inbound message on an open subscription.
    SubscriptionMessage {
        handle: SubscriptionHandle,
        event: SubscriptionEvent,
    },
    /// The view went away.
    Unmount,
}

/// Work for the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run `source` as a query and report back with `epoch`.
    ExecuteQuery { epoch: Epoch, source: String },
    /// Open `source` as a subscription and report back with `epoch`.
    OpenSubscription { epoch: Epoch, source: String },
    /// Tear down an open subscription.
    CloseSubscription { handle: SubscriptionHandle },
}

/// Per-view selection state.
///
/// Starts unmounted; [`Event::Mount`] selects index 0 and runs its policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    selected_index: usize,
    subscription_armed: bool,
    live_result: DisplayPayload,
    epoch: Epoch,
    loading: bool,
    subscription: Option<SubscriptionHandle>,
    completed: bool,
    mounted: bool,
}

impl SelectionState {
    /// An unmounted state at index 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the selected example.
    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    /// Whether the selected subscription was armed.
    pub fn is_armed(&self) -> bool {
        self.subscription_armed
    }

    /// The latest payload or error.
    pub fn live_result(&self) -> &DisplayPayload {
        &self.live_result
    }

    /// Current selection generation.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Whether a query for the current selection is outstanding.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The open subscription, if any.
    pub fn subscription(&self) -> Option<SubscriptionHandle> {
        self.subscription
    }

    /// Whether the open subscription reported completion.
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Whether the state is mounted.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether the selected example can be armed now.
    pub fn is_armable(&self, catalog: &Catalog) -> bool {
        self.mounted
            && !self.subscription_armed
            && catalog
                .get(self.selected_index)
                .is_ok_and(|example| ExecutionPolicy::of(example) == ExecutionPolicy::Subscription)
    }

    /// Apply one event, returning the commands it requires.
    ///
    /// Only [`Event::SelectIndex`] can fail, with
    /// [`ExplorerError::OutOfRange`]. Events arriving after
    /// [`Event::Unmount`] only ever produce closes.
    pub fn apply(&mut self, catalog: &Catalog, event: Event) -> Result<Vec<Command>> {
        match event {
            Event::Mount => {
                self.mounted = true;
                self.reset(catalog, 0)
            }
            Event::SelectNext => {
                if !self.mounted || self.selected_index + 1 >= catalog.len() {
                    return Ok(Vec::new());
                }
                self.reset(catalog, self.selected_index + 1)
            }
            Event::SelectPrevious => {
                if !self.mounted || self.selected_index == 0 {
                    return Ok(Vec::new());
                }
                self.reset(catalog, self.selected_index - 1)
            }
            Event::SelectIndex(index) => {
                if index >= catalog.len() {
                    return Err(ExplorerError::out_of_range(index, catalog.len()));
                }
                if !self.mounted {
                    return Ok(Vec::new());
                }
                self.reset(catalog, index)
            }
            Event::ArmSubscription => Ok(self.arm(catalog)),
            Event::QueryCompleted { epoch, result } => {
                if !self.mounted || epoch != self.epoch || !self.loading {
                    tracing::trace!(
                        target: targets::CONTROLLER,
                        epoch = epoch.get(),
                        current = self.epoch.get(),
                        "discarding stale query result"
                    );
                    return Ok(Vec::new());
                }
                self.loading = false;
                self.live_result = match result {
                    Ok(data) => DisplayPayload::data(&data),
                    Err(error) => {
                        tracing::warn!(target: targets::CONTROLLER, %error, "query failed");
                        DisplayPayload::error(&error)
                    }
                };
                Ok(Vec::new())
            }
            Event::SubscriptionOpened { epoch, handle } => {
                if !self.mounted
                    || epoch != self.epoch
                    || !self.subscription_armed
                    || self.subscription.is_some()
                {
                    tracing::trace!(
                        target: targets::CONTROLLER,
                        handle = handle.id(),
                        "closing subscription opened for a stale selection"
                    );
                    return Ok(vec![Command::CloseSubscription { handle }]);
                }
                tracing::debug!(target: targets::CONTROLLER, handle = handle.id(), "subscription live");
                self.subscription = Some(handle);
                Ok(Vec::new())
            }
            Event::SubscriptionFailed { epoch, error } => {
                if !self.mounted
                    || epoch != self.epoch
                    || !self.subscription_armed
                    || self.subscription.is_some()
                {
                    tracing::trace!(target: targets::CONTROLLER, "discarding stale subscription failure");
                    return Ok(Vec::new());
                }
                tracing::warn!(target: targets::CONTROLLER, %error, "subscription failed to open");
                self.subscription_armed = false;
                self.live_result = DisplayPayload::error(&error);
                Ok(Vec::new())
            }
            Event::SubscriptionMessage { handle, event } => {
                if self.subscription != Some(handle) {
                    tracing::trace!(
                        target: targets::CONTROLLER,
                        handle = handle.id(),
                        "discarding message for a closed subscription"
                    );
                    return Ok(Vec::new());
                }
                match event {
                    SubscriptionEvent::Data(data) => self.live_result = DisplayPayload::data(&data),
                    SubscriptionEvent::Error(error) => {
                        tracing::warn!(target: targets::CONTROLLER, %error, "subscription error");
                        self.live_result = DisplayPayload::error(&error);
                    }
                    SubscriptionEvent::Complete => {
                        tracing::debug!(target: targets::CONTROLLER, handle = handle.id(), "subscription complete");
                        self.completed = true;
                    }
                }
                Ok(Vec::new())
            }
            Event::Unmount => {
                let commands = self.teardown();
                self.mounted = false;
                Ok(commands)
            }
        }
    }

    fn teardown(&mut self) -> Vec<Command> {
        self.epoch.bump();
        self.subscription_armed = false;
        self.live_result = DisplayPayload::Empty;
        self.loading = false;
        self.completed = false;
        self.subscription
            .take()
            .map(|handle| Command::CloseSubscription { handle })
            .into_iter()
            .collect()
    }

    fn reset(&mut self, catalog: &Catalog, index: usize) -> Result<Vec<Command>> {
        let example = catalog.get(index)?;
        let mut commands = self.teardown();
        self.selected_index = index;

        let policy = ExecutionPolicy::of(example);
        tracing::debug!(
            target: targets::CONTROLLER,
            index,
            name = %example.name,
            ?policy,
            epoch = self.epoch.get(),
            "selection reset"
        );

        match policy {
            ExecutionPolicy::Mock => {
                if let Some(mock) = &example.mock {
                    self.live_result = DisplayPayload::Mock(mock.clone());
                }
            }
            ExecutionPolicy::Query => {
                self.loading = true;
                commands.push(Command::ExecuteQuery {
                    epoch: self.epoch,
                    source: example.source.clone(),
                });
            }
            ExecutionPolicy::Subscription => {}
        }
        Ok(commands)
    }

    fn arm(&mut self, catalog: &Catalog) -> Vec<Command> {
        if !self.is_armable(catalog) {
            return Vec::new();
        }
        let Ok(example) = catalog.get(self.selected_index) else {
            return Vec::new();
        };

        self.subscription_armed = true;
        self.live_result = DisplayPayload::Empty;
        self.completed = false;
        tracing::debug!(target: targets::CONTROLLER, name = %example.name, "subscription armed");
        vec![Command::OpenSubscription {
            epoch: self.epoch,
            source: example.source.clone(),
        }]
    }
}
