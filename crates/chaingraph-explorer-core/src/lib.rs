//! Core systems for the Chaingraph example explorer.
//!
//! This crate provides the pieces shared by the explorer's network and
//! controller crates:
//!
//! - **Signal/Slot System**: Type-safe change notification
//! - **Logging**: `tracing` target names for each subsystem
//!
//! # Signal/Slot Example
//!
//! ```
//! use chaingraph_explorer_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//!
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```

pub mod logging;
pub mod signal;

pub use signal::{ConnectionId, Signal};

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);
static_assertions::assert_impl_all!(Signal<String>: Send, Sync);
