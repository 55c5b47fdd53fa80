//! Logging facilities for the Chaingraph explorer.
//!
//! The explorer uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("chaingraph_explorer=debug,chaingraph_explorer_net=info")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "chaingraph_explorer_core::signal";
    /// Explorer controller target.
    pub const CONTROLLER: &str = "chaingraph_explorer::controller";
    /// Catalog loading and validation target.
    pub const CATALOG: &str = "chaingraph_explorer::catalog";
    /// Syntax highlighting target.
    pub const RENDER: &str = "chaingraph_explorer::render";
    /// Configuration loading target.
    pub const CONFIG: &str = "chaingraph_explorer::config";
    /// GraphQL HTTP client target.
    pub const GRAPHQL: &str = "chaingraph_explorer_net::graphql";
    /// GraphQL WebSocket subscription target.
    pub const SUBSCRIPTION: &str = "chaingraph_explorer_net::subscription";
}
