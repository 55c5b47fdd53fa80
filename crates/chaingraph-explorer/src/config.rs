//! Endpoint configuration.
//!
//! The explorer talks to one Chaingraph GraphQL endpoint. By default that is
//! the public demo instance; a TOML file and environment variables can point
//! it elsewhere:
//!
//! ```toml
//! bearer_token = "secret"
//!
//! [endpoint]
//! host = "localhost:8080"
//! secure = false
//! path = "/v1/graphql"
//!
//! [timeouts]
//! request_secs = 30
//! connection_secs = 10
//! keep_alive_secs = 0   # disable keep-alive pings
//! ```
//!
//! Environment overrides: `CHAINGRAPH_HOST`, `CHAINGRAPH_SECURE`,
//! `CHAINGRAPH_HTTP_URL` and `CHAINGRAPH_WS_URL`.

use std::path::Path;
use std::time::Duration;

use chaingraph_explorer_core::logging::targets;
use chaingraph_explorer_net::graphql::GraphQLClient;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// Host of the public Chaingraph demo.
pub const DEFAULT_HOST: &str = "demo.chaingraph.cash";

/// Path of the GraphQL endpoint on a Chaingraph host.
pub const DEFAULT_PATH: &str = "/v1/graphql";

/// Where the GraphQL endpoint lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Host, optionally with a port.
    pub host: String,
    /// Use `https`/`wss` instead of `http`/`ws`.
    pub secure: bool,
    /// Path of the GraphQL endpoint.
    pub path: String,
    /// Full HTTP URL. Takes precedence over `host`, `secure` and `path`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_url: Option<String>,
    /// Full WebSocket URL. Takes precedence over `host`, `secure` and `path`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub websocket_url: Option<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            secure: true,
            path: DEFAULT_PATH.to_string(),
            http_url: None,
            websocket_url: None,
        }
    }
}

/// Network timeouts, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-query timeout. 0 means none.
    pub request_secs: u64,
    /// WebSocket handshake and `connection_ack` timeout. 0 means none.
    pub connection_secs: u64,
    /// Interval between keep-alive pings. 0 disables them.
    pub keep_alive_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            connection_secs: 30,
            keep_alive_secs: 30,
        }
    }
}

/// Explorer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// GraphQL endpoint.
    pub endpoint: EndpointConfig,
    /// Network timeouts.
    pub timeouts: TimeoutConfig,
    /// Sent as `Authorization: Bearer ...` and in the WebSocket init payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
}

impl ExplorerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(document).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), "loading config");
        Self::from_toml_str(&document)
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup("CHAINGRAPH_HOST") {
            self.endpoint.host = host;
        }
        if let Some(secure) = lookup("CHAINGRAPH_SECURE") {
            self.endpoint.secure = parse_bool("CHAINGRAPH_SECURE", &secure)?;
        }
        if let Some(url) = lookup("CHAINGRAPH_HTTP_URL") {
            self.endpoint.http_url = Some(url);
        }
        if let Some(url) = lookup("CHAINGRAPH_WS_URL") {
            self.endpoint.websocket_url = Some(url);
        }
        self.validate()?;
        Ok(self)
    }

    /// Check that both endpoint URLs are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.http_url()?;
        self.websocket_url()?;
        Ok(())
    }

    /// The URL queries are POSTed to.
    pub fn http_url(&self) -> Result<String, ConfigError> {
        let scheme = if self.endpoint.secure { "https" } else { "http" };
        self.resolve("http_url", self.endpoint.http_url.as_deref(), scheme, &["http", "https"])
    }

    /// The URL subscriptions connect to.
    pub fn websocket_url(&self) -> Result<String, ConfigError> {
        let scheme = if self.endpoint.secure { "wss" } else { "ws" };
        self.resolve(
            "websocket_url",
            self.endpoint.websocket_url.as_deref(),
            scheme,
            &["ws", "wss"],
        )
    }

    fn resolve(
        &self,
        key: &str,
        explicit: Option<&str>,
        scheme: &str,
        allowed: &[&str],
    ) -> Result<String, ConfigError> {
        let raw = match explicit {
            Some(url) => url.to_string(),
            None => {
                let path = self.endpoint.path.trim_start_matches('/');
                format!("{scheme}://{}/{path}", self.endpoint.host.trim_end_matches('/'))
            }
        };

        let url = Url::parse(&raw).map_err(|e| ConfigError::invalid_value(key, format!("'{raw}': {e}")))?;
        if !allowed.contains(&url.scheme()) {
            return Err(ConfigError::invalid_value(
                key,
                format!("'{raw}' must use one of {}", allowed.join(", ")),
            ));
        }
        Ok(raw)
    }

    /// Build a GraphQL client for the configured endpoint.
    pub fn build_client(&self) -> Result<GraphQLClient, ConfigError> {
        let http_url = self.http_url()?;
        let websocket_url = self.websocket_url()?;
        tracing::debug!(target: targets::CONFIG, %http_url, %websocket_url, "building client");

        let mut builder = GraphQLClient::builder(http_url)
            .websocket_url(websocket_url)
            .connection_timeout(Duration::from_secs(self.timeouts.connection_secs))
            .keep_alive_interval(Some(Duration::from_secs(self.timeouts.keep_alive_secs)));
        if self.timeouts.request_secs > 0 {
            builder = builder.request_timeout(Duration::from_secs(self.timeouts.request_secs));
        }
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder.build()?)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::invalid_value(
            key,
            format!("expected a boolean, got '{other}'"),
        )),
    }
}
