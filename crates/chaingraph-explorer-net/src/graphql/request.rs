//! GraphQL request types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A GraphQL operation type.
///
/// The explorer only runs read operations, so mutations are not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// A one-shot query operation.
    #[default]
    Query,
    /// A long-lived subscription operation.
    Subscription,
}

impl OperationType {
    /// Infer the operation type from the leading keyword of a document.
    ///
    /// Leading whitespace and `#` comments are skipped. Anything that does not
    /// start with `subscription` (including the `{ ... }` shorthand) is a query.
    pub fn infer(source: &str) -> Self {
        let mut rest = source;
        loop {
            rest = rest.trim_start();
            if let Some(comment) = rest.strip_prefix('#') {
                rest = comment.split_once('\n').map_or("", |(_, tail)| tail);
            } else {
                break;
            }
        }

        let keyword: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        if keyword == "subscription" {
            Self::Subscription
        } else {
            Self::Query
        }
    }
}

/// A GraphQL request.
///
/// Represents a GraphQL operation with optional variables and operation name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQLRequest {
    /// The GraphQL document text.
    pub query: String,

    /// Optional variables for the operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,

    /// Optional operation name (for documents with multiple operations).
    #[serde(skip_serializing_if = "Option::is_none", rename = "operationName")]
    pub operation_name: Option<String>,

    /// The operation type (not serialized, used internally).
    #[serde(skip)]
    pub(crate) operation_type: OperationType,
}

impl GraphQLRequest {
    /// Create a new query request.
    pub fn query(query: impl Into<String>) -> Self {
        Self::with_type(query, OperationType::Query)
    }

    /// Create a new subscription request.
    pub fn subscription(query: impl Into<String>) -> Self {
        Self::with_type(query, OperationType::Subscription)
    }

    /// Create a request from a raw document, inferring its operation type.
    pub fn new(query: impl Into<String>) -> Self {
        let query = query.into();
        let operation_type = OperationType::infer(&query);
        Self::with_type(query, operation_type)
    }

    fn with_type(query: impl Into<String>, operation_type: OperationType) -> Self {
        Self {
            query: query.into(),
            variables: None,
            operation_name: None,
            operation_type,
        }
    }

    /// Set a variable value.
    pub fn variable(mut self, name: impl Into<String>, value: impl Serialize) -> Self {
        let variables = self
            .variables
            .get_or_insert_with(|| Value::Object(Default::default()));
        if let Value::Object(map) = variables
            && let Ok(value) = serde_json::to_value(value)
        {
            map.insert(name.into(), value);
        }
        self
    }

    /// Set the operation name.
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Get the operation type.
    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    /// Check if this is a subscription.
    pub fn is_subscription(&self) -> bool {
        self.operation_type == OperationType::Subscription
    }
}
