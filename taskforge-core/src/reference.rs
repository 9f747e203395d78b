//! Data model for the machine-readable API description.
//!
//! An [`ApiReference`] is parsed once from JSON and never mutated. Each
//! entry either describes a REST endpoint (`function`) or an AMQP topic
//! exchange (`topic-exchange`); the client interprets the table at call
//! time instead of synthesizing per-entry methods.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A parsed API description for one service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReference {
    /// Default base URL for REST entries, e.g. `https://queue.taskforge.net/v1`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Default exchange prefix for topic entries, e.g. `exchange/taskforge-queue/v1`.
    #[serde(default)]
    pub exchange_prefix: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub entries: Vec<Entry>,
}

/// One callable entry in an API description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Entry {
    #[serde(rename = "function")]
    Function(FunctionEntry),
    #[serde(rename = "topic-exchange")]
    TopicExchange(TopicExchangeEntry),
}

/// A REST endpoint: HTTP method, route template and declared arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEntry {
    pub name: String,
    /// HTTP method name as written in the description (`get`, `post`, ...).
    pub method: String,
    /// Route template with `<name>` placeholders, relative to the base URL.
    pub route: String,
    /// Ordered positional parameter names; each must appear in the route.
    #[serde(default)]
    pub args: Vec<String>,
    /// Reference to the payload schema; presence means the entry takes a
    /// trailing JSON payload argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FunctionEntry {
    /// Whether this entry consumes a trailing JSON payload.
    pub fn accepts_input(&self) -> bool {
        self.input.is_some()
    }
}

/// A topic exchange: exchange-name suffix plus the ordered routing-key schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicExchangeEntry {
    pub name: String,
    /// Exchange name suffix, joined onto the client's exchange prefix.
    pub exchange: String,
    /// Routing-key tokens in declared order; order is significant and fixed.
    pub routing_key: Vec<RoutingKeyToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One token of a dot-delimited routing key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingKeyToken {
    pub name: String,
    #[serde(default)]
    pub required: bool,
    /// Fixed literal emitted for this position, e.g. `primary`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<String>,
    /// Whether the token may span multiple words (`#` wildcard instead of `*`).
    #[serde(default)]
    pub multiple_words: bool,
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::Function(f) => &f.name,
            Entry::TopicExchange(t) => &t.name,
        }
    }
}

impl ApiReference {
    /// Parse an API description from its JSON form.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(json.clone())
            .map_err(|e| Error::failure(format!("invalid API description: {}", e)))
    }

    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Look up a REST entry, failing on unknown names or topic entries.
    pub fn function(&self, name: &str) -> Result<&FunctionEntry> {
        match self.entry(name) {
            Some(Entry::Function(f)) => Ok(f),
            Some(Entry::TopicExchange(_)) => Err(Error::failure(format!(
                "'{}' is a topic exchange, not a callable endpoint",
                name
            ))),
            None => Err(Error::failure(format!("no API method named '{}'", name))),
        }
    }

    /// Look up a topic-exchange entry, failing on unknown names or REST entries.
    pub fn topic_exchange(&self, name: &str) -> Result<&TopicExchangeEntry> {
        match self.entry(name) {
            Some(Entry::TopicExchange(t)) => Ok(t),
            Some(Entry::Function(_)) => Err(Error::failure(format!(
                "'{}' is a callable endpoint, not a topic exchange",
                name
            ))),
            None => Err(Error::failure(format!("no topic exchange named '{}'", name))),
        }
    }
}
