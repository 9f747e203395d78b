//! Topic-exchange routing-key patterns.
//!
//! Builds AMQP-style dot-delimited patterns from an entry's ordered token
//! schema and a caller-supplied partial pattern. `*` matches exactly one
//! word, `#` matches zero or more.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::reference::RoutingKeyToken;

/// Routing-key pattern output, consumed by an external pub/sub transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangePattern {
    pub exchange: String,
    pub routing_key_pattern: String,
}

/// One positional pattern argument.
#[derive(Debug, Clone)]
pub enum PatternArg {
    /// A literal pattern string, passed through verbatim.
    Literal(String),
    /// Token-name to value bindings; unbound tokens become wildcards.
    ByName(BTreeMap<String, String>),
}

/// Positional and keyword pattern arguments for one topic-exchange call.
///
/// Mirrors the shape of a loosely-typed call site so that conflicting
/// combinations stay representable and fail with a typed error.
#[derive(Debug, Clone, Default)]
pub struct PatternArgs {
    positional: Vec<PatternArg>,
    keyword: BTreeMap<String, String>,
}

impl PatternArgs {
    pub fn none() -> Self {
        PatternArgs::default()
    }

    /// A single literal pattern string.
    pub fn literal(pattern: impl Into<String>) -> Self {
        PatternArgs::none().arg(PatternArg::Literal(pattern.into()))
    }

    /// A single name→value mapping.
    pub fn by_name<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        PatternArgs::none().arg(PatternArg::ByName(map))
    }

    /// Append a positional pattern argument.
    pub fn arg(mut self, arg: PatternArg) -> Self {
        self.positional.push(arg);
        self
    }

    /// Add a keyword token binding.
    pub fn named(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }
}

/// Exchange name: prefix and suffix joined with exactly one slash.
pub fn exchange_name(prefix: &str, suffix: &str) -> String {
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        suffix.trim_start_matches('/')
    )
}

fn wildcard(token: &RoutingKeyToken) -> &'static str {
    if token.multiple_words {
        "#"
    } else {
        "*"
    }
}

fn pattern_from_map(schema: &[RoutingKeyToken], values: &BTreeMap<String, String>) -> String {
    schema
        .iter()
        .map(|token| {
            if let Some(constant) = &token.constant {
                constant.clone()
            } else if let Some(value) = values.get(&token.name) {
                value.clone()
            } else {
                wildcard(token).to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Build the routing-key pattern for a schema from the caller's arguments.
pub fn routing_key_pattern(
    entry_name: &str,
    schema: &[RoutingKeyToken],
    args: &PatternArgs,
) -> Result<String> {
    if args.positional.len() > 1 {
        return Err(Error::topic_exchange(format!(
            "'{}' takes at most one pattern argument, got {}",
            entry_name,
            args.positional.len()
        )));
    }
    if !args.positional.is_empty() && !args.keyword.is_empty() {
        return Err(Error::topic_exchange(format!(
            "'{}' given both a pattern argument and keyword token values",
            entry_name
        )));
    }

    match args.positional.first() {
        Some(PatternArg::Literal(pattern)) => Ok(pattern.clone()),
        Some(PatternArg::ByName(values)) => Ok(pattern_from_map(schema, values)),
        None => Ok(pattern_from_map(schema, &args.keyword)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<RoutingKeyToken> {
        let token = |name: &str, constant: Option<&str>, multi: bool| RoutingKeyToken {
            name: name.to_owned(),
            required: constant.is_some(),
            constant: constant.map(str::to_owned),
            multiple_words: multi,
        };
        vec![
            token("primary_key", Some("primary"), false),
            token("norm1", None, false),
            token("norm2", None, false),
            token("norm3", None, false),
            token("multi_key", None, true),
        ]
    }

    #[test]
    fn test_string_passes_through() {
        let pattern =
            routing_key_pattern("topicName", &schema(), &PatternArgs::literal("johnwrotethis"))
                .unwrap();
        assert_eq!(pattern, "johnwrotethis");
    }

    #[test]
    fn test_empty_pattern_is_all_wildcards() {
        let expected = "primary.*.*.*.#";
        let from_none = routing_key_pattern("topicName", &schema(), &PatternArgs::none()).unwrap();
        let from_empty_map = routing_key_pattern(
            "topicName",
            &schema(),
            &PatternArgs::by_name(Vec::<(&str, &str)>::new()),
        )
        .unwrap();
        assert_eq!(from_none, expected);
        assert_eq!(from_empty_map, expected);
    }

    #[test]
    fn test_inserts_supplied_values() {
        let pattern = routing_key_pattern(
            "topicName",
            &schema(),
            &PatternArgs::by_name([("norm2", "value2")]),
        )
        .unwrap();
        assert_eq!(pattern, "primary.*.value2.*.#");
    }

    #[test]
    fn test_keyword_values_work_like_a_map() {
        let pattern =
            routing_key_pattern("topicName", &schema(), &PatternArgs::none().named("norm2", "v"))
                .unwrap();
        assert_eq!(pattern, "primary.*.v.*.#");
    }

    #[test]
    fn test_two_positional_args_fail() {
        let args = PatternArgs::by_name([("taskId", "123")])
            .arg(PatternArg::Literal("another".to_owned()));
        let err = routing_key_pattern("topicName", &schema(), &args).unwrap_err();
        assert!(matches!(err, Error::TopicExchange(_)));
    }

    #[test]
    fn test_positional_plus_keyword_fails() {
        let args = PatternArgs::by_name([("taskId", "123")]).named("taskId", "123");
        let err = routing_key_pattern("topicName", &schema(), &args).unwrap_err();
        assert!(matches!(err, Error::TopicExchange(_)));
    }

    #[test]
    fn test_exchange_name_trailing_slash() {
        assert_eq!(
            exchange_name("test/v1", "topicExchange"),
            "test/v1/topicExchange"
        );
        assert_eq!(
            exchange_name("test/v1/", "/topicExchange"),
            "test/v1/topicExchange"
        );
    }
}
