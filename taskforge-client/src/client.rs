//! The generic API client.
//!
//! Construction takes the service's API description and interprets its
//! entry table; each call runs binder → route builder → signature engine →
//! dispatcher. Topic-exchange entries never touch the network.

use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use url::Url;

use taskforge_core::hawk;
use taskforge_core::route;
use taskforge_core::topic;
use taskforge_core::{
    args, ApiReference, CallArgs, Credentials, Error, ExchangePattern, FunctionEntry, PatternArgs,
    Result,
};

use crate::config::ClientConfig;
use crate::dispatch::{dispatch, RetryPolicy};

/// A client for one service, built from its API description.
///
/// Instances are immutable and independent; they can be shared across
/// tasks freely. All per-call state lives on the call's stack.
#[derive(Debug)]
pub struct Client {
    name: String,
    reference: ApiReference,
    base_url: Option<String>,
    exchange_prefix: String,
    credentials: Option<Credentials>,
    authorized_scopes: Option<Vec<String>>,
    policy: RetryPolicy,
    http: reqwest::Client,
}

impl Client {
    /// Build a client from an API description and a config snapshot.
    ///
    /// Credentials are validated eagerly: a malformed clientId,
    /// accessToken or certificate fails here, before any call is made.
    pub fn new(name: impl Into<String>, reference: ApiReference, config: ClientConfig) -> Result<Self> {
        if let Some(credentials) = &config.credentials {
            credentials.validate()?;
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::failure(format!("failed to build HTTP client: {}", e)))?;

        let base_url = config.base_url.or_else(|| reference.base_url.clone());
        let exchange_prefix = config
            .exchange_prefix
            .or_else(|| reference.exchange_prefix.clone())
            .unwrap_or_default();

        Ok(Self {
            name: name.into(),
            reference,
            base_url,
            exchange_prefix,
            credentials: config.credentials,
            authorized_scopes: config.authorized_scopes,
            policy: RetryPolicy {
                max_retries: config.max_retries,
                delay_factor: config.retry_delay_factor,
                randomization_factor: config.retry_randomization,
                max_delay: config.max_retry_delay,
            },
            http,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reference(&self) -> &ApiReference {
        &self.reference
    }

    fn base_url(&self) -> Result<&str> {
        self.base_url
            .as_deref()
            .ok_or_else(|| Error::failure(format!("no base URL configured for '{}'", self.name)))
    }

    /// Credentials able to sign, if any. Empty credentials mean
    /// unauthenticated calls, matching the services' anonymous endpoints.
    fn signing_credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref().filter(|c| c.is_usable())
    }

    fn route_url(&self, entry: &FunctionEntry, call_args: &CallArgs) -> Result<String> {
        let bound = args::bind(&entry.name, &entry.args, call_args)?;
        let path = route::substitute(&entry.name, &entry.route, &bound)?;
        Ok(route::join_url(self.base_url()?, &path))
    }

    /// Invoke a REST entry by name.
    ///
    /// `payload` must be given exactly when the entry declares an input
    /// schema; it is serialized as the JSON request body.
    pub async fn call(
        &self,
        method_name: &str,
        call_args: &CallArgs,
        payload: Option<Value>,
    ) -> Result<Value> {
        let entry = self.reference.function(method_name)?;

        if entry.accepts_input() && payload.is_none() {
            return Err(Error::failure(format!(
                "'{}' requires a payload argument",
                method_name
            )));
        }
        if !entry.accepts_input() && payload.is_some() {
            return Err(Error::failure(format!(
                "'{}' does not take a payload argument",
                method_name
            )));
        }

        let url = self.route_url(entry, call_args)?;
        let method = parse_method(&entry.method)?;
        let body = payload
            .map(|p| serde_json::to_string(&p))
            .transpose()
            .map_err(|e| Error::failure(format!("unserializable payload: {}", e)))?;

        let auth_header = match self.signing_credentials() {
            Some(credentials) => {
                let parsed = Url::parse(&url)
                    .map_err(|e| Error::failure(format!("invalid URL '{}': {}", url, e)))?;
                let ext = hawk::request_ext(credentials, self.authorized_scopes.as_deref())?;
                Some(hawk::sign_request(
                    credentials,
                    &entry.method,
                    &parsed,
                    body.as_deref(),
                    ext.as_deref(),
                )?)
            }
            None => None,
        };

        debug!(client = %self.name, method = %method_name, url, "calling API method");
        dispatch(&self.http, method, &url, body, auth_header, &self.policy).await
    }

    /// Absolute URL for a REST entry, without calling it.
    pub fn build_url(&self, method_name: &str, call_args: &CallArgs) -> Result<String> {
        let entry = self.reference.function(method_name)?;
        self.route_url(entry, call_args)
    }

    /// Signed GET URL for a REST entry: the built URL plus a time-limited
    /// `bewit` query parameter. `ttl_secs` defaults to fifteen minutes,
    /// always relative to now.
    pub fn build_signed_url(
        &self,
        method_name: &str,
        call_args: &CallArgs,
        ttl_secs: Option<i64>,
    ) -> Result<String> {
        let url = self.build_url(method_name, call_args)?;
        let credentials = self
            .signing_credentials()
            .ok_or_else(|| Error::auth("credentials are required to build signed URLs"))?;

        let parsed = Url::parse(&url)
            .map_err(|e| Error::failure(format!("invalid URL '{}': {}", url, e)))?;
        let ext = hawk::request_ext(credentials, self.authorized_scopes.as_deref())?;
        let bewit = hawk::bewit(
            credentials,
            &parsed,
            ttl_secs.unwrap_or(hawk::DEFAULT_BEWIT_TTL_SECS),
            ext.as_deref(),
        )?;

        let separator = if parsed.query().is_some() { '&' } else { '?' };
        Ok(format!("{}{}bewit={}", url, separator, bewit))
    }

    /// Exchange name and routing-key pattern for a topic entry. Pure
    /// computation; the result feeds an external pub/sub transport.
    pub fn exchange_pattern(
        &self,
        exchange_name: &str,
        pattern_args: &PatternArgs,
    ) -> Result<ExchangePattern> {
        let entry = self.reference.topic_exchange(exchange_name)?;
        let routing_key_pattern =
            topic::routing_key_pattern(&entry.name, &entry.routing_key, pattern_args)?;
        Ok(ExchangePattern {
            exchange: topic::exchange_name(&self.exchange_prefix, &entry.exchange),
            routing_key_pattern,
        })
    }
}

fn parse_method(name: &str) -> Result<Method> {
    Method::from_bytes(name.to_uppercase().as_bytes())
        .map_err(|_| Error::failure(format!("unknown HTTP method '{}'", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reference() -> ApiReference {
        ApiReference::from_json(&json!({
            "baseUrl": "https://fake.taskforge.net/v1",
            "exchangePrefix": "test/v1",
            "entries": [
                {
                    "type": "function",
                    "name": "two_args_no_input",
                    "method": "get",
                    "route": "/two_args_no_input/<arg0>/<arg1>",
                    "args": ["arg0", "arg1"]
                },
                {
                    "type": "function",
                    "name": "bad_verb",
                    "method": "g e t",
                    "route": "/bad_verb",
                    "args": []
                },
                {
                    "type": "topic-exchange",
                    "name": "topicName",
                    "exchange": "topicExchange",
                    "routingKey": [
                        {"name": "routingKeyKind", "constant": "primary", "required": true},
                        {"name": "taskId", "required": true},
                        {"name": "routes", "multipleWords": true}
                    ]
                }
            ]
        }))
        .unwrap()
    }

    fn client(config: ClientConfig) -> Client {
        Client::new("testApi", reference(), config).unwrap()
    }

    #[test]
    fn test_build_url_positional_and_keyword_agree() {
        let client = client(ClientConfig::default());
        let expected = "https://fake.taskforge.net/v1/two_args_no_input/arg0/arg1";

        let positional = client
            .build_url("two_args_no_input", &CallArgs::positional(["arg0", "arg1"]))
            .unwrap();
        let keyword = client
            .build_url(
                "two_args_no_input",
                &CallArgs::none().named("arg0", "arg0").named("arg1", "arg1"),
            )
            .unwrap();
        assert_eq!(positional, expected);
        assert_eq!(keyword, expected);
    }

    #[test]
    fn test_build_url_unknown_method_fails() {
        let client = client(ClientConfig::default());
        let err = client.build_url("non-existing", &CallArgs::none()).unwrap_err();
        assert!(matches!(err, Error::Failure(_)));
    }

    #[test]
    fn test_build_url_not_enough_args_fails() {
        let client = client(ClientConfig::default());
        let err = client
            .build_url("two_args_no_input", &CallArgs::positional(["not-enough-args"]))
            .unwrap_err();
        assert!(matches!(err, Error::Failure(_)));
    }

    #[test]
    fn test_config_base_url_overrides_reference() {
        let client = client(ClientConfig::default().with_base_url("http://notlocalhost:5888/v2"));
        let url = client
            .build_url("two_args_no_input", &CallArgs::positional(["a", "b"]))
            .unwrap();
        assert_eq!(url, "http://notlocalhost:5888/v2/two_args_no_input/a/b");
    }

    #[test]
    fn test_non_ascii_credentials_rejected_at_construction() {
        let config =
            ClientConfig::default().with_credentials(Credentials::permanent("\u{1F4A9}", "\u{1F4A9}"));
        let err = Client::new("testApi", reference(), config).unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn test_build_signed_url_shape() {
        let config =
            ClientConfig::default().with_credentials(Credentials::permanent("tester", "no-secret"));
        let client = client(config);
        let url = client
            .build_signed_url(
                "two_args_no_input",
                &CallArgs::positional(["arg0", "arg1"]),
                None,
            )
            .unwrap();
        let (path, bewit) = url.split_once("?bewit=").unwrap();
        assert_eq!(path, "https://fake.taskforge.net/v1/two_args_no_input/arg0/arg1");
        assert!(taskforge_core::hawk::decode_bewit(bewit).is_ok());
    }

    #[test]
    fn test_build_signed_url_without_credentials_fails() {
        let client = client(ClientConfig::default());
        let err = client
            .build_signed_url("two_args_no_input", &CallArgs::positional(["a", "b"]), None)
            .unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
    }

    #[test]
    fn test_exchange_pattern() {
        let client = client(ClientConfig::default());

        let all_wildcards = client
            .exchange_pattern("topicName", &PatternArgs::none())
            .unwrap();
        assert_eq!(all_wildcards.exchange, "test/v1/topicExchange");
        assert_eq!(all_wildcards.routing_key_pattern, "primary.*.#");

        let with_task = client
            .exchange_pattern("topicName", &PatternArgs::by_name([("taskId", "123")]))
            .unwrap();
        assert_eq!(with_task.routing_key_pattern, "primary.123.#");

        let literal = client
            .exchange_pattern("topicName", &PatternArgs::literal("johnwrotethis"))
            .unwrap();
        assert_eq!(literal.routing_key_pattern, "johnwrotethis");
    }

    #[test]
    fn test_exchange_prefix_trailing_slash_is_normalized() {
        let client = client(ClientConfig {
            exchange_prefix: Some("test/v1/".to_owned()),
            ..ClientConfig::default()
        });
        let pattern = client
            .exchange_pattern("topicName", &PatternArgs::none())
            .unwrap();
        assert_eq!(pattern.exchange, "test/v1/topicExchange");
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("get").unwrap(), Method::GET);
        assert_eq!(parse_method("post").unwrap(), Method::POST);
        assert!(parse_method("g e t").is_err());
    }

    #[tokio::test]
    async fn test_unknown_http_verb_fails_before_io() {
        let client = client(ClientConfig::default());
        let err = client.call("bad_verb", &CallArgs::none(), None).await.unwrap_err();
        assert!(matches!(err, Error::Failure(_)));
    }

    #[tokio::test]
    async fn test_payload_mismatches_fail_before_io() {
        let client = client(ClientConfig::default());
        let err = client
            .call(
                "two_args_no_input",
                &CallArgs::positional(["a", "b"]),
                Some(json!({})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Failure(_)));
    }
}
