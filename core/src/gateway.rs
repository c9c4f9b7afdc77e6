//! Single point of egress for every API call.
//!
//! # Design
//! A call goes through two steps. `build_request` is pure: it composes the
//! URL, converts body keys for the wire, applies headers and runs the auth
//! interceptor. The `Transport` then executes the request. Whatever happens,
//! `request` returns an `Envelope`; callers never see a transport error.
//!
//! Calls are at-most-once. There is no retry; a timeout is available per
//! gateway (`GatewayConfig::timeout`) and per call (`RequestOptions::timeout`).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::config::GatewayConfig;
use crate::envelope::Envelope;
use crate::error::{CaseError, GatewayError};
use crate::http::{set_header, HttpMethod, HttpRequest};
use crate::keycase::{convert_keys, Direction};
use crate::token::TokenStore;
use crate::transport::{Transport, UreqTransport};

/// A scalar that can appear in a query string.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Str(s) => f.write_str(s),
            QueryValue::Int(n) => write!(f, "{n}"),
            QueryValue::Float(n) => write!(f, "{n}"),
            QueryValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(s: &str) -> Self {
        QueryValue::Str(s.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(s: String) -> Self {
        QueryValue::Str(s)
    }
}

impl From<i32> for QueryValue {
    fn from(n: i32) -> Self {
        QueryValue::Int(n.into())
    }
}

impl From<i64> for QueryValue {
    fn from(n: i64) -> Self {
        QueryValue::Int(n)
    }
}

impl From<f64> for QueryValue {
    fn from(n: f64) -> Self {
        QueryValue::Float(n)
    }
}

impl From<bool> for QueryValue {
    fn from(b: bool) -> Self {
        QueryValue::Bool(b)
    }
}

/// Everything a caller can say about one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    /// Path relative to the gateway's base URL.
    pub url: String,
    /// Flat query parameters, encoded in insertion order.
    pub query: Vec<(String, QueryValue)>,
    /// Body in UI (camelCase) form. Keys are converted before sending.
    pub body: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new(method: HttpMethod, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn query(mut self, key: &str, value: impl Into<QueryValue>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        set_header(&mut self.headers, name, value.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Extras the verb helpers pass through to `request`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    pub query: Vec<(String, QueryValue)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: &str, value: impl Into<QueryValue>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        set_header(&mut self.headers, name, value.to_string());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn into_request(self, method: HttpMethod, url: &str, body: Option<Value>) -> RequestOptions {
        RequestOptions {
            method,
            url: url.to_string(),
            query: self.query,
            body,
            headers: self.headers,
            timeout: self.timeout,
        }
    }
}

/// Wire-format policy: GET payloads are camelCased, every other verb sends
/// snake_case.
pub fn convert_keys_for_method(data: &Value, method: HttpMethod) -> Result<Value, CaseError> {
    let direction = match method {
        HttpMethod::Get => Direction::ToCamelCase,
        _ => Direction::ToSnakeCase,
    };
    convert_keys(data, direction)
}

/// Capability handed to services that need to talk to the API.
///
/// Only `request` is required; the verb methods just shape parameters.
/// The `*_with` forms take query, headers and timeout as `CallOptions`.
pub trait Gateway {
    fn request(&self, options: RequestOptions) -> Envelope;

    fn get(&self, url: &str) -> Envelope {
        self.get_with(url, CallOptions::default())
    }

    fn get_with(&self, url: &str, call: CallOptions) -> Envelope {
        self.request(call.into_request(HttpMethod::Get, url, None))
    }

    fn post(&self, url: &str, body: Option<Value>) -> Envelope {
        self.post_with(url, body, CallOptions::default())
    }

    fn post_with(&self, url: &str, body: Option<Value>, call: CallOptions) -> Envelope {
        self.request(call.into_request(HttpMethod::Post, url, body))
    }

    fn put(&self, url: &str, body: Value) -> Envelope {
        self.put_with(url, body, CallOptions::default())
    }

    fn put_with(&self, url: &str, body: Value, call: CallOptions) -> Envelope {
        self.request(call.into_request(HttpMethod::Put, url, Some(body)))
    }

    fn patch(&self, url: &str, body: Value) -> Envelope {
        self.patch_with(url, body, CallOptions::default())
    }

    fn patch_with(&self, url: &str, body: Value, call: CallOptions) -> Envelope {
        self.request(call.into_request(HttpMethod::Patch, url, Some(body)))
    }

    fn delete(&self, url: &str) -> Envelope {
        self.delete_with(url, CallOptions::default())
    }

    fn delete_with(&self, url: &str, call: CallOptions) -> Envelope {
        self.request(call.into_request(HttpMethod::Delete, url, None))
    }
}

impl<G: Gateway + ?Sized> Gateway for &G {
    fn request(&self, options: RequestOptions) -> Envelope {
        (**self).request(options)
    }
}

impl<G: Gateway + ?Sized> Gateway for Arc<G> {
    fn request(&self, options: RequestOptions) -> Envelope {
        (**self).request(options)
    }
}

/// HTTP client for the tracker API.
pub struct ApiGateway<T = UreqTransport> {
    config: GatewayConfig,
    transport: T,
    tokens: Arc<dyn TokenStore>,
}

impl ApiGateway<UreqTransport> {
    pub fn new(config: GatewayConfig, tokens: Arc<dyn TokenStore>) -> Self {
        let transport = UreqTransport::new(&config);
        Self::with_transport(config, transport, tokens)
    }
}

impl<T: Transport> ApiGateway<T> {
    pub fn with_transport(mut config: GatewayConfig, transport: T, tokens: Arc<dyn TokenStore>) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            config,
            transport,
            tokens,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Produce the request that `request` would send, without sending it.
    pub fn build_request(&self, options: &RequestOptions) -> Result<HttpRequest, CaseError> {
        let body = options
            .body
            .as_ref()
            .map(|body| convert_keys_for_method(body, options.method))
            .transpose()?
            .map(|body| body.to_string());

        let mut request = HttpRequest {
            method: options.method,
            url: self.compose_url(options),
            headers: Vec::new(),
            body,
            timeout: options.timeout,
        };
        if request.body.is_some() {
            request.set_header("content-type", self.config.content_type.as_str());
        }
        for (name, value) in &options.headers {
            request.set_header(name, value.as_str());
        }
        self.intercept(&mut request);
        Ok(request)
    }

    /// Attach the bearer token when the session holds one. Runs after the
    /// caller's headers, so it has the last word on `authorization`.
    fn intercept(&self, request: &mut HttpRequest) {
        if let Some(token) = self.tokens.get() {
            request.set_header("authorization", format!("Bearer {token}"));
        }
    }

    fn compose_url(&self, options: &RequestOptions) -> String {
        let mut url = self.config.base_url.clone();
        if !options.url.starts_with('/') {
            url.push('/');
        }
        url.push_str(&options.url);

        if !options.query.is_empty() {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (key, value) in &options.query {
                serializer.append_pair(key, &value.to_string());
            }
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&serializer.finish());
        }
        url
    }

    /// Send one request and normalize the outcome. Never fails.
    pub fn request(&self, options: RequestOptions) -> Envelope {
        let outcome = self
            .build_request(&options)
            .map_err(GatewayError::from)
            .and_then(|request| self.transport.execute(&request).map_err(GatewayError::from));

        match outcome {
            Ok(response) => {
                debug!(method = %options.method, url = %options.url, status = response.status, "API request completed");
                Envelope::from_response(response)
            }
            Err(e) => {
                warn!(method = %options.method, url = %options.url, error = %e, "API request failed");
                Envelope::failure(&e)
            }
        }
    }
}

impl<T: Transport> Gateway for ApiGateway<T> {
    fn request(&self, options: RequestOptions) -> Envelope {
        ApiGateway::request(self, options)
    }
}
