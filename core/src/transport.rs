//! Executing `HttpRequest` values against the network.
//!
//! # Design
//! `Transport` is the seam between the pure request pipeline and real I/O.
//! Tests implement it with scripted responses; production uses
//! `UreqTransport`. A received status of any kind is `Ok`; `Err` means no
//! response was obtained at all. Once a status line has arrived it is
//! never discarded: a body that cannot be read (too large, cut short) is
//! replaced by an empty one.
//!
//! The wire request is exactly the `HttpRequest`. A GET that carries a body
//! sends it.

use std::time::Duration;

use tracing::{debug, warn};
use ureq::{Agent, RequestBuilder};

use crate::config::GatewayConfig;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Blocking transport over a ureq agent.
///
/// With credentials included one agent, and its cookie jar, is shared by
/// every call so cookies the server sets are sent back. Without them each
/// call gets a fresh agent and nothing carries over.
pub struct UreqTransport {
    shared: Option<Agent>,
    timeout: Option<Duration>,
    max_body_bytes: u64,
}

impl UreqTransport {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            shared: config.with_credentials.then(|| build_agent(config.timeout)),
            timeout: config.timeout,
            max_body_bytes: config.max_body_bytes,
        }
    }

    fn agent(&self) -> Agent {
        match &self.shared {
            Some(agent) => agent.clone(),
            None => build_agent(self.timeout),
        }
    }
}

/// Status codes are data here, never errors.
fn build_agent(timeout: Option<Duration>) -> Agent {
    Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(timeout)
        .build()
        .new_agent()
}

fn prepare<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(timeout) = request.timeout {
        builder = builder.config().timeout_global(Some(timeout)).build();
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = self.agent();
        let url = request.url.as_str();
        debug!(method = %request.method, url, "Sending request");

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, None) => prepare(agent.get(url), request).call(),
            (HttpMethod::Get, Some(body)) => prepare(agent.get(url), request)
                .force_send_body()
                .send(body.as_bytes()),
            (HttpMethod::Delete, None) => prepare(agent.delete(url), request).call(),
            (HttpMethod::Delete, Some(body)) => prepare(agent.delete(url), request)
                .force_send_body()
                .send(body.as_bytes()),
            (HttpMethod::Post, Some(body)) => prepare(agent.post(url), request).send(body.as_bytes()),
            (HttpMethod::Post, None) => prepare(agent.post(url), request).send_empty(),
            (HttpMethod::Put, Some(body)) => prepare(agent.put(url), request).send(body.as_bytes()),
            (HttpMethod::Put, None) => prepare(agent.put(url), request).send_empty(),
            (HttpMethod::Patch, Some(body)) => prepare(agent.patch(url), request).send(body.as_bytes()),
            (HttpMethod::Patch, None) => prepare(agent.patch(url), request).send_empty(),
        };
        let mut response = result?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = match response
            .body_mut()
            .with_config()
            .limit(self.max_body_bytes)
            .read_to_string()
        {
            Ok(body) => body,
            Err(e) => {
                warn!(status, url, error = %e, "Response body dropped");
                String::new()
            }
        };

        debug!(status, url, "Received response");
        Ok(HttpResponse { status, headers, body })
    }
}
