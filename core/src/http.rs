//! HTTP transport types described as plain data.
//!
//! # Design
//! The gateway builds an `HttpRequest` without touching the network and a
//! `Transport` turns it into an `HttpResponse`. Keeping both sides as owned
//! data makes the request pipeline deterministic and lets tests swap the
//! transport for a scripted one.
//!
//! Header names are kept lowercase so lookups and replacement are
//! case-insensitive without extra bookkeeping.

use std::time::Duration;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request ready to be executed by a `Transport`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Absolute URL including the query string.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    /// Abort the call after this long. `None` defers to the transport.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Set `name` to `value`, replacing any previous header of that name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        set_header(&mut self.headers, name, value.into());
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response as returned by a `Transport`. Any status is a response;
/// 4xx and 5xx are not errors at this layer.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

pub(crate) fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    let name = name.to_ascii_lowercase();
    headers.retain(|(existing, _)| *existing != name);
    headers.push((name, value));
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost/api".to_string(),
            headers: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    #[test]
    fn set_header_lowercases_and_replaces() {
        let mut req = request();
        req.set_header("Content-Type", "text/plain");
        req.set_header("content-type", "application/json");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn header_lookup_ignores_case() {
        let mut req = request();
        req.set_header("Authorization", "Bearer abc");
        assert_eq!(req.header("AUTHORIZATION"), Some("Bearer abc"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[test]
    fn method_names_are_uppercase() {
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}
