//! Incoming HTTP request type.

use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use http::HeaderMap;

use crate::context::RequestContext;

/// An incoming HTTP request with its body fully read.
///
/// Carries the typed [`RequestContext`] slot that middleware fills in before
/// the handler runs.
pub struct Request {
    method: http::Method,
    uri: http::Uri,
    headers: HeaderMap,
    body: Bytes,
    pub(crate) params: HashMap<String, String>,
    peer: Option<SocketAddr>,
    context: RequestContext,
}

impl Request {
    pub fn method(&self) -> &str { self.method.as_str() }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Address of the connected peer, when the request came off a socket.
    pub fn peer_addr(&self) -> Option<SocketAddr> { self.peer }

    /// Case-insensitive header lookup.
    ///
    /// Returns `None` for absent headers and for values that are not visible
    /// ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `Host` header, or the URI authority for HTTP/2 requests that only
    /// send `:authority`.
    pub fn host(&self) -> Option<&str> {
        self.header("host")
            .or_else(|| self.uri.authority().map(http::uri::Authority::as_str))
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn context(&self) -> &RequestContext { &self.context }
    pub fn context_mut(&mut self) -> &mut RequestContext { &mut self.context }

    /// The correlation id assigned to this request, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.context.correlation_id()
    }

    pub(crate) fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub(crate) fn http_method(&self) -> &http::Method { &self.method }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params: HashMap::new(),
            peer: None,
            context: RequestContext::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(builder: http::request::Builder) -> Request {
        builder.body(Bytes::new()).unwrap().into()
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = request(http::Request::get("/").header("X-Request-ID", "abc"));
        assert_eq!(req.header("x-request-id"), Some("abc"));
        assert_eq!(req.header("X-REQUEST-ID"), Some("abc"));
        assert_eq!(req.header("origin"), None);
    }

    #[test]
    fn host_falls_back_to_uri_authority() {
        let req = request(http::Request::get("https://foobar.com:8443/api/ip"));
        assert_eq!(req.host(), Some("foobar.com:8443"));

        let req = request(
            http::Request::get("https://foobar.com/api/ip").header("host", "other.com"),
        );
        assert_eq!(req.host(), Some("other.com"));
    }

    #[test]
    fn every_request_starts_with_an_empty_context() {
        let req = request(http::Request::get("/api/ip").header("x-request-id", "abc"));
        assert_eq!(req.request_id(), None);
        assert_eq!(req.path(), "/api/ip");
    }
}
