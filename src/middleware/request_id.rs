//! Request correlation ids.
//!
//! Every request leaves with an `X-Request-ID`. A non-empty id sent by the
//! caller is propagated verbatim so traces line up across hops; otherwise a
//! UUID v4 is minted, unless generation is switched off, in which case the
//! request simply has no id. Correlation is best-effort: a missing or
//! unencodable id never fails a request.

use std::ops::ControlFlow;

use http::header::{HeaderName, HeaderValue};
use tracing::info;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::Response;

pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Assigns a correlation id on the way in and echoes it on the way out.
#[derive(Clone, Copy, Debug)]
pub struct RequestCorrelator {
    generate: bool,
}

impl RequestCorrelator {
    /// `generate` controls whether requests without an inbound id get a fresh one.
    pub fn new(generate: bool) -> Self {
        Self { generate }
    }

    /// Builds the context for `req` from its `X-Request-ID` header.
    pub fn assign(&self, req: &Request) -> RequestContext {
        match req.header(X_REQUEST_ID.as_str()).filter(|id| !id.is_empty()) {
            Some(id) => RequestContext::with_correlation_id(id),
            None if self.generate => RequestContext::with_correlation_id(Uuid::new_v4().to_string()),
            None => RequestContext::new(),
        }
    }

    /// Copies the context's id onto `res`. No-op when there is none.
    pub fn attach(res: &mut Response, ctx: &RequestContext) {
        let Some(id) = ctx.correlation_id() else { return };
        if let Ok(value) = HeaderValue::from_str(id) {
            res.set_header(X_REQUEST_ID.clone(), value);
        }
    }
}

impl Default for RequestCorrelator {
    fn default() -> Self { Self::new(true) }
}

impl Middleware for RequestCorrelator {
    fn before(&self, req: &mut Request) -> ControlFlow<Response> {
        let ctx = self.assign(req);
        if let Some(id) = ctx.correlation_id() {
            info!(request_id = %id, method = req.method(), path = req.path(), "request");
        }
        *req.context_mut() = ctx;
        ControlFlow::Continue(())
    }

    fn after(&self, ctx: &RequestContext, res: &mut Response) {
        Self::attach(res, ctx);
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn request(id: Option<&str>) -> Request {
        let mut builder = http::Request::get("/api/ip");
        if let Some(id) = id {
            builder = builder.header("X-Request-ID", id);
        }
        builder.body(Bytes::new()).unwrap().into()
    }

    #[test]
    fn propagates_inbound_id_verbatim() {
        let ctx = RequestCorrelator::new(true).assign(&request(Some("abc-123")));
        assert_eq!(ctx.correlation_id(), Some("abc-123"));
    }

    #[test]
    fn generates_uuid_when_missing_or_empty() {
        let correlator = RequestCorrelator::new(true);
        for req in [request(None), request(Some(""))] {
            let ctx = correlator.assign(&req);
            let id = ctx.correlation_id().expect("generated id");
            assert!(Uuid::parse_str(id).is_ok(), "not a uuid: {id}");
        }
    }

    #[test]
    fn leaves_context_unset_when_generation_disabled() {
        let ctx = RequestCorrelator::new(false).assign(&request(None));
        assert_eq!(ctx.correlation_id(), None);

        let ctx = RequestCorrelator::new(false).assign(&request(Some("abc")));
        assert_eq!(ctx.correlation_id(), Some("abc"));
    }

    #[test]
    fn generated_ids_differ() {
        let correlator = RequestCorrelator::new(true);
        let a = correlator.assign(&request(None));
        let b = correlator.assign(&request(None));
        assert_ne!(a.correlation_id(), b.correlation_id());
    }

    #[test]
    fn attach_is_noop_without_id() {
        let mut res = Response::text("ok");
        RequestCorrelator::attach(&mut res, &RequestContext::new());
        assert_eq!(res.header("x-request-id"), None);
    }

    #[test]
    fn attach_overwrites_existing_header() {
        let mut res = Response::builder().header("x-request-id", "stale").no_body();
        RequestCorrelator::attach(&mut res, &RequestContext::with_correlation_id("abc-123"));
        assert_eq!(res.header("X-Request-ID"), Some("abc-123"));
        assert_eq!(res.headers().get_all("x-request-id").iter().count(), 1);
    }

    #[test]
    fn before_stores_context_on_request() {
        let mut req = request(Some("abc-123"));
        let flow = RequestCorrelator::default().before(&mut req);
        assert!(flow.is_continue());
        assert_eq!(req.request_id(), Some("abc-123"));
    }
}
