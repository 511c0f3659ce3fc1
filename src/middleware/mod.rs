//! Middleware layer.
//!
//! Middleware intercepts requests on the way in and responses on the way
//! out. Register stages with [`Router::layer`](crate::Router::layer).
//!
//! Built-in stages:
//! - [`RequestCorrelator`]: propagates or generates `X-Request-ID`
//! - [`OriginGuard`]: rejects untrusted cross-origin requests with a 403
//! - [`SecurityHeaderInjector`]: stamps `Strict-Transport-Security`
//!
//! [`SecurityConfig::install`](crate::SecurityConfig::install) registers all
//! three in the right order.

use std::ops::ControlFlow;

use crate::context::RequestContext;
use crate::request::Request;
use crate::response::Response;

pub mod hsts;
pub mod origin;
pub mod request_id;

pub use hsts::SecurityHeaderInjector;
pub use origin::{DenyReason, GuardPolicy, GuardPolicyBuilder, OriginDecision, OriginGuard};
pub use request_id::RequestCorrelator;

/// One stage of the request/response pipeline.
///
/// Stages are shared by every in-flight request, so they hold only
/// immutable configuration. Per-request state goes in the request's
/// [`RequestContext`].
pub trait Middleware: Send + Sync + 'static {
    /// Runs before the handler. Break with a response to short-circuit.
    fn before(&self, _req: &mut Request) -> ControlFlow<Response> {
        ControlFlow::Continue(())
    }

    /// Runs on every outgoing response, including short-circuited ones.
    fn after(&self, _ctx: &RequestContext, _res: &mut Response) {}
}
