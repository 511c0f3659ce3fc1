//! Radix-tree request router and the middleware pipeline around it.
//!
//! One tree per HTTP method. O(path-length) lookup. Middleware registered
//! with [`Router::layer`] wraps every request, matched or not.

use std::any::Any;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use matchit::Router as MatchitRouter;
use tracing::{Instrument, error, info_span};

use crate::context::RequestContext;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

const SERVER_ERROR_BODY: &str = r#"{"error":{"message":"server_error"}}"#;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so calls chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    middleware: Vec<Box<dyn Middleware>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), middleware: Vec::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax: `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` conflicts with an already registered route.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Append a middleware stage.
    ///
    /// `before` hooks run in registration order; `after` hooks run in
    /// reverse, so the first stage registered sees the request first and the
    /// response last.
    pub fn layer(mut self, stage: impl Middleware) -> Self {
        self.middleware.push(Box::new(stage));
        self
    }

    /// Runs one request through the pipeline and returns its response.
    ///
    /// A `before` hook that breaks skips the remaining `before` hooks and the
    /// handler. `after` hooks always run, for every registered stage, even
    /// when the handler panics (it is answered with a `500`).
    pub async fn dispatch(&self, mut req: Request) -> Response {
        let mut early = None;
        for stage in &self.middleware {
            if let ControlFlow::Break(res) = stage.before(&mut req) {
                early = Some(res);
                break;
            }
        }

        let context = req.context().clone();
        let mut res = match early {
            Some(res) => res,
            None => self.route(req).await,
        };

        for stage in self.middleware.iter().rev() {
            stage.after(&context, &mut res);
        }
        res
    }

    /// Runs the `after` hooks on a response produced before a [`Request`]
    /// existed (unreadable body), with an empty context.
    pub(crate) fn finish(&self, mut res: Response) -> Response {
        let context = RequestContext::new();
        for stage in self.middleware.iter().rev() {
            stage.after(&context, &mut res);
        }
        res
    }

    async fn route(&self, mut req: Request) -> Response {
        let Ok(method) = Method::try_from(req.http_method()) else {
            return Response::status(Status::MethodNotAllowed);
        };
        let Some((handler, params)) = self.lookup(method, req.path()) else {
            return Response::status(Status::NotFound);
        };
        req.params = params;

        let span = info_span!(
            "request",
            request_id = req.request_id().unwrap_or("-"),
            method = %method,
            path = req.path(),
        );
        match AssertUnwindSafe(handler.call(req).instrument(span.clone()))
            .catch_unwind()
            .await
        {
            Ok(res) => res,
            Err(panic) => {
                span.in_scope(|| error!(panic = panic_message(&*panic), "handler panicked"));
                Response::builder()
                    .status(Status::InternalServerError)
                    .json(SERVER_ERROR_BODY)
            }
        }
    }

    fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic.downcast_ref::<&str>().copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
