//! # warden
//!
//! A small hyper server whose request pipeline refuses untrusted
//! cross-origin calls, tags every request with a correlation id, and stamps
//! `Strict-Transport-Security` on every response.
//!
//! ## The pipeline
//!
//! ```text
//! request ──► RequestCorrelator ──► OriginGuard ──► handler
//!                                       │ 403
//! response ◄── RequestCorrelator ◄── SecurityHeaderInjector ◄┘
//! ```
//!
//! - [`middleware::RequestCorrelator`]: reuses the caller's `X-Request-ID`
//!   or mints a UUID, and echoes it on the response
//! - [`middleware::OriginGuard`]: on protected paths, checks `Origin`
//!   (or `Referer`) against `Host` and an allow-list; anything else gets
//!   `403 {"error":"access denied"}`
//! - [`middleware::SecurityHeaderInjector`]: HSTS on every response,
//!   denials included
//!
//! This is not CORS: there is no preflight handling and no per-route policy.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use warden::{Method, Request, Response, Router, SecurityConfig, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), warden::Error> {
//!     let config = SecurityConfig {
//!         allowed_origins: vec!["localhost:8443".into()],
//!         ..SecurityConfig::default()
//!     };
//!
//!     let app = config.install(Router::new().on(Method::Get, "/api/ip", ip));
//!
//!     Server::bind("0.0.0.0:8443")?.serve(app).await
//! }
//!
//! async fn ip(req: Request) -> Response {
//!     let ip = req.peer_addr().map(|a| a.ip().to_string()).unwrap_or_default();
//!     Response::json(format!(r#"{{"data":{{"ip":"{ip}"}}}}"#))
//! }
//! ```

mod config;
mod context;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod middleware;

pub use config::SecurityConfig;
pub use context::RequestContext;
pub use error::Error;
pub use handler::Handler;
pub use method::Method;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::{Server, serve_listener};
pub use status::Status;
