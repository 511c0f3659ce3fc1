#![allow(dead_code)]

use bytes::Bytes;
use warden::{Method, Request, Response, Router, SecurityConfig};

pub const HSTS: &str = "max-age=86400; includeSubDomains";

/// The demo app's routes behind `config`.
pub fn app(config: &SecurityConfig) -> Router {
    config.install(
        Router::new()
            .on(Method::Get, "/api/ip", ip)
            .on(Method::Post, "/api/ip", ip)
            .on(Method::Get, "/static/index.html", index)
            .on(Method::Get, "/api/crash", crash),
    )
}

/// Default config with `foobar.com` allow-listed.
pub fn foobar() -> SecurityConfig {
    SecurityConfig {
        allowed_origins: vec!["foobar.com".to_owned()],
        ..SecurityConfig::default()
    }
}

pub fn request(method: &str, path: &str, headers: &[(&str, &str)]) -> Request {
    let mut builder = http::Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Bytes::new()).unwrap().into()
}

async fn ip(req: Request) -> Response {
    Response::json(format!(
        r#"{{"data":{{"ip":"127.0.0.1"}},"request_id":"{}"}}"#,
        req.request_id().unwrap_or(""),
    ))
}

async fn index(_req: Request) -> Response {
    Response::html("<html></html>")
}

async fn crash(_req: Request) -> Response {
    panic!("handler bug")
}
