//! Demo API behind the full security pipeline.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example api
//!   RUST_LOG=debug cargo run --example api -- --config warden.toml --bind 127.0.0.1:8000
//!
//! Try:
//!   curl -i http://localhost:8443/                                   # unprotected, 200
//!   curl -i http://localhost:8443/api/ip                             # no Origin, 403
//!   curl -i -H 'Origin: http://localhost:8443' http://localhost:8443/api/ip
//!   curl -i -H 'Origin: http://evil.com'       http://localhost:8443/api/ip
//!   curl -i -H 'X-Request-ID: abc-123' -H 'Origin: http://localhost:8443' \
//!        http://localhost:8443/api/ip                                # echoes abc-123

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use warden::{Method, Request, Response, Router, SecurityConfig, Server};

#[derive(Parser)]
#[command(name = "api", about = "warden demo API")]
struct Args {
    /// Address to listen on.
    #[arg(short, long, default_value = "0.0.0.0:8443")]
    bind: String,

    /// TOML security config. Without it the demo allow-list is used.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

const INDEX: &str = r#"<!doctype html>
<html>
  <body>
    <pre id="out">…</pre>
    <script>
      fetch("/api/ip", { method: "POST" })
        .then((r) => r.text())
        .then((t) => (document.getElementById("out").textContent = t));
    </script>
  </body>
</html>
"#;

#[tokio::main]
async fn main() -> Result<(), warden::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warden=info".into()))
        .init();

    let args = Args::parse();

    let config = match args.config {
        Some(path) => SecurityConfig::load(path)?,
        None => SecurityConfig {
            allowed_origins: [
                "127.0.0.1:8443",
                "localhost:8443",
                "127.0.0.1:8000",
                "localhost:8000",
                "localhost",
                "foobar.com",
            ]
            .map(String::from)
            .to_vec(),
            ..SecurityConfig::default()
        },
    };

    let app = config.install(
        Router::new()
            .on(Method::Get,  "/",       index)
            .on(Method::Get,  "/api/ip", ip)
            // Browsers only send Origin on GET for cross-origin fetches; POST
            // makes same-origin calls from the index page carry it too.
            .on(Method::Post, "/api/ip", ip),
    );

    Server::bind(&args.bind)?.serve(app).await
}

// GET /
async fn index(_req: Request) -> Response {
    Response::html(INDEX)
}

// GET|POST /api/ip
//
// Behind a proxy the peer is the proxy, so prefer the address it forwards.
async fn ip(req: Request) -> Response {
    let ip = req
        .header("x-real-ip")
        .and_then(|v| v.parse::<IpAddr>().ok())
        .or_else(|| req.peer_addr().map(|a| a.ip()))
        .map(|ip| ip.to_string())
        .unwrap_or_default();

    tracing::info!(request_id = req.request_id().unwrap_or("-"), %ip, "ip lookup");
    Response::json(format!(r#"{{"data":{{"ip":"{ip}"}}}}"#))
}
