mod common;

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use common::{HSTS, app, foobar};

/// Sends one HTTP/1.1 request with `Connection: close` and returns the raw response.
async fn roundtrip(addr: SocketAddr, path: &str, headers: &[(&str, &str)]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let mut raw = format!("GET {path} HTTP/1.1\r\nconnection: close\r\n");
    for (name, value) in headers {
        raw.push_str(&format!("{name}: {value}\r\n"));
    }
    raw.push_str("\r\n");
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();
    out
}

#[tokio::test]
async fn serves_pipeline_over_tcp_and_shuts_down() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let server = tokio::spawn(warden::serve_listener(listener, app(&foobar()), async {
        stopped.await.ok();
    }));

    let denied = roundtrip(addr, "/api/ip", &[("host", "foobar.com"), ("x-request-id", "abc-123")]).await;
    assert!(denied.starts_with("HTTP/1.1 403"), "{denied}");
    assert!(denied.contains(&format!("strict-transport-security: {HSTS}")), "{denied}");
    assert!(denied.contains("x-request-id: abc-123"), "{denied}");
    assert!(denied.ends_with(r#"{"error":"access denied"}"#), "{denied}");

    let allowed = roundtrip(addr, "/api/ip", &[("host", "foobar.com"), ("origin", "https://foobar.com")]).await;
    assert!(allowed.starts_with("HTTP/1.1 200"), "{allowed}");
    assert!(allowed.contains("x-request-id: "), "{allowed}");

    let static_page = roundtrip(addr, "/static/index.html", &[("host", "foobar.com")]).await;
    assert!(static_page.starts_with("HTTP/1.1 200"), "{static_page}");

    let crashed = roundtrip(addr, "/api/crash", &[("host", "foobar.com"), ("origin", "https://foobar.com")]).await;
    assert!(crashed.starts_with("HTTP/1.1 500"), "{crashed}");
    assert!(crashed.contains(&format!("strict-transport-security: {HSTS}")), "{crashed}");
    assert!(crashed.ends_with(r#"{"error":{"message":"server_error"}}"#), "{crashed}");

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}

#[test]
fn bind_rejects_bad_address() {
    let err = warden::Server::bind("not an address").err().unwrap();
    assert!(matches!(err, warden::Error::InvalidAddress(_)));
}
