//! End-to-end tests: real sockets on both sides of the proxy.

use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use forward_proxy::http::Response;
use forward_proxy::net::tunnel::{BAD_GATEWAY, CONNECTION_ESTABLISHED};
use forward_proxy::ProxyConfig;

mod common;
use common::TestProxy;

#[tokio::test]
async fn repeated_get_is_served_from_cache() {
    let (origin, connections) = common::start_mock_origin("hello", Some("max-age=60")).await;
    let proxy = TestProxy::start(ProxyConfig::default()).await;

    let request = format!(
        "GET http://{}/index.html HTTP/1.1\r\nHost: {}\r\n\r\n",
        origin, origin
    );

    let first = Response::parse(&common::send_raw(proxy.addr, &request).await);
    assert_eq!(first.status_code, 200);
    assert_eq!(first.body, b"hello");
    assert_eq!(connections.load(Ordering::SeqCst), 1);

    let second = Response::parse(&common::send_raw(proxy.addr, &request).await);
    assert_eq!(second.status_code, 200);
    assert_eq!(second.body, b"hello");
    assert_eq!(
        connections.load(Ordering::SeqCst),
        1,
        "second request must not reach the origin"
    );
    assert_eq!(proxy.cache.len(), 1);

    proxy.stop().await;
}

#[tokio::test]
async fn no_store_responses_always_reach_origin() {
    let (origin, connections) = common::start_mock_origin("fresh", Some("no-store")).await;
    let proxy = TestProxy::start(ProxyConfig::default()).await;
    let request = format!("GET / HTTP/1.1\r\nHost: {}\r\n\r\n", origin);

    for _ in 0..3 {
        let response = Response::parse(&common::send_raw(proxy.addr, &request).await);
        assert_eq!(response.body, b"fresh");
    }
    assert_eq!(connections.load(Ordering::SeqCst), 3);
    assert!(proxy.cache.is_empty());

    proxy.stop().await;
}

#[tokio::test]
async fn disabled_cache_forwards_every_request() {
    let (origin, connections) = common::start_mock_origin("body", None).await;
    let mut config = ProxyConfig::default();
    config.cache.enabled = false;
    let proxy = TestProxy::start(config).await;
    let request = format!("GET /a HTTP/1.1\r\nHost: {}\r\n\r\n", origin);

    common::send_raw(proxy.addr, &request).await;
    common::send_raw(proxy.addr, &request).await;
    assert_eq!(connections.load(Ordering::SeqCst), 2);

    proxy.stop().await;
}

#[tokio::test]
async fn http_client_through_proxy() {
    let (origin, connections) = common::start_mock_origin("via proxy", None).await;
    let proxy = TestProxy::start(ProxyConfig::default()).await;

    let client = reqwest::Client::builder()
        .proxy(reqwest::Proxy::http(format!("http://{}", proxy.addr)).unwrap())
        .pool_max_idle_per_host(0)
        .build()
        .unwrap();

    let url = format!("http://{}/resource", origin);
    for _ in 0..2 {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.text().await.unwrap(), "via proxy");
    }
    assert_eq!(connections.load(Ordering::SeqCst), 1);

    proxy.stop().await;
}

#[tokio::test]
async fn connect_tunnel_relays_opaque_bytes() {
    let origin = common::start_echo_origin().await;
    let proxy = TestProxy::start(ProxyConfig::default()).await;

    let mut stream = TcpStream::connect(proxy.addr).await.unwrap();
    stream
        .write_all(format!("CONNECT {} HTTP/1.1\r\nHost: {}\r\n\r\n", origin, origin).as_bytes())
        .await
        .unwrap();

    let mut head = vec![0u8; CONNECTION_ESTABLISHED.len()];
    stream.read_exact(&mut head).await.unwrap();
    assert_eq!(head, CONNECTION_ESTABLISHED);

    // Not HTTP: the tunnel must pass it through untouched.
    let payload = b"\x16\x03\x01\x00\x05hello";
    stream.write_all(payload).await.unwrap();
    let mut echoed = vec![0u8; payload.len()];
    stream.read_exact(&mut echoed).await.unwrap();
    assert_eq!(echoed, payload);

    stream.shutdown().await.unwrap();
    let mut tail = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut tail))
        .await
        .unwrap()
        .unwrap();
    assert!(tail.is_empty());
    assert!(proxy.cache.is_empty());

    proxy.stop().await;
}

#[tokio::test]
async fn connect_to_unreachable_origin_is_bad_gateway() {
    let target = common::closed_addr().await;
    let proxy = TestProxy::start(ProxyConfig::default()).await;

    let response = common::send_raw(
        proxy.addr,
        &format!("CONNECT {} HTTP/1.1\r\nHost: {}\r\n\r\n", target, target),
    )
    .await;
    assert_eq!(response, BAD_GATEWAY);

    proxy.stop().await;
}

#[tokio::test]
async fn unreachable_http_origin_closes_silently() {
    let target = common::closed_addr().await;
    let proxy = TestProxy::start(ProxyConfig::default()).await;

    let response =
        common::send_raw(proxy.addr, &format!("GET / HTTP/1.1\r\nHost: {}\r\n\r\n", target)).await;
    assert!(response.is_empty());

    proxy.stop().await;
}

#[tokio::test]
async fn concurrent_clients_are_independent() {
    let (origin, connections) = common::start_mock_origin("shared", None).await;
    let proxy = TestProxy::start(ProxyConfig::default()).await;

    let mut clients = Vec::new();
    for i in 0..16 {
        let addr = proxy.addr;
        clients.push(tokio::spawn(async move {
            let request = format!("GET /item/{} HTTP/1.1\r\nHost: {}\r\n\r\n", i, origin);
            Response::parse(&common::send_raw(addr, &request).await)
        }));
    }

    for client in clients {
        let response = client.await.unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, b"shared");
    }
    assert_eq!(connections.load(Ordering::SeqCst), 16);
    assert_eq!(proxy.cache.len(), 16);

    proxy.stop().await;
}
