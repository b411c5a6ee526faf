//! End-to-end forwarding through the gateway.

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{gateway_config, http_client, refused_addr, start_downstream, start_gateway};

async fn ok_downstream(reply: &'static str) -> common::MockDownstream {
    start_downstream(move |_| async move { (200, reply.to_string()) }).await
}

#[tokio::test]
async fn test_analyze_wraps_body_as_url() {
    let analyze = ok_downstream(r#"{"status":"queued"}"#).await;
    let ask = ok_downstream("{}").await;
    let (gateway, shutdown) = start_gateway(gateway_config(analyze.addr, ask.addr)).await;

    let body = "https://example.com/articles/rust?lang=en";
    let res = http_client()
        .post(format!("http://{}/analyze/foo", gateway))
        .body(body)
        .send()
        .await
        .expect("Gateway unreachable");

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), r#"{"status":"queued"}"#);

    let calls = analyze.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/analyze/foo");
    assert_eq!(calls[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(calls[0].json(), json!({ "url": body }));
    assert_eq!(ask.call_count(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_ask_wraps_body_as_question() {
    let analyze = ok_downstream("{}").await;
    let ask = ok_downstream(r#"{"answer":"42"}"#).await;
    let (gateway, shutdown) = start_gateway(gateway_config(analyze.addr, ask.addr)).await;

    // Not JSON, not trimmed, forwarded verbatim.
    let body = "  What does \"ownership\" mean?\n{not json} ";
    let res = http_client()
        .post(format!("http://{}/ask/foo", gateway))
        .body(body)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), r#"{"answer":"42"}"#);

    let calls = ask.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/ask/foo");
    assert_eq!(calls[0].json(), json!({ "question": body }));
    assert_eq!(analyze.call_count(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_downstream_error_is_relayed() {
    let analyze = start_downstream(|_| async { (422, r#"{"detail":"unsupported url"}"#.to_string()) }).await;
    let ask = start_downstream(|_| async { (500, "model crashed".to_string()) }).await;
    let (gateway, shutdown) = start_gateway(gateway_config(analyze.addr, ask.addr)).await;
    let client = http_client();

    let res = client
        .post(format!("http://{}/analyze/", gateway))
        .body("ftp://nope")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.text().await.unwrap(), r#"{"detail":"unsupported url"}"#);

    let res = client
        .post(format!("http://{}/ask/", gateway))
        .body("why?")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), "model crashed");

    shutdown.trigger();
}

#[tokio::test]
async fn test_empty_body_is_rejected() {
    let analyze = ok_downstream("{}").await;
    let ask = ok_downstream("{}").await;
    let (gateway, shutdown) = start_gateway(gateway_config(analyze.addr, ask.addr)).await;
    let client = http_client();

    let res = client
        .post(format!("http://{}/analyze/x", gateway))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.text().await.unwrap(),
        "'url' parameter is required in the POST body"
    );

    let res = client
        .post(format!("http://{}/ask/x", gateway))
        .body("")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.text().await.unwrap(),
        "'user-input' parameter is required in the POST body"
    );

    assert_eq!(analyze.call_count(), 0);
    assert_eq!(ask.call_count(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_oversized_body_is_too_large_not_empty() {
    let analyze = ok_downstream("{}").await;
    let ask = ok_downstream("{}").await;
    let mut config = gateway_config(analyze.addr, ask.addr);
    config.listener.max_body_bytes = 16;
    let (gateway, shutdown) = start_gateway(config).await;
    let client = http_client();

    let res = client
        .post(format!("http://{}/analyze/x", gateway))
        .body("https://example.com/a/very/long/path")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(res.text().await.unwrap(), "request body exceeds the 16 byte limit");
    assert_eq!(analyze.call_count(), 0);

    // Exactly at the bound is still forwarded.
    let res = client
        .post(format!("http://{}/analyze/x", gateway))
        .body("https://a.io/abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(analyze.calls()[0].json(), json!({ "url": "https://a.io/abc" }));

    shutdown.trigger();
}

#[tokio::test]
async fn test_default_bound_rejects_large_body_with_413() {
    let analyze = ok_downstream("{}").await;
    let ask = ok_downstream("{}").await;
    let (gateway, shutdown) = start_gateway(gateway_config(analyze.addr, ask.addr)).await;

    let res = http_client()
        .post(format!("http://{}/analyze/big", gateway))
        .body("a".repeat(3 * 1024 * 1024))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let text = res.text().await.unwrap();
    assert!(!text.contains("parameter is required"), "{}", text);
    assert_eq!(analyze.call_count(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_query_string_is_not_forwarded() {
    let analyze = ok_downstream("{}").await;
    let ask = ok_downstream("{}").await;
    let (gateway, shutdown) = start_gateway(gateway_config(analyze.addr, ask.addr)).await;

    let res = http_client()
        .post(format!("http://{}/analyze/foo?x=1&lang=en", gateway))
        .body("https://example.com")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let calls = analyze.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "/analyze/foo");
    assert_eq!(calls[0].query, None);

    shutdown.trigger();
}

#[tokio::test]
async fn test_any_inbound_method_is_forwarded_as_post() {
    let analyze = ok_downstream("{}").await;
    let ask = ok_downstream(r#"{"answer":"yes"}"#).await;
    let (gateway, shutdown) = start_gateway(gateway_config(analyze.addr, ask.addr)).await;
    let client = http_client();

    for method in [reqwest::Method::GET, reqwest::Method::PUT, reqwest::Method::DELETE] {
        let res = client
            .request(method.clone(), format!("http://{}/ask/q", gateway))
            .body("is it forwarded?")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK, "method {}", method);
        assert_eq!(res.text().await.unwrap(), r#"{"answer":"yes"}"#);
    }

    let calls = ask.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| c.method == "POST"));
    assert!(calls.iter().all(|c| c.json() == json!({ "question": "is it forwarded?" })));

    shutdown.trigger();
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let analyze = ok_downstream("{}").await;
    let ask = ok_downstream("{}").await;
    let (gateway, shutdown) = start_gateway(gateway_config(analyze.addr, ask.addr)).await;
    let client = http_client();

    for path in ["/unknown/path", "/analyze", "/", "/ASK/x"] {
        let res = client
            .post(format!("http://{}{}", gateway, path))
            .body("payload")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "path {}", path);
    }

    assert_eq!(analyze.call_count(), 0);
    assert_eq!(ask.call_count(), 0);

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_downstream_is_unavailable() {
    let dead = refused_addr().await;
    let (gateway, shutdown) = start_gateway(gateway_config(dead, dead)).await;

    let res = http_client()
        .post(format!("http://{}/analyze/foo", gateway))
        .body("https://example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let text = res.text().await.unwrap();
    assert_eq!(text, "Service unavailable");
    assert!(!text.contains(&dead.port().to_string()));

    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_downstream_hits_deadline() {
    let analyze = start_downstream(|_| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        (200, "too late".to_string())
    })
    .await;
    let ask = ok_downstream("{}").await;
    let mut config = gateway_config(analyze.addr, ask.addr);
    config.timeouts.request_secs = 1;
    let (gateway, shutdown) = start_gateway(config).await;

    let res = http_client()
        .post(format!("http://{}/analyze/slow", gateway))
        .body("https://example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.text().await.unwrap(), "Service unavailable");

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let analyze = ok_downstream("{}").await;
    let ask = ok_downstream("{}").await;
    let (gateway, shutdown) = start_gateway(gateway_config(analyze.addr, ask.addr)).await;
    let client = http_client();

    let res = client
        .post(format!("http://{}/ask/q", gateway))
        .header("x-request-id", "req-1234")
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "req-1234");

    // Generated when the client sends none.
    let res = client
        .post(format!("http://{}/ask/q", gateway))
        .body("hello")
        .send()
        .await
        .unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap().to_string();
    assert!(!generated.is_empty());

    let calls = ask.calls();
    assert_eq!(calls[0].request_id.as_deref(), Some("req-1234"));
    assert_eq!(calls[1].request_id.as_deref(), Some(generated.as_str()));

    shutdown.trigger();
}

#[tokio::test]
async fn test_repeated_forward_sends_identical_payload() {
    let analyze = ok_downstream("{}").await;
    let ask = ok_downstream("{}").await;
    let (gateway, shutdown) = start_gateway(gateway_config(analyze.addr, ask.addr)).await;
    let client = http_client();

    for _ in 0..3 {
        let res = client
            .post(format!("http://{}/analyze/again", gateway))
            .body("https://example.com/ünïcødé")
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let calls = analyze.calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.iter().all(|c| c.body == calls[0].body));

    shutdown.trigger();
}
