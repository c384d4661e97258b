mod support;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use goodwork_client::{ApiOutcome, BACKEND_UNREACHABLE, RequestOptions};
use httpmock::prelude::*;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use support::{client_at, client_for, watch};

#[tokio::test]
async fn expired_token_is_refreshed_and_request_retried_once() {
    let server = MockServer::start_async().await;
    let stale = server.mock(|when, then| {
        when.method(GET)
            .path("/api/home")
            .header("authorization", "Bearer old");
        then.status(401)
            .header("content-type", "application/json")
            .json_body(json!({"msg": "Token has expired"}));
    });
    let refresh = server.mock(|when, then| {
        when.method(POST)
            .path("/refresh")
            .header("authorization", "Bearer refresh-1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"JWT": "new"}));
    });
    let fresh = server.mock(|when, then| {
        when.method(GET)
            .path("/api/home")
            .header("authorization", "Bearer new");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"business_name": "Cafe"}));
    });

    let client = client_for(&server);
    client.tokens().save_token("old");
    client.tokens().save_refresh_token("refresh-1");

    let outcome = client
        .authenticated_request("/api/home", &RequestOptions::get())
        .await
        .expect("request completes");

    assert_eq!(outcome, ApiOutcome::Success(json!({"business_name": "Cafe"})));
    stale.assert();
    refresh.assert();
    fresh.assert();
    assert_eq!(client.tokens().get_token().as_deref(), Some("new"));
}

#[tokio::test]
async fn rejected_refresh_clears_session_and_redirects() {
    let server = MockServer::start_async().await;
    let original = server.mock(|when, then| {
        when.method(POST).path("/api/employee/post_shift");
        then.status(401);
    });
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/refresh");
        then.status(401)
            .header("content-type", "application/json")
            .json_body(json!({"msg": "Token has been revoked"}));
    });

    let redirects = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&redirects);
    let client = client_for(&server).with_reauth_hook(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    client.tokens().save_token("old");
    client.tokens().save_refresh_token("revoked");

    let outcome = client
        .authenticated_request(
            "/api/employee/post_shift",
            &RequestOptions::post(json!({"shift_id": "s-1"})),
        )
        .await
        .expect("request completes");

    assert_eq!(outcome, ApiOutcome::Redirected);
    assert_eq!(original.hits(), 1);
    assert_eq!(refresh.hits(), 1);
    assert_eq!(redirects.load(Ordering::SeqCst), 1);
    assert_eq!(client.tokens().get_token(), None);
    assert_eq!(client.tokens().get_refresh_token(), None);
    assert!(!client.connectivity().is_offline());
}

#[tokio::test]
async fn bad_request_with_refresh_token_refreshes_and_retries() {
    let server = MockServer::start_async().await;
    let stale = server.mock(|when, then| {
        when.method(POST)
            .path("/api/employee/take_shift")
            .header("authorization", "Bearer old");
        then.status(400)
            .header("content-type", "application/json")
            .json_body(json!({"msg": "Bad Authorization header"}));
    });
    let refresh = server.mock(|when, then| {
        when.method(POST)
            .path("/refresh")
            .header("authorization", "Bearer refresh-1");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"JWT": "new"}));
    });
    let fresh = server.mock(|when, then| {
        when.method(POST)
            .path("/api/employee/take_shift")
            .header("authorization", "Bearer new");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"message": "Shift taken"}));
    });

    let client = client_for(&server);
    client.tokens().save_token("old");
    client.tokens().save_refresh_token("refresh-1");

    let outcome = client
        .authenticated_request(
            "/api/employee/take_shift",
            &RequestOptions::post(json!({"shift_id": "s-1"})),
        )
        .await
        .expect("request completes");

    assert_eq!(outcome, ApiOutcome::Success(json!({"message": "Shift taken"})));
    assert_eq!(stale.hits(), 1);
    assert_eq!(refresh.hits(), 1);
    assert_eq!(fresh.hits(), 1);
}

#[tokio::test]
async fn retry_is_not_refreshed_a_second_time() {
    let server = MockServer::start_async().await;
    let original = server.mock(|when, then| {
        when.method(GET).path("/api/activity");
        then.status(401)
            .header("content-type", "application/json")
            .json_body(json!({"message": "Token has been revoked"}));
    });
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/refresh");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"JWT": "new"}));
    });

    let client = client_for(&server);
    client.tokens().save_token("old");
    client.tokens().save_refresh_token("refresh-1");

    let outcome = client
        .authenticated_request("/api/activity", &RequestOptions::get())
        .await
        .expect("request completes");

    let ApiOutcome::Rejected(problem) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert_eq!(problem.status, 401);
    assert_eq!(problem.message, "Token has been revoked");
    assert_eq!(original.hits(), 2);
    assert_eq!(refresh.hits(), 1);
}

#[tokio::test]
async fn concurrent_rejected_refresh_runs_reauth_hook_once() {
    let server = MockServer::start_async().await;
    let original = server.mock(|when, then| {
        when.method(GET).path("/api/home");
        then.status(401);
    });
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/refresh");
        then.status(401).delay(Duration::from_millis(100));
    });

    let redirects = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&redirects);
    let client = client_for(&server).with_reauth_hook(move || {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    client.tokens().save_token("old");
    client.tokens().save_refresh_token("revoked");

    let options = RequestOptions::get();
    let (first, second, third) = tokio::join!(
        client.authenticated_request("/api/home", &options),
        client.authenticated_request("/api/home", &options),
        client.authenticated_request("/api/home", &options),
    );

    for outcome in [first, second, third] {
        assert_eq!(outcome.expect("request completes"), ApiOutcome::Redirected);
    }
    assert_eq!(original.hits(), 3);
    assert_eq!(refresh.hits(), 1);
    assert_eq!(redirects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unauthorised_without_refresh_token_is_rejected() {
    let server = MockServer::start_async().await;
    let original = server.mock(|when, then| {
        when.method(GET).path("/api/activity");
        then.status(401)
            .header("content-type", "application/json")
            .json_body(json!({"message": "Missing Authorization Header"}));
    });
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/refresh");
        then.status(200).json_body(json!({"JWT": "never"}));
    });

    let client = client_for(&server);
    let outcome = client
        .authenticated_request("/api/activity", &RequestOptions::get())
        .await
        .expect("request completes");

    let ApiOutcome::Rejected(problem) = outcome else {
        panic!("expected rejection, got {outcome:?}");
    };
    assert_eq!(problem.status, 401);
    assert_eq!(problem.message, "Missing Authorization Header");
    assert_eq!(original.hits(), 1);
    assert_eq!(refresh.hits(), 0);
}

#[tokio::test]
async fn proxy_bad_gateway_goes_offline_once() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET).path("/api/home");
        then.status(502)
            .header("content-type", "application/json")
            .json_body(json!({"error": "Backend unreachable"}));
    });

    let client = client_for(&server);
    let transitions = watch(client.connectivity());

    for _ in 0..3 {
        let outcome = client
            .authenticated_request("/api/home", &RequestOptions::get())
            .await
            .expect("request completes");
        assert_eq!(
            outcome,
            ApiOutcome::Offline {
                error: Some(BACKEND_UNREACHABLE.to_string())
            }
        );
    }

    assert_eq!(mock.hits(), 3);
    assert!(client.connectivity().is_offline());
    assert_eq!(transitions.offline(), 1);
    assert_eq!(transitions.online(), 0);
}

#[tokio::test]
async fn server_error_is_offline_without_message() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/api/posted_shifts");
        then.status(503);
    });

    let client = client_for(&server);
    let outcome = client
        .authenticated_request("/api/posted_shifts", &RequestOptions::get())
        .await
        .expect("request completes");

    assert_eq!(outcome, ApiOutcome::Offline { error: None });
    assert!(client.connectivity().is_offline());
}

#[tokio::test]
async fn success_after_outage_reconnects_once() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/api/home");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"business_name": "Cafe"}));
    });

    let client = client_for(&server);
    let transitions = watch(client.connectivity());
    client.connectivity().go_offline();

    for _ in 0..2 {
        let outcome = client
            .authenticated_request("/api/home", &RequestOptions::get())
            .await
            .expect("request completes");
        assert!(outcome.is_success());
    }

    let state = client.connectivity().state();
    assert!(!state.is_offline);
    assert!(state.just_reconnected);
    assert_eq!(transitions.online(), 1);
}

#[tokio::test]
async fn refused_connection_is_offline() {
    let client = client_at("http://127.0.0.1:1");
    let transitions = watch(client.connectivity());

    let outcome = client
        .authenticated_request("/api/home", &RequestOptions::get())
        .await
        .expect("connectivity failures are outcomes");

    assert_eq!(outcome, ApiOutcome::Offline { error: None });
    assert_eq!(transitions.offline(), 1);
}

#[tokio::test]
async fn connection_dropped_mid_body_is_offline() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = [0_u8; 1024];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n{\"business",
            )
            .await
            .expect("write partial response");
        socket.shutdown().await.expect("close");
    });

    let client = client_at(&format!("http://{addr}"));
    let transitions = watch(client.connectivity());

    let outcome = client
        .authenticated_request("/api/home", &RequestOptions::get())
        .await
        .expect("interrupted bodies are outcomes");

    assert_eq!(outcome, ApiOutcome::Offline { error: None });
    assert_eq!(transitions.offline(), 1);
    server.await.expect("server task");
}

#[tokio::test]
async fn concurrent_unauthorised_requests_share_one_refresh() {
    let server = MockServer::start_async().await;
    let stale = server.mock(|when, then| {
        when.method(GET)
            .path("/api/employee/shifts")
            .header("authorization", "Bearer old");
        then.status(401);
    });
    let refresh = server.mock(|when, then| {
        when.method(POST).path("/refresh");
        then.status(200)
            .delay(Duration::from_millis(100))
            .header("content-type", "application/json")
            .json_body(json!({"JWT": "new"}));
    });
    let fresh = server.mock(|when, then| {
        when.method(GET)
            .path("/api/employee/shifts")
            .header("authorization", "Bearer new");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({"shifts": []}));
    });

    let client = client_for(&server);
    client.tokens().save_token("old");
    client.tokens().save_refresh_token("refresh-1");

    let options = RequestOptions::get();
    let (first, second) = tokio::join!(
        client.authenticated_request("/api/employee/shifts", &options),
        client.authenticated_request("/api/employee/shifts", &options),
    );

    assert!(first.expect("first completes").is_success());
    assert!(second.expect("second completes").is_success());
    assert_eq!(stale.hits(), 2);
    assert_eq!(refresh.hits(), 1);
    assert_eq!(fresh.hits(), 2);
}

#[tokio::test]
async fn refresh_outage_is_offline_and_keeps_session() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/api/home");
        then.status(401);
    });
    server.mock(|when, then| {
        when.method(POST).path("/refresh");
        then.status(502)
            .json_body(json!({"error": "Backend unreachable"}));
    });

    let client = client_for(&server);
    client.tokens().save_token("old");
    client.tokens().save_refresh_token("refresh-1");

    let outcome = client
        .authenticated_request("/api/home", &RequestOptions::get())
        .await
        .expect("request completes");

    assert_eq!(
        outcome,
        ApiOutcome::Offline {
            error: Some(BACKEND_UNREACHABLE.to_string())
        }
    );
    assert_eq!(client.tokens().get_refresh_token().as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn caller_headers_override_authorization() {
    let server = MockServer::start_async().await;
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/api/home")
            .header("authorization", "Bearer override");
        then.status(204);
    });

    let client = client_for(&server);
    client.tokens().save_token("stored");
    let options = RequestOptions::get().with_header(
        reqwest::header::AUTHORIZATION,
        reqwest::header::HeaderValue::from_static("Bearer override"),
    );

    let outcome = client
        .authenticated_request("/api/home", &options)
        .await
        .expect("request completes");

    assert_eq!(outcome, ApiOutcome::Success(serde_json::Value::Null));
    mock.assert();
}

#[tokio::test]
async fn anonymous_requests_carry_no_token() {
    let server = MockServer::start_async().await;
    let with_token = server.mock(|when, then| {
        when.method(POST).path("/api/auth/login").header_exists("authorization");
        then.status(500);
    });
    let without_token = server.mock(|when, then| {
        when.method(POST).path("/api/auth/login");
        then.status(200).json_body(json!({"JWT": "a.b.c"}));
    });

    let client = client_for(&server);
    client.tokens().save_token("stored");
    let outcome = client
        .request("/api/auth/login", &RequestOptions::post(json!({"username": "ada"})))
        .await
        .expect("request completes");

    assert!(outcome.is_success());
    assert_eq!(with_token.hits(), 0);
    assert_eq!(without_token.hits(), 1);
}
