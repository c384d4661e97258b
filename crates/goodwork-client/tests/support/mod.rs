//! Shared fixtures for client integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::{Engine as _, engine::general_purpose};
use goodwork_client::{Connectivity, ConnectivityHandlers, RequestClient, TokenVault};
use httpmock::MockServer;
use reqwest::Client;
use serde_json::Value;

/// Transition counters fed by a subscribed listener.
#[derive(Default)]
pub struct Transitions {
    pub offline: AtomicUsize,
    pub online: AtomicUsize,
}

impl Transitions {
    pub fn offline(&self) -> usize {
        self.offline.load(Ordering::SeqCst)
    }

    pub fn online(&self) -> usize {
        self.online.load(Ordering::SeqCst)
    }
}

pub fn watch(tracker: &Connectivity) -> Arc<Transitions> {
    let counts = Arc::new(Transitions::default());
    let offline = Arc::clone(&counts);
    let online = Arc::clone(&counts);
    tracker.subscribe(ConnectivityHandlers::new(
        move || {
            offline.offline.fetch_add(1, Ordering::SeqCst);
        },
        move || {
            online.online.fetch_add(1, Ordering::SeqCst);
        },
    ));
    counts
}

pub fn client_at(base_url: &str) -> RequestClient {
    RequestClient::new(
        Client::new(),
        base_url.parse().expect("valid URL"),
        TokenVault::in_memory(),
        Arc::new(Connectivity::new()),
    )
}

pub fn client_for(server: &MockServer) -> RequestClient {
    client_at(&server.base_url())
}

/// Unsigned JWT carrying `claims` as its payload.
pub fn token_with(claims: &Value) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
