//! Authenticated request execution.
//!
//! # Design
//! - Every call resolves to one [`ApiOutcome`]; only programming errors and
//!   unexpected transport failures surface as [`ClientError`].
//! - A `401`/`400` with a refresh token on hand triggers exactly one refresh
//!   and one retry. The retry is never refreshed again.
//! - Refreshes are single-flight: callers queue on one async mutex, and a
//!   caller that finds the access token already replaced reuses it.
//! - The connectivity tracker hears about each call at most once, with the
//!   most specific classification available.

use std::fmt;
use std::sync::Arc;

use goodwork_api_models::RefreshResponse;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::connectivity::{Connectivity, OutcomeKind};
use crate::error::ClientError;
use crate::tokens::TokenVault;

/// Endpoint exchanging a refresh token for a new access token.
pub const REFRESH_PATH: &str = "/refresh";
/// Error text attached to outcomes caused by a `502` from the proxy.
pub const BACKEND_UNREACHABLE: &str = "Backend unreachable";

/// Result of one logical API call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome<T> {
    /// `2xx` response with its decoded body.
    Success(T),
    /// The backend could not be reached; the tracker has been told.
    Offline {
        /// Explanation when one is known (set for proxy `502`s).
        error: Option<String>,
    },
    /// The session could not be refreshed; tokens were cleared and the
    /// re-authentication hook ran.
    Redirected,
    /// The backend answered with a client error.
    Rejected(ApiProblem),
}

impl<T> ApiOutcome<T> {
    /// Transform the success value.
    pub fn map<U>(self, apply: impl FnOnce(T) -> U) -> ApiOutcome<U> {
        match self {
            Self::Success(value) => ApiOutcome::Success(apply(value)),
            Self::Offline { error } => ApiOutcome::Offline { error },
            Self::Redirected => ApiOutcome::Redirected,
            Self::Rejected(problem) => ApiOutcome::Rejected(problem),
        }
    }

    /// Success value, discarding any other outcome.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Whether the call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Whether the call was classified as a connectivity failure.
    #[must_use]
    pub const fn is_offline(&self) -> bool {
        matches!(self, Self::Offline { .. })
    }
}

impl ApiOutcome<Value> {
    /// Decode a JSON success body into `T`.
    ///
    /// An empty body decodes as `{}`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Decode`] when the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(self, path: &str) -> Result<ApiOutcome<T>, ClientError> {
        match self {
            Self::Success(value) => {
                let value = if value.is_null() {
                    Value::Object(Map::new())
                } else {
                    value
                };
                serde_json::from_value(value)
                    .map(ApiOutcome::Success)
                    .map_err(|source| ClientError::Decode {
                        path: path.to_string(),
                        source,
                    })
            }
            Self::Offline { error } => Ok(ApiOutcome::Offline { error }),
            Self::Redirected => Ok(ApiOutcome::Redirected),
            Self::Rejected(problem) => Ok(ApiOutcome::Rejected(problem)),
        }
    }
}

/// Client error reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiProblem {
    /// HTTP status code.
    pub status: u16,
    /// `message` field of the body, or `HTTP <status>`.
    pub message: String,
    /// Parsed response body (`null` when empty).
    pub body: Value,
}

impl ApiProblem {
    fn from_body(status: StatusCode, bytes: &[u8]) -> Self {
        let body = parse_body(bytes);
        let message = ["message", "error"]
            .iter()
            .find_map(|field| body.get(field).and_then(Value::as_str))
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string);
        Self {
            status: status.as_u16(),
            message,
            body,
        }
    }
}

impl fmt::Display for ApiProblem {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} (status {})", self.message, self.status)
    }
}

/// Method, body and extra headers of a request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// HTTP method; `GET` by default.
    pub method: Method,
    /// JSON body.
    pub body: Option<Value>,
    /// Extra headers; these win over the generated `Authorization` header.
    pub headers: HeaderMap,
}

impl RequestOptions {
    /// `GET` without a body.
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    /// `POST` with a JSON body.
    #[must_use]
    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            headers: HeaderMap::new(),
        }
    }

    /// Add or replace one header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Callback run when a session can no longer be refreshed.
pub type ReauthHook = Arc<dyn Fn() + Send + Sync>;

/// HTTP client that attaches session tokens and classifies outcomes.
pub struct RequestClient {
    http: Client,
    base_url: Url,
    tokens: TokenVault,
    connectivity: Arc<Connectivity>,
    refresh_gate: Mutex<()>,
    on_reauth: Option<ReauthHook>,
}

enum Attempt {
    Response(Response),
    Unreachable(reqwest::Error),
}

enum Refresh {
    Renewed(String),
    Rejected,
    /// Another caller's refresh was rejected and the session is already gone.
    Ended,
    Offline(OutcomeKind),
}

impl RequestClient {
    /// Assemble a client from its collaborators.
    #[must_use]
    pub fn new(
        http: Client,
        base_url: Url,
        tokens: TokenVault,
        connectivity: Arc<Connectivity>,
    ) -> Self {
        Self {
            http,
            base_url: normalise_base(base_url),
            tokens,
            connectivity,
            refresh_gate: Mutex::new(()),
            on_reauth: None,
        }
    }

    /// Build the HTTP client described by `config` and assemble around it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClient`] if the HTTP client cannot be built.
    pub fn from_config(
        config: &ClientConfig,
        tokens: TokenVault,
        connectivity: Arc<Connectivity>,
    ) -> Result<Self, ClientError> {
        let http = config.build_http_client()?;
        Ok(Self::new(
            http,
            config.base_url.clone(),
            tokens,
            connectivity,
        ))
    }

    /// Install the callback run when re-authentication is required.
    #[must_use]
    pub fn with_reauth_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_reauth = Some(Arc::new(hook));
        self
    }

    /// Token storage used by this client.
    #[must_use]
    pub const fn tokens(&self) -> &TokenVault {
        &self.tokens
    }

    /// Tracker this client reports to.
    #[must_use]
    pub const fn connectivity(&self) -> &Arc<Connectivity> {
        &self.connectivity
    }

    /// Root that request paths are joined onto.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a request path against the base URL.
    ///
    /// Leading slashes are ignored so a base URL with a path prefix keeps it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidPath`] when the join fails.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ClientError::InvalidPath {
                path: path.to_string(),
                source,
            })
    }

    /// Perform one authenticated call with refresh-and-retry.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] only for invalid paths, unreadable bodies and
    /// transport failures that are not connectivity problems.
    #[instrument(name = "request.authenticated", skip(self, options), fields(method = %options.method))]
    pub async fn authenticated_request(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<ApiOutcome<Value>, ClientError> {
        let url = self.endpoint(path)?;
        let token = self.tokens.get_token();
        let attempt = self.send(&url, path, options, token.as_deref()).await?;

        let attempt = match attempt {
            Attempt::Response(response)
                if triggers_refresh(response.status())
                    && self.tokens.get_refresh_token().is_some() =>
            {
                debug!(status = %response.status(), "access token rejected; refreshing");
                drop(response);
                match self.refresh_access_token(token.as_deref()).await? {
                    Refresh::Renewed(fresh) => {
                        self.send(&url, path, options, Some(fresh.as_str())).await?
                    }
                    Refresh::Rejected => return Ok(self.force_reauthentication()),
                    Refresh::Ended => return Ok(ApiOutcome::Redirected),
                    Refresh::Offline(kind) => return Ok(self.offline(kind)),
                }
            }
            other => other,
        };

        self.classify(path, attempt).await
    }

    /// Perform one call without attaching tokens or refreshing.
    ///
    /// # Errors
    ///
    /// Same as [`Self::authenticated_request`].
    #[instrument(name = "request.anonymous", skip(self, options), fields(method = %options.method))]
    pub async fn request(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<ApiOutcome<Value>, ClientError> {
        let url = self.endpoint(path)?;
        let attempt = self.send(&url, path, options, None).await?;
        self.classify(path, attempt).await
    }

    /// Unauthenticated reachability check.
    ///
    /// Any non-`2xx` answer or transport failure counts as offline.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidPath`] when `path` cannot be resolved.
    pub async fn probe(&self, path: &str) -> Result<bool, ClientError> {
        let url = self.endpoint(path)?;
        let kind = match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => OutcomeKind::Reachable,
            Ok(response) if response.status() == StatusCode::BAD_GATEWAY => {
                OutcomeKind::ProxyUnreachable
            }
            Ok(_) => OutcomeKind::ServerError,
            Err(err) => {
                debug!(error = %err, "reachability probe failed");
                OutcomeKind::Unreachable
            }
        };
        self.connectivity.report_outcome(kind);
        Ok(kind.is_reachable())
    }

    async fn send(
        &self,
        url: &Url,
        path: &str,
        options: &RequestOptions,
        token: Option<&str>,
    ) -> Result<Attempt, ClientError> {
        let mut builder = self.http.request(options.method.clone(), url.clone());
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }
        if !options.headers.is_empty() {
            builder = builder.headers(options.headers.clone());
        }

        match builder.send().await {
            Ok(response) => Ok(Attempt::Response(response)),
            Err(err) if is_connectivity_failure(&err) => Ok(Attempt::Unreachable(err)),
            Err(source) => Err(ClientError::Transport {
                path: path.to_string(),
                source,
            }),
        }
    }

    async fn classify(&self, path: &str, attempt: Attempt) -> Result<ApiOutcome<Value>, ClientError> {
        let response = match attempt {
            Attempt::Response(response) => response,
            Attempt::Unreachable(err) => {
                warn!(error = %err, "request did not reach the backend");
                return Ok(self.offline(OutcomeKind::Unreachable));
            }
        };

        let status = response.status();
        if status == StatusCode::BAD_GATEWAY {
            return Ok(self.offline(OutcomeKind::ProxyUnreachable));
        }
        if status.is_server_error() {
            warn!(status = %status, "backend answered with a server error");
            return Ok(self.offline(OutcomeKind::ServerError));
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(err) if is_interrupted_body(&err) => {
                warn!(error = %err, "connection dropped while reading the response");
                return Ok(self.offline(OutcomeKind::Unreachable));
            }
            Err(source) => {
                return Err(ClientError::Body {
                    path: path.to_string(),
                    source,
                });
            }
        };

        if status.is_success() {
            self.connectivity.report_outcome(OutcomeKind::Reachable);
            return Ok(ApiOutcome::Success(parse_body(&bytes)));
        }

        let problem = ApiProblem::from_body(status, &bytes);
        debug!(status = problem.status, message = %problem.message, "request rejected");
        Ok(ApiOutcome::Rejected(problem))
    }

    async fn refresh_access_token(&self, stale: Option<&str>) -> Result<Refresh, ClientError> {
        let _gate = self.refresh_gate.lock().await;

        match self.tokens.get_token() {
            Some(current) if Some(current.as_str()) != stale => {
                debug!("access token already renewed by a concurrent request");
                return Ok(Refresh::Renewed(current));
            }
            None if stale.is_some() => {
                debug!("session ended by a concurrent refresh");
                return Ok(Refresh::Ended);
            }
            _ => {}
        }

        let Some(refresh_token) = self.tokens.get_refresh_token() else {
            return Ok(Refresh::Rejected);
        };

        let url = self.endpoint(REFRESH_PATH)?;
        let response = match self.http.post(url).bearer_auth(&refresh_token).send().await {
            Ok(response) => response,
            Err(err) if is_connectivity_failure(&err) => {
                warn!(error = %err, "token refresh did not reach the backend");
                return Ok(Refresh::Offline(OutcomeKind::Unreachable));
            }
            Err(source) => {
                return Err(ClientError::Transport {
                    path: REFRESH_PATH.to_string(),
                    source,
                });
            }
        };

        let status = response.status();
        if status == StatusCode::BAD_GATEWAY {
            return Ok(Refresh::Offline(OutcomeKind::ProxyUnreachable));
        }
        if status.is_server_error() {
            return Ok(Refresh::Offline(OutcomeKind::ServerError));
        }
        if !status.is_success() {
            debug!(status = %status, "refresh token rejected");
            return Ok(Refresh::Rejected);
        }

        match response.json::<RefreshResponse>().await {
            Ok(body) if !body.access_token.trim().is_empty() => {
                self.tokens.save_token(&body.access_token);
                info!("access token refreshed");
                Ok(Refresh::Renewed(body.access_token))
            }
            Ok(_) => Ok(Refresh::Rejected),
            Err(err) => {
                warn!(error = %err, "refresh response carried no usable token");
                Ok(Refresh::Rejected)
            }
        }
    }

    fn force_reauthentication(&self) -> ApiOutcome<Value> {
        warn!("session could not be refreshed; re-authentication required");
        self.tokens.clear();
        if let Some(hook) = &self.on_reauth {
            hook();
        }
        ApiOutcome::Redirected
    }

    fn offline(&self, kind: OutcomeKind) -> ApiOutcome<Value> {
        self.connectivity.report_outcome(kind);
        ApiOutcome::Offline {
            error: (kind == OutcomeKind::ProxyUnreachable).then(|| BACKEND_UNREACHABLE.to_string()),
        }
    }
}

impl fmt::Debug for RequestClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RequestClient")
            .field("base_url", &self.base_url.as_str())
            .field("tokens", &self.tokens)
            .field("connectivity", &self.connectivity)
            .finish_non_exhaustive()
    }
}

const fn triggers_refresh(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST)
}

fn is_connectivity_failure(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request()
}

fn is_interrupted_body(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_body() || err.is_decode()
}

fn normalise_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client_for(base: &str) -> RequestClient {
        RequestClient::new(
            Client::new(),
            Url::parse(base).unwrap(),
            TokenVault::in_memory(),
            Arc::new(Connectivity::new()),
        )
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let rooted = client_for("http://localhost:3333");
        assert_eq!(
            rooted.endpoint("/api/home").unwrap().as_str(),
            "http://localhost:3333/api/home"
        );

        let prefixed = client_for("http://example.test/goodwork");
        assert_eq!(
            prefixed.endpoint("/api/ping").unwrap().as_str(),
            "http://example.test/goodwork/api/ping"
        );
    }

    #[test]
    fn problem_prefers_message_then_error_then_status() {
        let problem = ApiProblem::from_body(
            StatusCode::BAD_REQUEST,
            br#"{"message":"Username already exists"}"#,
        );
        assert_eq!(problem.message, "Username already exists");
        assert_eq!(problem.to_string(), "Username already exists (status 400)");

        let proxy = ApiProblem::from_body(StatusCode::FORBIDDEN, br#"{"error":"nope"}"#);
        assert_eq!(proxy.message, "nope");

        let bare = ApiProblem::from_body(StatusCode::NOT_FOUND, b"");
        assert_eq!(bare.message, "HTTP 404");
        assert_eq!(bare.body, Value::Null);
    }

    #[test]
    fn bodies_fall_back_to_text() {
        assert_eq!(parse_body(b"  "), Value::Null);
        assert_eq!(parse_body(br#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_body(b"<html>"), json!("<html>"));
    }

    #[test]
    fn outcome_helpers_preserve_variants() {
        let offline: ApiOutcome<Value> = ApiOutcome::Offline { error: None };
        assert!(offline.is_offline());
        assert_eq!(offline.map(|_| 1), ApiOutcome::Offline { error: None });

        let empty: ApiOutcome<Value> = ApiOutcome::Success(Value::Null);
        let decoded = empty.decode::<Map<String, Value>>("/api/x").unwrap();
        assert_eq!(decoded.success(), Some(Map::new()));

        let wrong: ApiOutcome<Value> = ApiOutcome::Success(json!([1, 2]));
        assert!(matches!(
            wrong.decode::<Map<String, Value>>("/api/x"),
            Err(ClientError::Decode { .. })
        ));
    }
}
