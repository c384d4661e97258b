#![forbid(unsafe_code)]
#![deny(unused_must_use, rustdoc::broken_intra_doc_links, rustdoc::bare_urls)]
#![warn(missing_docs, unreachable_pub, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Client core for the Good Work scheduling API.
//!
//! Layout:
//! - `connectivity.rs`: online/offline tracker and its listeners
//! - `request.rs`: token attachment, refresh-and-retry, outcome classification
//! - `tokens.rs`: session token storage backends
//! - `claims.rs`: unverified token claims and landing decisions
//! - `api.rs`: typed wrappers over backend routes
//! - `poll.rs`: background reachability probe
//! - `config.rs`: client settings and HTTP client construction

pub mod api;
pub mod claims;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod poll;
pub mod request;
pub mod tokens;

pub use api::{GoodWorkApi, LoginSuccess, PING_PATH};
pub use claims::{LandingPage, Role, TokenClaims, decode_claims};
pub use config::{ClientConfig, DEFAULT_API_URL, DEFAULT_POLL_INTERVAL_SECS, parse_base_url};
pub use connectivity::{
    Connectivity, ConnectivityHandlers, ConnectivityListener, ConnectivityState, OutcomeKind,
    SubscriptionId,
};
pub use error::{ClaimsError, ClientError, ConfigError, LoginError};
pub use poll::{PollHandle, ReachabilityPoller};
pub use request::{
    ApiOutcome, ApiProblem, BACKEND_UNREACHABLE, REFRESH_PATH, ReauthHook, RequestClient,
    RequestOptions,
};
pub use tokens::{FileTokenStore, MemoryTokenStore, TokenStore, TokenVault};
