//! Shared API context, error types, and outcome mapping for the CLI.

use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use goodwork_client::{
    ApiOutcome, ClientConfig, Connectivity, FileTokenStore, GoodWorkApi, LoginError,
    RequestClient, TokenVault, parse_base_url,
};
use url::Url;

use crate::cli::Cli;
use crate::output::ConnectivityBanner;

/// Token file location relative to the home directory.
pub(crate) const DEFAULT_TOKEN_FILE: &str = ".goodwork/session.json";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<LoginError> for CliError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::UnknownRole { role } => Self::validation(format!(
                "accounts with role '{role}' cannot use this client"
            )),
            other => Self::failure(other),
        }
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) api: GoodWorkApi,
    pub(crate) poll_interval: Duration,
}

impl AppContext {
    /// Build the client stack described by the global flags.
    ///
    /// The connectivity banner is subscribed before any request is issued.
    pub(crate) fn from_cli(cli: &Cli, trace_id: &str) -> CliResult<Self> {
        let config = ClientConfig {
            base_url: cli.api_url.clone(),
            timeout: Duration::from_secs(cli.timeout),
            token_path: cli.token_file.clone().or_else(default_token_path),
            request_id: Some(trace_id.to_string()),
            ..ClientConfig::default()
        };
        config
            .validate()
            .map_err(|err| CliError::validation(err.to_string()))?;

        let tokens = config.token_path.as_ref().map_or_else(TokenVault::in_memory, |path| {
            TokenVault::new(Arc::new(FileTokenStore::new(path)))
        });

        let connectivity = Arc::new(Connectivity::new());
        connectivity.subscribe(ConnectivityBanner);

        let client = RequestClient::from_config(&config, tokens, connectivity)
            .map_err(CliError::failure)?
            .with_reauth_hook(|| {
                eprintln!("Your session has expired. Run `goodwork login` to sign in again.");
            });

        Ok(Self {
            api: GoodWorkApi::new(Arc::new(client)),
            poll_interval: config.poll_interval,
        })
    }
}

/// `$HOME/.goodwork/session.json`, when a home directory is known.
pub(crate) fn default_token_path() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(DEFAULT_TOKEN_FILE))
}

/// Parse the API URL provided to the CLI.
pub(crate) fn parse_url(input: &str) -> Result<Url, String> {
    parse_base_url(input).map_err(|err| err.to_string())
}

/// Unwrap a successful outcome or turn it into the matching CLI error.
pub(crate) fn expect_success<T>(outcome: ApiOutcome<T>) -> CliResult<T> {
    match outcome {
        ApiOutcome::Success(value) => Ok(value),
        ApiOutcome::Offline { error } => Err(CliError::failure(anyhow!(
            "{}",
            error.unwrap_or_else(|| "backend unreachable; try again once you're back online"
                .to_string())
        ))),
        ApiOutcome::Redirected => Err(CliError::failure(anyhow!(
            "session expired; sign in again with `goodwork login`"
        ))),
        ApiOutcome::Rejected(problem) => Err(CliError::validation(problem.message)),
    }
}
