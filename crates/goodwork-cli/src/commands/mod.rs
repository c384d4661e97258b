//! Command handlers grouped by concern.

pub(crate) mod activity;
pub(crate) mod auth;
pub(crate) mod business;
pub(crate) mod home;
pub(crate) mod schedule;
pub(crate) mod shifts;
pub(crate) mod watch;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use goodwork_client::{ClientConfig, Connectivity, GoodWorkApi, RequestClient, TokenVault};
    use httpmock::MockServer;

    use crate::client::AppContext;

    pub(crate) fn context_with(server: &MockServer) -> AppContext {
        let config = ClientConfig::default()
            .with_base_url(&server.base_url())
            .expect("valid URL");
        let client = RequestClient::from_config(
            &config,
            TokenVault::in_memory(),
            Arc::new(Connectivity::new()),
        )
        .expect("client builds");
        AppContext {
            api: GoodWorkApi::new(Arc::new(client)),
            poll_interval: Duration::from_millis(20),
        }
    }
}
