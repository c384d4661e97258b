use anyhow::anyhow;

use crate::cli::OutputFormat;
use crate::client::{AppContext, CliError, CliResult, expect_success};
use crate::output::render_home;

pub(crate) async fn handle_home(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let home = expect_success(ctx.api.home().await.map_err(CliError::failure)?)?;
    render_home(&home, format)
}

pub(crate) async fn handle_ping(ctx: &AppContext) -> CliResult<()> {
    if ctx.api.check_backend().await.map_err(CliError::failure)? {
        println!("backend reachable at {}", ctx.api.client().base_url());
        Ok(())
    } else {
        Err(CliError::failure(anyhow!(
            "backend unreachable at {}",
            ctx.api.client().base_url()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context_with;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn home_sends_stored_token() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/home")
                .header("authorization", "Bearer stored");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "business_name": "Cafe",
                    "business_code": "C0DE",
                    "schedule_id": "sch-1",
                    "shifts": [{"_id": "sh-1", "start": "2026-03-02T09:00:00Z"}]
                }));
        });

        let ctx = context_with(&server);
        ctx.api.client().tokens().save_token("stored");
        handle_home(&ctx, OutputFormat::Table)
            .await
            .expect("home should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn ping_fails_when_backend_errors() {
        let server = MockServer::start_async().await;
        let mut down = server.mock(|when, then| {
            when.method(GET).path("/api/ping");
            then.status(500);
        });

        let ctx = context_with(&server);
        let err = handle_ping(&ctx).await.expect_err("backend is down");
        assert_eq!(err.exit_code(), 3);

        down.delete();
        server.mock(|when, then| {
            when.method(GET).path("/api/ping");
            then.status(200);
        });
        handle_ping(&ctx).await.expect("backend is back");
        assert!(ctx.api.client().connectivity().state().just_reconnected);
    }
}
