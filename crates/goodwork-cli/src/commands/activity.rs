use crate::cli::{OutputFormat, ShiftIdArgs};
use crate::client::{AppContext, CliError, CliResult, expect_success};
use crate::commands::shifts::shift_id;
use crate::output::{render_activity, render_message, render_upcoming};

pub(crate) async fn handle_activity_show(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let status = expect_success(ctx.api.activity().await.map_err(CliError::failure)?)?;
    render_activity(&status, format)
}

pub(crate) async fn handle_clock(
    ctx: &AppContext,
    args: ShiftIdArgs,
    clock_in: bool,
    format: OutputFormat,
) -> CliResult<()> {
    let shift_id = shift_id(&args)?;
    let message = expect_success(
        ctx.api
            .log_activity(shift_id, clock_in)
            .await
            .map_err(CliError::failure)?,
    )?;
    let fallback = if clock_in { "clocked in" } else { "clocked out" };
    render_message(&message, fallback, format)
}

pub(crate) async fn handle_upcoming_shift(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let upcoming = expect_success(ctx.api.upcoming_shift().await.map_err(CliError::failure)?)?;
    render_upcoming(&upcoming, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::context_with;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn clock_out_posts_false_flag() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/log_activity")
                .json_body(json!({"shift_id": "sh-1", "clock_in": false}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"message": "Clocked out"}));
        });

        let ctx = context_with(&server);
        handle_clock(
            &ctx,
            ShiftIdArgs {
                shift_id: "sh-1".into(),
            },
            false,
            OutputFormat::Table,
        )
        .await
        .expect("clock out should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn activity_renders_status() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/activity");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "clocked_in": true,
                    "upcoming_shift": {"_id": "sh-1", "start": "2026-03-02T09:00:00Z"}
                }));
        });

        let ctx = context_with(&server);
        handle_activity_show(&ctx, OutputFormat::Table)
            .await
            .expect("activity should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn upcoming_without_shift_prints_message() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/upcoming_shift");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"message": "No upcoming shifts"}));
        });

        let ctx = context_with(&server);
        handle_upcoming_shift(&ctx, OutputFormat::Json)
            .await
            .expect("upcoming should succeed");
        mock.assert();
    }
}
