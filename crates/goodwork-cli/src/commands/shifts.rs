use crate::cli::{OutputFormat, ShiftIdArgs};
use crate::client::{AppContext, CliError, CliResult, expect_success};
use crate::output::{render_message, render_shifts};

pub(crate) async fn handle_shifts_mine(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let list = expect_success(ctx.api.employee_shifts().await.map_err(CliError::failure)?)?;
    render_shifts(&list.shifts, format)
}

pub(crate) async fn handle_shifts_posted(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let list = expect_success(ctx.api.posted_shifts().await.map_err(CliError::failure)?)?;
    render_shifts(&list.shifts, format)
}

pub(crate) async fn handle_shifts_post(
    ctx: &AppContext,
    args: ShiftIdArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let shift_id = shift_id(&args)?;
    let message = expect_success(
        ctx.api
            .post_shift(shift_id)
            .await
            .map_err(CliError::failure)?,
    )?;
    render_message(&message, "shift posted", format)
}

pub(crate) async fn handle_shifts_take(
    ctx: &AppContext,
    args: ShiftIdArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let shift_id = shift_id(&args)?;
    let message = expect_success(
        ctx.api
            .take_shift(shift_id)
            .await
            .map_err(CliError::failure)?,
    )?;
    render_message(&message, "shift taken", format)
}

pub(crate) fn shift_id(args: &ShiftIdArgs) -> CliResult<&str> {
    let trimmed = args.shift_id.trim();
    if trimmed.is_empty() {
        return Err(CliError::validation("shift id must not be empty"));
    }
    Ok(trimmed)
}
