use goodwork_api_models::{NewScheduleRequest, ShiftDraft, ShiftEdit, parse_timestamp};

use crate::cli::{OutputFormat, ScheduleNewArgs, ShiftAddArgs, ShiftDeleteArgs, ShiftEditArgs};
use crate::client::{AppContext, CliError, CliResult, expect_success};
use crate::output::{render_message, render_schedules, render_value};

pub(crate) async fn handle_schedule_list(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let schedules = expect_success(ctx.api.schedules().await.map_err(CliError::failure)?)?;
    render_schedules(&schedules, format)
}

pub(crate) async fn handle_schedule_new(
    ctx: &AppContext,
    args: ScheduleNewArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let request = NewScheduleRequest::new(args.year, args.month)
        .ok_or_else(|| CliError::validation("month must be between 1 and 12"))?;
    let message = expect_success(
        ctx.api
            .new_schedule(&request)
            .await
            .map_err(CliError::failure)?,
    )?;
    render_message(&message, "schedule created", format)
}

pub(crate) async fn handle_schedule_add_shift(
    ctx: &AppContext,
    args: ShiftAddArgs,
    format: OutputFormat,
) -> CliResult<()> {
    validate_window(Some(&args.start), Some(&args.end))?;
    let draft = ShiftDraft {
        schedule_id: non_empty("schedule", &args.schedule_id)?,
        employee_id: non_empty("employee", &args.employee_id)?,
        start: args.start.trim().to_string(),
        end: args.end.trim().to_string(),
    };
    let created = expect_success(ctx.api.add_shift(&draft).await.map_err(CliError::failure)?)?;
    render_value(&created, "shift added", format)
}

pub(crate) async fn handle_schedule_edit_shift(
    ctx: &AppContext,
    args: ShiftEditArgs,
    format: OutputFormat,
) -> CliResult<()> {
    if args.start.is_none() && args.end.is_none() && args.employee_id.is_none() {
        return Err(CliError::validation(
            "nothing to change; pass --start, --end or --employee",
        ));
    }
    validate_window(args.start.as_deref(), args.end.as_deref())?;
    let edit = ShiftEdit {
        schedule_id: non_empty("schedule", &args.schedule_id)?,
        shift_id: non_empty("shift", &args.shift_id)?,
        start: args.start.map(|value| value.trim().to_string()),
        end: args.end.map(|value| value.trim().to_string()),
        employee_id: args.employee_id.map(|value| value.trim().to_string()),
    };
    let updated = expect_success(ctx.api.edit_shift(&edit).await.map_err(CliError::failure)?)?;
    render_value(&updated, "shift updated", format)
}

pub(crate) async fn handle_schedule_delete_shift(
    ctx: &AppContext,
    args: ShiftDeleteArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let schedule_id = non_empty("schedule", &args.schedule_id)?;
    let shift_id = non_empty("shift", &args.shift_id)?;
    let message = expect_success(
        ctx.api
            .delete_shift(&schedule_id, &shift_id)
            .await
            .map_err(CliError::failure)?,
    )?;
    render_message(&message, "shift deleted", format)
}

fn non_empty(field: &str, value: &str) -> CliResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CliError::validation(format!("{field} id must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Timestamps must parse, and a full window must end after it starts.
fn validate_window(start: Option<&str>, end: Option<&str>) -> CliResult<()> {
    let parse = |label: &str, raw: &str| {
        parse_timestamp(raw)
            .ok_or_else(|| CliError::validation(format!("{label} '{raw}' is not a valid timestamp")))
    };
    let start = start.map(|raw| parse("start", raw)).transpose()?;
    let end = end.map(|raw| parse("end", raw)).transpose()?;
    if let (Some(start), Some(end)) = (start, end)
        && end <= start
    {
        return Err(CliError::validation("shift must end after it starts"));
    }
    Ok(())
}
