use goodwork_api_models::{BusinessHours, CreateBusinessRequest, ensure_unique_days};

use crate::cli::{BusinessCreateArgs, BusinessLinkArgs, OutputFormat};
use crate::client::{AppContext, CliError, CliResult, expect_success};
use crate::output::render_value;

pub(crate) async fn handle_business_create(
    ctx: &AppContext,
    args: BusinessCreateArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let business_name = args.name.trim();
    if business_name.is_empty() {
        return Err(CliError::validation("business name must not be empty"));
    }
    let hours = parse_hours(&args.hours)?;

    let request = CreateBusinessRequest {
        business_name: business_name.to_string(),
        hours,
    };
    let created = expect_success(
        ctx.api
            .create_business(&request)
            .await
            .map_err(CliError::failure)?,
    )?;

    match format {
        OutputFormat::Json => {
            let value = serde_json::to_value(&created).map_err(CliError::failure)?;
            render_value(&value, "", format)
        }
        OutputFormat::Table => {
            println!("{}", created.message.as_deref().unwrap_or("business created"));
            if let Some(code) = &created.business_code {
                println!("share this code with employees: {code}");
            }
            println!("sign in again to refresh your session with the new business");
            Ok(())
        }
    }
}

pub(crate) async fn handle_business_link(
    ctx: &AppContext,
    args: BusinessLinkArgs,
    format: OutputFormat,
) -> CliResult<()> {
    if args.code.trim().is_empty() {
        return Err(CliError::validation("business code must not be empty"));
    }
    let linked = expect_success(
        ctx.api
            .link_business(&args.code)
            .await
            .map_err(CliError::failure)?,
    )?;
    let value = serde_json::to_value(&linked).map_err(CliError::failure)?;
    render_value(&value, "business linked", format)
}

fn parse_hours(entries: &[String]) -> CliResult<Vec<BusinessHours>> {
    let hours = entries
        .iter()
        .map(|entry| BusinessHours::parse_entry(entry))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| CliError::validation(err.to_string()))?;
    ensure_unique_days(&hours).map_err(|err| CliError::validation(err.to_string()))?;
    Ok(hours)
}
