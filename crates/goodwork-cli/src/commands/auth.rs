use std::io::{self, IsTerminal};

use anyhow::anyhow;
use goodwork_api_models::RegisterRequest;

use crate::cli::{LoginArgs, OutputFormat, RegisterArgs};
use crate::client::{AppContext, CliError, CliResult, expect_success};
use crate::output::{render_claims, render_session};

pub(crate) async fn handle_register(
    ctx: &AppContext,
    args: RegisterArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let request = RegisterRequest {
        first_name: required("first name", &args.first_name)?,
        last_name: required("last name", &args.last_name)?,
        username: required("username", &args.username)?,
        password: resolve_password(args.password.as_deref())?,
        role: args.role.as_str().to_string(),
        code: args
            .code
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty()),
    };

    let session = expect_success(ctx.api.register(&request).await?)?;
    render_session(&session, format)
}

pub(crate) async fn handle_login(
    ctx: &AppContext,
    args: LoginArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let username = required("username", &args.username)?;
    let password = resolve_password(args.password.as_deref())?;

    let session = expect_success(ctx.api.login(&username, &password).await?)?;
    render_session(&session, format)
}

pub(crate) fn handle_logout(ctx: &AppContext) -> CliResult<()> {
    ctx.api.logout();
    println!("signed out");
    Ok(())
}

pub(crate) fn handle_whoami(ctx: &AppContext, format: OutputFormat) -> CliResult<()> {
    let claims = ctx
        .api
        .current_claims()
        .map_err(|err| {
            CliError::failure(anyhow!(err).context("stored session token is unreadable"))
        })?
        .ok_or_else(|| CliError::validation("not signed in; run `goodwork login`"))?;
    render_claims(&claims, format)
}

fn required(field: &str, value: &str) -> CliResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CliError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Password from the flag or environment, else an interactive prompt.
fn resolve_password(provided: Option<&str>) -> CliResult<String> {
    if let Some(value) = provided {
        if value.is_empty() {
            return Err(CliError::validation("password cannot be empty"));
        }
        return Ok(value.to_string());
    }

    if io::stdin().is_terminal() {
        let password = rpassword::prompt_password("Password: ").map_err(|err| {
            CliError::failure(anyhow!("failed to read password from stdin: {err}"))
        })?;
        if password.is_empty() {
            return Err(CliError::validation("password cannot be empty"));
        }
        Ok(password)
    } else {
        Err(CliError::validation(
            "password required; supply via --password or GOODWORK_PASSWORD when running non-interactively",
        ))
    }
}
