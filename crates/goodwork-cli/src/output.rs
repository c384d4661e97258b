//! Output renderers and the connectivity banner.

use anyhow::anyhow;
use goodwork_api_models::{
    ActivityStatus, ApiMessage, HomeResponse, Schedule, Shift, UpcomingShiftResponse,
};
use goodwork_client::{ConnectivityListener, LoginSuccess, TokenClaims};
use serde::Serialize;
use serde_json::{Value, json};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

/// Banner shown when the backend stops answering.
pub(crate) const OFFLINE_BANNER: &str = "You're offline. Editing is disabled.";
/// Banner shown when the backend answers again.
pub(crate) const ONLINE_BANNER: &str = "You're back online!";

/// Prints connectivity transitions to stderr.
pub(crate) struct ConnectivityBanner;

impl ConnectivityListener for ConnectivityBanner {
    fn on_offline(&self) {
        eprintln!("{OFFLINE_BANNER}");
    }

    fn on_online(&self) {
        eprintln!("{ONLINE_BANNER}");
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_session(session: &LoginSuccess, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(&json!({
            "username": session.username,
            "role": session.claims.role().as_str(),
            "business_code": session.claims.business_code(),
            "landing": session.landing.path(),
        })),
        OutputFormat::Table => {
            let who = session.username.as_deref().unwrap_or("user");
            println!("signed in as {who} ({})", session.claims.role().as_str());
            println!("next: {}", session.landing.path());
            Ok(())
        }
    }
}

pub(crate) fn render_claims(claims: &TokenClaims, format: OutputFormat) -> CliResult<()> {
    let landing = goodwork_client::LandingPage::for_claims(claims).map(|page| page.path());
    match format {
        OutputFormat::Json => print_json(&json!({
            "username": claims.sub,
            "role": claims.role().as_str(),
            "business_code": claims.business_code(),
            "user_id": claims.user_id,
            "expires_at": claims.exp,
            "landing": landing,
        })),
        OutputFormat::Table => {
            if let Some(sub) = &claims.sub {
                println!("username: {sub}");
            }
            println!("role: {}", claims.role().as_str());
            println!("business: {}", claims.business_code().unwrap_or("<none>"));
            if let Some(id) = &claims.user_id {
                println!("user id: {id}");
            }
            if let Some(page) = landing {
                println!("home: {page}");
            }
            Ok(())
        }
    }
}

pub(crate) fn render_message(message: &ApiMessage, fallback: &str, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(message),
        OutputFormat::Table => {
            println!("{}", message.text().unwrap_or(fallback));
            Ok(())
        }
    }
}

/// Print an untyped payload; tables fall back to its `message` field.
pub(crate) fn render_value(value: &Value, fallback: &str, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => {
            let text = value
                .get("message")
                .and_then(Value::as_str)
                .filter(|text| !text.trim().is_empty())
                .unwrap_or(fallback);
            println!("{text}");
            Ok(())
        }
    }
}

pub(crate) fn render_home(home: &HomeResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(home),
        OutputFormat::Table => {
            println!("business: {}", home.business_name);
            if let Some(code) = home.business_code.as_deref().filter(|c| !c.is_empty()) {
                println!("code: {code}");
            }
            match home.schedule() {
                Some(id) => println!("schedule: {id}"),
                None => println!("schedule: <none this month>"),
            }
            print_shift_table(&home.shifts);
            Ok(())
        }
    }
}

pub(crate) fn render_shifts(shifts: &[Shift], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(shifts),
        OutputFormat::Table => {
            print_shift_table(shifts);
            Ok(())
        }
    }
}

pub(crate) fn render_schedules(schedules: &[Schedule], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(schedules),
        OutputFormat::Table => {
            println!("{:<26} {:>4} {:>5} {:>6}", "ID", "YEAR", "MONTH", "SHIFTS");
            for schedule in schedules {
                println!(
                    "{:<26} {:>4} {:>5} {:>6}",
                    schedule.id,
                    scalar(&schedule.year),
                    scalar(&schedule.month),
                    schedule.shifts.len()
                );
            }
            Ok(())
        }
    }
}

pub(crate) fn render_activity(status: &ActivityStatus, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(status),
        OutputFormat::Table => {
            println!(
                "status: {}",
                if status.clocked_in { "clocked in" } else { "clocked out" }
            );
            match &status.upcoming_shift {
                Some(shift) => println!("next shift: {}", describe_shift(shift)),
                None => println!("next shift: <none>"),
            }
            Ok(())
        }
    }
}

pub(crate) fn render_upcoming(upcoming: &UpcomingShiftResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(upcoming),
        OutputFormat::Table => {
            match (&upcoming.shift, upcoming.message.as_deref()) {
                (Some(shift), _) => println!("next shift: {}", describe_shift(shift)),
                (None, Some(message)) => println!("{message}"),
                (None, None) => println!("no upcoming shift"),
            }
            Ok(())
        }
    }
}

fn print_shift_table(shifts: &[Shift]) {
    if shifts.is_empty() {
        println!("no shifts");
        return;
    }
    println!("{:<26} {:<17} {:<17} EMPLOYEE", "ID", "START", "END");
    for shift in shifts {
        let (start, end) = shift.window().map_or_else(
            || {
                (
                    shift.start.clone().unwrap_or_default(),
                    shift.end.clone().unwrap_or_default(),
                )
            },
            |(start, end)| {
                (
                    start.format("%Y-%m-%d %H:%M").to_string(),
                    end.format("%Y-%m-%d %H:%M").to_string(),
                )
            },
        );
        let employee = shift
            .employee_name
            .as_deref()
            .or(shift.employee_id.as_deref())
            .unwrap_or("<open>");
        println!("{:<26} {:<17} {:<17} {}", shift.id, start, end, employee);
    }
}

fn describe_shift(shift: &Shift) -> String {
    shift.window().map_or_else(
        || format!("{} ({})", shift.id, shift.start.as_deref().unwrap_or("unscheduled")),
        |(start, end)| {
            format!(
                "{} {} to {}",
                shift.id,
                start.format("%Y-%m-%d %H:%M"),
                end.format("%H:%M")
            )
        },
    )
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn shift_description_uses_window_when_parseable() {
        let shift: Shift = serde_json::from_value(json!({
            "_id": "sh-1",
            "start": "2026-03-02T09:00:00Z",
            "end": "2026-03-02T17:00:00Z"
        }))
        .unwrap();
        assert_eq!(describe_shift(&shift), "sh-1 2026-03-02 09:00 to 17:00");

        let loose: Shift = serde_json::from_value(json!({"_id": "sh-2", "start": "soon"})).unwrap();
        assert_eq!(describe_shift(&loose), "sh-2 (soon)");
    }

    #[test]
    fn scalars_render_without_quotes() {
        assert_eq!(scalar(&json!("2026")), "2026");
        assert_eq!(scalar(&json!(3)), "3");
        assert_eq!(scalar(&Value::Null), "-");
    }

    #[test]
    fn renderers_accept_both_formats() {
        let home: HomeResponse =
            serde_json::from_value(json!({"business_name": "Cafe", "shifts": ""})).unwrap();
        render_home(&home, OutputFormat::Table).unwrap();
        render_home(&home, OutputFormat::Json).unwrap();
        render_value(&json!({"message": ""}), "done", OutputFormat::Table).unwrap();
    }
}
