//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use goodwork_client::DEFAULT_API_URL;
use goodwork_client::config::DEFAULT_TIMEOUT_SECS;
use goodwork_telemetry::{LogFormat, LoggingConfig, command_span, init_logging};
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::client::{AppContext, CliResult, parse_url};
use crate::commands::activity::{handle_activity_show, handle_clock, handle_upcoming_shift};
use crate::commands::auth::{handle_login, handle_logout, handle_register, handle_whoami};
use crate::commands::business::{handle_business_create, handle_business_link};
use crate::commands::home::{handle_home, handle_ping};
use crate::commands::schedule::{
    handle_schedule_add_shift, handle_schedule_delete_shift, handle_schedule_edit_shift,
    handle_schedule_list, handle_schedule_new,
};
use crate::commands::shifts::{
    handle_shifts_mine, handle_shifts_post, handle_shifts_posted, handle_shifts_take,
};
use crate::commands::watch::handle_watch;

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    install_logging(cli.log_format.as_deref());

    let trace_id = Uuid::new_v4().to_string();
    let span = command_span(command_label(&cli.command), &trace_id);

    let result = execute(cli, &trace_id).instrument(span).await;

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn install_logging(format: Option<&str>) {
    let format = format
        .and_then(|raw| raw.parse::<LogFormat>().ok())
        .unwrap_or(LogFormat::Pretty);
    let config = LoggingConfig {
        format,
        ..LoggingConfig::default()
    };
    if let Err(err) = init_logging(&config) {
        eprintln!("warning: logging disabled: {err}");
    }
}

async fn execute(cli: Cli, trace_id: &str) -> CliResult<()> {
    let ctx = AppContext::from_cli(&cli, trace_id)?;
    dispatch(cli, &ctx).await
}

pub(crate) async fn dispatch(cli: Cli, ctx: &AppContext) -> CliResult<()> {
    let format = cli.output;
    match cli.command {
        Command::Register(args) => handle_register(ctx, args, format).await,
        Command::Login(args) => handle_login(ctx, args, format).await,
        Command::Logout => handle_logout(ctx),
        Command::Whoami => handle_whoami(ctx, format),
        Command::Home => handle_home(ctx, format).await,
        Command::Ping => handle_ping(ctx).await,
        Command::Watch(args) => handle_watch(ctx, args).await,
        Command::Business(business) => match business {
            BusinessCommand::Create(args) => handle_business_create(ctx, args, format).await,
            BusinessCommand::Link(args) => handle_business_link(ctx, args, format).await,
        },
        Command::Schedule(schedule) => match schedule {
            ScheduleCommand::List => handle_schedule_list(ctx, format).await,
            ScheduleCommand::New(args) => handle_schedule_new(ctx, args, format).await,
            ScheduleCommand::AddShift(args) => handle_schedule_add_shift(ctx, args, format).await,
            ScheduleCommand::EditShift(args) => {
                handle_schedule_edit_shift(ctx, args, format).await
            }
            ScheduleCommand::DeleteShift(args) => {
                handle_schedule_delete_shift(ctx, args, format).await
            }
        },
        Command::Shifts(shifts) => match shifts {
            ShiftsCommand::Mine => handle_shifts_mine(ctx, format).await,
            ShiftsCommand::Posted => handle_shifts_posted(ctx, format).await,
            ShiftsCommand::Post(args) => handle_shifts_post(ctx, args, format).await,
            ShiftsCommand::Take(args) => handle_shifts_take(ctx, args, format).await,
        },
        Command::Activity(activity) => match activity {
            ActivityCommand::Show => handle_activity_show(ctx, format).await,
            ActivityCommand::ClockIn(args) => handle_clock(ctx, args, true, format).await,
            ActivityCommand::ClockOut(args) => handle_clock(ctx, args, false, format).await,
            ActivityCommand::Upcoming => handle_upcoming_shift(ctx, format).await,
        },
    }
}

pub(crate) const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Register(_) => "register",
        Command::Login(_) => "login",
        Command::Logout => "logout",
        Command::Whoami => "whoami",
        Command::Home => "home",
        Command::Ping => "ping",
        Command::Watch(_) => "watch",
        Command::Business(BusinessCommand::Create(_)) => "business_create",
        Command::Business(BusinessCommand::Link(_)) => "business_link",
        Command::Schedule(ScheduleCommand::List) => "schedule_list",
        Command::Schedule(ScheduleCommand::New(_)) => "schedule_new",
        Command::Schedule(ScheduleCommand::AddShift(_)) => "schedule_add_shift",
        Command::Schedule(ScheduleCommand::EditShift(_)) => "schedule_edit_shift",
        Command::Schedule(ScheduleCommand::DeleteShift(_)) => "schedule_delete_shift",
        Command::Shifts(ShiftsCommand::Mine) => "shifts_mine",
        Command::Shifts(ShiftsCommand::Posted) => "shifts_posted",
        Command::Shifts(ShiftsCommand::Post(_)) => "shifts_post",
        Command::Shifts(ShiftsCommand::Take(_)) => "shifts_take",
        Command::Activity(ActivityCommand::Show) => "activity_show",
        Command::Activity(ActivityCommand::ClockIn(_)) => "activity_clock_in",
        Command::Activity(ActivityCommand::ClockOut(_)) => "activity_clock_out",
        Command::Activity(ActivityCommand::Upcoming) => "activity_upcoming",
    }
}

#[derive(Parser)]
#[command(name = "goodwork", about = "Command-line client for the Good Work scheduling API")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "GOODWORK_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "GOODWORK_TOKEN_FILE",
        help = "Session file (defaults to ~/.goodwork/session.json)"
    )]
    pub(crate) token_file: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "GOODWORK_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[arg(long, global = true, env = "GOODWORK_LOG_FORMAT", help = "Log format: pretty or json")]
    pub(crate) log_format: Option<String>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Create an account and sign in.
    Register(RegisterArgs),
    /// Sign in with a username and password.
    Login(LoginArgs),
    /// Forget the stored session.
    Logout,
    /// Show the signed-in account.
    Whoami,
    /// Show the home payload (business and this month's shifts).
    Home,
    /// Check whether the backend is reachable.
    Ping,
    /// Poll the backend and report connectivity changes.
    Watch(WatchArgs),
    /// Create or join a business.
    #[command(subcommand)]
    Business(BusinessCommand),
    /// Manage monthly schedules and their shifts (managers).
    #[command(subcommand)]
    Schedule(ScheduleCommand),
    /// View and trade shifts (employees).
    #[command(subcommand)]
    Shifts(ShiftsCommand),
    /// Clock in and out and check your next shift.
    #[command(subcommand)]
    Activity(ActivityCommand),
}

#[derive(Subcommand)]
pub(crate) enum BusinessCommand {
    /// Create the manager's business.
    Create(BusinessCreateArgs),
    /// Join a business by its code.
    Link(BusinessLinkArgs),
}

#[derive(Subcommand)]
pub(crate) enum ScheduleCommand {
    /// List the business's schedules.
    List,
    /// Create a schedule for a month.
    New(ScheduleNewArgs),
    /// Add a shift to a schedule.
    AddShift(ShiftAddArgs),
    /// Change a scheduled shift.
    EditShift(ShiftEditArgs),
    /// Remove a scheduled shift.
    DeleteShift(ShiftDeleteArgs),
}

#[derive(Subcommand)]
pub(crate) enum ShiftsCommand {
    /// Shifts assigned to you.
    Mine,
    /// Shifts offered by colleagues.
    Posted,
    /// Offer one of your shifts.
    Post(ShiftIdArgs),
    /// Take an offered shift.
    Take(ShiftIdArgs),
}

#[derive(Subcommand)]
pub(crate) enum ActivityCommand {
    /// Clock status and next shift.
    Show,
    /// Clock in to a shift.
    ClockIn(ShiftIdArgs),
    /// Clock out of a shift.
    ClockOut(ShiftIdArgs),
    /// Your next shift.
    Upcoming,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum AccountRole {
    Manager,
    Employee,
}

impl AccountRole {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Employee => "employee",
        }
    }
}

#[derive(Args)]
pub(crate) struct RegisterArgs {
    #[arg(long)]
    pub(crate) first_name: String,
    #[arg(long)]
    pub(crate) last_name: String,
    #[arg(long)]
    pub(crate) username: String,
    #[arg(long, env = "GOODWORK_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
    #[arg(long, value_enum)]
    pub(crate) role: AccountRole,
    #[arg(long, help = "Business code to join (employees)")]
    pub(crate) code: Option<String>,
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    #[arg(long)]
    pub(crate) username: String,
    #[arg(long, env = "GOODWORK_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct WatchArgs {
    #[arg(long, help = "Seconds between probes (defaults to 15)")]
    pub(crate) interval: Option<u64>,
    #[arg(long, help = "Stop after this many seconds instead of waiting for Ctrl-C")]
    pub(crate) duration: Option<u64>,
}

#[derive(Args)]
pub(crate) struct BusinessCreateArgs {
    #[arg(long)]
    pub(crate) name: String,
    #[arg(
        long = "hours",
        value_name = "DAY=HH:MM-HH:MM",
        help = "Opening hours for one day; repeat per day"
    )]
    pub(crate) hours: Vec<String>,
}

#[derive(Args)]
pub(crate) struct BusinessLinkArgs {
    #[arg(long)]
    pub(crate) code: String,
}

#[derive(Args)]
pub(crate) struct ScheduleNewArgs {
    #[arg(long)]
    pub(crate) year: i32,
    #[arg(long)]
    pub(crate) month: u32,
}

#[derive(Args)]
pub(crate) struct ShiftAddArgs {
    #[arg(long = "schedule")]
    pub(crate) schedule_id: String,
    #[arg(long = "employee")]
    pub(crate) employee_id: String,
    #[arg(long)]
    pub(crate) start: String,
    #[arg(long)]
    pub(crate) end: String,
}

#[derive(Args)]
pub(crate) struct ShiftEditArgs {
    #[arg(long = "schedule")]
    pub(crate) schedule_id: String,
    #[arg(long = "shift")]
    pub(crate) shift_id: String,
    #[arg(long)]
    pub(crate) start: Option<String>,
    #[arg(long)]
    pub(crate) end: Option<String>,
    #[arg(long = "employee")]
    pub(crate) employee_id: Option<String>,
}

#[derive(Args)]
pub(crate) struct ShiftDeleteArgs {
    #[arg(long = "schedule")]
    pub(crate) schedule_id: String,
    #[arg(long = "shift")]
    pub(crate) shift_id: String,
}

#[derive(Args)]
pub(crate) struct ShiftIdArgs {
    #[arg(long = "shift")]
    pub(crate) shift_id: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}
