use std::time::Duration;

use anyhow::anyhow;
use goodwork_client::ReachabilityPoller;
use tracing::info;

use crate::cli::WatchArgs;
use crate::client::{AppContext, CliError, CliResult};

pub(crate) async fn handle_watch(ctx: &AppContext, args: WatchArgs) -> CliResult<()> {
    let interval = match args.interval {
        Some(0) => return Err(CliError::validation("interval must be greater than zero")),
        Some(secs) => Duration::from_secs(secs),
        None => ctx.poll_interval,
    };

    eprintln!(
        "watching {} every {}s; press Ctrl-C to stop",
        ctx.api.client().base_url(),
        interval.as_secs()
    );
    let handle = ReachabilityPoller::spawn(ctx.api.clone(), interval);

    let stopped = match args.duration {
        Some(secs) => {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            Ok(())
        }
        None => tokio::signal::ctrl_c().await,
    };
    handle.shutdown().await;
    info!("watch stopped");

    stopped.map_err(|err| CliError::failure(anyhow!("failed to listen for Ctrl-C: {err}")))?;

    if ctx.api.client().connectivity().is_offline() {
        Err(CliError::failure(anyhow!("backend still unreachable")))
    } else {
        Ok(())
    }
}
