//! `goodwork` binary entrypoint.

use std::process;

#[tokio::main]
async fn main() {
    let exit_code = goodwork_cli::run().await;
    process::exit(exit_code);
}
