//! Span helpers for command-level context.

use tracing::Span;

use crate::init::build_sha;

/// Build the top-level span wrapping a single CLI command.
///
/// Every event emitted while the span is entered carries the command label,
/// the per-invocation trace identifier and the build SHA.
#[must_use]
pub fn command_span(command: &str, trace_id: &str) -> Span {
    tracing::info_span!(
        "command",
        command = %command,
        trace_id = %trace_id,
        build_sha = %build_sha()
    )
}
