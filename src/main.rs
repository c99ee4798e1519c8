//! Binary entrypoint for the `topics` command-line client.

use std::process::ExitCode;

use topic_sync::start_topic_sync;

/// Run one topic action against the configured backend.
fn main() -> ExitCode {
    start_topic_sync::run()
}
