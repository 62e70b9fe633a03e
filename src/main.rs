//! Binary entrypoint for the gout HTTP server.

use std::process::ExitCode;

use gout::start_gout;

/// Load the configuration, open the event catalogs and the RAG engine, then serve.
fn main() -> ExitCode {
    start_gout::run()
}
