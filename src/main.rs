//! adasink CLI
//!
//! Host process for a target adapter. Unrecoverable sink failures reported
//! by the library terminate the process with a non-zero status.

use adasink::cli::{Cli, Runner};
use clap::Parser;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        if e.is_fatal() {
            tracing::error!(error = %e, "unrecoverable sink failure");
        } else {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}
