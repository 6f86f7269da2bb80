//! Quire command-line application
//!
//! Resolves the images referenced by a markdown document and manages the
//! recent documents list.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("quire error: {:#}", err);
        std::process::exit(1);
    }
}
