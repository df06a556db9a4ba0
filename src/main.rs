mod auth;
mod build;
mod check;
mod checker;
mod cli;
mod fetch;
mod github;
mod images;
mod messages;
mod model;
mod report;
mod settings;
mod storage;

use std::process;

use clap::Parser;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = cli::Cli::parse();
    init_logging(cli.debug);

    if let Err(e) = cli::run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Logs to stderr. `RUST_LOG` wins over `--debug`.
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
