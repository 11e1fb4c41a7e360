use anyhow::{Context, Result};
use clap::Parser;
use commands::{handle_command, Application};
use std::io;
use tracing::metadata::LevelFilter;
use tracing::{debug, error};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

mod commands;
mod server;

#[tokio::main]
async fn main() {
    let app = Application::parse();

    if let Err(err) = init_logging(app.log_json) {
        eprintln!("Unable to initialize logging: {:#}", err);
        std::process::exit(1);
    }

    let result = handle_command(app).await;

    match result {
        Ok(_) => debug!("Command completed successfully"),
        Err(err) => {
            error!("Command failed: {:?}", err);
            std::process::exit(1);
        }
    }
}

/// Initialize logging for the application.
///
/// Everything at level info and higher is logged to stderr, leaving stdout
/// for the metrics printed by `collect`. Users are able to influence this by
/// exporting the `RUST_LOG` environment variable, for example
/// `RUST_LOG=config_collector=debug,info` shows the outcome of every probe.
fn init_logging(json: bool) -> Result<()> {
    // The filter layer controls which log levels to display.
    let filter_layer = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let registry = Registry::default().with(filter_layer);

    let result = if json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .try_init()
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).try_init()
    };

    result.context("unable to initialize logger")?;

    Ok(())
}
