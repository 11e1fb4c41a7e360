use crate::commands::CollectorArguments;
use crate::server::start_web_server;
use anyhow::{bail, Result};
use clap::Parser;
use config_collector::Collector;
use std::net::SocketAddr;
use tokio::select;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(flatten)]
    pub collector: CollectorArguments,

    /// The listen address for the metrics endpoint.
    ///
    /// Defaults to `127.0.0.1:9101`.
    #[clap(short, long, env = "CC_EXPORTER_LISTEN_ADDRESS")]
    listen_address: Option<SocketAddr>,
}

pub async fn handle_command(args: Arguments) -> Result<()> {
    let settings = args.collector.settings()?;

    let listen_address = args
        .listen_address
        .or(settings.listen_address)
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 9101)));

    let collector = Collector::new(args.collector.collector_config(&settings));

    info!(
        config_dir = ?collector.config().config_dir,
        "Serving probe metrics"
    );

    select! {
        biased;

        _ = tokio::signal::ctrl_c() => {
            info!("SIGINT signal received, exiting...");
            Ok(())
        }

        result = start_web_server(&listen_address, collector) => {
            if let Err(err) = result {
                bail!("Web server exited with an error: {err:?}");
            }
            Ok(())
        }
    }
}
