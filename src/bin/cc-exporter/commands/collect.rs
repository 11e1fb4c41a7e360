use crate::commands::CollectorArguments;
use anyhow::{Context, Result};
use clap::Parser;
use config_collector::Collector;
use std::io::{self, Write};
use tracing::debug;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(flatten)]
    pub collector: CollectorArguments,

    /// Metric text printed before the probe metrics.
    #[clap(long, env = "CC_EXPORTER_BASE_METRIC", default_value = "")]
    base_metric: String,
}

pub async fn handle_command(args: Arguments) -> Result<()> {
    let settings = args.collector.settings()?;
    let collector = Collector::new(args.collector.collector_config(&settings));

    debug!(config = ?collector.config(), "Running a single collection");

    let metrics = collector.collect(&args.base_metric).await;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(metrics.as_bytes())
        .and_then(|_| stdout.flush())
        .context("Unable to write metrics to stdout")?;

    Ok(())
}
