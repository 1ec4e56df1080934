use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use quotetower::{
    Cli, Config, Display, HttpQuoteSource, LogWriter, MemoryDisplay, RuntimeError, Service,
    Subscribe, TowerClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let dry_run = cli.dry_run;
    let cfg = cli.into_config();

    let source = HttpQuoteSource::new(&cfg.quotes_url, &cfg.category, cfg.fetch_timeout)
        .map_err(|e| RuntimeError::startup("quote source", e))?;
    tracing::info!(url = source.url(), "quote source ready");

    let display: Box<dyn Display> = if dry_run {
        let (display, _log) = MemoryDisplay::new();
        Box::new(display)
    } else {
        Box::new(connect_display(&cfg).await?)
    };

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let service = Service::builder(cfg).with_subscribers(subs).build();
    service.run(display, Arc::new(source)).await?;
    Ok(())
}

/// Dials the display, retrying with the startup backoff.
async fn connect_display(cfg: &Config) -> Result<TowerClient, RuntimeError> {
    let attempts = cfg.startup_attempts_clamped();
    let mut attempt = 1;
    loop {
        match TowerClient::connect(cfg.display_addr.as_str()).await {
            Ok(client) => return Ok(client),
            Err(e) if attempt >= attempts => {
                return Err(RuntimeError::startup("display connect", e));
            }
            Err(e) => {
                let delay = cfg.startup_backoff.next(attempt - 1);
                tracing::warn!(attempt, ?delay, error = %e, "display connect failed; retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
