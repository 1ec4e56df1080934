//! Runs the service against an in-memory display and a fixed quote.
//!
//! A reveal is triggered after one second and the service stops after three;
//! every committed frame is printed at the end.
//!
//! ```text
//! cargo run --example dry_run
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quotetower::{
    Config, ContentState, DEFAULT_TOPIC, FetchError, LogWriter, MemoryDisplay, QuoteSource,
    Service, Subscribe,
};

struct Fixed;

#[async_trait]
impl QuoteSource for Fixed {
    async fn fetch(&self) -> Result<ContentState, FetchError> {
        Ok(ContentState::new("Stay hungry, stay foolish", "Stewart Brand"))
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("debug").init();

    let cfg = Config {
        refresh_every: Duration::from_secs(2),
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let service = Service::builder(cfg).with_subscribers(subs).build();

    let trigger = service.trigger();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        trigger.deliver(DEFAULT_TOPIC, "HI");
    });

    let (display, log) = MemoryDisplay::new();
    let stop = async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        Ok(())
    };
    service.run_until(display, Arc::new(Fixed), stop).await?;

    for (i, frame) in log.frames().iter().enumerate() {
        println!("frame {i:>2}: {frame:?}");
    }
    Ok(())
}
