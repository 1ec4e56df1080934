//! Command-line interface.
//!
//! Every flag can also be set through a `QUOTETOWER_*` environment variable.
//! Durations are whole seconds unless the flag name says otherwise; `0`
//! disables a cadence.

use std::time::Duration;

use clap::Parser;

use crate::config::{Config, DEFAULT_TOPIC, RevealPacing};
use crate::content::DEFAULT_QUOTES_URL;

#[derive(Parser, Debug, Clone)]
#[command(name = "quotetower", version)]
#[command(about = "Quote of the day and secret reveals on a shared display", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, env = "QUOTETOWER_DEBUG")]
    pub debug: bool,

    /// Quote category (empty for any)
    #[arg(long, env = "QUOTETOWER_CATEGORY", default_value = "students")]
    pub category: String,

    /// Display server address
    #[arg(long, env = "QUOTETOWER_URL", default_value = "localhost:10000")]
    pub url: String,

    /// Quote-of-the-day endpoint
    #[arg(long, env = "QUOTETOWER_QUOTES_URL", default_value = DEFAULT_QUOTES_URL)]
    pub quotes_url: String,

    /// Address accepting trigger messages (empty to disable)
    #[arg(long, env = "QUOTETOWER_TRIGGER_LISTEN", default_value = "")]
    pub trigger_listen: String,

    /// Topic whose messages are revealed
    #[arg(long, env = "QUOTETOWER_TOPIC", default_value = DEFAULT_TOPIC)]
    pub topic: String,

    /// Seconds between re-renders of the current quote
    #[arg(long, env = "QUOTETOWER_REFRESH_EVERY", default_value = "60")]
    pub refresh_every: u64,

    /// Seconds between quote fetches
    #[arg(long, env = "QUOTETOWER_REFETCH_EVERY", default_value = "3600")]
    pub refetch_every: u64,

    /// Milliseconds each revealed character stays on screen
    #[arg(long, env = "QUOTETOWER_REVEAL_ON_MS", default_value = "500")]
    pub reveal_on_ms: u64,

    /// Milliseconds of blank screen between revealed characters
    #[arg(long, env = "QUOTETOWER_REVEAL_OFF_MS", default_value = "200")]
    pub reveal_off_ms: u64,

    /// Seconds to wait for tasks on shutdown
    #[arg(long, env = "QUOTETOWER_GRACE", default_value = "5")]
    pub grace: u64,

    /// Seconds before a quote fetch times out
    #[arg(long, env = "QUOTETOWER_FETCH_TIMEOUT", default_value = "10")]
    pub fetch_timeout: u64,

    /// Render into memory instead of connecting to the display
    #[arg(long, env = "QUOTETOWER_DRY_RUN")]
    pub dry_run: bool,
}

impl Cli {
    /// Converts parsed flags into a [`Config`]; unset knobs keep their defaults.
    pub fn into_config(self) -> Config {
        Config {
            display_addr: self.url,
            quotes_url: self.quotes_url,
            category: self.category,
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
            topic: self.topic,
            trigger_listen: self.trigger_listen,
            refresh_every: Duration::from_secs(self.refresh_every),
            refetch_every: Duration::from_secs(self.refetch_every),
            reveal: RevealPacing {
                on: Duration::from_millis(self.reveal_on_ms),
                off: Duration::from_millis(self.reveal_off_ms),
            },
            grace: Duration::from_secs(self.grace),
            ..Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_config_defaults() {
        let cli = Cli::try_parse_from(["quotetower"]).unwrap();
        assert!(!cli.debug);
        assert!(!cli.dry_run);

        let cfg = cli.into_config();
        let def = Config::default();
        assert_eq!(cfg.display_addr, "localhost:10000");
        assert_eq!(cfg.category, "students");
        assert_eq!(cfg.quotes_url, def.quotes_url);
        assert_eq!(cfg.topic, def.topic);
        assert_eq!(cfg.refresh_every, def.refresh_every);
        assert_eq!(cfg.refetch_every, def.refetch_every);
        assert_eq!(cfg.reveal, RevealPacing::default());
        assert_eq!(cfg.grace, def.grace);
        assert_eq!(cfg.trigger_addr(), None);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "quotetower",
            "--debug",
            "--category",
            "",
            "--url",
            "tower:9000",
            "--trigger-listen",
            "127.0.0.1:7000",
            "--refresh-every",
            "0",
            "--reveal-on-ms",
            "100",
            "--reveal-off-ms",
            "50",
        ])
        .unwrap();
        assert!(cli.debug);

        let cfg = cli.into_config();
        assert_eq!(cfg.category, "");
        assert_eq!(cfg.display_addr, "tower:9000");
        assert_eq!(cfg.trigger_addr(), Some("127.0.0.1:7000"));
        assert_eq!(cfg.refresh_interval(), None);
        assert_eq!(cfg.reveal.on, Duration::from_millis(100));
        assert_eq!(cfg.reveal.off, Duration::from_millis(50));
    }

    #[test]
    fn test_rejects_non_numeric_duration() {
        assert!(Cli::try_parse_from(["quotetower", "--grace", "soon"]).is_err());
    }
}
