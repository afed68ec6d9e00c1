//! Server configuration from CLI flags and environment variables.

use allocator::types::{DEFAULT_MAX_ENTRY_AMOUNT, DEFAULT_SAVINGS_FRACTION};
use allocator::{AllocationConfig, ConfigError};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Lottery life-simulation game server
#[derive(Parser, Debug, Clone)]
#[command(name = "lotto-server")]
#[command(about = "HTTP backend for the lottery winnings life-simulation game")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:6957")]
    pub listen: SocketAddr,

    /// SQLite file holding the leaderboard table
    #[arg(long, env = "DATABASE_PATH", default_value = "game.db")]
    pub database_path: PathBuf,

    /// Directory containing `<category>.json` catalog files
    #[arg(long, env = "CATALOG_DIR", default_value = "static/json")]
    pub catalog_dir: PathBuf,

    /// Idle lifetime of a browser session, in days
    #[arg(long, env = "SESSION_TTL_DAYS", default_value = "14")]
    pub session_ttl_days: u64,

    /// Webhook receiving outbound email notifications (disabled when unset)
    #[arg(long, env = "NOTIFY_WEBHOOK_URL")]
    pub notify_webhook_url: Option<String>,

    /// Timeout for the outbound notification call, in milliseconds
    #[arg(long, env = "NOTIFY_TIMEOUT_MS", default_value = "5000")]
    pub notify_timeout_ms: u64,

    /// Largest jackpot accepted before tax computation
    #[arg(long, env = "MAX_ENTRY_AMOUNT", default_value_t = DEFAULT_MAX_ENTRY_AMOUNT)]
    pub max_entry_amount: f64,

    /// Share of net proceeds placed in savings
    #[arg(long, env = "SAVINGS_FRACTION", default_value_t = DEFAULT_SAVINGS_FRACTION)]
    pub savings_fraction: f64,

    /// Log level (trace, debug, info, warn, error), used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_days * 24 * 60 * 60)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_ms)
    }

    /// Builds the calculator constants once at startup.
    pub fn allocation_config(&self) -> Result<AllocationConfig, ConfigError> {
        AllocationConfig {
            savings_fraction: self.savings_fraction,
            max_entry_amount: self.max_entry_amount,
            ..Default::default()
        }
        .validate()
    }
}
