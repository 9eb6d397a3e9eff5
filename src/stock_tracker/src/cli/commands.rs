use std::path::PathBuf;

use clap::{Parser, Subcommand};
use portfolio::models::transaction::Side;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the config file (defaults to ./stock_tracker.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to listen on, overriding the config (e.g. "0.0.0.0:3000")
        #[arg(long)]
        bind: Option<String>,
    },

    /// Print a normalized close-price chart
    Chart {
        #[arg(long)]
        symbol: String,

        /// Range token: 1d, 5d, 1mo, 3mo, 6mo, 1y, 2y, 5y
        #[arg(long, default_value = "6mo")]
        range: String,

        /// Interval token: 1m, 5m, 15m, 30m, 1h, 1d, 1wk, 1mo
        #[arg(long, default_value = "1wk")]
        interval: String,

        /// Prior-session 5 minute sparkline; ignores range and interval
        #[arg(long)]
        mini: bool,
    },

    /// Print the latest quote
    Quote {
        symbol: String,

        /// Keep polling at the configured interval until Ctrl-C
        #[arg(long)]
        watch: bool,
    },

    /// Print open positions for a user
    Positions {
        #[arg(long)]
        user: String,

        /// Mark each position to the latest quote
        #[arg(long)]
        value: bool,
    },

    /// Record a BUY or SELL transaction
    Record {
        #[arg(long)]
        user: String,

        #[arg(long)]
        symbol: String,

        /// BUY or SELL
        #[arg(long)]
        side: Side,

        #[arg(long)]
        quantity: f64,

        #[arg(long)]
        price: f64,
    },
}
