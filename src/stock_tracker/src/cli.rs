mod commands;

pub use commands::{Cli, Commands};

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use market_data::{
    chart::{Chart, fetch_chart, fetch_mini_chart},
    lookup::fetch_quote,
    models::quote::LatestQuote,
    outcome::FetchOutcome,
    providers::{QuoteProvider, build_bars_provider, build_quote_provider},
};
use portfolio::{
    ledger,
    models::transaction::NewTransaction,
    store::build_store,
    valuation::value_position,
};
use tokio::{net::TcpListener, time::MissedTickBehavior};
use tracing::warn;

use crate::{
    config::AppConfig,
    server::{self, AppState},
};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            let addr = config.bind_addr()?;
            let state = AppState::from_config(&config)?;
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("bind {addr}"))?;
            server::serve(state, listener).await
        }

        Commands::Chart {
            symbol,
            range,
            interval,
            mini,
        } => {
            let provider = build_bars_provider(config.market_data.provider, &config.endpoints())?;
            let tz = config.display_tz()?;
            let now = Utc::now();
            let outcome = if mini {
                fetch_mini_chart(provider.as_ref(), &symbol, now, tz).await?
            } else {
                fetch_chart(provider.as_ref(), &symbol, &range, &interval, now, tz).await?
            };
            print_chart(&symbol, outcome);
            Ok(())
        }

        Commands::Quote { symbol, watch } => {
            let quotes = build_quote_provider(&config.endpoints())?;
            if !watch {
                print_quote(&symbol, fetch_quote(quotes.as_ref(), &symbol).await?);
                return Ok(());
            }
            watch_quote(quotes, &symbol, &config).await
        }

        Commands::Positions { user, value } => {
            let store = build_store(&config.store)?;
            let positions = ledger::positions(store.as_ref(), &user).await?;
            if positions.is_empty() {
                println!("no open positions for {user}");
                return Ok(());
            }
            let quotes = if value {
                Some(build_quote_provider(&config.endpoints())?)
            } else {
                None
            };
            for position in positions {
                let avg = position
                    .average_cost
                    .map_or_else(|| "-".to_string(), |a| format!("{a:.4}"));
                print!(
                    "{:<8} qty {:>12.4}  avg {:>12}  cost {:>14.2}",
                    position.symbol, position.quantity, avg, position.total_cost
                );
                if let Some(quotes) = &quotes {
                    let quote = fetch_quote(quotes.as_ref(), &position.symbol).await?;
                    match quote.ready().and_then(|q| value_position(&position, &q)) {
                        Some(v) => print!(
                            "  mark {:>10.4}  value {:>14.2}  pnl {:>12.2}",
                            v.mark_price, v.market_value, v.unrealized_pnl
                        ),
                        None => print!("  mark -"),
                    }
                }
                println!();
            }
            Ok(())
        }

        Commands::Record {
            user,
            symbol,
            side,
            quantity,
            price,
        } => {
            let store = build_store(&config.store)?;
            let new = NewTransaction {
                user_id: user,
                symbol,
                side,
                quantity,
                price,
            };
            let stored = ledger::record(store.as_ref(), new).await?;
            println!("{}", serde_json::to_string_pretty(&stored)?);
            Ok(())
        }
    }
}

async fn watch_quote(
    quotes: Arc<dyn QuoteProvider>,
    symbol: &str,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(config.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                print_quote(symbol, fetch_quote(quotes.as_ref(), symbol).await?);
            }
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!(error = %e, "ctrl-c handler failed");
                }
                return Ok(());
            }
        }
    }
}

fn print_chart(symbol: &str, outcome: FetchOutcome<Chart>) {
    match outcome {
        FetchOutcome::Ready(chart) => {
            println!(
                "{} {} {} .. {}",
                chart.symbol, chart.window.timeframe, chart.window.start, chart.window.end
            );
            for (label, close) in chart.series.labels.iter().zip(&chart.series.closes) {
                println!("{label}\t{close:.4}");
            }
        }
        FetchOutcome::EmptyResult => println!("{symbol}: no data"),
        FetchOutcome::UpstreamUnavailable { reason } => {
            println!("{symbol}: no data (upstream unavailable: {reason})")
        }
    }
}

fn print_quote(symbol: &str, outcome: FetchOutcome<LatestQuote>) {
    match outcome {
        FetchOutcome::Ready(q) => println!(
            "{} {}  bid {:.4} x {}  ask {:.4} x {}",
            q.symbol,
            q.timestamp.format("%H:%M:%S"),
            q.bid_price,
            q.bid_size,
            q.ask_price,
            q.ask_size
        ),
        FetchOutcome::EmptyResult => println!("{symbol}: no quote"),
        FetchOutcome::UpstreamUnavailable { reason } => {
            println!("{symbol}: no quote (upstream unavailable: {reason})")
        }
    }
}
