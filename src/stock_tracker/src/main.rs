use clap::Parser;
use stock_tracker::{
    cli::{self, Cli},
    logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init()?;
    let args = Cli::parse();
    cli::run(args).await
}
