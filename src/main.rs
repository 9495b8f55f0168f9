use tracing_subscriber::{EnvFilter, fmt};

use dexswap::core::{Config, OrderIntent, Side};
use dexswap::execution::Orchestrator;
use rust_decimal::Decimal;
use std::str::FromStr;

fn usage() -> String {
    "usage: dexswap <config.toml> <command> [args]\n\
     commands: quote <token> | buy <token> [qty] | sell <token> [qty] | \
     bal | asset | pos | info | name | help"
        .to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dexswap=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(config_path) = args.next() else {
        println!("{}", usage());
        return Ok(());
    };
    let command = args.next().unwrap_or_else(|| "help".to_string());

    let config = Config::load(&config_path)?;
    let orchestrator = Orchestrator::from_config(&config).await?;

    let output = match command.as_str() {
        "quote" => {
            let token = args.next().ok_or_else(|| anyhow::anyhow!(usage()))?;
            orchestrator.get_quote(&token).await
        }
        "buy" | "sell" => {
            let token = args.next().ok_or_else(|| anyhow::anyhow!(usage()))?;
            let side = Side::from_str(&command)?;
            let mut intent = OrderIntent::new(side, token);
            if let Some(qty) = args.next() {
                intent = intent.with_quantity(Decimal::from_str(&qty)?);
            }
            orchestrator.execute_order(&intent).await
        }
        "bal" => orchestrator.get_account_balance().await,
        "asset" => orchestrator.get_trading_asset_balance().await,
        "pos" => orchestrator.get_account_position().await,
        "info" => orchestrator.get_info().await,
        "name" => orchestrator.get_name(),
        _ => orchestrator.get_help(),
    };

    println!("{}", output);
    Ok(())
}
