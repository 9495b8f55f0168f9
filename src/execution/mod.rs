//! Execution layer - routes one trade intent across all configured venues
//!
//! Policy split: writes (swaps) are first-success-wins to avoid duplicate
//! submissions and double gas spend; reads (quotes) are all-exchanges with
//! per-venue sentinels. Venue iteration order is configuration order.

use ethers::types::Address;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::account::AccountSigner;
use crate::chain::HttpChain;
use crate::contracts::{TokenRegistry, parse_address};
use crate::core::{
    ChainClient, Config, DexAdapter, Error, ExchangeConfig, OrderIntent, Protocol, Quote, Result,
    resolve_direction,
};
use crate::exchanges::{UniswapDex, ZeroXDex};

/// Runtime binding of one exchange configuration to a live adapter and
/// signer. Owned exclusively by the orchestrator's registry.
pub(crate) struct ExchangeClient {
    pub(crate) name: String,
    pub(crate) trading_asset: Address,
    pub(crate) adapter: Arc<dyn DexAdapter>,
    pub(crate) signer: Arc<AccountSigner>,
    pub(crate) tokens: Arc<TokenRegistry>,
    pub(crate) explorer_url: Option<String>,
}

impl ExchangeClient {
    async fn connect(cfg: &ExchangeConfig, token_map: &HashMap<String, Address>) -> Result<Self> {
        let chain: Arc<dyn ChainClient> = Arc::new(HttpChain::connect(&cfg.rpc_url).await?);
        let router = parse_address(&cfg.router_contract_addr)
            .map_err(|e| Error::Config(format!("{}: {}", cfg.name, e)))?;
        let trading_asset = parse_address(&cfg.trading_asset_address)
            .map_err(|e| Error::Config(format!("{}: {}", cfg.name, e)))?;
        let tokens = Arc::new(TokenRegistry::new(chain.clone(), token_map.clone()));
        let signer = Arc::new(AccountSigner::new(
            chain.clone(),
            tokens.clone(),
            &cfg.private_key,
            router,
            trading_asset,
            Duration::from_secs(cfg.receipt_timeout_secs),
        )?);

        let configured_wallet = parse_address(&cfg.wallet_address)
            .map_err(|e| Error::Config(format!("{}: {}", cfg.name, e)))?;
        if configured_wallet != signer.address() {
            return Err(Error::Config(format!(
                "{}: wallet_address does not match the private key",
                cfg.name
            )));
        }

        let adapter: Arc<dyn DexAdapter> = match cfg.protocol {
            Protocol::Uniswap => Arc::new(UniswapDex::new(
                cfg.name.clone(),
                chain.clone(),
                tokens.clone(),
                signer.clone(),
                router,
                cfg.trading_risk_amount,
                cfg.trading_slippage,
            )?),
            Protocol::ZeroX => {
                let api_endpoint = cfg.api_endpoint.clone().ok_or_else(|| {
                    Error::Config(format!("{}: api_endpoint required for 0x", cfg.name))
                })?;
                Arc::new(ZeroXDex::new(
                    cfg.name.clone(),
                    api_endpoint,
                    cfg.api_key.clone(),
                    tokens.clone(),
                    signer.clone(),
                    router,
                    cfg.trading_risk_amount,
                    cfg.trading_slippage,
                ))
            }
        };

        Ok(Self {
            name: cfg.name.clone(),
            trading_asset,
            adapter,
            signer,
            tokens,
            explorer_url: cfg.block_explorer_url.clone(),
        })
    }
}

/// Fans trade intents and read operations across the configured venues
pub struct Orchestrator {
    pub(crate) clients: Vec<ExchangeClient>,
    pub(crate) commands: String,
}

impl Orchestrator {
    /// Build the client registry. Construction failures are explicit; no
    /// exchange is ever silently dropped from the registry.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let mut token_map = HashMap::new();
        for (symbol, addr) in &config.tokens {
            let parsed = parse_address(addr)
                .map_err(|e| Error::Config(format!("token {}: {}", symbol, e)))?;
            token_map.insert(symbol.clone(), parsed);
        }

        let mut clients = Vec::with_capacity(config.exchanges.len());
        for cfg in &config.exchanges {
            info!(exchange = %cfg.name, protocol = %cfg.protocol, "loading exchange");
            clients.push(ExchangeClient::connect(cfg, &token_map).await?);
        }
        info!(exchanges = clients.len(), "registry ready");

        Ok(Self {
            clients,
            commands: config.commands.clone(),
        })
    }

    /// Execute a trade intent: try venues in configured order and return a
    /// confirmation for the first successful swap. Remaining venues are not
    /// attempted once one succeeds. If every venue fails, the whole
    /// operation collapses to a single warning string - never an Err.
    pub async fn execute_order(&self, intent: &OrderIntent) -> String {
        let mut last_error: Option<Error> = None;
        for client in &self.clients {
            debug!(exchange = %client.name, side = %intent.side, "executing order");
            match self.try_execute(client, intent).await {
                Ok(confirmation) => {
                    return format!(
                        "{} {}\n{}",
                        intent.side.glyph(),
                        intent.instrument,
                        confirmation
                    );
                }
                Err(e) => {
                    warn!(exchange = %client.name, error = %e, "order attempt failed");
                    last_error = Some(e);
                }
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no exchanges configured".to_string());
        format!("⚠️ order execution: {}", reason)
    }

    async fn try_execute(&self, client: &ExchangeClient, intent: &OrderIntent) -> Result<String> {
        let instrument = client.tokens.resolve(&intent.instrument)?;
        let (sell, buy) = resolve_direction(intent.side, client.trading_asset, instrument);
        let confirmation = client.adapter.swap(buy, sell, intent.quantity).await?;
        if confirmation.is_empty() {
            return Err(Error::Execution(format!("{}: empty swap result", client.name)));
        }
        Ok(match &client.explorer_url {
            Some(url) => format!(
                "{}\n{}/tx/{}",
                confirmation,
                url.trim_end_matches('/'),
                confirmation
            ),
            None => confirmation,
        })
    }

    /// Quote a token against every venue's trading asset: one line per
    /// configured exchange, failures replaced inline with a sentinel.
    pub async fn get_quote(&self, sell_token: &str) -> String {
        let lines = join_all(
            self.clients
                .iter()
                .map(|client| self.quote_line(client, sell_token)),
        )
        .await;
        lines.join("\n")
    }

    async fn quote_line(&self, client: &ExchangeClient, sell_token: &str) -> String {
        match self.try_quote(client, sell_token).await {
            Ok(quote) => format!("{}: {}", client.name, quote),
            Err(e) => {
                warn!(exchange = %client.name, error = %e, "quote failed");
                format!("{}: Quote failed", client.name)
            }
        }
    }

    async fn try_quote(&self, client: &ExchangeClient, sell_token: &str) -> Result<Quote> {
        let sell = client.tokens.resolve(sell_token)?;
        let price = client.adapter.get_quote(client.trading_asset, sell).await?;
        let symbol = client.tokens.symbol(client.trading_asset).await?;
        Ok(Quote { price, symbol })
    }
}
