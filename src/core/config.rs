//! Configuration - Type-safe, validated config

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Help text surfaced by the front-end
    #[serde(default = "default_commands")]
    pub commands: String,

    /// Symbol -> token address map consumed by the token resolver
    #[serde(default)]
    pub tokens: HashMap<String, String>,

    /// Exchange configurations, one per venue; iteration order is
    /// preference order for order execution
    pub exchanges: Vec<ExchangeConfig>,
}

/// Immutable per-venue record, created once at startup
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// Venue name (e.g., "uniswap-mainnet")
    pub name: String,

    /// Protocol variant; unknown tags fail at parse time
    pub protocol: Protocol,

    /// Wallet address holding the traded funds
    pub wallet_address: String,

    /// Signing key, never logged
    pub private_key: Secret,

    /// Node RPC endpoint
    pub rpc_url: String,

    /// Off-chain quote API endpoint (aggregator protocols)
    pub api_endpoint: Option<String>,

    /// Off-chain quote API key
    pub api_key: Option<Secret>,

    /// Swap router / allowance target contract
    pub router_contract_addr: String,

    /// Pair factory contract (AMM protocols)
    pub factory_contract_addr: Option<String>,

    /// Base/quote currency this venue trades against
    pub trading_asset_address: String,

    /// Trade size in trading-asset display units, scaled by intent quantity
    pub trading_risk_amount: Decimal,

    /// Slippage tolerance in percent
    pub trading_slippage: Decimal,

    /// Upper bound on the approval receipt wait
    #[serde(default = "default_receipt_timeout")]
    pub receipt_timeout_secs: u64,

    pub block_explorer_url: Option<String>,
    pub block_explorer_api: Option<Secret>,
}

/// Supported protocol variants - a closed set, checked exhaustively at
/// client construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Protocol {
    #[serde(rename = "uniswap")]
    Uniswap,
    #[serde(rename = "0x")]
    ZeroX,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Uniswap => write!(f, "uniswap"),
            Protocol::ZeroX => write!(f, "0x"),
        }
    }
}

/// Opaque secret reference. Debug output is redacted so keys can never
/// reach the logs through config dumps.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret(***)")
    }
}

fn default_commands() -> String {
    "/help /quote <symbol> /buy <symbol> /sell <symbol> /bal /pos /info".to_string()
}

fn default_receipt_timeout() -> u64 {
    120
}

impl Config {
    /// Load from TOML file
    pub fn load(path: impl AsRef<Path>) -> crate::core::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::core::Error::Config(format!("Failed to read config: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parse from TOML content
    pub fn from_toml(content: &str) -> crate::core::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::core::Error::Config(format!("Failed to parse config: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [tokens]
        WBTC = "0x2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599"

        [[exchanges]]
        name = "uniswap-mainnet"
        protocol = "uniswap"
        wallet_address = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e"
        private_key = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef"
        rpc_url = "http://localhost:8545"
        router_contract_addr = "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"
        trading_asset_address = "0xdAC17F958D2ee523a2206206994597C13D831ec7"
        trading_risk_amount = 10
        trading_slippage = 2

        [[exchanges]]
        name = "zerox-mainnet"
        protocol = "0x"
        wallet_address = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e"
        private_key = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef"
        rpc_url = "http://localhost:8545"
        api_endpoint = "https://api.0x.org"
        api_key = "test-key"
        router_contract_addr = "0xDef1C0ded9bec7F1a1670819833240f027b25EfF"
        trading_asset_address = "0xdAC17F958D2ee523a2206206994597C13D831ec7"
        trading_risk_amount = 10
        trading_slippage = 2
    "#;

    #[test]
    fn test_parse_config() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(config.exchanges.len(), 2);
        assert_eq!(config.exchanges[0].protocol, Protocol::Uniswap);
        assert_eq!(config.exchanges[1].protocol, Protocol::ZeroX);
        assert_eq!(config.exchanges[0].receipt_timeout_secs, 120);
        assert!(config.tokens.contains_key("WBTC"));
        assert!(config.commands.contains("/quote"));
    }

    #[test]
    fn test_unknown_protocol_rejected_at_parse() {
        let bad = SAMPLE.replace("protocol = \"uniswap\"", "protocol = \"sushiswap\"");
        assert!(Config::from_toml(&bad).is_err());
    }

    #[test]
    fn test_secret_debug_redacted() {
        let config = Config::from_toml(SAMPLE).unwrap();
        let dump = format!("{:?}", config.exchanges[0]);
        assert!(dump.contains("Secret(***)"));
        assert!(!dump.contains("1234567890abcdef"));
    }
}
