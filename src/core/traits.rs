//! Core traits - capability boundaries for adapters and the chain RPC

use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, H256, TransactionReceipt, U256};
use rust_decimal::Decimal;

use crate::core::Result;

/// Protocol-specific exchange adapter - translates generic quote/swap calls
/// into a venue's contract or API calls.
#[async_trait]
pub trait DexAdapter: Send + Sync {
    /// Venue name
    fn name(&self) -> &str;

    /// Price of one sell-token unit denominated in the buy token
    async fn get_quote(&self, buy: Address, sell: Address) -> Result<Decimal>;

    /// Execute a swap; returns the broadcast transaction hash
    async fn swap(&self, buy: Address, sell: Address, quantity: Decimal) -> Result<String>;

    /// Human-readable venue summary line
    async fn get_info(&self) -> Result<String>;
}

/// Node RPC capability the core calls through. One implementation per
/// exchange configuration, shared read-only across concurrent calls.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain id, resolved once at connection time
    fn chain_id(&self) -> u64;

    /// Native currency balance in wei
    async fn native_balance(&self, owner: Address) -> Result<U256>;

    /// Read-only contract call
    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes>;

    /// Raw gas estimate for a transaction
    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256>;

    /// Current network gas price in wei
    async fn gas_price(&self) -> Result<U256>;

    /// Next transaction nonce for an account
    async fn nonce(&self, owner: Address) -> Result<U256>;

    /// Broadcast a signed raw transaction, returning its hash
    async fn broadcast(&self, raw: Bytes) -> Result<H256>;

    /// Poll for a mined receipt; None while pending
    async fn receipt(&self, tx_hash: H256) -> Result<Option<TransactionReceipt>>;
}
