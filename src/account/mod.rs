//! Account signing pipeline - one wallet's authorization and transaction
//! lifecycle for one exchange configuration.
//!
//! Authorization path for a swap: NO_ALLOWANCE -> APPROVAL_SUBMITTED ->
//! APPROVAL_CONFIRMED -> SWAP_SIGNABLE. The approval receipt is awaited
//! (bounded by `receipt_timeout`) before any dependent swap is signed; a
//! swap against a still-zero allowance would revert on-chain and waste gas.

use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, H256, TransactionReceipt, TransactionRequest, U256};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use crate::contracts::{Erc20, TokenRegistry, checksum, from_base_units};
use crate::core::{ChainClient, Error, Result, Secret};

const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Maximal approval amount granted to the router
fn max_approval() -> U256 {
    U256::from(u64::MAX) * U256::exp10(18)
}

/// Owns a wallet's credentials; performs allowance checks, approval
/// transactions, gas estimation, signing, and broadcast.
///
/// Failures in the public operations are contained here: reporting calls
/// degrade to sentinels, approval/sign calls log and return `None`, so a
/// single exchange's failure never aborts orchestration across the others.
pub struct AccountSigner {
    chain: Arc<dyn ChainClient>,
    tokens: Arc<TokenRegistry>,
    wallet: LocalWallet,
    wallet_address: Address,
    account_label: String,
    trading_asset: Address,
    router: Address,
    receipt_timeout: Duration,
}

impl AccountSigner {
    /// The router (spender) address is an explicit parameter; nothing here
    /// reads ambient configuration.
    pub fn new(
        chain: Arc<dyn ChainClient>,
        tokens: Arc<TokenRegistry>,
        private_key: &Secret,
        router: Address,
        trading_asset: Address,
        receipt_timeout: Duration,
    ) -> Result<Self> {
        let key = private_key.expose();
        let key = key.strip_prefix("0x").unwrap_or(key);
        let wallet = LocalWallet::from_str(key)
            .map_err(|e| Error::Config(format!("invalid private key: {}", e)))?
            .with_chain_id(chain.chain_id());
        let wallet_address = wallet.address();
        let checksummed = checksum(&wallet_address);
        let account_label = format!(
            "{} - {}",
            chain.chain_id(),
            &checksummed[checksummed.len() - 8..]
        );
        debug!(account = %account_label, "signer ready");

        Ok(Self {
            chain,
            tokens,
            wallet,
            wallet_address,
            account_label,
            trading_asset,
            router,
            receipt_timeout,
        })
    }

    pub fn address(&self) -> Address {
        self.wallet_address
    }

    pub fn account_label(&self) -> &str {
        &self.account_label
    }

    // ─────────────────────────────────────────────────────────────
    // Reporting
    // ─────────────────────────────────────────────────────────────

    /// Native + trading-asset balance snapshot, recomputed on every call.
    /// Sub-query failures degrade to a sentinel; partial information beats
    /// total failure for a reporting call.
    pub async fn get_account_balance(&self) -> String {
        let native = match self.try_native_balance().await {
            Ok(balance) => balance.round_dp(5).normalize().to_string(),
            Err(e) => {
                debug!(error = %e, "native balance query failed");
                "failed".to_string()
            }
        };
        let asset = match self.try_trading_asset_balance().await {
            Ok(balance) => balance.normalize().to_string(),
            Err(e) => {
                debug!(error = %e, "trading asset balance query failed");
                "failed".to_string()
            }
        };
        format!("🏦 Balance {}\n₿ {}\n💵 {}", self.account_label, native, asset)
    }

    /// Trading-asset balance; zero when unavailable, since balance-of on a
    /// non-existent position is semantically zero, not a fault.
    pub async fn get_trading_asset_balance(&self) -> Decimal {
        match self.try_trading_asset_balance().await {
            Ok(balance) => balance,
            Err(e) => {
                debug!(error = %e, "trading asset balance unavailable");
                Decimal::ZERO
            }
        }
    }

    /// Open-position count and margin are reported as zero until a
    /// position-tracking subsystem exists.
    pub async fn get_account_position(&self) -> String {
        format!(
            "📊 Position {}\nOpened: {}\nMargin: {}",
            self.account_label, 0, 0
        )
    }

    async fn try_native_balance(&self) -> Result<Decimal> {
        let wei = self.chain.native_balance(self.wallet_address).await?;
        from_base_units(wei, 18)
    }

    async fn try_trading_asset_balance(&self) -> Result<Decimal> {
        self.tokens
            .display_balance(self.trading_asset, self.wallet_address)
            .await
    }

    // ─────────────────────────────────────────────────────────────
    // Authorization and signing
    // ─────────────────────────────────────────────────────────────

    /// The safety gate before any swap: grant the router a maximal
    /// allowance for `token` unless one already exists.
    ///
    /// Returns the mined approval receipt, or `None` when the call was a
    /// no-op or failed (failures are logged, never raised past here).
    pub async fn get_approve(&self, token: Address) -> Option<TransactionReceipt> {
        match self.try_approve(token).await {
            Ok(receipt) => receipt,
            Err(e) => {
                error!(token = %checksum(&token), error = %e, "approval failed");
                None
            }
        }
    }

    /// Approval with error detail, for the swap path: adapters must not
    /// proceed to swap submission when this fails.
    pub(crate) async fn try_approve(&self, token: Address) -> Result<Option<TransactionReceipt>> {
        let erc20 = self.tokens.erc20(token);
        let allowance = erc20
            .allowance(self.wallet_address, self.router)
            .await
            .map_err(|e| Error::Approval(e.to_string()))?;
        if !allowance.is_zero() {
            debug!(token = %checksum(&token), %allowance, "allowance already granted");
            return Ok(None);
        }

        let data = Erc20::approve_data(self.router, max_approval());
        let tx: TypedTransaction = TransactionRequest::new().to(token).data(data).into();
        let tx_hash = self
            .try_sign(tx)
            .await
            .map_err(|e| Error::Approval(e.to_string()))?;
        let receipt = self
            .wait_for_receipt(tx_hash)
            .await
            .map_err(|e| Error::Approval(e.to_string()))?;
        Ok(Some(receipt))
    }

    /// Sign with the held key and broadcast; fail closed (log + None) so
    /// orchestrator-level aggregation semantics are preserved.
    pub async fn get_sign(&self, tx: TypedTransaction) -> Option<H256> {
        match self.try_sign(tx).await {
            Ok(hash) => Some(hash),
            Err(e) => {
                error!(error = %e, "sign failed");
                None
            }
        }
    }

    /// Fill nonce/gas/chain id, sign, and broadcast the raw transaction
    pub(crate) async fn try_sign(&self, mut tx: TypedTransaction) -> Result<H256> {
        tx.set_from(self.wallet_address);
        tx.set_chain_id(self.chain.chain_id());
        let nonce = self.chain.nonce(self.wallet_address).await?;
        tx.set_nonce(nonce);
        let gas_price = self.chain.gas_price().await?;
        tx.set_gas_price(gas_price);
        let gas = self.get_gas(&tx).await?;
        tx.set_gas(gas);

        let signature = self
            .wallet
            .sign_transaction(&tx)
            .await
            .map_err(|e| Error::Sign(e.to_string()))?;
        let raw = tx.rlp_signed(&signature);
        self.chain.broadcast(raw).await
    }

    /// Node estimate with a 25% margin against state changes between
    /// estimation and execution
    pub async fn get_gas(&self, tx: &TypedTransaction) -> Result<U256> {
        let estimate = self.chain.estimate_gas(tx).await?;
        Ok(estimate * U256::from(125u64) / U256::from(100u64))
    }

    /// Network gas price in gwei, rounded to 2 decimal places
    pub async fn get_gas_price(&self) -> Result<Decimal> {
        let wei = self.chain.gas_price().await?;
        let gwei = ethers::utils::format_units(wei, "gwei")
            .map_err(|e| Error::Chain(e.to_string()))?;
        let price = Decimal::from_str(&gwei).map_err(|e| Error::Chain(e.to_string()))?;
        Ok(price.round_dp(2))
    }

    /// Poll for the mined receipt, bounded by the configured timeout
    pub(crate) async fn wait_for_receipt(&self, tx_hash: H256) -> Result<TransactionReceipt> {
        let deadline = tokio::time::Instant::now() + self.receipt_timeout;
        loop {
            if let Some(receipt) = self.chain.receipt(tx_hash).await? {
                return Ok(receipt);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Chain(format!("receipt timeout for {:#x}", tx_hash)));
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::testing::MockChain;
    use std::collections::HashMap;

    const TEST_KEY: &str = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";

    fn signer_with(chain: Arc<MockChain>) -> AccountSigner {
        let chain_dyn: Arc<dyn ChainClient> = chain;
        let tokens = Arc::new(TokenRegistry::new(chain_dyn.clone(), HashMap::new()));
        AccountSigner::new(
            chain_dyn,
            tokens,
            &Secret::new(TEST_KEY),
            Address::from([0xf0; 20]),
            Address::from([0xa5; 20]),
            Duration::from_secs(30),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_approve_noop_when_allowance_granted() {
        let chain = Arc::new(MockChain {
            allowance: U256::from(1_000u64),
            ..Default::default()
        });
        let signer = signer_with(chain.clone());

        let receipt = signer.get_approve(Address::from([0x01; 20])).await;
        assert!(receipt.is_none());
        assert_eq!(chain.broadcast_count(), 0);
    }

    #[tokio::test]
    async fn test_approve_submits_once_when_allowance_zero() {
        let chain = Arc::new(MockChain::default());
        let signer = signer_with(chain.clone());

        let receipt = signer.get_approve(Address::from([0x01; 20])).await;
        assert!(receipt.is_some());
        assert_eq!(chain.broadcast_count(), 1);
    }

    #[tokio::test]
    async fn test_gas_margin() {
        let chain = Arc::new(MockChain {
            gas_estimate: U256::from(100_000u64),
            ..Default::default()
        });
        let signer = signer_with(chain);
        let tx: TypedTransaction = TransactionRequest::new().into();
        let gas = signer.get_gas(&tx).await.unwrap();
        assert_eq!(gas, U256::from(125_000u64));
    }

    #[tokio::test]
    async fn test_gas_price_rounded_to_gwei() {
        let chain = Arc::new(MockChain {
            gas_price: U256::from(23_456_000_000u64), // 23.456 gwei
            ..Default::default()
        });
        let signer = signer_with(chain);
        let price = signer.get_gas_price().await.unwrap();
        assert_eq!(price, Decimal::new(2346, 2)); // 23.46
    }

    #[tokio::test]
    async fn test_balance_sentinel_on_asset_failure() {
        let chain = Arc::new(MockChain {
            native: U256::exp10(18) * U256::from(15u64) / U256::from(10u64), // 1.5 ETH
            fail_token_balance: true,
            ..Default::default()
        });
        let signer = signer_with(chain);
        let report = signer.get_account_balance().await;
        assert!(report.contains("1.5"));
        assert!(report.contains("failed"));
    }

    #[tokio::test]
    async fn test_trading_asset_balance_zero_when_unavailable() {
        let chain = Arc::new(MockChain {
            fail_token_balance: true,
            ..Default::default()
        });
        let signer = signer_with(chain);
        assert_eq!(signer.get_trading_asset_balance().await, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_sign_broadcasts_raw_transaction() {
        let chain = Arc::new(MockChain::default());
        let signer = signer_with(chain.clone());
        let tx: TypedTransaction = TransactionRequest::new()
            .to(Address::from([0x02; 20]))
            .into();
        let hash = signer.get_sign(tx).await;
        assert!(hash.is_some());
        assert_eq!(chain.broadcast_count(), 1);
    }

    #[test]
    fn test_account_label_format() {
        let chain = Arc::new(MockChain::default());
        let signer = signer_with(chain);
        let label = signer.account_label();
        assert!(label.starts_with("1 - "));
        assert_eq!(label.len(), "1 - ".len() + 8);
    }
}
