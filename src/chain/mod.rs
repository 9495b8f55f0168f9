//! Chain RPC plumbing - ethers HTTP provider behind the ChainClient capability

use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, H256, TransactionReceipt, U256};

use crate::core::{ChainClient, Error, Result};

fn chain_err(e: impl std::fmt::Display) -> Error {
    Error::Chain(e.to_string())
}

/// JSON-RPC node connection for one exchange configuration.
///
/// Created once at startup and held for the configuration's lifetime;
/// read-shared across concurrent calls.
pub struct HttpChain {
    provider: Provider<Http>,
    chain_id: u64,
}

impl HttpChain {
    /// Connect to a node and resolve its chain id
    pub async fn connect(rpc_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| Error::Config(format!("invalid rpc url {}: {}", rpc_url, e)))?;
        let chain_id = provider.get_chainid().await.map_err(chain_err)?.as_u64();
        Ok(Self { provider, chain_id })
    }
}

#[async_trait]
impl ChainClient for HttpChain {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.provider.get_balance(owner, None).await.map_err(chain_err)
    }

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes> {
        self.provider.call(tx, None).await.map_err(chain_err)
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256> {
        self.provider.estimate_gas(tx, None).await.map_err(chain_err)
    }

    async fn gas_price(&self) -> Result<U256> {
        self.provider.get_gas_price().await.map_err(chain_err)
    }

    async fn nonce(&self, owner: Address) -> Result<U256> {
        self.provider
            .get_transaction_count(owner, None)
            .await
            .map_err(chain_err)
    }

    async fn broadcast(&self, raw: Bytes) -> Result<H256> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(chain_err)?;
        Ok(pending.tx_hash())
    }

    async fn receipt(&self, tx_hash: H256) -> Result<Option<TransactionReceipt>> {
        self.provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(chain_err)
    }
}
