//! 0x-style aggregator adapter
//!
//! Prices and swap calldata come from the aggregator's HTTP quote API;
//! the returned transaction is submitted through the signing pipeline.

use async_trait::async_trait;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, U256};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::account::AccountSigner;
use crate::contracts::{TokenRegistry, to_base_units};
use crate::core::{DexAdapter, Error, Result, Secret};

pub struct ZeroXDex {
    name: String,
    http: reqwest::Client,
    api_endpoint: String,
    api_key: Option<Secret>,
    tokens: Arc<TokenRegistry>,
    signer: Arc<AccountSigner>,
    /// Configured allowance target for this venue
    router: Address,
    risk_amount: Decimal,
    slippage_pct: Decimal,
}

/// Subset of the aggregator quote response the adapter consumes
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapQuote {
    price: String,
    to: Address,
    data: Bytes,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    allowance_target: Option<Address>,
}

impl ZeroXDex {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        api_endpoint: String,
        api_key: Option<Secret>,
        tokens: Arc<TokenRegistry>,
        signer: Arc<AccountSigner>,
        router: Address,
        risk_amount: Decimal,
        slippage_pct: Decimal,
    ) -> Self {
        Self {
            name,
            http: reqwest::Client::new(),
            api_endpoint: api_endpoint.trim_end_matches('/').to_string(),
            api_key,
            tokens,
            signer,
            router,
            risk_amount,
            slippage_pct,
        }
    }

    async fn fetch_quote(
        &self,
        buy: Address,
        sell: Address,
        sell_amount: U256,
        taker: Option<Address>,
    ) -> Result<SwapQuote> {
        let slippage_fraction = self.slippage_pct / Decimal::ONE_HUNDRED;
        let mut request = self
            .http
            .get(format!("{}/swap/v1/quote", self.api_endpoint))
            .query(&[
                ("buyToken", format!("{:#x}", buy)),
                ("sellToken", format!("{:#x}", sell)),
                ("sellAmount", sell_amount.to_string()),
                ("slippagePercentage", slippage_fraction.to_string()),
            ]);
        if let Some(taker) = taker {
            request = request.query(&[("takerAddress", format!("{:#x}", taker))]);
        }
        if let Some(key) = &self.api_key {
            request = request.header("0x-api-key", key.expose());
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Error::Chain(format!(
                "{}: quote endpoint returned {}",
                self.name,
                response.status()
            )));
        }
        Ok(response.json::<SwapQuote>().await?)
    }
}

#[async_trait]
impl DexAdapter for ZeroXDex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_quote(&self, buy: Address, sell: Address) -> Result<Decimal> {
        let sell_decimals = self.tokens.decimals(sell).await?;
        let one_unit = U256::exp10(sell_decimals as usize);
        let quote = self.fetch_quote(buy, sell, one_unit, None).await?;
        Decimal::from_str(&quote.price).map_err(|e| Error::Token(e.to_string()))
    }

    async fn swap(&self, buy: Address, sell: Address, quantity: Decimal) -> Result<String> {
        let sell_decimals = self.tokens.decimals(sell).await?;
        let amount_in = to_base_units(self.risk_amount * quantity, sell_decimals)?;

        // allowance must observably commit before the swap is signed
        self.signer.try_approve(sell).await?;

        let quote = self
            .fetch_quote(buy, sell, amount_in, Some(self.signer.address()))
            .await?;
        if let Some(target) = quote.allowance_target {
            if target != self.router {
                debug!(
                    exchange = %self.name,
                    configured = %self.router, quoted = %target,
                    "allowance target differs from configured router"
                );
            }
        }

        let mut tx = TransactionRequest::new().to(quote.to).data(quote.data);
        if let Some(value) = &quote.value {
            let value = U256::from_dec_str(value)
                .map_err(|e| Error::Chain(format!("bad quote value: {}", e)))?;
            tx = tx.value(value);
        }
        let tx: TypedTransaction = tx.into();
        let hash = self.signer.try_sign(tx).await?;
        Ok(format!("{:#x}", hash))
    }

    async fn get_info(&self) -> Result<String> {
        Ok(format!("{} 0x aggregator {}", self.name, self.api_endpoint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_response_parsing() {
        let raw = r#"{
            "price": "1823.45",
            "to": "0xdef1c0ded9bec7f1a1670819833240f027b25eff",
            "data": "0x38ed1739",
            "value": "0",
            "allowanceTarget": "0xdef1c0ded9bec7f1a1670819833240f027b25eff",
            "buyAmount": "1823450000",
            "sellAmount": "1000000000000000000"
        }"#;
        let quote: SwapQuote = serde_json::from_str(raw).unwrap();
        assert_eq!(quote.price, "1823.45");
        assert_eq!(quote.data.len(), 4);
        assert_eq!(quote.value.as_deref(), Some("0"));
        assert!(quote.allowance_target.is_some());
        assert_eq!(
            Decimal::from_str(&quote.price).unwrap(),
            Decimal::new(182_345, 2)
        );
    }

    #[test]
    fn test_quote_response_minimal_fields() {
        // value and allowanceTarget are optional
        let raw = r#"{
            "price": "0.99",
            "to": "0xdef1c0ded9bec7f1a1670819833240f027b25eff",
            "data": "0x"
        }"#;
        let quote: SwapQuote = serde_json::from_str(raw).unwrap();
        assert!(quote.value.is_none());
        assert!(quote.allowance_target.is_none());
    }
}
