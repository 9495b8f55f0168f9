//! Uniswap-V2-style AMM adapter
//!
//! Quotes through the router's getAmountsOut and swaps through
//! swapExactTokensForTokens, with the approval gate and the signing
//! pipeline supplied by the account signer.

use async_trait::async_trait;
use chrono::Utc;
use ethers::abi::{self, ParamType, Token};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionRequest, U256};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::sync::Arc;
use tracing::debug;

use crate::account::AccountSigner;
use crate::contracts::{TokenRegistry, checksum, encode_call, eth_call, from_base_units, to_base_units};
use crate::core::{ChainClient, DexAdapter, Error, Result};

/// Seconds a submitted swap stays valid on-chain
const SWAP_DEADLINE_SECS: i64 = 600;

pub struct UniswapDex {
    name: String,
    chain: Arc<dyn ChainClient>,
    tokens: Arc<TokenRegistry>,
    signer: Arc<AccountSigner>,
    router: Address,
    /// Trade size in sell-token display units, scaled by intent quantity
    risk_amount: Decimal,
    slippage_bps: u32,
}

impl UniswapDex {
    pub fn new(
        name: String,
        chain: Arc<dyn ChainClient>,
        tokens: Arc<TokenRegistry>,
        signer: Arc<AccountSigner>,
        router: Address,
        risk_amount: Decimal,
        slippage_pct: Decimal,
    ) -> Result<Self> {
        let slippage_bps = (slippage_pct * Decimal::ONE_HUNDRED)
            .to_u32()
            .filter(|bps| *bps < 10_000)
            .ok_or_else(|| Error::Config(format!("{}: invalid slippage {}", name, slippage_pct)))?;
        Ok(Self {
            name,
            chain,
            tokens,
            signer,
            router,
            risk_amount,
            slippage_bps,
        })
    }

    async fn amounts_out(&self, amount_in: U256, path: [Address; 2]) -> Result<Vec<U256>> {
        let data = encode_call(
            "getAmountsOut(uint256,address[])",
            &[
                Token::Uint(amount_in),
                Token::Array(path.iter().map(|a| Token::Address(*a)).collect()),
            ],
        );
        let out = self.chain.call(&eth_call(self.router, data)).await?;
        let tokens = abi::decode(
            &[ParamType::Array(Box::new(ParamType::Uint(256)))],
            &out,
        )
        .map_err(|e| Error::Chain(e.to_string()))?;
        tokens
            .into_iter()
            .next()
            .and_then(|t| t.into_array())
            .map(|arr| arr.into_iter().filter_map(|t| t.into_uint()).collect())
            .ok_or_else(|| Error::Chain("malformed getAmountsOut return".into()))
    }

    /// Slippage-adjusted lower bound on the swap output
    fn min_out(&self, expected: U256) -> U256 {
        expected * U256::from(10_000 - self.slippage_bps) / U256::from(10_000u64)
    }

    fn swap_data(
        &self,
        amount_in: U256,
        min_out: U256,
        path: [Address; 2],
        to: Address,
        deadline: U256,
    ) -> TypedTransaction {
        let data = encode_call(
            "swapExactTokensForTokens(uint256,uint256,address[],address,uint256)",
            &[
                Token::Uint(amount_in),
                Token::Uint(min_out),
                Token::Array(path.iter().map(|a| Token::Address(*a)).collect()),
                Token::Address(to),
                Token::Uint(deadline),
            ],
        );
        TransactionRequest::new().to(self.router).data(data).into()
    }
}

#[async_trait]
impl DexAdapter for UniswapDex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_quote(&self, buy: Address, sell: Address) -> Result<Decimal> {
        let sell_decimals = self.tokens.decimals(sell).await?;
        let buy_decimals = self.tokens.decimals(buy).await?;
        let one_unit = U256::exp10(sell_decimals as usize);
        let amounts = self.amounts_out(one_unit, [sell, buy]).await?;
        let out = amounts
            .last()
            .copied()
            .ok_or_else(|| Error::Chain("empty amounts from router".into()))?;
        from_base_units(out, buy_decimals)
    }

    async fn swap(&self, buy: Address, sell: Address, quantity: Decimal) -> Result<String> {
        let sell_decimals = self.tokens.decimals(sell).await?;
        let amount_in = to_base_units(self.risk_amount * quantity, sell_decimals)?;

        // allowance must observably commit before the swap is signed
        self.signer.try_approve(sell).await?;

        let amounts = self.amounts_out(amount_in, [sell, buy]).await?;
        let expected = amounts
            .last()
            .copied()
            .ok_or_else(|| Error::Chain("empty amounts from router".into()))?;
        let min_out = self.min_out(expected);
        debug!(
            exchange = %self.name,
            %amount_in, %expected, %min_out,
            "submitting swap"
        );

        let deadline = U256::from((Utc::now().timestamp() + SWAP_DEADLINE_SECS) as u64);
        let tx = self.swap_data(amount_in, min_out, [sell, buy], self.signer.address(), deadline);
        let hash = self.signer.try_sign(tx).await?;
        Ok(format!("{:#x}", hash))
    }

    async fn get_info(&self) -> Result<String> {
        Ok(format!(
            "{} uniswap-v2 router {}",
            self.name,
            checksum(&self.router)
        ))
    }
}
