//! Contract metadata and ERC-20 call plumbing
//!
//! Calls are hand-encoded (selector + ABI args) and issued through the
//! ChainClient capability, keeping every consumer mockable.

use ethers::abi::{self, ParamType, Token};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, U256};
use ethers::utils::{keccak256, to_checksum};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::{ChainClient, Error, Result};

/// First four bytes of the keccak hash of a function signature
pub(crate) fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Selector-prefixed ABI-encoded calldata
pub(crate) fn encode_call(signature: &str, args: &[Token]) -> Bytes {
    let mut data = selector(signature).to_vec();
    data.extend(abi::encode(args));
    Bytes::from(data)
}

pub(crate) fn eth_call(to: Address, data: Bytes) -> TypedTransaction {
    TransactionRequest::new().to(to).data(data).into()
}

fn decode_uint(data: &[u8]) -> Result<U256> {
    abi::decode(&[ParamType::Uint(256)], data)
        .map_err(|e| Error::Token(e.to_string()))?
        .into_iter()
        .next()
        .and_then(|t| t.into_uint())
        .ok_or_else(|| Error::Token("expected uint return".into()))
}

fn decode_string(data: &[u8]) -> Result<String> {
    abi::decode(&[ParamType::String], data)
        .map_err(|e| Error::Token(e.to_string()))?
        .into_iter()
        .next()
        .and_then(|t| t.into_string())
        .ok_or_else(|| Error::Token("expected string return".into()))
}

/// Parse a hex token/contract address
pub fn parse_address(s: &str) -> Result<Address> {
    Address::from_str(s.trim()).map_err(|e| Error::Token(format!("invalid address {}: {}", s, e)))
}

/// EIP-55 checksummed form, used at display boundaries
pub fn checksum(addr: &Address) -> String {
    to_checksum(addr, None)
}

/// Convert a display-unit amount into the token's smallest integer unit.
/// The only place human decimals become chain amounts.
pub fn to_base_units(amount: Decimal, decimals: u8) -> Result<U256> {
    let parsed = ethers::utils::parse_units(amount.to_string(), decimals as u32)
        .map_err(|e| Error::Token(format!("amount {}: {}", amount, e)))?;
    Ok(parsed.into())
}

/// Convert a smallest-unit amount to display units
pub fn from_base_units(amount: U256, decimals: u8) -> Result<Decimal> {
    let formatted = ethers::utils::format_units(amount, decimals as u32)
        .map_err(|e| Error::Token(e.to_string()))?;
    Decimal::from_str(&formatted).map_err(|e| Error::Token(e.to_string()))
}

/// Typed handle on one ERC-20 token contract
pub struct Erc20 {
    chain: Arc<dyn ChainClient>,
    pub address: Address,
}

impl Erc20 {
    pub fn new(chain: Arc<dyn ChainClient>, address: Address) -> Self {
        Self { chain, address }
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        let data = encode_call(
            "allowance(address,address)",
            &[Token::Address(owner), Token::Address(spender)],
        );
        let out = self.chain.call(&eth_call(self.address, data)).await?;
        decode_uint(&out)
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        let data = encode_call("balanceOf(address)", &[Token::Address(owner)]);
        let out = self.chain.call(&eth_call(self.address, data)).await?;
        decode_uint(&out)
    }

    pub async fn symbol(&self) -> Result<String> {
        let data = encode_call("symbol()", &[]);
        let out = self.chain.call(&eth_call(self.address, data)).await?;
        decode_string(&out)
    }

    pub async fn decimals(&self) -> Result<u8> {
        let data = encode_call("decimals()", &[]);
        let out = self.chain.call(&eth_call(self.address, data)).await?;
        Ok(decode_uint(&out)?.as_u32() as u8)
    }

    /// Calldata for approve(spender, amount)
    pub fn approve_data(spender: Address, amount: U256) -> Bytes {
        encode_call(
            "approve(address,uint256)",
            &[Token::Address(spender), Token::Uint(amount)],
        )
    }
}

/// Token resolution and metadata for one exchange configuration.
///
/// Symbols resolve through the configured token map; hex addresses pass
/// through unchanged.
pub struct TokenRegistry {
    chain: Arc<dyn ChainClient>,
    tokens: HashMap<String, Address>,
}

impl TokenRegistry {
    pub fn new(chain: Arc<dyn ChainClient>, tokens: HashMap<String, Address>) -> Self {
        let tokens = tokens
            .into_iter()
            .map(|(symbol, addr)| (symbol.to_uppercase(), addr))
            .collect();
        Self { chain, tokens }
    }

    pub fn erc20(&self, token: Address) -> Erc20 {
        Erc20::new(self.chain.clone(), token)
    }

    /// Resolve a user-supplied instrument (address or configured symbol)
    pub fn resolve(&self, query: &str) -> Result<Address> {
        if query.starts_with("0x") || query.starts_with("0X") {
            return parse_address(query);
        }
        self.tokens
            .get(&query.to_uppercase())
            .copied()
            .ok_or_else(|| Error::Token(format!("unknown token: {}", query)))
    }

    pub async fn symbol(&self, token: Address) -> Result<String> {
        self.erc20(token).symbol().await
    }

    pub async fn decimals(&self, token: Address) -> Result<u8> {
        self.erc20(token).decimals().await
    }

    pub async fn balance_of(&self, token: Address, owner: Address) -> Result<U256> {
        self.erc20(token).balance_of(owner).await
    }

    /// Token balance in display units
    pub async fn display_balance(&self, token: Address, owner: Address) -> Result<Decimal> {
        let erc20 = self.erc20(token);
        let raw = erc20.balance_of(owner).await?;
        let decimals = erc20.decimals().await?;
        from_base_units(raw, decimals)
    }
}
