//! Exchange implementations - Pluggable DEX adapters

pub mod uniswap;
pub mod zerox;

pub use uniswap::UniswapDex;
pub use zerox::ZeroXDex;
