//! Read-only reporting fan-out across all configured exchanges
//!
//! Always best-effort: a failing venue degrades to a sentinel line instead
//! of aborting the aggregate report. Reads are side-effect-free and cheap
//! to ignore, unlike swap submissions, so nothing here short-circuits.

use futures::future::join_all;
use tracing::warn;

use crate::execution::Orchestrator;

const INFO_FAILED: &str = "Info failed";

impl Orchestrator {
    /// Available front-end commands
    pub fn get_help(&self) -> String {
        format!("{}\n", self.commands)
    }

    /// Version header plus one summary line per venue
    pub async fn get_info(&self) -> String {
        let mut info = format!("ℹ️ v{}\n", env!("CARGO_PKG_VERSION"));
        let lines = join_all(self.clients.iter().map(|client| async {
            match client.adapter.get_info().await {
                Ok(line) => line,
                Err(e) => {
                    warn!(exchange = %client.name, error = %e, "info failed");
                    INFO_FAILED.to_string()
                }
            }
        }))
        .await;
        info.push_str(&lines.join("\n"));
        info.trim_end().to_string()
    }

    /// Names of all configured venues
    pub fn get_name(&self) -> String {
        self.clients
            .iter()
            .map(|client| client.adapter.name())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Balance snapshot per venue; sub-query failures are already reduced
    /// to sentinels inside the signer
    pub async fn get_account_balance(&self) -> String {
        let reports = join_all(
            self.clients
                .iter()
                .map(|client| client.signer.get_account_balance()),
        )
        .await;
        reports.join("\n")
    }

    /// Trading-asset balance per venue
    pub async fn get_trading_asset_balance(&self) -> String {
        let reports = join_all(self.clients.iter().map(|client| async {
            format!(
                "💵 {}: {}",
                client.name,
                client.signer.get_trading_asset_balance().await.normalize()
            )
        }))
        .await;
        reports.join("\n")
    }

    /// Position snapshot per venue
    pub async fn get_account_position(&self) -> String {
        let reports = join_all(
            self.clients
                .iter()
                .map(|client| client.signer.get_account_position()),
        )
        .await;
        reports.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountSigner;
    use crate::chain::testing::MockChain;
    use crate::contracts::TokenRegistry;
    use crate::core::{ChainClient, Secret};
    use crate::exchanges::testing::MockAdapter;
    use crate::execution::ExchangeClient;
    use ethers::types::{Address, U256};
    use rust_decimal::Decimal;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    const TEST_KEY: &str = "0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef";

    fn client_with(name: &str, chain: Arc<MockChain>) -> ExchangeClient {
        let chain_dyn: Arc<dyn ChainClient> = chain;
        let tokens = Arc::new(TokenRegistry::new(chain_dyn.clone(), HashMap::new()));
        let signer = Arc::new(
            AccountSigner::new(
                chain_dyn,
                tokens.clone(),
                &Secret::new(TEST_KEY),
                Address::from([0xf0; 20]),
                Address::from([0xa5; 20]),
                Duration::from_secs(5),
            )
            .unwrap(),
        );
        ExchangeClient {
            name: name.to_string(),
            trading_asset: Address::from([0xa5; 20]),
            adapter: Arc::new(MockAdapter::new(name, Some(Decimal::ONE), None)),
            signer,
            tokens,
            explorer_url: None,
        }
    }

    fn orchestrator_with(clients: Vec<ExchangeClient>) -> Orchestrator {
        Orchestrator {
            clients,
            commands: "/help /quote".to_string(),
        }
    }

    #[test]
    fn test_help_returns_commands() {
        let orchestrator = orchestrator_with(vec![]);
        assert_eq!(orchestrator.get_help(), "/help /quote\n");
    }

    #[tokio::test]
    async fn test_info_has_version_header_and_venue_lines() {
        let orchestrator = orchestrator_with(vec![
            client_with("ex1", Arc::new(MockChain::default())),
            client_with("ex2", Arc::new(MockChain::default())),
        ]);
        let info = orchestrator.get_info().await;
        assert!(info.starts_with(&format!("ℹ️ v{}", env!("CARGO_PKG_VERSION"))));
        assert!(info.contains("ex1 (mock)"));
        assert!(info.contains("ex2 (mock)"));
    }

    #[tokio::test]
    async fn test_name_joins_all_venues() {
        let orchestrator = orchestrator_with(vec![
            client_with("ex1", Arc::new(MockChain::default())),
            client_with("ex2", Arc::new(MockChain::default())),
        ]);
        assert_eq!(orchestrator.get_name(), "ex1 ex2");
    }

    #[tokio::test]
    async fn test_balance_fans_across_venues() {
        let funded = Arc::new(MockChain {
            token_balance: units(250, 6),
            ..Default::default()
        });
        let broken = Arc::new(MockChain {
            fail_token_balance: true,
            ..Default::default()
        });
        let orchestrator = orchestrator_with(vec![
            client_with("ex1", funded),
            client_with("ex2", broken),
        ]);

        let report = orchestrator.get_account_balance().await;
        assert_eq!(report.matches("🏦 Balance").count(), 2);
        assert!(report.contains("250"));
        assert!(report.contains("failed"));
    }

    #[tokio::test]
    async fn test_trading_asset_balance_per_venue() {
        let funded = Arc::new(MockChain {
            token_balance: units(42, 6),
            ..Default::default()
        });
        let orchestrator = orchestrator_with(vec![client_with("ex1", funded)]);
        let report = orchestrator.get_trading_asset_balance().await;
        assert_eq!(report, "💵 ex1: 42");
    }

    #[tokio::test]
    async fn test_position_is_stubbed_zeroes() {
        let orchestrator =
            orchestrator_with(vec![client_with("ex1", Arc::new(MockChain::default()))]);
        let report = orchestrator.get_account_position().await;
        assert!(report.contains("📊 Position"));
        assert!(report.contains("Opened: 0"));
        assert!(report.contains("Margin: 0"));
    }

    fn units(amount: u64, decimals: u32) -> U256 {
        U256::from(amount) * U256::exp10(decimals as usize)
    }
}
