//! Client settings: confirmation polling and the table of supported networks.

use std::time::Duration;

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use tokenforge::chain::DEV_CHAIN_ID;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: String,
    pub testnet: bool,
    /// Unset on networks the factory is not deployed to.
    #[serde(default)]
    pub factory_address: Option<Address>,
    #[serde(default)]
    pub explorer_url: String,
}

impl NetworkConfig {
    pub fn explorer_address_url(&self, address: &Address) -> Option<String> {
        self.explorer_link("address", &address.to_checksum(None))
    }

    pub fn explorer_tx_url(&self, hash: &B256) -> Option<String> {
        self.explorer_link("tx", &hash.to_string())
    }

    fn explorer_link(&self, kind: &str, id: &str) -> Option<String> {
        if self.explorer_url.is_empty() {
            return None;
        }
        Some(format!("{}/{kind}/{id}", self.explorer_url.trim_end_matches('/')))
    }
}

fn network(chain_id: u64, name: &str, testnet: bool, explorer_url: &str) -> NetworkConfig {
    NetworkConfig {
        chain_id,
        name: name.to_string(),
        testnet,
        factory_address: None,
        explorer_url: explorer_url.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    pub poll_interval_ms: u64,
    pub confirmation_timeout_ms: u64,
    pub networks: Vec<NetworkConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1_000,
            confirmation_timeout_ms: 120_000,
            networks: vec![
                network(1, "Ethereum", false, "https://etherscan.io"),
                network(137, "Polygon", false, "https://polygonscan.com"),
                network(42161, "Arbitrum", false, "https://arbiscan.io"),
                network(10, "Optimism", false, "https://optimistic.etherscan.io"),
                network(8453, "Base", false, "https://basescan.org"),
                network(11155111, "Sepolia", true, "https://sepolia.etherscan.io"),
                network(DEV_CHAIN_ID, "Localhost", true, ""),
            ],
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }

    pub fn network(&self, chain_id: u64) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.chain_id == chain_id)
    }

    /// Records the factory deployed on `chain_id`. Returns `false` if the
    /// network is not configured.
    pub fn set_factory_address(&mut self, chain_id: u64, factory: Address) -> bool {
        match self.networks.iter_mut().find(|n| n.chain_id == chain_id) {
            Some(network) => {
                network.factory_address = Some(factory);
                true
            }
            None => false,
        }
    }
}
