//! Creating tokens through a factory and reading its registry.

use alloy_primitives::{Address, U256};
use common::address::short_address;
use common::units::format_units;
use serde::Serialize;
use tokenforge::DeploymentRecord;
use tracing::{info, warn};

use crate::backend::{ChainBackend, RegistryQuery, TxHash, TxReceipt, TxRequest};
use crate::config::ClientConfig;
use crate::confirm::wait_for_confirmation;
use crate::error::{ClientError, Rejection};
use crate::params::CreateTokenParams;

/// Outcome of [`FactoryClient::create_token`], in the shape the UI shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub success: bool,
    pub token_address: Option<Address>,
    pub transaction_hash: Option<TxHash>,
    pub error: Option<String>,
}

/// A registry record for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Base units.
    pub total_supply: U256,
    pub owner: Address,
    pub features: Vec<String>,
    /// Unix milliseconds.
    pub created_at: u64,
}

impl TokenSummary {
    /// Total supply in whole tokens, e.g. "1000000.5".
    pub fn display_supply(&self) -> String {
        format_units(self.total_supply, self.decimals)
    }

    pub fn short_address(&self) -> String {
        short_address(&self.address)
    }
}

impl From<DeploymentRecord> for TokenSummary {
    fn from(record: DeploymentRecord) -> Self {
        Self {
            address: record.token_address,
            name: record.name,
            symbol: record.symbol,
            decimals: record.decimals,
            total_supply: record.total_supply,
            owner: record.owner,
            features: record.features,
            created_at: record.created_at.saturating_mul(1_000),
        }
    }
}

pub struct FactoryClient<B> {
    backend: B,
    factory: Address,
    config: ClientConfig,
}

impl<B: ChainBackend> FactoryClient<B> {
    pub fn new(backend: B, factory: Address, config: ClientConfig) -> Self {
        Self {
            backend,
            factory,
            config,
        }
    }

    /// Uses the factory configured for the backend's chain.
    pub fn for_network(backend: B, config: ClientConfig) -> Result<Self, ClientError> {
        let chain_id = backend.chain_id();
        let factory = config
            .network(chain_id)
            .and_then(|network| network.factory_address)
            .ok_or(Rejection::UnknownNetwork(chain_id))?;
        Ok(Self::new(backend, factory, config))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn platform_fee(&self) -> Result<U256, ClientError> {
        self.backend
            .platform_fee(self.factory)
            .ok_or_else(|| Rejection::UnknownContract(self.factory).into())
    }

    /// Validates `params` and submits the deployment, paying `payment` or
    /// exactly the platform fee. Anything that would certainly revert is
    /// rejected here without submitting.
    pub fn submit_create_token(
        &self,
        params: &CreateTokenParams,
        payment: Option<U256>,
    ) -> Result<TxHash, ClientError> {
        let account = self.backend.account().ok_or(Rejection::WalletNotConnected)?;
        let config = params.to_config(account)?;
        config.validate()?;

        let required = self.platform_fee()?;
        let sent = payment.unwrap_or(required);
        if sent < required {
            return Err(Rejection::InsufficientFee { sent, required }.into());
        }
        self.backend.submit(TxRequest::CreateToken {
            factory: self.factory,
            payment: sent,
            config,
        })
    }

    pub async fn wait_for_confirmation(&self, hash: TxHash) -> Result<TxReceipt, ClientError> {
        wait_for_confirmation(&self.backend, hash, &self.config).await
    }

    /// Submits and waits; every failure lands in [`DeploymentResult::error`].
    pub async fn create_token(
        &self,
        params: &CreateTokenParams,
        payment: Option<U256>,
    ) -> DeploymentResult {
        let hash = match self.submit_create_token(params, payment) {
            Ok(hash) => hash,
            Err(err) => {
                warn!(symbol = %params.symbol, error = %err, "token creation rejected");
                return DeploymentResult::failed(None, err);
            }
        };
        match self.wait_for_confirmation(hash).await {
            Ok(receipt) => {
                info!(symbol = %params.symbol, token = ?receipt.token_address, %hash, "token created");
                DeploymentResult {
                    success: true,
                    token_address: receipt.token_address,
                    transaction_hash: Some(hash),
                    error: None,
                }
            }
            Err(err) => DeploymentResult::failed(Some(hash), err),
        }
    }

    fn query(&self, query: RegistryQuery) -> Result<Vec<TokenSummary>, ClientError> {
        let records = self.backend.deployments(self.factory, query)?;
        Ok(records.into_iter().map(TokenSummary::from).collect())
    }

    pub fn get_all_tokens(&self) -> Result<Vec<TokenSummary>, ClientError> {
        self.query(RegistryQuery::All)
    }

    pub fn get_tokens_by_owner(&self, owner: Address) -> Result<Vec<TokenSummary>, ClientError> {
        self.query(RegistryQuery::ByOwner(owner))
    }

    pub fn get_tokens_by_deployer(&self, deployer: Address) -> Result<Vec<TokenSummary>, ClientError> {
        self.query(RegistryQuery::ByDeployer(deployer))
    }

    pub fn get_tokens_paginated(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<TokenSummary>, ClientError> {
        self.query(RegistryQuery::Page { offset, limit })
    }

    /// Tokens deployed by the connected account.
    pub fn my_tokens(&self) -> Result<Vec<TokenSummary>, ClientError> {
        let account = self.backend.account().ok_or(Rejection::WalletNotConnected)?;
        self.get_tokens_by_deployer(account)
    }
}

impl DeploymentResult {
    fn failed(hash: Option<TxHash>, err: ClientError) -> Self {
        Self {
            success: false,
            token_address: None,
            transaction_hash: hash,
            error: Some(err.to_string()),
        }
    }
}
