//! The client's view of a chain: submit transactions, watch their status and
//! read contract state.

use std::sync::Arc;

use alloy_primitives::{Address, Log, B256, U256};
use tokenforge::{DeploymentRecord, TokenConfig, TokenFeatures};

use crate::error::ClientError;

pub type TxHash = B256;

/// Token operations the client can send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCall {
    Mint { to: Address, amount: U256 },
    Burn { amount: U256 },
    Transfer { to: Address, amount: U256 },
    Approve { spender: Address, amount: U256 },
    Pause,
    Unpause,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxRequest {
    CreateToken {
        factory: Address,
        payment: U256,
        config: TokenConfig,
    },
    Token { token: Address, call: TokenCall },
}

/// A transaction that made it into a block.
#[derive(Debug, Clone, PartialEq)]
pub struct TxReceipt {
    pub hash: TxHash,
    pub block_number: u64,
    /// Set for token deployments.
    pub token_address: Option<Address>,
    pub logs: Vec<Log>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TxStatus {
    /// Submitted, not yet processed.
    Pending,
    Confirmed(TxReceipt),
    /// Processed and reverted. `data` is the ABI-encoded revert error.
    Reverted { reason: String, data: Vec<u8> },
    /// Never processed; also reported for unknown hashes.
    Dropped,
}

/// Which slice of a factory's registry to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryQuery {
    All,
    ByDeployer(Address),
    ByOwner(Address),
    Page { offset: usize, limit: usize },
}

/// Snapshot of a token's public state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenState {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub max_supply: U256,
    pub owner: Address,
    pub features: TokenFeatures,
    pub paused: bool,
}

#[cfg_attr(test, mockall::automock)]
pub trait ChainBackend {
    /// The connected wallet account, if any.
    fn account(&self) -> Option<Address>;

    fn chain_id(&self) -> u64;

    /// Queues `request` from the connected account.
    fn submit(&self, request: TxRequest) -> Result<TxHash, ClientError>;

    fn status(&self, hash: TxHash) -> TxStatus;

    /// `None` if there is no factory at `factory`.
    fn platform_fee(&self, factory: Address) -> Option<U256>;

    fn deployments(
        &self,
        factory: Address,
        query: RegistryQuery,
    ) -> Result<Vec<DeploymentRecord>, ClientError>;

    fn token_state(&self, token: Address) -> Option<TokenState>;

    fn balance_of(&self, token: Address, account: Address) -> Option<U256>;
}

impl<T: ChainBackend + ?Sized> ChainBackend for Arc<T> {
    fn account(&self) -> Option<Address> {
        (**self).account()
    }

    fn chain_id(&self) -> u64 {
        (**self).chain_id()
    }

    fn submit(&self, request: TxRequest) -> Result<TxHash, ClientError> {
        (**self).submit(request)
    }

    fn status(&self, hash: TxHash) -> TxStatus {
        (**self).status(hash)
    }

    fn platform_fee(&self, factory: Address) -> Option<U256> {
        (**self).platform_fee(factory)
    }

    fn deployments(
        &self,
        factory: Address,
        query: RegistryQuery,
    ) -> Result<Vec<DeploymentRecord>, ClientError> {
        (**self).deployments(factory, query)
    }

    fn token_state(&self, token: Address) -> Option<TokenState> {
        (**self).token_state(token)
    }

    fn balance_of(&self, token: Address, account: Address) -> Option<U256> {
        (**self).balance_of(token, account)
    }
}
