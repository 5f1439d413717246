//! Deploys [`FeatureToken`]s for a platform fee and keeps the registry of
//! everything it deployed.

use alloy_primitives::{keccak256, Address, B256, U256};
use alloy_sol_types::{sol, SolError, SolValue};
use tracing::{debug, info};

use super::registry::{DeploymentEntry, DeploymentRecord, DuplicateToken, Registry, TokenLens};
use crate::host::Env;
use crate::tokens::{FeatureToken, TokenConfig, TokenError};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    event TokenCreated(address indexed deployer, address indexed token, string name, string symbol);
    #[derive(Debug, PartialEq, Eq)]
    event PlatformFeeUpdated(uint256 old_fee, uint256 new_fee);
    #[derive(Debug, PartialEq, Eq)]
    event FeeRecipientUpdated(address indexed old_recipient, address indexed new_recipient);
    #[derive(Debug, PartialEq, Eq)]
    event OwnershipTransferred(address indexed previous_owner, address indexed new_owner);

    #[derive(Debug, PartialEq, Eq)]
    error Unauthorized(address account);
    #[derive(Debug, PartialEq, Eq)]
    error InsufficientFee(uint256 sent, uint256 required);
    #[derive(Debug, PartialEq, Eq)]
    error OutOfRange(uint256 offset, uint256 length);
    #[derive(Debug, PartialEq, Eq)]
    error FeeTransferFailed(address recipient, uint256 amount);
    #[derive(Debug, PartialEq, Eq)]
    error RefundFailed(address to, uint256 amount);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidRecipient(address recipient);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidOwner(address owner);
    #[derive(Debug, PartialEq, Eq)]
    error TokenExists(address token);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FactoryError {
    #[error("{} is not the factory owner", .0.account)]
    Unauthorized(Unauthorized),
    #[error("insufficient platform fee: sent {}, required {}", .0.sent, .0.required)]
    InsufficientFee(InsufficientFee),
    #[error("offset {} is past the {} deployments", .0.offset, .0.length)]
    OutOfRange(OutOfRange),
    #[error("could not forward fee {} to {}", .0.amount, .0.recipient)]
    FeeTransferFailed(FeeTransferFailed),
    #[error("could not refund {} to {}", .0.amount, .0.to)]
    RefundFailed(RefundFailed),
    #[error("invalid fee recipient {}", .0.recipient)]
    InvalidRecipient(InvalidRecipient),
    #[error("invalid owner {}", .0.owner)]
    InvalidOwner(InvalidOwner),
    #[error("a token is already deployed at {}", .0.token)]
    TokenExists(TokenExists),
    #[error("invalid token config: {0}")]
    InvalidConfig(TokenError),
}

impl From<DuplicateToken> for FactoryError {
    fn from(err: DuplicateToken) -> Self {
        FactoryError::TokenExists(TokenExists { token: err.0 })
    }
}

/// ABI-encoded revert data.
impl From<FactoryError> for Vec<u8> {
    fn from(err: FactoryError) -> Self {
        match err {
            FactoryError::Unauthorized(e) => e.abi_encode(),
            FactoryError::InsufficientFee(e) => e.abi_encode(),
            FactoryError::OutOfRange(e) => e.abi_encode(),
            FactoryError::FeeTransferFailed(e) => e.abi_encode(),
            FactoryError::RefundFailed(e) => e.abi_encode(),
            FactoryError::InvalidRecipient(e) => e.abi_encode(),
            FactoryError::InvalidOwner(e) => e.abi_encode(),
            FactoryError::TokenExists(e) => e.abi_encode(),
            FactoryError::InvalidConfig(e) => e.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenFactory {
    address: Address,
    owner: Address,
    platform_fee: U256,
    fee_recipient: Address,
    registry: Registry,
}

impl TokenFactory {
    /// Constructor; the deployer becomes the owner.
    pub fn new(
        env: &mut Env<'_>,
        fee_recipient: Address,
        platform_fee: U256,
    ) -> Result<Self, FactoryError> {
        if fee_recipient.is_zero() {
            return Err(FactoryError::InvalidRecipient(InvalidRecipient {
                recipient: fee_recipient,
            }));
        }
        let owner = env.msg.sender;
        env.log(OwnershipTransferred {
            previous_owner: Address::ZERO,
            new_owner: owner,
        });
        Ok(Self {
            address: env.contract_address(),
            owner,
            platform_fee,
            fee_recipient,
            registry: Registry::default(),
        })
    }

    fn require_owner(&self, caller: Address) -> Result<(), FactoryError> {
        if caller != self.owner {
            return Err(FactoryError::Unauthorized(Unauthorized { account: caller }));
        }
        Ok(())
    }

    /// Address the next token of `deployer` lands at: CREATE2 over the factory
    /// address with a salt binding the deployer and the deployment index.
    fn next_token_address(&self, deployer: Address) -> Address {
        let salt = keccak256((deployer, U256::from(self.registry.len())).abi_encode());
        self.address.create2(salt, feature_token_code_hash())
    }

    /// Deploys a token for `msg.value >= platform_fee`. The fee goes to the fee
    /// recipient and any excess back to the caller; either transfer failing
    /// aborts the deployment.
    ///
    /// Emits {TokenCreated}.
    pub fn create_token(
        &mut self,
        env: &mut Env<'_>,
        config: TokenConfig,
    ) -> Result<FeatureToken, FactoryError> {
        let deployer = env.msg.sender;
        let payment = env.msg.value;
        if payment < self.platform_fee {
            return Err(FactoryError::InsufficientFee(InsufficientFee {
                sent: payment,
                required: self.platform_fee,
            }));
        }
        config.validate().map_err(FactoryError::InvalidConfig)?;

        let address = self.next_token_address(deployer);
        if self.registry.contains(address) {
            return Err(DuplicateToken(address).into());
        }
        let token = FeatureToken::deploy(&mut env.create(address), config)
            .map_err(FactoryError::InvalidConfig)?;

        let fee = self.platform_fee;
        env.transfer_value(self.fee_recipient, fee).map_err(|_| {
            FactoryError::FeeTransferFailed(FeeTransferFailed {
                recipient: self.fee_recipient,
                amount: fee,
            })
        })?;
        let refund = payment - fee;
        env.transfer_value(deployer, refund).map_err(|_| {
            FactoryError::RefundFailed(RefundFailed {
                to: deployer,
                amount: refund,
            })
        })?;

        self.registry.record(DeploymentEntry {
            token: address,
            name: token.name().to_string(),
            symbol: token.symbol().to_string(),
            decimals: token.decimals(),
            initial_supply: token.total_supply(),
            owner: token.owner(),
            deployer,
            features: token.features(),
            created_at: env.block.timestamp,
        })?;
        env.log(TokenCreated {
            deployer,
            token: address,
            name: token.name().to_string(),
            symbol: token.symbol().to_string(),
        });
        info!(%deployer, token = %address, symbol = token.symbol(), %fee, %refund, "token deployed");
        Ok(token)
    }

    pub fn update_platform_fee(&mut self, env: &mut Env<'_>, new_fee: U256) -> Result<(), FactoryError> {
        self.require_owner(env.msg.sender)?;
        let old_fee = self.platform_fee;
        self.platform_fee = new_fee;
        env.log(PlatformFeeUpdated { old_fee, new_fee });
        debug!(%old_fee, %new_fee, "platform fee updated");
        Ok(())
    }

    pub fn update_fee_recipient(
        &mut self,
        env: &mut Env<'_>,
        new_recipient: Address,
    ) -> Result<(), FactoryError> {
        self.require_owner(env.msg.sender)?;
        if new_recipient.is_zero() {
            return Err(FactoryError::InvalidRecipient(InvalidRecipient {
                recipient: new_recipient,
            }));
        }
        let old_recipient = self.fee_recipient;
        self.fee_recipient = new_recipient;
        env.log(FeeRecipientUpdated {
            old_recipient,
            new_recipient,
        });
        Ok(())
    }

    /// Takes effect immediately; there is no acceptance step.
    pub fn transfer_ownership(&mut self, env: &mut Env<'_>, new_owner: Address) -> Result<(), FactoryError> {
        self.require_owner(env.msg.sender)?;
        if new_owner.is_zero() {
            return Err(FactoryError::InvalidOwner(InvalidOwner { owner: new_owner }));
        }
        let previous_owner = self.owner;
        self.owner = new_owner;
        env.log(OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(())
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn platform_fee(&self) -> U256 {
        self.platform_fee
    }

    pub fn fee_recipient(&self) -> Address {
        self.fee_recipient
    }

    pub fn get_deployment_count(&self) -> usize {
        self.registry.len()
    }

    pub fn is_factory_token(&self, token: Address) -> bool {
        self.registry.contains(token)
    }

    pub fn get_tokens_by_deployer(&self, lens: &impl TokenLens, deployer: Address) -> Vec<DeploymentRecord> {
        self.registry
            .by_deployer(deployer)
            .map(|entry| entry.to_record(lens))
            .collect()
    }

    pub fn get_tokens_by_owner(&self, lens: &impl TokenLens, owner: Address) -> Vec<DeploymentRecord> {
        self.registry
            .by_owner(owner)
            .map(|entry| entry.to_record(lens))
            .collect()
    }

    pub fn get_all_tokens(&self, lens: &impl TokenLens) -> Vec<DeploymentRecord> {
        self.registry
            .entries()
            .iter()
            .map(|entry| entry.to_record(lens))
            .collect()
    }

    /// At most `limit` records starting at `offset`. Only an `offset` past the
    /// end is an error; any `limit` is clamped.
    pub fn get_tokens_paginated(
        &self,
        lens: &impl TokenLens,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DeploymentRecord>, FactoryError> {
        let page = self.registry.page(offset, limit).ok_or_else(|| {
            FactoryError::OutOfRange(OutOfRange {
                offset: U256::from(offset),
                length: U256::from(self.registry.len()),
            })
        })?;
        Ok(page.iter().map(|entry| entry.to_record(lens)).collect())
    }
}

/// Stand-in for the init code hash of the token contract in CREATE2.
fn feature_token_code_hash() -> B256 {
    keccak256("tokenforge.FeatureToken")
}
