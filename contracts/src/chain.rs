//! A single-threaded chain the contracts run on. Each transaction executes
//! against a snapshot of the world; a failing transaction restores it, so none
//! of its balance changes, registry entries or logs survive.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use alloy_primitives::{Address, Log, U256};
use tracing::{debug, info};

use crate::factory::{DuplicateToken, FactoryError, TokenFactory, TokenLens};
use crate::host::{Block, Env, Msg, NativeLedger, ValueTransferError};
use crate::tokens::{FeatureToken, TokenConfig, TokenError};

/// Chain id of a local development chain.
pub const DEV_CHAIN_ID: u64 = 31337;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain_id: u64,
    /// Unix timestamp (seconds) of the first block.
    pub genesis_timestamp: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: DEV_CHAIN_ID,
            genesis_timestamp: 1_700_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError<E> {
    #[error("no contract deployed at {0}")]
    UnknownContract(Address),
    #[error(transparent)]
    Value(#[from] ValueTransferError),
    #[error("execution reverted: {0}")]
    Revert(E),
}

impl<E: Clone + Into<Vec<u8>>> ChainError<E> {
    /// ABI-encoded revert data, if the contract reverted.
    pub fn revert_data(&self) -> Option<Vec<u8>> {
        match self {
            ChainError::Revert(err) => Some(err.clone().into()),
            _ => None,
        }
    }
}

/// Outcome of a successful transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt<T> {
    pub output: T,
    pub logs: Vec<Log>,
    pub block_number: u64,
}

/// Every token deployed on the chain, keyed by address.
#[derive(Debug, Clone, Default)]
pub struct TokenArena(HashMap<Address, FeatureToken>);

impl TokenArena {
    pub fn get(&self, token: Address) -> Option<&FeatureToken> {
        self.0.get(&token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TokenArena {
    /// Adds a freshly deployed token. An occupied address is never overwritten.
    fn insert(&mut self, token: FeatureToken) -> Result<Address, DuplicateToken> {
        let address = token.address();
        match self.0.entry(address) {
            Entry::Occupied(_) => Err(DuplicateToken(address)),
            Entry::Vacant(slot) => {
                slot.insert(token);
                Ok(address)
            }
        }
    }
}

impl TokenLens for TokenArena {
    fn total_supply(&self, token: Address) -> Option<U256> {
        self.get(token).map(FeatureToken::total_supply)
    }
}

#[derive(Debug, Clone, Default)]
struct Contracts {
    factories: HashMap<Address, TokenFactory>,
    tokens: TokenArena,
}

/// State a transaction may change.
#[derive(Debug, Clone, Default)]
struct World {
    native: NativeLedger,
    contracts: Contracts,
}

#[derive(Debug)]
pub struct Chain {
    config: ChainConfig,
    world: World,
    /// Account nonces survive reverts.
    nonces: HashMap<Address, u64>,
    block_number: u64,
    timestamp: u64,
    logs: Vec<Log>,
}

impl Default for Chain {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

impl Chain {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            config,
            world: World::default(),
            nonces: HashMap::new(),
            block_number: 0,
            timestamp: config.genesis_timestamp,
            logs: Vec::new(),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.timestamp = timestamp;
    }

    pub fn advance(&mut self, seconds: u64) {
        self.timestamp = self.timestamp.saturating_add(seconds);
    }

    /// Every log emitted by a successful transaction, in order.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Mints native value to `account` outside of any transaction.
    pub fn fund(&mut self, account: Address, amount: U256) -> Result<(), ValueTransferError> {
        self.world.native.credit(account, amount)
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.world.native.balance_of(account)
    }

    /// Makes `account` revert on incoming native value.
    pub fn set_rejects_value(&mut self, account: Address, rejects: bool) {
        self.world.native.set_rejects_value(account, rejects);
    }

    pub fn nonce(&self, account: Address) -> u64 {
        self.nonces.get(&account).copied().unwrap_or_default()
    }

    pub fn factory(&self, address: Address) -> Option<&TokenFactory> {
        self.world.contracts.factories.get(&address)
    }

    pub fn token(&self, address: Address) -> Option<&FeatureToken> {
        self.world.contracts.tokens.get(address)
    }

    pub fn tokens(&self) -> &TokenArena {
        &self.world.contracts.tokens
    }

    /// Deploys a [`TokenFactory`] owned by `sender` at the CREATE address of
    /// its nonce.
    pub fn deploy_factory(
        &mut self,
        sender: Address,
        fee_recipient: Address,
        platform_fee: U256,
    ) -> Result<Receipt<Address>, ChainError<FactoryError>> {
        let address = sender.create(self.nonce(sender));
        let receipt = self.transact(sender, address, U256::ZERO, |contracts, env| {
            let factory =
                TokenFactory::new(env, fee_recipient, platform_fee).map_err(ChainError::Revert)?;
            contracts.factories.insert(address, factory);
            Ok(address)
        })?;
        info!(%sender, factory = %address, %platform_fee, "factory deployed");
        Ok(receipt)
    }

    /// Calls [`TokenFactory::create_token`] with `value` attached and returns
    /// the new token's address.
    pub fn create_token(
        &mut self,
        sender: Address,
        factory: Address,
        value: U256,
        config: TokenConfig,
    ) -> Result<Receipt<Address>, ChainError<FactoryError>> {
        self.require_factory(factory)?;
        self.transact(sender, factory, value, |contracts, env| {
            let Contracts { factories, tokens } = contracts;
            let factory = factories
                .get_mut(&factory)
                .ok_or(ChainError::UnknownContract(factory))?;
            let token = factory.create_token(env, config).map_err(ChainError::Revert)?;
            tokens.insert(token).map_err(|dup| ChainError::Revert(dup.into()))
        })
    }

    /// Runs `call` against the factory at `factory` as a transaction from `sender`.
    pub fn call_factory<T>(
        &mut self,
        sender: Address,
        factory: Address,
        value: U256,
        call: impl FnOnce(&mut TokenFactory, &mut Env<'_>) -> Result<T, FactoryError>,
    ) -> Result<Receipt<T>, ChainError<FactoryError>> {
        self.require_factory(factory)?;
        self.transact(sender, factory, value, |contracts, env| {
            let factory = contracts
                .factories
                .get_mut(&factory)
                .ok_or(ChainError::UnknownContract(factory))?;
            call(factory, env).map_err(ChainError::Revert)
        })
    }

    /// Runs `call` against the token at `token` as a transaction from `sender`.
    pub fn call_token<T>(
        &mut self,
        sender: Address,
        token: Address,
        call: impl FnOnce(&mut FeatureToken, &mut Env<'_>) -> Result<T, TokenError>,
    ) -> Result<Receipt<T>, ChainError<TokenError>> {
        if self.token(token).is_none() {
            return Err(ChainError::UnknownContract(token));
        }
        self.transact(sender, token, U256::ZERO, |contracts, env| {
            let token = contracts
                .tokens
                .0
                .get_mut(&token)
                .ok_or(ChainError::UnknownContract(token))?;
            call(token, env).map_err(ChainError::Revert)
        })
    }

    fn require_factory<E>(&self, factory: Address) -> Result<(), ChainError<E>> {
        if self.factory(factory).is_none() {
            return Err(ChainError::UnknownContract(factory));
        }
        Ok(())
    }

    /// Mines one block holding a single transaction. `value` moves from
    /// `sender` to `to` before `execute` runs.
    fn transact<T, E>(
        &mut self,
        sender: Address,
        to: Address,
        value: U256,
        execute: impl FnOnce(&mut Contracts, &mut Env<'_>) -> Result<T, ChainError<E>>,
    ) -> Result<Receipt<T>, ChainError<E>> {
        *self.nonces.entry(sender).or_default() += 1;
        self.block_number += 1;
        let block = Block {
            number: self.block_number,
            timestamp: self.timestamp,
            chain_id: self.config.chain_id,
        };

        let snapshot = self.world.clone();
        let mut logs = Vec::new();
        let World { native, contracts } = &mut self.world;
        let result = match native.transfer(sender, to, value) {
            Ok(()) => {
                let mut env = Env::new(Msg { sender, value }, block, to, &mut logs, native);
                execute(contracts, &mut env)
            }
            Err(err) => Err(ChainError::Value(err)),
        };

        match result {
            Ok(output) => {
                debug!(block = block.number, %sender, %to, logs = logs.len(), "transaction succeeded");
                self.logs.extend(logs.iter().cloned());
                Ok(Receipt {
                    output,
                    logs,
                    block_number: block.number,
                })
            }
            Err(err) => {
                debug!(block = block.number, %sender, %to, "transaction reverted");
                self.world = snapshot;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolError;

    const OWNER: Address = Address::repeat_byte(0x01);
    const USER: Address = Address::repeat_byte(0x02);

    #[test]
    fn reverted_transactions_keep_nonce_and_block_but_not_state() {
        let mut chain = Chain::default();
        let factory = chain
            .deploy_factory(OWNER, OWNER, U256::from(100))
            .unwrap()
            .output;
        assert_eq!(factory, OWNER.create(0));
        chain.fund(USER, U256::from(1_000)).unwrap();

        let err = chain
            .call_factory(USER, factory, U256::from(500), |factory, env| {
                factory.update_platform_fee(env, U256::ZERO)
            })
            .unwrap_err();
        assert!(matches!(err, ChainError::Revert(FactoryError::Unauthorized(_))));
        assert_eq!(chain.balance_of(USER), U256::from(1_000));
        assert_eq!(chain.balance_of(factory), U256::ZERO);
        assert_eq!(chain.nonce(USER), 1);
        assert_eq!(chain.block_number(), 2);
        assert_eq!(chain.logs().len(), 1);
    }

    #[test]
    fn receipts_carry_only_their_own_logs() {
        let mut chain = Chain::default();
        let factory = chain
            .deploy_factory(OWNER, OWNER, U256::ZERO)
            .unwrap()
            .output;
        let receipt = chain
            .create_token(USER, factory, U256::ZERO, TokenConfig::new("Log", "LOG", USER))
            .unwrap();
        // token OwnershipTransferred and factory TokenCreated
        assert_eq!(receipt.logs.len(), 2);
        assert_eq!(chain.logs().len(), 3);
        assert_eq!(chain.tokens().total_supply(receipt.output), Some(U256::ZERO));
        assert_eq!(chain.tokens().total_supply(USER), None);
    }

    #[test]
    fn arena_never_overwrites_a_live_token() {
        let mut chain = Chain::default();
        let factory = chain
            .deploy_factory(OWNER, OWNER, U256::ZERO)
            .unwrap()
            .output;
        let config = TokenConfig::new("Once", "ONE", USER).initial_supply(U256::from(7));
        let token = chain
            .create_token(USER, factory, U256::ZERO, config)
            .unwrap()
            .output;
        let copy = chain.token(token).unwrap().clone();

        let mut arena = chain.tokens().clone();
        assert_eq!(arena.insert(copy), Err(DuplicateToken(token)));
        assert_eq!(arena.len(), 1);
        assert_eq!(arena.total_supply(token), Some(U256::from(7)));
        let data: Vec<u8> = FactoryError::from(DuplicateToken(token)).into();
        assert_eq!(data[..4], crate::factory::token_factory::TokenExists::SELECTOR);
    }

    #[test]
    fn timestamps_move_forward() {
        let mut chain = Chain::new(ChainConfig {
            chain_id: 5,
            genesis_timestamp: 10,
        });
        chain.advance(5);
        assert_eq!(chain.timestamp(), 15);
        chain.set_timestamp(100);
        assert_eq!(chain.timestamp(), 100);
        assert_eq!(chain.chain_id(), 5);
    }
}
