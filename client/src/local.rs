//! [`ChainBackend`] over an in-process [`Chain`], with a mempool so callers
//! can observe the pending state and dropped transactions.

use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::sync::{Mutex, MutexGuard, PoisonError};

use alloy_primitives::{keccak256, Address, U256};
use tokenforge::chain::{ChainError, Receipt};
use tokenforge::host::Env;
use tokenforge::{Chain, DeploymentRecord, FeatureToken, TokenError};
use tracing::{debug, info};

use crate::backend::{
    ChainBackend, RegistryQuery, TokenCall, TokenState, TxHash, TxReceipt, TxRequest, TxStatus,
};
use crate::error::{ClientError, Rejection};

struct PendingTx {
    hash: TxHash,
    sender: Address,
    request: TxRequest,
}

struct LocalState {
    chain: Chain,
    account: Option<Address>,
    automine: bool,
    mempool: VecDeque<PendingTx>,
    statuses: HashMap<TxHash, TxStatus>,
    submitted: u64,
}

pub struct LocalBackend {
    state: Mutex<LocalState>,
}

impl LocalBackend {
    /// Wraps `chain` with no account connected and automining on.
    pub fn new(chain: Chain) -> Self {
        Self {
            state: Mutex::new(LocalState {
                chain,
                account: None,
                automine: true,
                mempool: VecDeque::new(),
                statuses: HashMap::new(),
                submitted: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn connect(&self, account: Address) {
        self.lock().account = Some(account);
    }

    pub fn disconnect(&self) {
        self.lock().account = None;
    }

    /// With automining off, submissions stay pending until [`LocalBackend::mine`].
    pub fn set_automine(&self, automine: bool) {
        self.lock().automine = automine;
    }

    /// Executes every pending transaction in submission order and returns how
    /// many there were.
    pub fn mine(&self) -> usize {
        self.lock().mine()
    }

    /// Evicts a pending transaction. Returns `false` if it is not pending.
    pub fn drop_pending(&self, hash: TxHash) -> bool {
        let mut state = self.lock();
        let before = state.mempool.len();
        state.mempool.retain(|tx| tx.hash != hash);
        if state.mempool.len() == before {
            return false;
        }
        state.statuses.insert(hash, TxStatus::Dropped);
        debug!(%hash, "dropped pending transaction");
        true
    }

    /// Direct access to the chain, for setup and inspection.
    pub fn with_chain<R>(&self, f: impl FnOnce(&mut Chain) -> R) -> R {
        f(&mut self.lock().chain)
    }
}

impl LocalState {
    fn mine(&mut self) -> usize {
        let mut mined = 0;
        while let Some(tx) = self.mempool.pop_front() {
            let status = execute(&mut self.chain, tx.hash, tx.sender, tx.request);
            info!(
                hash = %tx.hash,
                block = self.chain.block_number(),
                confirmed = matches!(status, TxStatus::Confirmed(_)),
                "mined transaction"
            );
            self.statuses.insert(tx.hash, status);
            mined += 1;
        }
        mined
    }
}

fn execute(chain: &mut Chain, hash: TxHash, sender: Address, request: TxRequest) -> TxStatus {
    match request {
        TxRequest::CreateToken {
            factory,
            payment,
            config,
        } => match chain.create_token(sender, factory, payment, config) {
            Ok(receipt) => {
                let token = receipt.output;
                confirmed(hash, receipt, Some(token))
            }
            Err(err) => reverted(&err),
        },
        TxRequest::Token { token, call } => {
            match chain.call_token(sender, token, |t, env| apply(t, env, call)) {
                Ok(receipt) => confirmed(hash, receipt, None),
                Err(err) => reverted(&err),
            }
        }
    }
}

fn apply(token: &mut FeatureToken, env: &mut Env<'_>, call: TokenCall) -> Result<(), TokenError> {
    match call {
        TokenCall::Mint { to, amount } => token.mint(env, to, amount),
        TokenCall::Burn { amount } => token.burn(env, amount),
        TokenCall::Transfer { to, amount } => token.transfer(env, to, amount),
        TokenCall::Approve { spender, amount } => {
            token.approve(env, spender, amount);
            Ok(())
        }
        TokenCall::Pause => token.pause(env),
        TokenCall::Unpause => token.unpause(env),
    }
}

fn confirmed<T>(hash: TxHash, receipt: Receipt<T>, token_address: Option<Address>) -> TxStatus {
    TxStatus::Confirmed(TxReceipt {
        hash,
        block_number: receipt.block_number,
        token_address,
        logs: receipt.logs,
    })
}

fn reverted<E: Display + Clone + Into<Vec<u8>>>(err: &ChainError<E>) -> TxStatus {
    TxStatus::Reverted {
        reason: err.to_string(),
        data: err.revert_data().unwrap_or_default(),
    }
}

impl ChainBackend for LocalBackend {
    fn account(&self) -> Option<Address> {
        self.lock().account
    }

    fn chain_id(&self) -> u64 {
        self.lock().chain.chain_id()
    }

    fn submit(&self, request: TxRequest) -> Result<TxHash, ClientError> {
        let mut state = self.lock();
        let sender = state.account.ok_or(Rejection::WalletNotConnected)?;
        state.submitted += 1;
        let mut preimage = sender.to_vec();
        preimage.extend_from_slice(&state.submitted.to_be_bytes());
        let hash = keccak256(preimage);

        state.statuses.insert(hash, TxStatus::Pending);
        state.mempool.push_back(PendingTx {
            hash,
            sender,
            request,
        });
        debug!(%hash, %sender, "transaction submitted");
        if state.automine {
            state.mine();
        }
        Ok(hash)
    }

    fn status(&self, hash: TxHash) -> TxStatus {
        self.lock()
            .statuses
            .get(&hash)
            .cloned()
            .unwrap_or(TxStatus::Dropped)
    }

    fn platform_fee(&self, factory: Address) -> Option<U256> {
        self.lock().chain.factory(factory).map(|f| f.platform_fee())
    }

    fn deployments(
        &self,
        factory: Address,
        query: RegistryQuery,
    ) -> Result<Vec<DeploymentRecord>, ClientError> {
        let state = self.lock();
        let lens = state.chain.tokens();
        let factory = state
            .chain
            .factory(factory)
            .ok_or(Rejection::UnknownContract(factory))?;
        Ok(match query {
            RegistryQuery::All => factory.get_all_tokens(lens),
            RegistryQuery::ByDeployer(deployer) => factory.get_tokens_by_deployer(lens, deployer),
            RegistryQuery::ByOwner(owner) => factory.get_tokens_by_owner(lens, owner),
            RegistryQuery::Page { offset, limit } => factory
                .get_tokens_paginated(lens, offset, limit)
                .map_err(Rejection::Query)?,
        })
    }

    fn token_state(&self, token: Address) -> Option<TokenState> {
        self.lock().chain.token(token).map(|t| TokenState {
            name: t.name().to_string(),
            symbol: t.symbol().to_string(),
            decimals: t.decimals(),
            total_supply: t.total_supply(),
            max_supply: t.max_supply(),
            owner: t.owner(),
            features: t.features(),
            paused: t.paused(),
        })
    }

    fn balance_of(&self, token: Address, account: Address) -> Option<U256> {
        self.lock().chain.token(token).map(|t| t.balance_of(account))
    }
}
