//! What a contract can see and do while one call runs: the message, the block,
//! the native value ledger and the event log.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, Log, U256};
use alloy_sol_types::SolEvent;

/// The message being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Msg {
    pub sender: Address,
    /// Native value attached to the call, already credited to the callee.
    pub value: U256,
}

/// The block the message executes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub timestamp: u64,
    pub chain_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueTransferError {
    #[error("{account} holds {have} wei, needs {want}")]
    InsufficientFunds {
        account: Address,
        have: U256,
        want: U256,
    },
    #[error("{0} does not accept native value")]
    Rejected(Address),
    #[error("crediting {amount} wei to {account} overflows its balance")]
    Overflow { account: Address, amount: U256 },
}

/// Native (wei) balances of every account.
#[derive(Debug, Clone, Default)]
pub struct NativeLedger {
    balances: HashMap<Address, U256>,
    /// Accounts whose receive hook reverts.
    rejecting: HashSet<Address>,
}

impl NativeLedger {
    pub fn balance_of(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    pub fn credit(&mut self, account: Address, amount: U256) -> Result<(), ValueTransferError> {
        let balance = self.balances.entry(account).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(ValueTransferError::Overflow { account, amount })?;
        Ok(())
    }

    pub fn set_rejects_value(&mut self, account: Address, rejects: bool) {
        if rejects {
            self.rejecting.insert(account);
        } else {
            self.rejecting.remove(&account);
        }
    }

    /// Moves `amount` wei. A zero amount always succeeds.
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ValueTransferError> {
        if amount.is_zero() {
            return Ok(());
        }
        if self.rejecting.contains(&to) {
            return Err(ValueTransferError::Rejected(to));
        }
        let have = self.balance_of(from);
        if have < amount {
            return Err(ValueTransferError::InsufficientFunds {
                account: from,
                have,
                want: amount,
            });
        }
        if from != to {
            self.balance_of(to)
                .checked_add(amount)
                .ok_or(ValueTransferError::Overflow { account: to, amount })?;
        }
        self.balances.insert(from, have - amount);
        self.credit(to, amount)
    }
}

/// Execution environment handed to a contract for the duration of one call.
pub struct Env<'a> {
    pub msg: Msg,
    pub block: Block,
    address: Address,
    logs: &'a mut Vec<Log>,
    native: &'a mut NativeLedger,
}

impl<'a> Env<'a> {
    pub fn new(
        msg: Msg,
        block: Block,
        address: Address,
        logs: &'a mut Vec<Log>,
        native: &'a mut NativeLedger,
    ) -> Self {
        Self {
            msg,
            block,
            address,
            logs,
            native,
        }
    }

    /// Address of the executing contract.
    pub fn contract_address(&self) -> Address {
        self.address
    }

    /// Emits `event` from the executing contract.
    pub fn log<E: SolEvent>(&mut self, event: E) {
        self.logs.push(Log {
            address: self.address,
            data: event.encode_log_data(),
        });
    }

    /// Sends `amount` wei from the executing contract to `to`.
    pub fn transfer_value(&mut self, to: Address, amount: U256) -> Result<(), ValueTransferError> {
        self.native.transfer(self.address, to, amount)
    }

    /// Environment for a contract created by this one: the creator becomes
    /// `msg.sender`, no value is attached, logs and balances are shared.
    pub fn create(&mut self, address: Address) -> Env<'_> {
        Env {
            msg: Msg {
                sender: self.address,
                value: U256::ZERO,
            },
            block: self.block,
            address,
            logs: &mut *self.logs,
            native: &mut *self.native,
        }
    }
}
