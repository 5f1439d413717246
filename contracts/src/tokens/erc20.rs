//! ERC20 base ledger with EIP2612 (permit) support.
//! Doc comments are forked from: https://github.com/Vectorized/solady/blob/main/src/tokens/ERC20.sol

use std::collections::HashMap;

use alloy_primitives::{fixed_bytes, keccak256, Address, B256, U256};
use alloy_sol_types::{sol, SolValue};
use common::crypto::ecrecover::EcRecoverTrait;

use crate::host::Env;
use crate::utils::ecrecover::NativeEcRecover;

/// Balances, allowances and permit nonces of one token.
#[derive(Debug, Clone, Default)]
pub struct Erc20 {
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: U256,
    balances: HashMap<Address, U256>,
    allowances: HashMap<Address, HashMap<Address, U256>>,
    nonces: HashMap<Address, U256>,
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    event Transfer(address indexed from, address indexed to, uint256 value);
    #[derive(Debug, PartialEq, Eq)]
    event Approval(address indexed owner, address indexed spender, uint256 value);

    #[derive(Debug, PartialEq, Eq)]
    error InsufficientBalance(address from, uint256 have, uint256 want);
    #[derive(Debug, PartialEq, Eq)]
    error InsufficientAllowance(address owner, address spender, uint256 have, uint256 want);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidReceiver(address receiver);
    #[derive(Debug, PartialEq, Eq)]
    error PermitExpired(uint256 deadline, uint256 timestamp);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidSignature();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Erc20Error {
    InsufficientBalance(InsufficientBalance),
    InsufficientAllowance(InsufficientAllowance),
    InvalidReceiver(InvalidReceiver),
    PermitExpired(PermitExpired),
    InvalidSignature(InvalidSignature),
}

// keccak256("1")
const VERSION_HASH: B256 =
    fixed_bytes!("c89efdaa54c0f20c7adf612882df0950f5a951637e0307cdcb4c672f298b8bc6");

// keccack256("EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)")
const EIP_712_DOMAIN_HASH: B256 =
    fixed_bytes!("8b73c3c69bb8fe3d512ecc4cf759cc79239f7b179b0ffacaa9a75d522b39400f");

// keccak256("Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)")
const PERMIT_TYPEHASH: B256 =
    fixed_bytes!("6e71edae12b1b97f4d1f60370fef10105fa2faae0126114a169c64845d6126c9");

// Internal functions
impl Erc20 {
    pub fn new(name: String, symbol: String, decimals: u8) -> Self {
        Self {
            name,
            symbol,
            decimals,
            ..Default::default()
        }
    }

    /// Fails unless `account` holds at least `value`.
    pub fn require_balance(&self, account: Address, value: U256) -> Result<(), Erc20Error> {
        let have = self.balance_of(account);
        if have < value {
            return Err(Erc20Error::InsufficientBalance(InsufficientBalance {
                from: account,
                have,
                want: value,
            }));
        }
        Ok(())
    }

    /// Fails unless `spender` may move at least `value` of `owner`'s tokens.
    pub fn require_allowance(
        &self,
        owner: Address,
        spender: Address,
        value: U256,
    ) -> Result<(), Erc20Error> {
        let have = self.allowance(owner, spender);
        if have < value {
            return Err(Erc20Error::InsufficientAllowance(InsufficientAllowance {
                owner,
                spender,
                have,
                want: value,
            }));
        }
        Ok(())
    }

    /// Moves `amount` of tokens from `from` to `to`.
    pub fn _transfer(
        &mut self,
        env: &mut Env<'_>,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<(), Erc20Error> {
        if to.is_zero() {
            return Err(Erc20Error::InvalidReceiver(InvalidReceiver { receiver: to }));
        }
        self.require_balance(from, value)?;
        let sender_balance = self.balance_of(from);
        self.balances.insert(from, sender_balance - value);
        // the receiver's balance is bounded by the total supply
        let to_balance = self.balances.entry(to).or_default();
        *to_balance += value;
        env.log(Transfer { from, to, value });
        Ok(())
    }

    /// Mints `amount` tokens to `to`, increasing the total supply.
    /// The caller checks that the supply does not overflow.
    ///
    /// Emits a {Transfer} event.
    pub fn _mint(&mut self, env: &mut Env<'_>, to: Address, value: U256) -> Result<(), Erc20Error> {
        if to.is_zero() {
            return Err(Erc20Error::InvalidReceiver(InvalidReceiver { receiver: to }));
        }
        let balance = self.balances.entry(to).or_default();
        *balance += value;
        self.total_supply += value;
        env.log(Transfer {
            from: Address::ZERO,
            to,
            value,
        });
        Ok(())
    }

    /// Burns `amount` tokens from `from`, reducing the total supply.
    ///
    /// Emits a {Transfer} event.
    pub fn _burn(&mut self, env: &mut Env<'_>, from: Address, value: U256) -> Result<(), Erc20Error> {
        self.require_balance(from, value)?;
        let balance = self.balance_of(from);
        self.balances.insert(from, balance - value);
        self.total_supply -= value;
        env.log(Transfer {
            from,
            to: Address::ZERO,
            value,
        });
        Ok(())
    }

    /// Sets `value` as the allowance of `spender` over the tokens of `owner`.
    ///
    /// Emits a {Approval} event.
    pub fn _approve(&mut self, env: &mut Env<'_>, owner: Address, spender: Address, value: U256) {
        self.allowances.entry(owner).or_default().insert(spender, value);
        env.log(Approval {
            owner,
            spender,
            value,
        });
    }

    /// Deducts `value` from the allowance of `spender` over `owner`'s tokens.
    /// An infinite allowance is left untouched.
    pub fn _spend_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        value: U256,
    ) -> Result<(), Erc20Error> {
        self.require_allowance(owner, spender, value)?;
        let allowance = self.allowance(owner, spender);
        if allowance != U256::MAX {
            self.allowances
                .entry(owner)
                .or_default()
                .insert(spender, allowance - value);
        }
        Ok(())
    }

    /// Computes the domain separator for a token deployed at `verifying_contract`.
    pub fn _compute_domain_separator(&self, chain_id: u64, verifying_contract: Address) -> B256 {
        keccak256(
            (
                EIP_712_DOMAIN_HASH,
                keccak256(self.name.as_bytes()),
                VERSION_HASH,
                U256::from(chain_id),
                verifying_contract,
            )
                .abi_encode(),
        )
    }

    /// The EIP-712 digest an `owner` signs to grant `spender` an allowance of `value`.
    #[allow(clippy::too_many_arguments)]
    pub fn permit_digest(
        &self,
        chain_id: u64,
        verifying_contract: Address,
        owner: Address,
        spender: Address,
        value: U256,
        nonce: U256,
        deadline: U256,
    ) -> B256 {
        let struct_hash = keccak256(
            (PERMIT_TYPEHASH, owner, spender, value, nonce, deadline).abi_encode(),
        );

        let mut preimage = Vec::with_capacity(2 + 2 * 32);
        preimage.extend_from_slice(b"\x19\x01");
        preimage.extend_from_slice(
            self._compute_domain_separator(chain_id, verifying_contract)
                .as_slice(),
        );
        preimage.extend_from_slice(struct_hash.as_slice());
        keccak256(preimage)
    }
}

// External functions
impl Erc20 {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Returns the amount of tokens in existence.
    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Returns the amount of tokens owned by `owner`.
    pub fn balance_of(&self, address: Address) -> U256 {
        self.balances.get(&address).copied().unwrap_or_default()
    }

    /// Returns the amount of tokens that `spender` can spend on behalf of `owner`.
    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&owner)
            .and_then(|spenders| spenders.get(&spender))
            .copied()
            .unwrap_or_default()
    }

    /// Returns the current permit nonce of `owner`.
    pub fn nonces(&self, owner: Address) -> U256 {
        self.nonces.get(&owner).copied().unwrap_or_default()
    }

    /// Transfers `amount` tokens from `from` to `to`, spending the caller's allowance.
    ///
    /// Requirements:
    /// - The caller must have at least `amount` of allowance to transfer the tokens of `from`.
    /// - `from` must at least have `amount`.
    ///
    /// Emits a {Transfer} event.
    pub fn transfer_from(
        &mut self,
        env: &mut Env<'_>,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<(), Erc20Error> {
        let spender = env.msg.sender;
        self.require_allowance(from, spender, value)?;
        self.require_balance(from, value)?;
        if to.is_zero() {
            return Err(Erc20Error::InvalidReceiver(InvalidReceiver { receiver: to }));
        }
        self._spend_allowance(from, spender, value)?;
        self._transfer(env, from, to, value)
    }

    /// Sets `value` as the allowance of `spender` over the tokens of `owner`,
    /// authorized by a signed approval by `owner`.
    ///
    /// Emits a {Approval} event.
    #[allow(clippy::too_many_arguments)]
    pub fn permit(
        &mut self,
        env: &mut Env<'_>,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: U256,
        v: u8,
        r: B256,
        s: B256,
    ) -> Result<(), Erc20Error> {
        let timestamp = U256::from(env.block.timestamp);
        if timestamp > deadline {
            return Err(Erc20Error::PermitExpired(PermitExpired {
                deadline,
                timestamp,
            }));
        }

        let nonce = self.nonces(owner);
        let signed_hash = self.permit_digest(
            env.block.chain_id,
            env.contract_address(),
            owner,
            spender,
            value,
            nonce,
            deadline,
        );

        let recovered_address = Address::from(
            NativeEcRecover::ecrecover(&signed_hash.0, v, &r.0, &s.0)
                .map_err(|_| Erc20Error::InvalidSignature(InvalidSignature {}))?,
        );

        if recovered_address.is_zero() || recovered_address != owner {
            return Err(Erc20Error::InvalidSignature(InvalidSignature {}));
        }

        self.nonces.insert(owner, nonce + U256::from(1));
        self._approve(env, owner, spender, value);
        Ok(())
    }
}
