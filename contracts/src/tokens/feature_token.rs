//! A token deployed by the factory: an ERC20 ledger plus the operations its
//! feature set unlocks (minting, burning, pausing, permit, supply cap, roles).
//!
//! Minting and burning are not subject to the pause gate; only transfers are.

use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{sol, SolError};
use common::units::MAX_DECIMALS;

use super::access::{AccessControl, Action, Role};
use super::erc20::{
    Erc20, Erc20Error, InsufficientAllowance, InsufficientBalance, InvalidReceiver,
    InvalidSignature, PermitExpired,
};
use super::features::{Feature, TokenFeatures};
use crate::host::Env;

/// Construction parameters of a [`FeatureToken`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Minted to `owner` at construction.
    pub initial_supply: U256,
    /// Only meaningful when the token is capped.
    pub max_supply: U256,
    pub features: TokenFeatures,
    pub owner: Address,
}

impl TokenConfig {
    /// An 18-decimal token with no supply and no features.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, owner: Address) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals: MAX_DECIMALS,
            initial_supply: U256::ZERO,
            max_supply: U256::ZERO,
            features: TokenFeatures::NONE,
            owner,
        }
    }

    pub fn decimals(mut self, decimals: u8) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn initial_supply(mut self, amount: U256) -> Self {
        self.initial_supply = amount;
        self
    }

    pub fn max_supply(mut self, amount: U256) -> Self {
        self.max_supply = amount;
        self
    }

    pub fn features(mut self, features: TokenFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn validate(&self) -> Result<(), TokenError> {
        if self.decimals > MAX_DECIMALS {
            return Err(TokenError::InvalidDecimals(InvalidDecimals {
                decimals: self.decimals,
            }));
        }
        if self.owner.is_zero() {
            return Err(TokenError::InvalidOwner(InvalidOwner { owner: self.owner }));
        }
        if self.features.contains(Feature::Capped)
            && (self.max_supply.is_zero() || self.initial_supply > self.max_supply)
        {
            return Err(TokenError::InvalidCap(InvalidCap {
                initial_supply: self.initial_supply,
                cap: self.max_supply,
            }));
        }
        Ok(())
    }
}

/// Read-only summary returned by [`FeatureToken::get_token_info`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub max_supply: U256,
    pub features: TokenFeatures,
}

sol! {
    #[derive(Debug, PartialEq, Eq)]
    event Mint(address indexed to, uint256 amount);
    #[derive(Debug, PartialEq, Eq)]
    event Paused(address account);
    #[derive(Debug, PartialEq, Eq)]
    event Unpaused(address account);
    #[derive(Debug, PartialEq, Eq)]
    event OwnershipTransferred(address indexed previous_owner, address indexed new_owner);
    #[derive(Debug, PartialEq, Eq)]
    event RoleGranted(bytes32 indexed role, address indexed account, address indexed sender);
    #[derive(Debug, PartialEq, Eq)]
    event RoleRevoked(bytes32 indexed role, address indexed account, address indexed sender);

    #[derive(Debug, PartialEq, Eq)]
    error Unauthorized(address account);
    #[derive(Debug, PartialEq, Eq)]
    error FeatureDisabled(string feature);
    #[derive(Debug, PartialEq, Eq)]
    error EnforcedPause();
    #[derive(Debug, PartialEq, Eq)]
    error AlreadyPaused();
    #[derive(Debug, PartialEq, Eq)]
    error NotPaused();
    #[derive(Debug, PartialEq, Eq)]
    error SupplyCapExceeded(uint256 increased_supply, uint256 cap);
    #[derive(Debug, PartialEq, Eq)]
    error LengthMismatch(uint256 recipients, uint256 amounts);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidDecimals(uint8 decimals);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidCap(uint256 initial_supply, uint256 cap);
    #[derive(Debug, PartialEq, Eq)]
    error InvalidOwner(address owner);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("{} is not authorized", .0.account)]
    Unauthorized(Unauthorized),
    #[error("feature {} is not enabled on this token", .0.feature)]
    FeatureDisabled(FeatureDisabled),
    #[error("token transfers are paused")]
    Paused(EnforcedPause),
    #[error("token is already paused")]
    AlreadyPaused(AlreadyPaused),
    #[error("token is not paused")]
    NotPaused(NotPaused),
    #[error("supply would reach {}, cap is {}", .0.increased_supply, .0.cap)]
    SupplyCapExceeded(SupplyCapExceeded),
    #[error("insufficient balance: {} has {}, needs {}", .0.from, .0.have, .0.want)]
    InsufficientBalance(InsufficientBalance),
    #[error("insufficient allowance: {} may spend {} of {}, needs {}", .0.spender, .0.have, .0.owner, .0.want)]
    InsufficientAllowance(InsufficientAllowance),
    #[error("{} recipients but {} amounts", .0.recipients, .0.amounts)]
    LengthMismatch(LengthMismatch),
    #[error("invalid receiver {}", .0.receiver)]
    InvalidReceiver(InvalidReceiver),
    #[error("permit expired at {}, now {}", .0.deadline, .0.timestamp)]
    PermitExpired(PermitExpired),
    #[error("permit signature does not match the owner")]
    InvalidSignature(InvalidSignature),
    #[error("decimals {} exceeds 18", .0.decimals)]
    InvalidDecimals(InvalidDecimals),
    #[error("initial supply {} does not fit cap {}", .0.initial_supply, .0.cap)]
    InvalidCap(InvalidCap),
    #[error("invalid owner {}", .0.owner)]
    InvalidOwner(InvalidOwner),
}

impl From<Erc20Error> for TokenError {
    fn from(err: Erc20Error) -> Self {
        match err {
            Erc20Error::InsufficientBalance(e) => TokenError::InsufficientBalance(e),
            Erc20Error::InsufficientAllowance(e) => TokenError::InsufficientAllowance(e),
            Erc20Error::InvalidReceiver(e) => TokenError::InvalidReceiver(e),
            Erc20Error::PermitExpired(e) => TokenError::PermitExpired(e),
            Erc20Error::InvalidSignature(e) => TokenError::InvalidSignature(e),
        }
    }
}

/// ABI-encoded revert data.
impl From<TokenError> for Vec<u8> {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Unauthorized(e) => e.abi_encode(),
            TokenError::FeatureDisabled(e) => e.abi_encode(),
            TokenError::Paused(e) => e.abi_encode(),
            TokenError::AlreadyPaused(e) => e.abi_encode(),
            TokenError::NotPaused(e) => e.abi_encode(),
            TokenError::SupplyCapExceeded(e) => e.abi_encode(),
            TokenError::InsufficientBalance(e) => e.abi_encode(),
            TokenError::InsufficientAllowance(e) => e.abi_encode(),
            TokenError::LengthMismatch(e) => e.abi_encode(),
            TokenError::InvalidReceiver(e) => e.abi_encode(),
            TokenError::PermitExpired(e) => e.abi_encode(),
            TokenError::InvalidSignature(e) => e.abi_encode(),
            TokenError::InvalidDecimals(e) => e.abi_encode(),
            TokenError::InvalidCap(e) => e.abi_encode(),
            TokenError::InvalidOwner(e) => e.abi_encode(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeatureToken {
    address: Address,
    erc20: Erc20,
    owner: Address,
    features: TokenFeatures,
    /// Zero when uncapped.
    max_supply: U256,
    paused: bool,
    access: AccessControl,
}

// Internal functions
impl FeatureToken {
    /// Runs the constructor of a token living at `env.contract_address()` and
    /// mints the initial supply to the configured owner.
    pub fn deploy(env: &mut Env<'_>, config: TokenConfig) -> Result<Self, TokenError> {
        config.validate()?;
        let TokenConfig {
            name,
            symbol,
            decimals,
            initial_supply,
            max_supply,
            features,
            owner,
        } = config;

        let access = if features.contains(Feature::Roles) {
            AccessControl::with_roles(owner)
        } else {
            AccessControl::Owner
        };
        let mut token = FeatureToken {
            address: env.contract_address(),
            erc20: Erc20::new(name, symbol, decimals),
            owner,
            features,
            max_supply: if features.contains(Feature::Capped) {
                max_supply
            } else {
                U256::ZERO
            },
            paused: false,
            access,
        };

        env.log(OwnershipTransferred {
            previous_owner: Address::ZERO,
            new_owner: owner,
        });
        if !initial_supply.is_zero() {
            token.erc20._mint(env, owner, initial_supply)?;
        }
        Ok(token)
    }

    fn require_feature(&self, feature: Feature) -> Result<(), TokenError> {
        if !self.features.contains(feature) {
            return Err(TokenError::FeatureDisabled(FeatureDisabled {
                feature: feature.name().to_string(),
            }));
        }
        Ok(())
    }

    fn require_authorized(&self, caller: Address, action: Action) -> Result<(), TokenError> {
        if !self.access.authorized(self.owner, caller, action) {
            return Err(TokenError::Unauthorized(Unauthorized { account: caller }));
        }
        Ok(())
    }

    fn require_owner(&self, caller: Address) -> Result<(), TokenError> {
        if caller != self.owner {
            return Err(TokenError::Unauthorized(Unauthorized { account: caller }));
        }
        Ok(())
    }

    fn require_not_paused(&self) -> Result<(), TokenError> {
        if self.paused {
            return Err(TokenError::Paused(EnforcedPause {}));
        }
        Ok(())
    }

    fn cap(&self) -> U256 {
        if self.is_capped() {
            self.max_supply
        } else {
            U256::MAX
        }
    }

    /// Fails unless minting `amount` more keeps the supply within the cap (or U256).
    fn require_supply_room(&self, amount: Option<U256>) -> Result<(), TokenError> {
        let cap = self.cap();
        match amount.and_then(|amount| self.total_supply().checked_add(amount)) {
            Some(increased_supply) if increased_supply <= cap => Ok(()),
            increased => Err(TokenError::SupplyCapExceeded(SupplyCapExceeded {
                increased_supply: increased.unwrap_or(U256::MAX),
                cap,
            })),
        }
    }

    fn require_matching_lengths(recipients: &[Address], amounts: &[U256]) -> Result<(), TokenError> {
        if recipients.len() != amounts.len() {
            return Err(TokenError::LengthMismatch(LengthMismatch {
                recipients: U256::from(recipients.len()),
                amounts: U256::from(amounts.len()),
            }));
        }
        Ok(())
    }

    fn require_receivers(recipients: &[Address]) -> Result<(), TokenError> {
        match recipients.iter().find(|r| r.is_zero()) {
            Some(receiver) => Err(TokenError::InvalidReceiver(InvalidReceiver {
                receiver: *receiver,
            })),
            None => Ok(()),
        }
    }

    fn sum(amounts: &[U256]) -> Option<U256> {
        amounts
            .iter()
            .try_fold(U256::ZERO, |total, amount| total.checked_add(*amount))
    }
}

// External functions
impl FeatureToken {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        self.erc20.name()
    }

    pub fn symbol(&self) -> &str {
        self.erc20.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.erc20.decimals()
    }

    pub fn total_supply(&self) -> U256 {
        self.erc20.total_supply()
    }

    /// Zero when the token is uncapped.
    pub fn max_supply(&self) -> U256 {
        self.max_supply
    }

    pub fn balance_of(&self, account: Address) -> U256 {
        self.erc20.balance_of(account)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.erc20.allowance(owner, spender)
    }

    pub fn nonces(&self, owner: Address) -> U256 {
        self.erc20.nonces(owner)
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn features(&self) -> TokenFeatures {
        self.features
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(feature)
    }

    pub fn is_mintable(&self) -> bool {
        self.has_feature(Feature::Mintable)
    }

    pub fn is_burnable(&self) -> bool {
        self.has_feature(Feature::Burnable)
    }

    pub fn is_pausable(&self) -> bool {
        self.has_feature(Feature::Pausable)
    }

    pub fn is_capped(&self) -> bool {
        self.has_feature(Feature::Capped)
    }

    pub fn has_permit(&self) -> bool {
        self.has_feature(Feature::Permit)
    }

    pub fn has_votes(&self) -> bool {
        self.has_feature(Feature::Votes)
    }

    pub fn has_role(&self, role: Role, account: Address) -> bool {
        self.access
            .roles()
            .map(|table| table.has_role(role, account))
            .unwrap_or(false)
    }

    pub fn get_token_info(&self) -> TokenInfo {
        TokenInfo {
            name: self.name().to_string(),
            symbol: self.symbol().to_string(),
            decimals: self.decimals(),
            max_supply: self.max_supply,
            features: self.features,
        }
    }

    /// EIP-712 domain separator on `chain_id`.
    pub fn domain_separator(&self, chain_id: u64) -> B256 {
        self.erc20._compute_domain_separator(chain_id, self.address)
    }

    /// Digest `owner` must sign for [`FeatureToken::permit`] with its current nonce.
    pub fn permit_digest(
        &self,
        chain_id: u64,
        owner: Address,
        spender: Address,
        value: U256,
        deadline: U256,
    ) -> B256 {
        self.erc20.permit_digest(
            chain_id,
            self.address,
            owner,
            spender,
            value,
            self.nonces(owner),
            deadline,
        )
    }

    /// Mints `amount` to `to`.
    ///
    /// Requirements:
    /// - the token is mintable and the caller may mint;
    /// - a capped token stays within its cap.
    ///
    /// Emits {Transfer} and {Mint}.
    pub fn mint(&mut self, env: &mut Env<'_>, to: Address, amount: U256) -> Result<(), TokenError> {
        self.require_feature(Feature::Mintable)?;
        self.require_authorized(env.msg.sender, Action::Mint)?;
        Self::require_receivers(&[to])?;
        self.require_supply_room(Some(amount))?;
        self.erc20._mint(env, to, amount)?;
        env.log(Mint { to, amount });
        Ok(())
    }

    /// Mints every `amounts[i]` to `recipients[i]`, or nothing at all.
    pub fn batch_mint(
        &mut self,
        env: &mut Env<'_>,
        recipients: &[Address],
        amounts: &[U256],
    ) -> Result<(), TokenError> {
        self.require_feature(Feature::Mintable)?;
        self.require_authorized(env.msg.sender, Action::Mint)?;
        Self::require_matching_lengths(recipients, amounts)?;
        Self::require_receivers(recipients)?;
        self.require_supply_room(Self::sum(amounts))?;
        for (to, amount) in recipients.iter().zip(amounts) {
            self.erc20._mint(env, *to, *amount)?;
            env.log(Mint {
                to: *to,
                amount: *amount,
            });
        }
        Ok(())
    }

    /// Burns `amount` of the caller's tokens.
    pub fn burn(&mut self, env: &mut Env<'_>, amount: U256) -> Result<(), TokenError> {
        self.require_feature(Feature::Burnable)?;
        let sender = env.msg.sender;
        self.erc20._burn(env, sender, amount)?;
        Ok(())
    }

    /// Burns `amount` of `account`'s tokens, spending the caller's allowance.
    pub fn burn_from(
        &mut self,
        env: &mut Env<'_>,
        account: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.require_feature(Feature::Burnable)?;
        let spender = env.msg.sender;
        self.erc20.require_allowance(account, spender, amount)?;
        self.erc20.require_balance(account, amount)?;
        self.erc20._spend_allowance(account, spender, amount)?;
        self.erc20._burn(env, account, amount)?;
        Ok(())
    }

    pub fn transfer(&mut self, env: &mut Env<'_>, to: Address, amount: U256) -> Result<(), TokenError> {
        self.require_not_paused()?;
        let sender = env.msg.sender;
        self.erc20._transfer(env, sender, to, amount)?;
        Ok(())
    }

    pub fn transfer_from(
        &mut self,
        env: &mut Env<'_>,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.require_not_paused()?;
        self.erc20.transfer_from(env, from, to, amount)?;
        Ok(())
    }

    /// Sends every `amounts[i]` to `recipients[i]` in order. Each leg is checked
    /// on its own; the first failing leg reverts the whole call.
    pub fn batch_transfer(
        &mut self,
        env: &mut Env<'_>,
        recipients: &[Address],
        amounts: &[U256],
    ) -> Result<(), TokenError> {
        self.require_not_paused()?;
        Self::require_matching_lengths(recipients, amounts)?;
        Self::require_receivers(recipients)?;
        let sender = env.msg.sender;
        for (to, amount) in recipients.iter().zip(amounts) {
            self.erc20._transfer(env, sender, *to, *amount)?;
        }
        Ok(())
    }

    pub fn approve(&mut self, env: &mut Env<'_>, spender: Address, value: U256) -> bool {
        let owner = env.msg.sender;
        self.erc20._approve(env, owner, spender, value);
        true
    }

    pub fn pause(&mut self, env: &mut Env<'_>) -> Result<(), TokenError> {
        self.require_feature(Feature::Pausable)?;
        self.require_authorized(env.msg.sender, Action::Pause)?;
        if self.paused {
            return Err(TokenError::AlreadyPaused(AlreadyPaused {}));
        }
        self.paused = true;
        let account = env.msg.sender;
        env.log(Paused { account });
        Ok(())
    }

    pub fn unpause(&mut self, env: &mut Env<'_>) -> Result<(), TokenError> {
        self.require_feature(Feature::Pausable)?;
        self.require_authorized(env.msg.sender, Action::Pause)?;
        if !self.paused {
            return Err(TokenError::NotPaused(NotPaused {}));
        }
        self.paused = false;
        let account = env.msg.sender;
        env.log(Unpaused { account });
        Ok(())
    }

    /// Sets `value` as the allowance of `spender` over `owner`'s tokens from an
    /// EIP-2612 signature. Each signature is usable once: the owner's nonce moves on.
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
    ) -> Result<(), TokenError> {
        self.require_feature(Feature::Permit)?;
        self.erc20
            .permit(env, owner, spender, value, deadline, v, r, s)?;
        Ok(())
    }

    /// Hands the token to `new_owner`. With roles enabled the new owner also
    /// receives every role; the previous owner keeps theirs until revoked.
    pub fn transfer_ownership(
        &mut self,
        env: &mut Env<'_>,
        new_owner: Address,
    ) -> Result<(), TokenError> {
        let caller = env.msg.sender;
        self.require_owner(caller)?;
        if new_owner.is_zero() {
            return Err(TokenError::InvalidOwner(InvalidOwner { owner: new_owner }));
        }
        let previous_owner = self.owner;
        self.owner = new_owner;
        if let Some(table) = self.access.roles_mut() {
            for role in Role::ALL {
                if table.grant(role, new_owner) {
                    env.log(RoleGranted {
                        role: role.id(),
                        account: new_owner,
                        sender: caller,
                    });
                }
            }
        }
        env.log(OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(())
    }

    pub fn grant_role(
        &mut self,
        env: &mut Env<'_>,
        role: Role,
        account: Address,
    ) -> Result<(), TokenError> {
        self.require_feature(Feature::Roles)?;
        let sender = env.msg.sender;
        self.require_authorized(sender, Action::Admin)?;
        if let Some(table) = self.access.roles_mut() {
            if table.grant(role, account) {
                env.log(RoleGranted {
                    role: role.id(),
                    account,
                    sender,
                });
            }
        }
        Ok(())
    }

    pub fn revoke_role(
        &mut self,
        env: &mut Env<'_>,
        role: Role,
        account: Address,
    ) -> Result<(), TokenError> {
        self.require_feature(Feature::Roles)?;
        let sender = env.msg.sender;
        self.require_authorized(sender, Action::Admin)?;
        if let Some(table) = self.access.roles_mut() {
            if table.revoke(role, account) {
                env.log(RoleRevoked {
                    role: role.id(),
                    account,
                    sender,
                });
            }
        }
        Ok(())
    }
}
