//! Who may do what on a token. Call sites only ask
//! [`AccessControl::authorized`]; whether that means "is the owner" or "holds the
//! role" is decided by the token's feature set at deployment.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{keccak256, Address, B256};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// May grant and revoke roles.
    Admin,
    Minter,
    Pauser,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Minter, Role::Pauser];

    /// Role identifier as used in role events; the admin role is the zero hash.
    pub fn id(self) -> B256 {
        match self {
            Role::Admin => B256::ZERO,
            Role::Minter => keccak256("MINTER_ROLE"),
            Role::Pauser => keccak256("PAUSER_ROLE"),
        }
    }
}

/// Privileged operation families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Mint,
    Pause,
    Admin,
}

impl Action {
    pub const fn role(self) -> Role {
        match self {
            Action::Mint => Role::Minter,
            Action::Pause => Role::Pauser,
            Action::Admin => Role::Admin,
        }
    }
}

/// Role memberships.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleTable {
    members: HashMap<Role, HashSet<Address>>,
}

impl RoleTable {
    /// Returns `true` if `account` did not hold `role` before.
    pub fn grant(&mut self, role: Role, account: Address) -> bool {
        self.members.entry(role).or_default().insert(account)
    }

    /// Returns `true` if `account` held `role`.
    pub fn revoke(&mut self, role: Role, account: Address) -> bool {
        self.members
            .get_mut(&role)
            .map(|set| set.remove(&account))
            .unwrap_or(false)
    }

    pub fn has_role(&self, role: Role, account: Address) -> bool {
        self.members
            .get(&role)
            .map(|set| set.contains(&account))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessControl {
    /// Every privileged action belongs to the owner.
    Owner,
    /// Privileged actions require the matching role.
    Roles(RoleTable),
}

impl AccessControl {
    /// Role-backed control with every role granted to `owner`.
    pub fn with_roles(owner: Address) -> Self {
        let mut table = RoleTable::default();
        for role in Role::ALL {
            table.grant(role, owner);
        }
        AccessControl::Roles(table)
    }

    pub fn authorized(&self, owner: Address, caller: Address, action: Action) -> bool {
        match self {
            AccessControl::Owner => caller == owner,
            AccessControl::Roles(table) => table.has_role(action.role(), caller),
        }
    }

    pub fn roles(&self) -> Option<&RoleTable> {
        match self {
            AccessControl::Owner => None,
            AccessControl::Roles(table) => Some(table),
        }
    }

    pub fn roles_mut(&mut self) -> Option<&mut RoleTable> {
        match self {
            AccessControl::Owner => None,
            AccessControl::Roles(table) => Some(table),
        }
    }
}
