//! Append-only record of deployed tokens. Entries live once in an arena; the
//! global, per-deployer and per-owner lists hold indices into it.

use std::collections::HashMap;

use alloy_primitives::{Address, U256};

use crate::tokens::TokenFeatures;

/// What the factory remembers about a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentEntry {
    pub token: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub initial_supply: U256,
    pub owner: Address,
    pub deployer: Address,
    pub features: TokenFeatures,
    pub created_at: u64,
}

/// A registry entry as returned by the query surface, with the token's live supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRecord {
    pub token_address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    pub owner: Address,
    pub deployer: Address,
    pub features: Vec<String>,
    pub created_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("token {0} is already recorded")]
pub struct DuplicateToken(pub Address);

/// Read access to deployed tokens' supply.
pub trait TokenLens {
    fn total_supply(&self, token: Address) -> Option<U256>;
}

impl DeploymentEntry {
    pub fn to_record(&self, lens: &impl TokenLens) -> DeploymentRecord {
        DeploymentRecord {
            token_address: self.token,
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            total_supply: lens
                .total_supply(self.token)
                .unwrap_or(self.initial_supply),
            owner: self.owner,
            deployer: self.deployer,
            features: self.features.names(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<DeploymentEntry>,
    by_deployer: HashMap<Address, Vec<usize>>,
    by_owner: HashMap<Address, Vec<usize>>,
    positions: HashMap<Address, usize>,
}

impl Registry {
    /// Appends `entry` and returns its index. Token addresses are unique.
    pub fn record(&mut self, entry: DeploymentEntry) -> Result<usize, DuplicateToken> {
        if self.positions.contains_key(&entry.token) {
            return Err(DuplicateToken(entry.token));
        }
        let index = self.entries.len();
        self.by_deployer.entry(entry.deployer).or_default().push(index);
        self.by_owner.entry(entry.owner).or_default().push(index);
        self.positions.insert(entry.token, index);
        self.entries.push(entry);
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, token: Address) -> bool {
        self.positions.contains_key(&token)
    }

    pub fn entries(&self) -> &[DeploymentEntry] {
        &self.entries
    }

    pub fn by_deployer(&self, deployer: Address) -> impl Iterator<Item = &DeploymentEntry> {
        self.indexed(self.by_deployer.get(&deployer))
    }

    pub fn by_owner(&self, owner: Address) -> impl Iterator<Item = &DeploymentEntry> {
        self.indexed(self.by_owner.get(&owner))
    }

    /// Up to `limit` entries starting at `offset`; `None` if `offset` is past the end.
    pub fn page(&self, offset: usize, limit: usize) -> Option<&[DeploymentEntry]> {
        if offset > self.entries.len() {
            return None;
        }
        let end = offset.saturating_add(limit).min(self.entries.len());
        Some(&self.entries[offset..end])
    }

    fn indexed<'a>(
        &'a self,
        indices: Option<&'a Vec<usize>>,
    ) -> impl Iterator<Item = &'a DeploymentEntry> + 'a {
        indices
            .into_iter()
            .flatten()
            .map(move |&index| &self.entries[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(token: u8, deployer: u8, owner: u8) -> DeploymentEntry {
        DeploymentEntry {
            token: Address::repeat_byte(token),
            name: format!("Token {token}"),
            symbol: format!("TKN{token}"),
            decimals: 18,
            initial_supply: U256::from(1_000),
            owner: Address::repeat_byte(owner),
            deployer: Address::repeat_byte(deployer),
            features: TokenFeatures::NONE,
            created_at: 1,
        }
    }

    struct NoTokens;

    impl TokenLens for NoTokens {
        fn total_supply(&self, _token: Address) -> Option<U256> {
            None
        }
    }

    #[test]
    fn indexes_share_one_entry() {
        let mut registry = Registry::default();
        assert_eq!(registry.record(entry(0x10, 1, 1)), Ok(0));
        assert_eq!(registry.record(entry(0x11, 1, 2)), Ok(1));
        assert_eq!(registry.record(entry(0x12, 2, 2)), Ok(2));

        let by_deployer: Vec<_> = registry
            .by_deployer(Address::repeat_byte(1))
            .map(|e| e.token)
            .collect();
        assert_eq!(
            by_deployer,
            vec![Address::repeat_byte(0x10), Address::repeat_byte(0x11)]
        );
        let by_owner: Vec<_> = registry
            .by_owner(Address::repeat_byte(2))
            .map(|e| e.token)
            .collect();
        assert_eq!(
            by_owner,
            vec![Address::repeat_byte(0x11), Address::repeat_byte(0x12)]
        );
        assert_eq!(registry.by_deployer(Address::repeat_byte(9)).count(), 0);
    }

    #[test]
    fn duplicate_addresses_are_refused() {
        let mut registry = Registry::default();
        registry.record(entry(0x10, 1, 1)).unwrap();
        assert_eq!(
            registry.record(entry(0x10, 2, 2)),
            Err(DuplicateToken(Address::repeat_byte(0x10)))
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.by_deployer(Address::repeat_byte(2)).count(), 0);
        assert_eq!(registry.by_owner(Address::repeat_byte(2)).count(), 0);
        assert_eq!(registry.entries()[0].deployer, Address::repeat_byte(1));
    }

    #[test]
    fn pages_clamp_to_the_end() {
        let mut registry = Registry::default();
        for i in 0..3 {
            registry.record(entry(0x10 + i, 1, 1)).unwrap();
        }
        assert_eq!(registry.page(0, 2).map(<[_]>::len), Some(2));
        assert_eq!(registry.page(2, 10).map(<[_]>::len), Some(1));
        assert_eq!(registry.page(3, 10).map(<[_]>::len), Some(0));
        assert_eq!(registry.page(1, usize::MAX).map(<[_]>::len), Some(2));
        assert!(registry.page(4, 1).is_none());
    }

    #[test]
    fn records_fall_back_to_initial_supply() {
        let record = entry(0x10, 1, 1).to_record(&NoTokens);
        assert_eq!(record.total_supply, U256::from(1_000));
        assert!(record.features.is_empty());
    }
}
