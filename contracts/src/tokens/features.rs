//! Feature flags a token is created with. They are fixed at deployment; every
//! feature-gated operation checks the bitset.

use std::fmt;
use std::str::FromStr;

use alloy_sol_types::sol;

sol! {
    /// ABI shape of the feature set: ten named booleans.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct FeatureFlags {
        bool mintable;
        bool burnable;
        bool pausable;
        bool permit;
        bool flashMinting;
        bool snapshots;
        bool votes;
        bool roles;
        bool capped;
        bool multisig;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    Mintable,
    Burnable,
    Pausable,
    Permit,
    FlashMinting,
    Snapshots,
    Votes,
    Roles,
    Capped,
    Multisig,
}

impl Feature {
    pub const ALL: [Feature; 10] = [
        Feature::Mintable,
        Feature::Burnable,
        Feature::Pausable,
        Feature::Permit,
        Feature::FlashMinting,
        Feature::Snapshots,
        Feature::Votes,
        Feature::Roles,
        Feature::Capped,
        Feature::Multisig,
    ];

    const fn bit(self) -> u16 {
        1 << self as u16
    }

    /// The camelCase name used on the wire and in the client.
    pub const fn name(self) -> &'static str {
        match self {
            Feature::Mintable => "mintable",
            Feature::Burnable => "burnable",
            Feature::Pausable => "pausable",
            Feature::Permit => "permit",
            Feature::FlashMinting => "flashMinting",
            Feature::Snapshots => "snapshots",
            Feature::Votes => "votes",
            Feature::Roles => "roles",
            Feature::Capped => "capped",
            Feature::Multisig => "multisig",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown token feature {0:?}")]
pub struct UnknownFeature(pub String);

impl FromStr for Feature {
    type Err = UnknownFeature;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.name() == s)
            .ok_or_else(|| UnknownFeature(s.to_string()))
    }
}

/// Immutable set of [`Feature`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TokenFeatures(u16);

impl TokenFeatures {
    pub const NONE: TokenFeatures = TokenFeatures(0);

    pub const fn with(self, feature: Feature) -> Self {
        TokenFeatures(self.0 | feature.bit())
    }

    pub const fn contains(self, feature: Feature) -> bool {
        self.0 & feature.bit() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Feature> {
        Feature::ALL.into_iter().filter(move |f| self.contains(*f))
    }

    /// Names of the enabled features, in declaration order.
    pub fn names(self) -> Vec<String> {
        self.iter().map(|f| f.name().to_string()).collect()
    }
}

impl FromIterator<Feature> for TokenFeatures {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        iter.into_iter().fold(TokenFeatures::NONE, TokenFeatures::with)
    }
}

impl From<&FeatureFlags> for TokenFeatures {
    fn from(flags: &FeatureFlags) -> Self {
        let set = [
            flags.mintable,
            flags.burnable,
            flags.pausable,
            flags.permit,
            flags.flashMinting,
            flags.snapshots,
            flags.votes,
            flags.roles,
            flags.capped,
            flags.multisig,
        ];
        Feature::ALL
            .into_iter()
            .zip(set)
            .filter_map(|(feature, on)| on.then_some(feature))
            .collect()
    }
}

impl FeatureFlags {
    /// Sets the flag for `feature`, leaving the others as they are.
    pub fn enable(&mut self, feature: Feature) {
        let flag = match feature {
            Feature::Mintable => &mut self.mintable,
            Feature::Burnable => &mut self.burnable,
            Feature::Pausable => &mut self.pausable,
            Feature::Permit => &mut self.permit,
            Feature::FlashMinting => &mut self.flashMinting,
            Feature::Snapshots => &mut self.snapshots,
            Feature::Votes => &mut self.votes,
            Feature::Roles => &mut self.roles,
            Feature::Capped => &mut self.capped,
            Feature::Multisig => &mut self.multisig,
        };
        *flag = true;
    }
}
