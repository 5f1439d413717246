//! Token contracts: the ERC20 base ledger and the feature-flagged token built on it.

pub mod access;
pub mod erc20;
pub mod feature_token;
pub mod features;

pub use access::{AccessControl, Action, Role, RoleTable};
pub use feature_token::{FeatureToken, TokenConfig, TokenError, TokenInfo};
pub use features::{Feature, FeatureFlags, TokenFeatures, UnknownFeature};
