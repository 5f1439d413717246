//! Feature-flagged ERC20 tokens, the factory that deploys them for a fee and
//! keeps their registry, and the in-process chain they execute on.

extern crate common;

pub mod chain;
pub mod factory;
pub mod host;
pub mod tokens;
mod utils;

pub use chain::{Chain, ChainConfig, ChainError, Receipt, TokenArena};
pub use factory::{DeploymentRecord, FactoryError, TokenFactory};
pub use tokens::{Feature, FeatureFlags, FeatureToken, Role, TokenConfig, TokenError, TokenFeatures};
