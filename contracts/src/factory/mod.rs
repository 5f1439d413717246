pub mod registry;
pub mod token_factory;

pub use registry::{DeploymentEntry, DeploymentRecord, DuplicateToken, Registry, TokenLens};
pub use token_factory::{FactoryError, TokenFactory};
