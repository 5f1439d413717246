//! Client facade over the token factory: turns form input into factory
//! configs, submits transactions, waits for them to confirm and reads the
//! registry back for display.

pub mod backend;
pub mod config;
pub mod confirm;
pub mod error;
pub mod factory;
pub mod local;
pub mod params;
pub mod token;

pub use backend::{ChainBackend, RegistryQuery, TokenCall, TokenState, TxHash, TxReceipt, TxRequest, TxStatus};
pub use config::{ClientConfig, NetworkConfig};
pub use error::{ClientError, Rejection};
pub use factory::{DeploymentResult, FactoryClient, TokenSummary};
pub use local::LocalBackend;
pub use params::CreateTokenParams;
pub use token::TokenClient;
