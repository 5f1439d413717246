//! Client errors. A [`Rejection`] means nothing was sent; every other
//! [`ClientError`] refers to a submitted transaction.

use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use common::units::UnitsError;
use thiserror::Error;
use tokenforge::tokens::UnknownFeature;
use tokenforge::{FactoryError, TokenError};

/// Why a request never left the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("wallet not connected")]
    WalletNotConnected,
    #[error(transparent)]
    UnknownFeature(#[from] UnknownFeature),
    #[error("invalid {field} amount: {source}")]
    InvalidAmount {
        field: &'static str,
        #[source]
        source: UnitsError,
    },
    #[error("insufficient platform fee: sending {sent}, required {required}")]
    InsufficientFee { sent: U256, required: U256 },
    #[error(transparent)]
    InvalidConfig(#[from] TokenError),
    #[error("no contract at {0}")]
    UnknownContract(Address),
    #[error("no network configured for chain {0}")]
    UnknownNetwork(u64),
    #[error("registry query failed: {0}")]
    Query(FactoryError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Caught before submission; nothing was sent.
    #[error("rejected: {0}")]
    Rejected(#[from] Rejection),
    /// Processed and reverted; no state changed.
    #[error("transaction {hash} reverted: {reason}")]
    Reverted {
        hash: B256,
        reason: String,
        /// `0x`-prefixed revert data.
        data: String,
    },
    /// Never processed; no state changed.
    #[error("transaction {0} was dropped")]
    Dropped(B256),
    /// Still pending when the client stopped waiting. It may yet confirm.
    #[error("transaction {hash} not confirmed after {waited:?}")]
    Timeout { hash: B256, waited: Duration },
}

impl ClientError {
    /// `true` if the request was refused before it was submitted.
    pub fn is_rejected(&self) -> bool {
        matches!(self, ClientError::Rejected(_))
    }

    pub(crate) fn reverted(hash: B256, reason: String, data: &[u8]) -> Self {
        ClientError::Reverted {
            hash,
            reason,
            data: format!("0x{}", hex::encode(data)),
        }
    }
}

impl From<UnknownFeature> for ClientError {
    fn from(err: UnknownFeature) -> Self {
        ClientError::Rejected(err.into())
    }
}

impl From<TokenError> for ClientError {
    fn from(err: TokenError) -> Self {
        ClientError::Rejected(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_user_facing() {
        let err = ClientError::from(UnknownFeature("mintible".into()));
        assert!(err.is_rejected());
        assert_eq!(
            err.to_string(),
            "rejected: unknown token feature \"mintible\""
        );

        let err = ClientError::reverted(B256::ZERO, "token transfers are paused".into(), &[0xd9, 0x3c]);
        assert!(!err.is_rejected());
        match err {
            ClientError::Reverted { data, .. } => assert_eq!(data, "0xd93c"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
