//! Managing one deployed token. Amounts are whole-token decimal strings,
//! converted with the token's own decimals.

use alloy_primitives::{Address, U256};
use common::units::{format_units, parse_units};

use crate::backend::{ChainBackend, TokenCall, TokenState, TxReceipt, TxRequest};
use crate::config::ClientConfig;
use crate::confirm::wait_for_confirmation;
use crate::error::{ClientError, Rejection};

pub struct TokenClient<B> {
    backend: B,
    token: Address,
    decimals: u8,
    config: ClientConfig,
}

impl<B: ChainBackend> TokenClient<B> {
    /// Fails if there is no token at `token`.
    pub fn connect(backend: B, token: Address, config: ClientConfig) -> Result<Self, ClientError> {
        let state = backend
            .token_state(token)
            .ok_or(Rejection::UnknownContract(token))?;
        Ok(Self {
            backend,
            token,
            decimals: state.decimals,
            config,
        })
    }

    pub fn address(&self) -> Address {
        self.token
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn info(&self) -> Result<TokenState, ClientError> {
        self.backend
            .token_state(self.token)
            .ok_or_else(|| Rejection::UnknownContract(self.token).into())
    }

    /// Balance of `account` in whole tokens.
    pub fn balance(&self, account: Address) -> Result<String, ClientError> {
        let balance = self
            .backend
            .balance_of(self.token, account)
            .ok_or(Rejection::UnknownContract(self.token))?;
        Ok(format_units(balance, self.decimals))
    }

    fn amount(&self, amount: &str) -> Result<U256, ClientError> {
        parse_units(amount, self.decimals).map_err(|source| {
            Rejection::InvalidAmount {
                field: "token",
                source,
            }
            .into()
        })
    }

    async fn send(&self, call: TokenCall) -> Result<TxReceipt, ClientError> {
        if self.backend.account().is_none() {
            return Err(Rejection::WalletNotConnected.into());
        }
        let hash = self.backend.submit(TxRequest::Token {
            token: self.token,
            call,
        })?;
        wait_for_confirmation(&self.backend, hash, &self.config).await
    }

    pub async fn mint(&self, to: Address, amount: &str) -> Result<TxReceipt, ClientError> {
        let amount = self.amount(amount)?;
        self.send(TokenCall::Mint { to, amount }).await
    }

    pub async fn burn(&self, amount: &str) -> Result<TxReceipt, ClientError> {
        let amount = self.amount(amount)?;
        self.send(TokenCall::Burn { amount }).await
    }

    pub async fn transfer(&self, to: Address, amount: &str) -> Result<TxReceipt, ClientError> {
        let amount = self.amount(amount)?;
        self.send(TokenCall::Transfer { to, amount }).await
    }

    pub async fn approve(&self, spender: Address, amount: &str) -> Result<TxReceipt, ClientError> {
        let amount = self.amount(amount)?;
        self.send(TokenCall::Approve { spender, amount }).await
    }

    pub async fn pause(&self) -> Result<TxReceipt, ClientError> {
        self.send(TokenCall::Pause).await
    }

    pub async fn unpause(&self) -> Result<TxReceipt, ClientError> {
        self.send(TokenCall::Unpause).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockChainBackend, TxStatus};
    use alloy_primitives::B256;
    use tokenforge::TokenFeatures;

    const TOKEN: Address = Address::repeat_byte(0x70);

    fn state(decimals: u8) -> TokenState {
        TokenState {
            name: "Six".into(),
            symbol: "SIX".into(),
            decimals,
            total_supply: U256::ZERO,
            max_supply: U256::ZERO,
            owner: Address::ZERO,
            features: TokenFeatures::NONE,
            paused: false,
        }
    }

    #[test]
    fn connect_requires_a_token() {
        let mut backend = MockChainBackend::new();
        backend.expect_token_state().return_const(None);
        assert!(TokenClient::connect(backend, TOKEN, ClientConfig::default()).is_err());
    }

    #[test]
    fn balances_are_formatted_with_token_decimals() {
        let mut backend = MockChainBackend::new();
        backend.expect_token_state().return_const(Some(state(6)));
        backend
            .expect_balance_of()
            .return_const(Some(U256::from(2_500_000u64)));
        let client = TokenClient::connect(backend, TOKEN, ClientConfig::default()).unwrap();
        assert_eq!(client.balance(Address::ZERO).unwrap(), "2.5");
    }

    #[tokio::test]
    async fn mint_amounts_are_scaled_before_submission() {
        let mut backend = MockChainBackend::new();
        backend.expect_token_state().return_const(Some(state(6)));
        backend.expect_account().return_const(Some(Address::ZERO));
        backend
            .expect_submit()
            .withf(|request| {
                *request
                    == TxRequest::Token {
                        token: TOKEN,
                        call: TokenCall::Mint {
                            to: Address::repeat_byte(1),
                            amount: U256::from(1_250_000u64),
                        },
                    }
            })
            .returning(|_| Ok(B256::repeat_byte(5)));
        backend.expect_status().returning(|hash| {
            TxStatus::Confirmed(TxReceipt {
                hash,
                block_number: 3,
                token_address: None,
                logs: Vec::new(),
            })
        });

        let client = TokenClient::connect(backend, TOKEN, ClientConfig::default()).unwrap();
        let receipt = client.mint(Address::repeat_byte(1), "1.25").await.unwrap();
        assert_eq!(receipt.hash, B256::repeat_byte(5));
    }

    #[tokio::test]
    async fn malformed_amounts_never_reach_the_backend() {
        let mut backend = MockChainBackend::new();
        backend.expect_token_state().return_const(Some(state(2)));
        backend.expect_submit().never();
        let client = TokenClient::connect(backend, TOKEN, ClientConfig::default()).unwrap();
        let err = client.burn("1.234").await.unwrap_err();
        assert!(err.is_rejected());
        let err = client.transfer(Address::ZERO, "ten").await.unwrap_err();
        assert!(err.is_rejected());
    }
}
