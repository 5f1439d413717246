//! User-entered token parameters and their conversion into the factory's
//! [`TokenConfig`].

use alloy_primitives::{Address, U256};
use common::units::{parse_units, MAX_DECIMALS};
use serde::{Deserialize, Serialize};
use tokenforge::{Feature, FeatureFlags, TokenConfig, TokenFeatures};

use crate::error::{ClientError, Rejection};

/// What a user fills in to create a token. Amounts are decimal strings in
/// whole tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenParams {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    #[serde(default)]
    pub initial_supply: String,
    #[serde(default)]
    pub max_supply: String,
    #[serde(default)]
    pub features: Vec<String>,
    /// Defaults to the connected account.
    #[serde(default)]
    pub owner: Option<Address>,
}

fn default_decimals() -> u8 {
    MAX_DECIMALS
}

impl CreateTokenParams {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals: MAX_DECIMALS,
            initial_supply: String::new(),
            max_supply: String::new(),
            features: Vec::new(),
            owner: None,
        }
    }

    /// Every flag starts out disabled; only the named ones are set.
    pub fn feature_flags(&self) -> Result<FeatureFlags, ClientError> {
        let mut flags = FeatureFlags::default();
        for name in &self.features {
            flags.enable(name.parse::<Feature>()?);
        }
        Ok(flags)
    }

    /// Builds the on-chain config for a deployment sent from `account`.
    pub fn to_config(&self, account: Address) -> Result<TokenConfig, ClientError> {
        let features = TokenFeatures::from(&self.feature_flags()?);
        let initial_supply = self.amount("initial supply", &self.initial_supply)?;
        let max_supply = self.amount("max supply", &self.max_supply)?;
        Ok(
            TokenConfig::new(self.name.clone(), self.symbol.clone(), self.owner.unwrap_or(account))
                .decimals(self.decimals)
                .initial_supply(initial_supply)
                .max_supply(max_supply)
                .features(features),
        )
    }

    fn amount(&self, field: &'static str, value: &str) -> Result<U256, ClientError> {
        if value.trim().is_empty() {
            return Ok(U256::ZERO);
        }
        parse_units(value, self.decimals)
            .map_err(|source| Rejection::InvalidAmount { field, source }.into())
    }
}
