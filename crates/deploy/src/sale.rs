//! Human-readable NFT sale settings and the constructor arguments derived from them.

use alloy_core::primitives::Address;
use alloy_core::primitives::utils::parse_ether;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::ChainContext;
use crate::error::ConfigError;

/// Sale configuration of a VRF-backed NFT collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftSaleSettings {
    /// Token full name.
    pub token_name: String,
    /// Token symbol (short name / ticker).
    pub token_symbol: String,
    /// Metadata of every token before the random reveal.
    pub pre_reveal_uri: String,
    /// Base URI once the reveal has occurred.
    pub base_uri: String,
    /// Suffix appended to `{base_uri}{token_id_with_offset}`.
    pub suffix_base_uri: String,
    /// Total token supply.
    pub supply_limit: u64,
    /// Minutes between the deployment and the opening of the sale window.
    pub window_starts_in_minutes: u64,
    /// Length of the sale window in minutes.
    pub window_length_minutes: u64,
    /// Price per token in ether, as a decimal string.
    pub eth_price_per_token: String,
    /// Maximum number of tokens in a single transaction.
    pub max_mint_units_per_tx: u64,
}

impl Default for NftSaleSettings {
    /// The `RESTORE` demo collection, sized for a quick testnet run.
    fn default() -> Self {
        Self {
            token_name: "RESTORE".to_string(),
            token_symbol: "RSTR".to_string(),
            pre_reveal_uri:
                "ipfs://QmTSbgfx6YTFZ4HXrKCwCRGqEJrRbGrP6eZhb3TNfjU11U/pending_reveal.json"
                    .to_string(),
            base_uri: "ipfs://QmTSbgfx6YTFZ4HXrKCwCRGqEJrRbGrP6eZhb3TNfjU11U/".to_string(),
            suffix_base_uri: ".json".to_string(),
            supply_limit: 8,
            window_starts_in_minutes: 2,
            window_length_minutes: 3,
            eth_price_per_token: "0.001".to_string(),
            max_mint_units_per_tx: 4,
        }
    }
}

/// Sale settings as written in the settings file, where any field may be left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NftSaleConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_reveal_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix_base_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supply_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_starts_in_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_length_minutes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eth_price_per_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_mint_units_per_tx: Option<u64>,
}

impl NftSaleConfig {
    /// Name of the first field left out, in declaration order.
    pub fn first_missing(&self) -> Option<&'static str> {
        [
            ("token_name", self.token_name.is_none()),
            ("token_symbol", self.token_symbol.is_none()),
            ("pre_reveal_uri", self.pre_reveal_uri.is_none()),
            ("base_uri", self.base_uri.is_none()),
            ("suffix_base_uri", self.suffix_base_uri.is_none()),
            ("supply_limit", self.supply_limit.is_none()),
            ("window_starts_in_minutes", self.window_starts_in_minutes.is_none()),
            ("window_length_minutes", self.window_length_minutes.is_none()),
            ("eth_price_per_token", self.eth_price_per_token.is_none()),
            ("max_mint_units_per_tx", self.max_mint_units_per_tx.is_none()),
        ]
        .into_iter()
        .find_map(|(field, missing)| missing.then_some(field))
    }

    /// Fill the fields left out from `defaults`.
    pub fn or_defaults(&self, defaults: NftSaleSettings) -> NftSaleSettings {
        let config = self.clone();
        NftSaleSettings {
            token_name: config.token_name.unwrap_or(defaults.token_name),
            token_symbol: config.token_symbol.unwrap_or(defaults.token_symbol),
            pre_reveal_uri: config.pre_reveal_uri.unwrap_or(defaults.pre_reveal_uri),
            base_uri: config.base_uri.unwrap_or(defaults.base_uri),
            suffix_base_uri: config.suffix_base_uri.unwrap_or(defaults.suffix_base_uri),
            supply_limit: config.supply_limit.unwrap_or(defaults.supply_limit),
            window_starts_in_minutes: config
                .window_starts_in_minutes
                .unwrap_or(defaults.window_starts_in_minutes),
            window_length_minutes: config
                .window_length_minutes
                .unwrap_or(defaults.window_length_minutes),
            eth_price_per_token: config
                .eth_price_per_token
                .unwrap_or(defaults.eth_price_per_token),
            max_mint_units_per_tx: config
                .max_mint_units_per_tx
                .unwrap_or(defaults.max_mint_units_per_tx),
        }
    }
}

impl From<NftSaleSettings> for NftSaleConfig {
    fn from(settings: NftSaleSettings) -> Self {
        Self {
            token_name: Some(settings.token_name),
            token_symbol: Some(settings.token_symbol),
            pre_reveal_uri: Some(settings.pre_reveal_uri),
            base_uri: Some(settings.base_uri),
            suffix_base_uri: Some(settings.suffix_base_uri),
            supply_limit: Some(settings.supply_limit),
            window_starts_in_minutes: Some(settings.window_starts_in_minutes),
            window_length_minutes: Some(settings.window_length_minutes),
            eth_price_per_token: Some(settings.eth_price_per_token),
            max_mint_units_per_tx: Some(settings.max_mint_units_per_tx),
        }
    }
}

/// Unix timestamps bounding the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleWindow {
    pub start: u64,
    pub end: u64,
}

impl NftSaleSettings {
    /// Settings to deploy with on `ctx`.
    ///
    /// Mainnet never falls back to the demo collection: every field must be configured.
    /// Elsewhere the fields left out take the demo values.
    pub fn resolve(
        ctx: &ChainContext,
        configured: Option<&NftSaleConfig>,
    ) -> Result<Self, ConfigError> {
        match configured {
            None if ctx.is_mainnet() => Err(ConfigError::MissingSaleSettings),
            None => Ok(Self::default()),
            Some(config) if ctx.is_mainnet() => match config.first_missing() {
                Some(field) => Err(ConfigError::IncompleteSaleSettings { field }),
                None => Ok(config.or_defaults(Self::default())),
            },
            Some(config) => Ok(config.or_defaults(Self::default())),
        }
    }

    /// The window opens `window_starts_in_minutes` after `now` truncated to the minute.
    pub fn window(&self, now: DateTime<Utc>) -> SaleWindow {
        let now = now.timestamp().max(0) as u64;
        let minute = now - now % 60;
        let start = minute + 60 * self.window_starts_in_minutes;
        SaleWindow {
            start,
            end: start + 60 * self.window_length_minutes,
        }
    }

    /// Constructor arguments of the NFT contracts, in ABI order.
    pub fn constructor_args(&self, now: DateTime<Utc>, vrf_provider: Address) -> Result<Vec<String>> {
        let price_wei = parse_ether(&self.eth_price_per_token).with_context(|| {
            format!("Invalid ether price per token: {}", self.eth_price_per_token)
        })?;
        let window = self.window(now);

        Ok(vec![
            self.token_name.clone(),
            self.token_symbol.clone(),
            self.pre_reveal_uri.clone(),
            self.base_uri.clone(),
            self.suffix_base_uri.clone(),
            self.supply_limit.to_string(),
            window.start.to_string(),
            window.end.to_string(),
            price_wei.to_string(),
            self.max_mint_units_per_tx.to_string(),
            vrf_provider.to_string(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::network::NetworkRegistry;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_window_truncates_to_minute() {
        let settings = NftSaleSettings::default();

        // 2022-01-01T00:00:59Z
        let window = settings.window(at(1_640_995_259));
        assert_eq!(window.start, 1_640_995_200 + 120);
        assert_eq!(window.end, window.start + 180);
    }

    #[test]
    fn test_constructor_args() {
        let provider = Address::repeat_byte(0x11);
        let args = NftSaleSettings::default()
            .constructor_args(at(1_640_995_200), provider)
            .unwrap();

        assert_eq!(args.len(), 11);
        assert_eq!(args[0], "RESTORE");
        assert_eq!(args[1], "RSTR");
        assert_eq!(args[5], "8");
        assert_eq!(args[6], "1640995320");
        assert_eq!(args[7], "1640995500");
        assert_eq!(args[8], "1000000000000000");
        assert_eq!(args[9], "4");
        assert_eq!(args[10], provider.to_string());
    }

    #[test]
    fn test_invalid_price() {
        let settings = NftSaleSettings {
            eth_price_per_token: "one".to_string(),
            ..Default::default()
        };

        assert!(settings.constructor_args(at(0), Address::ZERO).is_err());
    }

    #[test]
    fn test_mainnet_requires_explicit_settings() {
        let registry = NetworkRegistry::builtin();
        let mainnet = ChainContext::new(registry.get(1).unwrap().clone(), Address::ZERO);
        let rinkeby = ChainContext::new(registry.get(4).unwrap().clone(), Address::ZERO);

        assert!(matches!(
            NftSaleSettings::resolve(&mainnet, None),
            Err(ConfigError::MissingSaleSettings)
        ));
        assert_eq!(
            NftSaleSettings::resolve(&rinkeby, None).unwrap(),
            NftSaleSettings::default()
        );

        let custom = NftSaleSettings {
            supply_limit: 10_000,
            ..Default::default()
        };
        assert_eq!(
            NftSaleSettings::resolve(&mainnet, Some(&custom.clone().into())).unwrap(),
            custom
        );
    }

    #[test]
    fn test_mainnet_rejects_partial_settings() {
        let registry = NetworkRegistry::builtin();
        let mainnet = ChainContext::new(registry.get(1).unwrap().clone(), Address::ZERO);
        let rinkeby = ChainContext::new(registry.get(4).unwrap().clone(), Address::ZERO);

        let partial = NftSaleConfig {
            token_name: Some("Genesis".to_string()),
            ..Default::default()
        };

        let err = NftSaleSettings::resolve(&mainnet, Some(&partial)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::IncompleteSaleSettings {
                field: "token_symbol"
            }
        ));
        assert!(err.to_string().contains("token_symbol"));

        let resolved = NftSaleSettings::resolve(&rinkeby, Some(&partial)).unwrap();
        assert_eq!(resolved.token_name, "Genesis");
        assert_eq!(resolved.token_symbol, "RSTR");
        assert_eq!(resolved.supply_limit, 8);
    }

    #[test]
    fn test_first_missing_follows_field_order() {
        let mut config = NftSaleConfig::from(NftSaleSettings::default());
        assert_eq!(config.first_missing(), None);

        config.max_mint_units_per_tx = None;
        config.eth_price_per_token = None;
        assert_eq!(config.first_missing(), Some("eth_price_per_token"));
    }
}
