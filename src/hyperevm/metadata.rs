//! Asset and token metadata for the EVM backend.
//!
//! Symbol-to-id mappings come from the HyperLiquid info endpoint; per-asset
//! size decimals come from the read precompiles and are cached, since they
//! are immutable once an asset is listed. Locks are never held across an
//! await.

use std::{collections::HashMap, sync::Mutex};

use alloy::{network::Ethereum, providers::DynProvider};
use rust_decimal::Decimal;
use serde_json::json;
use url::Url;

use crate::error::{Error, Result};
use crate::hypercore::types::{PerpMeta, SpotMeta};
use crate::hyperevm::precompiles;
use crate::units;

/// Raw price scale for an asset; drives both precompile price decoding and
/// tick rounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PriceScale {
    Perp { sz_decimals: u32 },
    Spot { base_sz_decimals: u32 },
}

impl PriceScale {
    pub fn convert(self, raw: u64) -> Result<Decimal> {
        match self {
            PriceScale::Perp { sz_decimals } => units::convert_perp_price(raw, sz_decimals),
            PriceScale::Spot { base_sz_decimals } => {
                Ok(units::convert_spot_price(raw, base_sz_decimals))
            }
        }
    }

    pub fn round_price(self, px: Decimal) -> Result<Decimal> {
        match self {
            PriceScale::Perp { sz_decimals } => units::round_price(px, sz_decimals, true),
            PriceScale::Spot { base_sz_decimals } => {
                units::round_price(px, base_sz_decimals, false)
            }
        }
    }
}

pub(super) struct MetadataCache {
    http: reqwest::Client,
    info_url: Url,
    asset_by_symbol: Mutex<HashMap<String, u32>>,
    token_by_symbol: Mutex<HashMap<String, u64>>,
    scales: Mutex<HashMap<u32, PriceScale>>,
}

impl MetadataCache {
    pub fn new(http: reqwest::Client, info_url: Url) -> Self {
        Self {
            http,
            info_url,
            asset_by_symbol: Mutex::new(HashMap::new()),
            token_by_symbol: Mutex::new(HashMap::new()),
            scales: Mutex::new(HashMap::new()),
        }
    }

    /// Loads the perp universe and spot token table from `/info`.
    pub async fn load(&self) -> Result<()> {
        let meta: PerpMeta = self.info(&json!({ "type": "meta" })).await?;
        let mut assets = HashMap::with_capacity(meta.universe.len());
        for (asset_id, market) in meta.universe.into_iter().enumerate() {
            assets.insert(market.name.to_ascii_uppercase(), asset_id as u32);
        }

        let spot: SpotMeta = self.info(&json!({ "type": "spotMeta" })).await?;
        let mut tokens = HashMap::with_capacity(spot.tokens.len());
        for token in spot.tokens {
            tokens.insert(token.name.to_ascii_uppercase(), token.index as u64);
        }

        log::debug!(
            "Loaded metadata: {} perp symbols, {} tokens",
            assets.len(),
            tokens.len(),
        );
        *self.asset_by_symbol.lock().unwrap() = assets;
        *self.token_by_symbol.lock().unwrap() = tokens;
        Ok(())
    }

    pub fn clear(&self) {
        self.asset_by_symbol.lock().unwrap().clear();
        self.token_by_symbol.lock().unwrap().clear();
        self.scales.lock().unwrap().clear();
    }

    /// Numeric text (decimal or `0x`) resolves directly; anything else is a
    /// perp symbol.
    pub fn resolve_asset(&self, asset: &str) -> Result<u32> {
        if let Some(id) = parse_numeric(asset) {
            return Ok(id);
        }
        self.asset_by_symbol
            .lock()
            .unwrap()
            .get(&asset.to_ascii_uppercase())
            .copied()
            .ok_or_else(|| Error::UnknownAsset(asset.to_string()))
    }

    pub fn resolve_token(&self, token: &str) -> Result<u64> {
        if let Some(index) = parse_numeric(token) {
            return Ok(index as u64);
        }
        self.token_by_symbol
            .lock()
            .unwrap()
            .get(&token.to_ascii_uppercase())
            .copied()
            .ok_or_else(|| Error::UnknownToken(token.to_string()))
    }

    /// Resolves the price scale for an asset, preferring the perp info
    /// precompile and falling back to the spot pair's base token.
    pub async fn price_scale(
        &self,
        provider: &DynProvider<Ethereum>,
        asset: u32,
    ) -> Result<PriceScale> {
        if let Some(scale) = self.scales.lock().unwrap().get(&asset) {
            return Ok(*scale);
        }

        let scale = if asset < 10_000 {
            let sz_decimals = precompiles::perp_sz_decimals(provider, asset).await?;
            PriceScale::Perp { sz_decimals }
        } else {
            let base = precompiles::spot_base_token(provider, asset - 10_000).await?;
            let base_sz_decimals = precompiles::token_sz_decimals(provider, base).await?;
            PriceScale::Spot { base_sz_decimals }
        };

        self.scales.lock().unwrap().insert(asset, scale);
        Ok(scale)
    }

    pub(super) async fn info<T: serde::de::DeserializeOwned>(
        &self,
        request: &serde_json::Value,
    ) -> Result<T> {
        let endpoint = self.info_url.to_string();
        self.http
            .post(self.info_url.clone())
            .json(request)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| Error::http(&endpoint, err))?
            .json()
            .await
            .map_err(|err| Error::http(&endpoint, err))
    }

    #[cfg(test)]
    fn seed(assets: &[(&str, u32)], tokens: &[(&str, u64)]) -> Self {
        let cache = Self::new(
            reqwest::Client::new(),
            "http://localhost/info".parse().unwrap(),
        );
        *cache.asset_by_symbol.lock().unwrap() = assets
            .iter()
            .map(|(name, id)| (name.to_string(), *id))
            .collect();
        *cache.token_by_symbol.lock().unwrap() = tokens
            .iter()
            .map(|(name, index)| (name.to_string(), *index))
            .collect();
        cache
    }
}

fn parse_numeric(text: &str) -> Option<u32> {
    match text.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    #[test]
    fn resolves_symbols_numeric_and_hex_ids() {
        let cache = MetadataCache::seed(&[("BTC", 0), ("ETH", 4)], &[("USDC", 0), ("HYPE", 150)]);

        assert_eq!(cache.resolve_asset("eth").unwrap(), 4);
        assert_eq!(cache.resolve_asset("4").unwrap(), 4);
        assert_eq!(cache.resolve_asset("0x4").unwrap(), 4);
        assert_eq!(cache.resolve_asset("10005").unwrap(), 10_005);
        assert!(matches!(
            cache.resolve_asset("DOGE"),
            Err(Error::UnknownAsset(_))
        ));

        assert_eq!(cache.resolve_token("hype").unwrap(), 150);
        assert_eq!(cache.resolve_token("150").unwrap(), 150);
        assert!(matches!(
            cache.resolve_token("WIF"),
            Err(Error::UnknownToken(_))
        ));
    }

    #[test]
    fn clear_drops_the_mappings() {
        let cache = MetadataCache::seed(&[("BTC", 0)], &[]);
        assert!(cache.resolve_asset("BTC").is_ok());
        cache.clear();
        assert!(cache.resolve_asset("BTC").is_err());
    }

    #[test]
    fn price_scales_convert_and_round() {
        let perp = PriceScale::Perp { sz_decimals: 4 };
        assert_eq!(perp.convert(250_013).unwrap(), dec!(2500.13));
        assert_eq!(perp.round_price(dec!(4500.12)).unwrap(), dec!(4500.1));

        let spot = PriceScale::Spot { base_sz_decimals: 0 };
        assert_eq!(spot.convert(12_345_678).unwrap(), dec!(0.12345678));
        assert_eq!(spot.round_price(dec!(1.234567890123)).unwrap(), dec!(1.2346));
    }
}
