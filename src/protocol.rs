//! Venue-independent trading surface.
//!
//! [`Protocol`] is implemented by both backends: [`crate::hypercore::Client`]
//! signs actions and posts them to the exchange REST endpoint, while
//! [`crate::hyperevm::Client`] submits the same actions as HyperEVM
//! transactions through CoreWriter or a strategy contract. Code written
//! against the trait runs unchanged on either.

use alloy::primitives::{Address, B128, B256};
use derive_more::Display;
use either::Either;
use rust_decimal::{dec, Decimal};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::units;

/// Default slippage tolerance for [`Protocol::market_order`].
pub const DEFAULT_SLIPPAGE: Decimal = dec!(0.05);

/// Default slippage tolerance for [`Protocol::market_close_position`].
/// Closes cross the spread of an existing position, so the tolerance is
/// tighter than for opening orders.
pub const DEFAULT_CLOSE_SLIPPAGE: Decimal = dec!(0.005);

/// Time-in-force for resting limit orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Tif {
    /// Add-liquidity-only. Rejected instead of crossing the book.
    Alo,
    /// Good-til-cancelled.
    Gtc,
    /// Immediate-or-cancel. The unfilled remainder is dropped.
    Ioc,
}

impl Tif {
    /// CoreWriter wire encoding.
    pub const fn encoding(self) -> u8 {
        match self {
            Tif::Alo => 1,
            Tif::Gtc => 2,
            Tif::Ioc => 3,
        }
    }

    pub const fn from_encoding(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Tif::Alo),
            2 => Some(Tif::Gtc),
            3 => Some(Tif::Ioc),
            _ => None,
        }
    }
}

impl FromStr for Tif {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "alo" => Ok(Tif::Alo),
            "gtc" => Ok(Tif::Gtc),
            "ioc" => Ok(Tif::Ioc),
            _ => Err(Error::validation("tif", format!("unknown time-in-force {s:?}"))),
        }
    }
}

/// Client order id. 128 bits, rendered as a 0x-prefixed 32-digit hex string
/// on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cloid(u128);

impl Cloid {
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub const fn as_u128(self) -> u128 {
        self.0
    }

    /// Fresh random id for fire-and-forget order tracking.
    pub fn random() -> Self {
        Self(u128::from_be_bytes(B128::random().0))
    }
}

impl std::fmt::Display for Cloid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:032x}", self.0)
    }
}

impl FromStr for Cloid {
    type Err = Error;

    /// Accepts the wire form (`0x` + hex) and bare decimal.
    fn from_str(s: &str) -> Result<Self> {
        let parsed = match s.strip_prefix("0x") {
            Some(hex) => u128::from_str_radix(hex, 16),
            None => s.parse::<u128>(),
        };
        parsed
            .map(Self)
            .map_err(|_| Error::validation("cloid", format!("not a 128-bit order id: {s:?}")))
    }
}

impl Serialize for Cloid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cloid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Exchange order id or client order id, for cancel routing.
pub type OidOrCloid = Either<u64, Cloid>;

/// Open perpetual position as reported by the venue.
#[derive(Debug, Clone, PartialEq)]
pub struct PerpPosition {
    pub asset: String,
    /// Signed size. Negative for shorts.
    pub szi: Decimal,
    pub entry_px: Option<Decimal>,
}

/// Matched quantity summary for an immediately-filled order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillSummary {
    pub total_sz: Decimal,
    pub avg_px: Decimal,
}

/// Outcome of an order placement.
///
/// Core fills report `oid` and, for resting or filled orders, a
/// [`FillSummary`]. EVM submissions report only the transaction hash; order
/// state lives on the Core side and is not echoed back by CoreWriter.
#[derive(Debug, Clone, Default)]
pub struct OrderReceipt {
    pub oid: Option<u64>,
    pub cloid: Option<Cloid>,
    pub filled: Option<FillSummary>,
    pub tx_hash: Option<B256>,
}

#[derive(Debug, Clone, Default)]
pub struct CancelReceipt {
    /// Number of orders confirmed cancelled. Always 1 on the EVM path, which
    /// cannot observe whether the oid was live.
    pub cancelled: usize,
    pub tx_hash: Option<B256>,
}

#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub amount: Decimal,
    pub tx_hash: Option<B256>,
}

#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub recipient: Address,
    pub amount: Decimal,
    pub tx_hash: Option<B256>,
}

#[derive(Debug, Clone)]
pub struct DelegateReceipt {
    pub validator: Address,
    /// Stake moved, in wei (8 decimals).
    pub wei: u64,
    pub undelegated: bool,
    pub tx_hash: Option<B256>,
}

#[derive(Debug, Clone)]
pub struct StakingReceipt {
    pub wei: u64,
    pub tx_hash: Option<B256>,
}

#[derive(Debug, Clone)]
pub struct ApprovalReceipt {
    pub builder: Address,
    pub max_fee_rate: Decimal,
    pub tx_hash: Option<B256>,
}

/// Unified HyperLiquid client surface.
///
/// Required methods are the venue primitives. Market orders and position
/// closes are provided on top of them, so both backends share one slippage
/// and sizing policy.
#[allow(async_fn_in_trait)]
pub trait Protocol {
    /// Establish venue connectivity and warm any metadata caches.
    async fn connect(&mut self) -> Result<()>;

    async fn disconnect(&mut self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Address whose positions and balances the client trades. For strategy
    /// contracts this is the subvault, not the signer.
    fn trading_address(&self) -> Result<Address>;

    /// Current mid price for an asset.
    async fn market_mid(&self, asset: &str) -> Result<Decimal>;

    /// Round a price to the venue tick for this asset.
    async fn round_price(&self, asset: &str, px: Decimal) -> Result<Decimal>;

    /// Open perpetual position, `None` when flat.
    async fn position(&self, asset: &str) -> Result<Option<PerpPosition>>;

    #[allow(clippy::too_many_arguments)]
    async fn limit_order(
        &self,
        asset: &str,
        is_buy: bool,
        limit_px: Decimal,
        sz: Decimal,
        reduce_only: bool,
        tif: Tif,
        cloid: Option<Cloid>,
    ) -> Result<OrderReceipt>;

    async fn cancel_order_by_oid(&self, asset: &str, oid: u64) -> Result<CancelReceipt>;

    async fn cancel_order_by_cloid(&self, asset: &str, cloid: Cloid) -> Result<CancelReceipt>;

    /// Cancel by whichever id the caller holds.
    async fn cancel_order(&self, asset: &str, id: OidOrCloid) -> Result<CancelReceipt> {
        match id {
            Either::Left(oid) => self.cancel_order_by_oid(asset, oid).await,
            Either::Right(cloid) => self.cancel_order_by_cloid(asset, cloid).await,
        }
    }

    /// Aggressively-priced IOC order: mid price padded by `slippage`, then
    /// rounded to tick.
    async fn market_order(
        &self,
        asset: &str,
        is_buy: bool,
        sz: Decimal,
        slippage: Decimal,
        cloid: Option<Cloid>,
    ) -> Result<OrderReceipt> {
        let mid = self.market_mid(asset).await?;
        let padded = units::slippage_px(mid, is_buy, slippage)?;
        let limit_px = self.round_price(asset, padded).await?;
        log::info!(
            "Market {} {asset}: mid={mid} slippage={slippage} limit={limit_px}",
            if is_buy { "buy" } else { "sell" },
        );
        self.limit_order(asset, is_buy, limit_px, sz, false, Tif::Ioc, cloid)
            .await
    }

    /// Close an open position with a reduce-only IOC order. `size` of `None`
    /// closes the whole position.
    async fn market_close_position(
        &self,
        asset: &str,
        size: Option<Decimal>,
        slippage: Decimal,
        cloid: Option<Cloid>,
    ) -> Result<OrderReceipt> {
        let position = self
            .position(asset)
            .await?
            .ok_or_else(|| Error::NoPosition(asset.to_string()))?;
        if position.szi.is_zero() {
            return Err(Error::NoPosition(asset.to_string()));
        }

        // Shorts are bought back, longs are sold.
        let is_buy = position.szi.is_sign_negative();
        let sz = match size {
            Some(sz) if sz <= Decimal::ZERO => {
                return Err(Error::validation("size", "close size must be positive".to_string()));
            }
            Some(sz) => sz,
            None => position.szi.abs(),
        };

        let mid = self.market_mid(asset).await?;
        let padded = units::slippage_px(mid, is_buy, slippage)?;
        let limit_px = self.round_price(asset, padded).await?;
        log::info!("Closing {asset}: szi={} sz={sz} limit={limit_px}", position.szi);
        self.limit_order(asset, is_buy, limit_px, sz, true, Tif::Ioc, cloid)
            .await
    }

    /// Move USDC between the signer and a vault.
    async fn vault_transfer(
        &self,
        vault: Address,
        is_deposit: bool,
        usd: Decimal,
    ) -> Result<TransferReceipt>;

    /// Send a spot token balance to another Core address.
    async fn spot_send(
        &self,
        recipient: Address,
        token: &str,
        amount: Decimal,
    ) -> Result<SendReceipt>;

    /// Send perp-account USDC to another Core address.
    async fn perp_send(&self, recipient: Address, amount: Decimal) -> Result<SendReceipt>;

    /// Move USDC from the spot balance to the perp margin account.
    async fn usd_class_transfer_to_perp(&self, amount: Decimal) -> Result<TransferReceipt>;

    /// Move USDC from the perp margin account to the spot balance.
    async fn usd_class_transfer_to_spot(&self, amount: Decimal) -> Result<TransferReceipt>;

    /// Delegate (or undelegate) staked HYPE to a validator.
    async fn token_delegate(
        &self,
        validator: Address,
        amount: Decimal,
        is_undelegate: bool,
    ) -> Result<DelegateReceipt>;

    /// Move HYPE from the spot balance into the staking balance.
    async fn staking_deposit(&self, amount: Decimal) -> Result<StakingReceipt>;

    /// Move HYPE from the staking balance back to spot.
    async fn staking_withdraw(&self, amount: Decimal) -> Result<StakingReceipt>;

    /// Authorize a builder to collect up to `max_fee_rate` on this account's
    /// orders. The rate is a fraction, e.g. `0.001` for 0.1%.
    async fn approve_builder_fee(
        &self,
        builder: Address,
        max_fee_rate: Decimal,
    ) -> Result<ApprovalReceipt>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tif_encodings_round_trip() {
        for tif in [Tif::Alo, Tif::Gtc, Tif::Ioc] {
            assert_eq!(Tif::from_encoding(tif.encoding()), Some(tif));
        }
        assert_eq!(Tif::from_encoding(0), None);
        assert_eq!(Tif::from_encoding(4), None);
    }

    #[test]
    fn tif_parses_case_insensitively() {
        assert_eq!("GTC".parse::<Tif>().unwrap(), Tif::Gtc);
        assert_eq!("ioc".parse::<Tif>().unwrap(), Tif::Ioc);
        assert_eq!("Alo".parse::<Tif>().unwrap(), Tif::Alo);
        assert!("FOK".parse::<Tif>().is_err());
    }

    #[test]
    fn tif_wire_names() {
        assert_eq!(serde_json::to_string(&Tif::Gtc).unwrap(), "\"Gtc\"");
        assert_eq!(serde_json::to_string(&Tif::Alo).unwrap(), "\"Alo\"");
        assert_eq!(serde_json::to_string(&Tif::Ioc).unwrap(), "\"Ioc\"");
    }

    #[test]
    fn cloid_parses_hex_and_decimal() {
        assert_eq!("0x3039".parse::<Cloid>().unwrap(), Cloid::new(0x3039));
        assert_eq!("12345".parse::<Cloid>().unwrap(), Cloid::new(12345));
        assert!("0xnope".parse::<Cloid>().is_err());
        // One bit past u128.
        assert!("340282366920938463463374607431768211456".parse::<Cloid>().is_err());
    }

    #[test]
    fn cloid_displays_as_full_width_hex() {
        let cloid = Cloid::new(0x3039);
        assert_eq!(cloid.to_string(), "0x00000000000000000000000000003039");
        assert_eq!(cloid.to_string().parse::<Cloid>().unwrap(), cloid);
    }

    #[test]
    fn cloid_serde_uses_wire_form() {
        let cloid = Cloid::new(0xdeadbeef);
        let json = serde_json::to_string(&cloid).unwrap();
        assert_eq!(json, "\"0x000000000000000000000000deadbeef\"");
        assert_eq!(serde_json::from_str::<Cloid>(&json).unwrap(), cloid);
    }

    #[test]
    fn random_cloids_are_distinct() {
        let a = Cloid::random();
        let b = Cloid::random();
        assert_ne!(a, b);
        assert_eq!(a.to_string().len(), 34);
    }
}
