//! Native HyperCore backend.
//!
//! [`Client`] signs exchange actions locally and posts them to the
//! HyperLiquid REST API: market data through `POST /info`, state changes
//! through `POST /exchange`. It implements [`crate::protocol::Protocol`], so
//! it is interchangeable with the [`crate::hyperevm`] backend.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use alloy::primitives::Address;
use rust_decimal::{Decimal, dec};
use serde::{Deserialize, Serialize};
use url::Url;

pub use alloy::signers::local::PrivateKeySigner;

use crate::error::{Error, Result};
use crate::protocol::{
    ApprovalReceipt, CancelReceipt, Cloid, DelegateReceipt, FillSummary, OrderReceipt,
    PerpPosition, Protocol, SendReceipt, StakingReceipt, Tif, TransferReceipt,
};
use crate::units;

mod signing;
pub mod types;

use signing::Signable;
use types::{
    ActionRequest, ApiResponse, ApproveBuilderFee, BatchCancel, BatchCancelCloid,
    BatchOrder, CDeposit, CWithdraw, CancelByCloidRequest, CancelRequest, Chain,
    ClearinghouseState, OkResponse, OrderRequest, OrderResponseStatus, OrderType, OrderGrouping,
    PerpMarket, PerpMeta, SIGNATURE_CHAIN_ID, SendToken, SpotMarket, SpotMeta, SpotSend,
    SpotToken, TokenDelegate, UsdClassTransfer, UsdSend, VaultTransfer,
};

pub const MAINNET_URL: &str = "https://api.hyperliquid.xyz";
pub const TESTNET_URL: &str = "https://api.hyperliquid-testnet.xyz";

/// Spot token balance from `spotClearinghouseState`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpotBalance {
    pub coin: String,
    pub total: Decimal,
    pub hold: Decimal,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum InfoRequest {
    Meta,
    SpotMeta,
    AllMids,
    ClearinghouseState { user: Address },
    SpotClearinghouseState { user: Address },
}

/// Resolved asset from the metadata cache.
#[derive(Debug, Clone)]
struct AssetMeta {
    asset_id: u32,
    sz_decimals: u32,
    is_perp: bool,
    /// Key in the `allMids` map and the `coin` field of positions.
    mid_key: String,
}

/// Perp and spot metadata loaded on connect.
#[derive(Debug, Default)]
struct MarketCache {
    perps: Vec<PerpMarket>,
    spot: Vec<SpotMarket>,
    tokens: Vec<SpotToken>,
}

impl MarketCache {
    /// Resolves a perp symbol, a decimal/hex asset id, or a spot id
    /// (`10000 + index`) to its metadata.
    fn resolve(&self, asset: &str) -> Result<AssetMeta> {
        if let Some(id) = parse_numeric(asset) {
            return self.resolve_id(id).ok_or_else(|| Error::UnknownAsset(asset.to_string()));
        }

        let symbol = asset.to_ascii_uppercase();
        self.perps
            .iter()
            .find(|perp| perp.name.eq_ignore_ascii_case(&symbol))
            .map(|perp| AssetMeta {
                asset_id: perp.asset_id,
                sz_decimals: perp.sz_decimals,
                is_perp: true,
                mid_key: perp.name.clone(),
            })
            .ok_or_else(|| Error::UnknownAsset(asset.to_string()))
    }

    fn resolve_id(&self, id: u32) -> Option<AssetMeta> {
        if id >= 10_000 {
            let market = self.spot.iter().find(|market| market.asset_id() == id)?;
            let base = self
                .tokens
                .iter()
                .find(|token| token.index == market.tokens[0])?;
            return Some(AssetMeta {
                asset_id: id,
                sz_decimals: base.sz_decimals,
                is_perp: false,
                mid_key: market.name.clone(),
            });
        }

        let perp = self.perps.iter().find(|perp| perp.asset_id == id)?;
        Some(AssetMeta {
            asset_id: id,
            sz_decimals: perp.sz_decimals,
            is_perp: true,
            mid_key: perp.name.clone(),
        })
    }

    /// Finds a spot token by name or numeric index.
    fn token(&self, token: &str) -> Result<&SpotToken> {
        if let Some(index) = parse_numeric(token) {
            return self
                .tokens
                .iter()
                .find(|entry| entry.index == index)
                .ok_or_else(|| Error::UnknownToken(token.to_string()));
        }

        self.tokens
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(token))
            .ok_or_else(|| Error::UnknownToken(token.to_string()))
    }
}

fn parse_numeric(text: &str) -> Option<u32> {
    match text.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// HyperCore exchange client.
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    signer: PrivateKeySigner,
    chain: Chain,
    last_nonce: AtomicU64,
    markets: Option<MarketCache>,
}

impl Client {
    pub fn new(base_url: Url, chain: Chain, signer: PrivateKeySigner) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .tcp_nodelay(true)
            .build()
            .unwrap();

        Self {
            http,
            base_url,
            signer,
            chain,
            last_nonce: AtomicU64::new(0),
            markets: None,
        }
    }

    pub fn mainnet(signer: PrivateKeySigner) -> Self {
        Self::new(MAINNET_URL.parse().unwrap(), Chain::Mainnet, signer)
    }

    pub fn testnet(signer: PrivateKeySigner) -> Self {
        Self::new(TESTNET_URL.parse().unwrap(), Chain::Testnet, signer)
    }

    /// Millisecond timestamp, strictly monotonic across calls so bursts of
    /// actions never reuse a nonce.
    fn next_nonce(&self) -> u64 {
        let now = chrono::Utc::now().timestamp_millis() as u64;
        self.last_nonce
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .map(|last| now.max(last + 1))
            .unwrap_or(now)
    }

    fn markets(&self) -> Result<&MarketCache> {
        self.markets.as_ref().ok_or(Error::NotConnected)
    }

    // --- info endpoint ---------------------------------------------------

    async fn info<T: serde::de::DeserializeOwned>(&self, request: &InfoRequest) -> Result<T> {
        let mut url = self.base_url.clone();
        url.set_path("/info");
        let endpoint = url.to_string();

        self.http
            .post(url)
            .json(request)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| Error::http(&endpoint, err))?
            .json()
            .await
            .map_err(|err| Error::http(&endpoint, err))
    }

    /// Perpetual universe; asset ids are positions in the universe.
    pub async fn perp_markets(&self) -> Result<Vec<PerpMarket>> {
        let meta: PerpMeta = self.info(&InfoRequest::Meta).await?;
        let mut universe = meta.universe;
        for (asset_id, market) in universe.iter_mut().enumerate() {
            market.asset_id = asset_id as u32;
        }
        Ok(universe)
    }

    pub async fn spot_markets(&self) -> Result<(Vec<SpotMarket>, Vec<SpotToken>)> {
        let meta: SpotMeta = self.info(&InfoRequest::SpotMeta).await?;
        Ok((meta.universe, meta.tokens))
    }

    /// Mid prices keyed by coin symbol (perps) or pair name (spot).
    pub async fn all_mids(&self) -> Result<HashMap<String, Decimal>> {
        self.info(&InfoRequest::AllMids).await
    }

    pub async fn clearinghouse_state(&self, user: Address) -> Result<ClearinghouseState> {
        self.info(&InfoRequest::ClearinghouseState { user }).await
    }

    pub async fn spot_balances(&self, user: Address) -> Result<Vec<SpotBalance>> {
        #[derive(Deserialize)]
        struct Balances {
            balances: Vec<SpotBalance>,
        }

        let data: Balances = self
            .info(&InfoRequest::SpotClearinghouseState { user })
            .await?;
        Ok(data.balances)
    }

    // --- exchange endpoint -----------------------------------------------

    async fn submit(&self, request: ActionRequest) -> Result<ApiResponse> {
        let mut url = self.base_url.clone();
        url.set_path("/exchange");
        let endpoint = url.to_string();

        self.http
            .post(url)
            .json(&request)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| Error::http(&endpoint, err))?
            .json()
            .await
            .map_err(|err| Error::http(&endpoint, err))
    }

    /// Signs and submits, allocating the nonce here so user-signed actions
    /// can embed it in their message before signing.
    async fn send_signed<A: Signable>(&self, action: A, nonce: u64) -> Result<ApiResponse> {
        let request = action.sign(&self.signer, nonce, None, None, self.chain)?;
        self.submit(request).await
    }

    async fn send_action<A: Signable>(&self, action: A) -> Result<ApiResponse> {
        let nonce = self.next_nonce();
        self.send_signed(action, nonce).await
    }

    fn expect_default(resp: ApiResponse) -> Result<()> {
        match resp {
            ApiResponse::Ok(OkResponse::Default) => Ok(()),
            ApiResponse::Ok(other) => Err(Error::api(
                "/exchange",
                format!("expected default response, got {other:?}"),
            )),
            ApiResponse::Err(reason) => Err(Error::Exchange(reason)),
        }
    }

    fn expect_statuses(resp: ApiResponse) -> Result<Vec<OrderResponseStatus>> {
        match resp {
            ApiResponse::Ok(OkResponse::Order { statuses }) => Ok(statuses),
            ApiResponse::Ok(other) => Err(Error::api(
                "/exchange",
                format!("expected order statuses, got {other:?}"),
            )),
            ApiResponse::Err(reason) => Err(Error::Exchange(reason)),
        }
    }
}

/// Maps a single-order batch response onto a receipt.
fn order_receipt(statuses: Vec<OrderResponseStatus>, cloid: Option<Cloid>) -> Result<OrderReceipt> {
    let status = statuses
        .into_iter()
        .next()
        .ok_or_else(|| Error::api("/exchange", "order response carried no statuses"))?;

    match status {
        OrderResponseStatus::Resting(resting) => Ok(OrderReceipt {
            oid: Some(resting.oid),
            cloid: resting.cloid.or(cloid),
            filled: None,
            tx_hash: None,
        }),
        OrderResponseStatus::Filled(filled) => Ok(OrderReceipt {
            oid: Some(filled.oid),
            cloid: filled.cloid.or(cloid),
            filled: Some(FillSummary {
                total_sz: filled.total_sz,
                avg_px: filled.avg_px,
            }),
            tx_hash: None,
        }),
        OrderResponseStatus::Error(reason) => Err(Error::Exchange(reason)),
        // Trigger/queue statuses carry no ids yet.
        _ => Ok(OrderReceipt {
            cloid,
            ..OrderReceipt::default()
        }),
    }
}

fn cancel_receipt(statuses: Vec<OrderResponseStatus>) -> Result<CancelReceipt> {
    let mut cancelled = 0;
    for status in statuses {
        match status {
            OrderResponseStatus::Error(reason) => return Err(Error::Exchange(reason)),
            _ => cancelled += 1,
        }
    }
    Ok(CancelReceipt {
        cancelled,
        tx_hash: None,
    })
}

impl Protocol for Client {
    async fn connect(&mut self) -> Result<()> {
        let perps = self.perp_markets().await?;
        let (spot, tokens) = self.spot_markets().await?;
        log::info!(
            "Connected to HyperLiquid {} ({} perps, {} spot pairs)",
            self.chain,
            perps.len(),
            spot.len(),
        );
        self.markets = Some(MarketCache {
            perps,
            spot,
            tokens,
        });
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.markets = None;
        log::info!("Disconnected from HyperLiquid {}", self.chain);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.markets.is_some()
    }

    fn trading_address(&self) -> Result<Address> {
        Ok(self.signer.address())
    }

    async fn market_mid(&self, asset: &str) -> Result<Decimal> {
        let meta = self.markets()?.resolve(asset)?;
        let mids = self.all_mids().await?;
        mids.get(&meta.mid_key)
            .copied()
            .ok_or_else(|| Error::UnknownAsset(asset.to_string()))
    }

    async fn round_price(&self, asset: &str, px: Decimal) -> Result<Decimal> {
        let meta = self.markets()?.resolve(asset)?;
        units::round_price(px, meta.sz_decimals, meta.is_perp)
    }

    async fn position(&self, asset: &str) -> Result<Option<PerpPosition>> {
        let meta = self.markets()?.resolve(asset)?;
        let state = self.clearinghouse_state(self.signer.address()).await?;

        Ok(state
            .asset_positions
            .into_iter()
            .map(|entry| entry.position)
            .find(|position| position.coin.eq_ignore_ascii_case(&meta.mid_key))
            .map(|position| PerpPosition {
                asset: position.coin,
                szi: position.szi,
                entry_px: position.entry_px,
            }))
    }

    async fn limit_order(
        &self,
        asset: &str,
        is_buy: bool,
        limit_px: Decimal,
        sz: Decimal,
        reduce_only: bool,
        tif: Tif,
        cloid: Option<Cloid>,
    ) -> Result<OrderReceipt> {
        let meta = self.markets()?.resolve(asset)?;

        let batch = BatchOrder {
            orders: vec![OrderRequest {
                asset: meta.asset_id,
                is_buy,
                limit_px,
                sz,
                reduce_only,
                order_type: OrderType::Limit { tif },
                cloid,
            }],
            grouping: OrderGrouping::Na,
            builder: None,
        };

        let resp = self.send_action(batch).await?;
        order_receipt(Client::expect_statuses(resp)?, cloid)
    }

    async fn cancel_order_by_oid(&self, asset: &str, oid: u64) -> Result<CancelReceipt> {
        let meta = self.markets()?.resolve(asset)?;
        let batch = BatchCancel {
            cancels: vec![CancelRequest {
                asset: meta.asset_id,
                oid,
            }],
        };

        let resp = self.send_action(batch).await?;
        cancel_receipt(Client::expect_statuses(resp)?)
    }

    async fn cancel_order_by_cloid(&self, asset: &str, cloid: Cloid) -> Result<CancelReceipt> {
        let meta = self.markets()?.resolve(asset)?;
        let batch = BatchCancelCloid {
            cancels: vec![CancelByCloidRequest {
                asset: meta.asset_id,
                cloid,
            }],
        };

        let resp = self.send_action(batch).await?;
        cancel_receipt(Client::expect_statuses(resp)?)
    }

    async fn vault_transfer(
        &self,
        vault: Address,
        is_deposit: bool,
        usd: Decimal,
    ) -> Result<TransferReceipt> {
        self.markets()?;
        let action = VaultTransfer {
            vault_address: vault,
            is_deposit,
            usd: units::to_uint64(usd, units::USDC_DECIMALS)?,
        };

        Client::expect_default(self.send_action(action).await?)?;
        Ok(TransferReceipt {
            amount: usd,
            tx_hash: None,
        })
    }

    async fn spot_send(
        &self,
        recipient: Address,
        token: &str,
        amount: Decimal,
    ) -> Result<SendReceipt> {
        let token = self.markets()?.token(token)?.clone();
        let nonce = self.next_nonce();
        let action = SpotSend {
            signature_chain_id: SIGNATURE_CHAIN_ID,
            hyperliquid_chain: self.chain,
            destination: recipient,
            token: SendToken(token),
            amount,
            time: nonce,
        };

        Client::expect_default(self.send_signed(action, nonce).await?)?;
        Ok(SendReceipt {
            recipient,
            amount,
            tx_hash: None,
        })
    }

    async fn perp_send(&self, recipient: Address, amount: Decimal) -> Result<SendReceipt> {
        self.markets()?;
        let nonce = self.next_nonce();
        let action = UsdSend {
            signature_chain_id: SIGNATURE_CHAIN_ID,
            hyperliquid_chain: self.chain,
            destination: recipient,
            amount,
            time: nonce,
        };

        Client::expect_default(self.send_signed(action, nonce).await?)?;
        Ok(SendReceipt {
            recipient,
            amount,
            tx_hash: None,
        })
    }

    async fn usd_class_transfer_to_perp(&self, amount: Decimal) -> Result<TransferReceipt> {
        self.usd_class_transfer(amount, true).await
    }

    async fn usd_class_transfer_to_spot(&self, amount: Decimal) -> Result<TransferReceipt> {
        self.usd_class_transfer(amount, false).await
    }

    async fn token_delegate(
        &self,
        validator: Address,
        amount: Decimal,
        is_undelegate: bool,
    ) -> Result<DelegateReceipt> {
        self.markets()?;
        let wei = units::to_uint64(amount, units::WEI_DECIMALS)?;
        let nonce = self.next_nonce();
        let action = TokenDelegate {
            signature_chain_id: SIGNATURE_CHAIN_ID,
            hyperliquid_chain: self.chain,
            validator,
            wei,
            is_undelegate,
            nonce,
        };

        Client::expect_default(self.send_signed(action, nonce).await?)?;
        Ok(DelegateReceipt {
            validator,
            wei,
            undelegated: is_undelegate,
            tx_hash: None,
        })
    }

    async fn staking_deposit(&self, amount: Decimal) -> Result<StakingReceipt> {
        self.markets()?;
        let wei = units::to_uint64(amount, units::WEI_DECIMALS)?;
        let nonce = self.next_nonce();
        let action = CDeposit {
            signature_chain_id: SIGNATURE_CHAIN_ID,
            hyperliquid_chain: self.chain,
            wei,
            nonce,
        };

        Client::expect_default(self.send_signed(action, nonce).await?)?;
        Ok(StakingReceipt { wei, tx_hash: None })
    }

    async fn staking_withdraw(&self, amount: Decimal) -> Result<StakingReceipt> {
        self.markets()?;
        let wei = units::to_uint64(amount, units::WEI_DECIMALS)?;
        let nonce = self.next_nonce();
        let action = CWithdraw {
            signature_chain_id: SIGNATURE_CHAIN_ID,
            hyperliquid_chain: self.chain,
            wei,
            nonce,
        };

        Client::expect_default(self.send_signed(action, nonce).await?)?;
        Ok(StakingReceipt { wei, tx_hash: None })
    }

    async fn approve_builder_fee(
        &self,
        builder: Address,
        max_fee_rate: Decimal,
    ) -> Result<ApprovalReceipt> {
        self.markets()?;
        if max_fee_rate < Decimal::ZERO || max_fee_rate >= Decimal::ONE {
            return Err(Error::validation(
                "max_fee_rate",
                format!("must be a fraction within [0, 1), got {max_fee_rate}"),
            ));
        }

        let nonce = self.next_nonce();
        let action = ApproveBuilderFee {
            signature_chain_id: SIGNATURE_CHAIN_ID,
            hyperliquid_chain: self.chain,
            max_fee_rate: percent_string(max_fee_rate),
            builder,
            nonce,
        };

        Client::expect_default(self.send_signed(action, nonce).await?)?;
        Ok(ApprovalReceipt {
            builder,
            max_fee_rate,
            tx_hash: None,
        })
    }
}

impl Client {
    async fn usd_class_transfer(&self, amount: Decimal, to_perp: bool) -> Result<TransferReceipt> {
        self.markets()?;
        let nonce = self.next_nonce();
        let action = UsdClassTransfer {
            signature_chain_id: SIGNATURE_CHAIN_ID,
            hyperliquid_chain: self.chain,
            amount,
            to_perp,
            nonce,
        };

        Client::expect_default(self.send_signed(action, nonce).await?)?;
        Ok(TransferReceipt {
            amount,
            tx_hash: None,
        })
    }
}

/// Renders a fee fraction as the percent string the exchange expects
/// (`0.001` becomes `"0.1%"`).
fn percent_string(rate: Decimal) -> String {
    format!("{}%", (rate * dec!(100)).normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn cache() -> MarketCache {
        let spot_meta: SpotMeta = serde_json::from_str(
            r#"{
                "universe": [
                    {"name":"PURR/USDC","tokens":[1,0],"index":0,"isCanonical":true}
                ],
                "tokens": [
                    {"name":"USDC","szDecimals":8,"weiDecimals":8,"index":0,
                     "tokenId":"0x6d1e7cde53ba9467b783cb7c530ce054","isCanonical":true},
                    {"name":"PURR","szDecimals":0,"weiDecimals":5,"index":1,
                     "tokenId":"0xc4bf3f870c0e9465323c0b6ed28096c2","isCanonical":true}
                ]
            }"#,
        )
        .unwrap();

        MarketCache {
            perps: vec![
                PerpMarket {
                    name: "BTC".into(),
                    sz_decimals: 5,
                    max_leverage: 40,
                    only_isolated: false,
                    is_delisted: false,
                    asset_id: 0,
                },
                PerpMarket {
                    name: "ETH".into(),
                    sz_decimals: 4,
                    max_leverage: 25,
                    only_isolated: false,
                    is_delisted: false,
                    asset_id: 4,
                },
            ],
            spot: spot_meta.universe,
            tokens: spot_meta.tokens,
        }
    }

    #[test]
    fn resolves_symbols_and_numeric_ids() {
        let cache = cache();

        let eth = cache.resolve("eth").unwrap();
        assert_eq!(eth.asset_id, 4);
        assert_eq!(eth.sz_decimals, 4);
        assert!(eth.is_perp);
        assert_eq!(eth.mid_key, "ETH");

        let by_id = cache.resolve("4").unwrap();
        assert_eq!(by_id.asset_id, 4);
        let by_hex = cache.resolve("0x4").unwrap();
        assert_eq!(by_hex.asset_id, 4);

        assert!(matches!(cache.resolve("DOGE"), Err(Error::UnknownAsset(_))));
    }

    #[test]
    fn resolves_spot_assets_with_the_offset() {
        let cache = cache();
        let purr = cache.resolve("10000").unwrap();
        assert!(!purr.is_perp);
        // Base token PURR has szDecimals 0.
        assert_eq!(purr.sz_decimals, 0);
        assert_eq!(purr.mid_key, "PURR/USDC");
    }

    #[test]
    fn resolves_tokens_by_name_and_index() {
        let cache = cache();
        assert_eq!(cache.token("purr").unwrap().index, 1);
        assert_eq!(cache.token("1").unwrap().name, "PURR");
        assert!(matches!(cache.token("WIF"), Err(Error::UnknownToken(_))));
    }

    #[test]
    fn nonces_are_strictly_monotonic() {
        let signer = PrivateKeySigner::random();
        let client = Client::mainnet(signer);

        let mut last = 0;
        for _ in 0..64 {
            let nonce = client.next_nonce();
            assert!(nonce > last);
            last = nonce;
        }
    }

    #[test]
    fn info_requests_use_the_wire_tags() {
        let user = Address::ZERO;
        assert_eq!(
            serde_json::to_value(InfoRequest::Meta).unwrap(),
            serde_json::json!({ "type": "meta" })
        );
        assert_eq!(
            serde_json::to_value(InfoRequest::AllMids).unwrap(),
            serde_json::json!({ "type": "allMids" })
        );
        let state = serde_json::to_value(InfoRequest::ClearinghouseState { user }).unwrap();
        assert_eq!(state["type"], "clearinghouseState");
        assert!(state["user"].is_string());
    }

    #[test]
    fn receipts_map_resting_filled_and_error() {
        let cloid = Some(Cloid::new(7));

        let resting = order_receipt(
            vec![OrderResponseStatus::Resting(types::RestingOrder {
                oid: 123,
                cloid: None,
            })],
            cloid,
        )
        .unwrap();
        assert_eq!(resting.oid, Some(123));
        assert_eq!(resting.cloid, cloid);
        assert!(resting.filled.is_none());

        let filled = order_receipt(
            vec![OrderResponseStatus::Filled(types::FilledOrder {
                oid: 124,
                total_sz: dec!(0.02),
                avg_px: dec!(1891.4),
                cloid: None,
            })],
            None,
        )
        .unwrap();
        assert_eq!(filled.oid, Some(124));
        assert_eq!(
            filled.filled,
            Some(FillSummary {
                total_sz: dec!(0.02),
                avg_px: dec!(1891.4),
            })
        );

        let rejected = order_receipt(
            vec![OrderResponseStatus::Error("too small".into())],
            None,
        );
        assert!(matches!(rejected, Err(Error::Exchange(_))));
    }

    #[test]
    fn cancel_receipts_count_successes() {
        let receipt = cancel_receipt(vec![
            OrderResponseStatus::Success,
            OrderResponseStatus::Success,
        ])
        .unwrap();
        assert_eq!(receipt.cancelled, 2);

        let failed = cancel_receipt(vec![
            OrderResponseStatus::Success,
            OrderResponseStatus::Error("already gone".into()),
        ]);
        assert!(matches!(failed, Err(Error::Exchange(_))));
    }

    #[test]
    fn builder_fee_rate_renders_as_percent() {
        assert_eq!(percent_string(dec!(0.001)), "0.1%");
        assert_eq!(percent_string(dec!(0.00001)), "0.001%");
        assert_eq!(percent_string(dec!(0.05)), "5%");
    }
}
