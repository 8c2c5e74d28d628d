//! Wire types for the HyperCore exchange and info endpoints.
//!
//! Actions come in two signing families. Trading actions (orders, cancels,
//! vault transfers) are MessagePack-hashed and signed through the
//! [`solidity::Agent`] envelope against [`CORE_EIP712_DOMAIN`]. User-signed
//! actions (transfers, delegation, staking, builder approval) are EIP-712
//! typed data against [`USER_SIGNED_EIP712_DOMAIN`], with the target network
//! carried in the message's `hyperliquidChain` field rather than the domain.

use alloy::{
    dyn_abi::{Eip712Domain, TypedData},
    primitives::{Address, B256, U256, keccak256},
    sol_types::eip712_domain,
};
use derive_more::{Display, IsVariant};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

use crate::error::Result;
use crate::protocol::{Cloid, Tif};

pub mod solidity;

/// Chain id pinned inside every user-signed action's EIP-712 domain.
///
/// The exchange verifies user-signed actions against this Arbitrum testnet
/// chain id on mainnet and testnet alike; the `hyperliquidChain` message
/// field is what distinguishes the networks.
pub const SIGNATURE_CHAIN_ID: U256 = U256::from_limbs([0x66eee, 0, 0, 0]);

/// EIP-712 domain for the [`solidity::Agent`] envelope of RMP-hashed actions.
///
/// Shared by mainnet and testnet; the agent's `source` field ("a" or "b")
/// selects the network.
pub const CORE_EIP712_DOMAIN: Eip712Domain = eip712_domain! {
    name: "Exchange",
    version: "1",
    chain_id: 1337,
    verifying_contract: Address::ZERO,
};

/// EIP-712 domain for user-signed actions.
pub const USER_SIGNED_EIP712_DOMAIN: Eip712Domain = eip712_domain! {
    name: "HyperliquidSignTransaction",
    version: "1",
    chain_id: 421_614,
    verifying_contract: Address::ZERO,
};

/// Network selector. Serializes as the wire's `hyperliquidChain` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IsVariant, Serialize, Deserialize)]
pub enum Chain {
    Mainnet,
    Testnet,
}

impl Chain {
    pub fn select(testnet: bool) -> Self {
        if testnet { Chain::Testnet } else { Chain::Mainnet }
    }
}

/// Hashes a serializable action the way the exchange derives `connectionId`:
/// MessagePack bytes, then the big-endian nonce, then a vault marker byte
/// (with the address when present), then an optional expiry marker, keccak'd.
pub(crate) fn rmp_hash<T: Serialize>(
    value: &T,
    nonce: u64,
    vault_address: Option<Address>,
    expires_after: Option<u64>,
) -> Result<B256> {
    let mut bytes = rmp_serde::to_vec_named(value)?;
    bytes.extend_from_slice(&nonce.to_be_bytes());

    match vault_address {
        Some(address) => {
            bytes.push(1);
            bytes.extend_from_slice(address.as_slice());
        }
        None => bytes.push(0),
    }

    if let Some(expires_after) = expires_after {
        bytes.push(0);
        bytes.extend_from_slice(&expires_after.to_be_bytes());
    }

    Ok(keccak256(bytes))
}

/// Addresses inside RMP-hashed actions must hash identically to the reference
/// implementations, which serialize them as lowercase hex strings.
fn lowercase_address<S>(address: &Address, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&address.to_string().to_lowercase())
}

// ---------------------------------------------------------------------------
// RMP-hashed trading actions
// ---------------------------------------------------------------------------

/// Single order entry. Field names follow the exchange's compressed wire
/// form; prices and sizes travel as decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(rename = "a")]
    pub asset: u32,
    #[serde(rename = "b")]
    pub is_buy: bool,
    #[serde(rename = "p", with = "rust_decimal::serde::str")]
    pub limit_px: Decimal,
    #[serde(rename = "s", with = "rust_decimal::serde::str")]
    pub sz: Decimal,
    #[serde(rename = "r")]
    pub reduce_only: bool,
    #[serde(rename = "t")]
    pub order_type: OrderType,
    #[serde(rename = "c", skip_serializing_if = "Option::is_none")]
    pub cloid: Option<Cloid>,
}

/// Order execution style. Only resting limit orders are expressible here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit { tif: Tif },
}

/// Order grouping. Plain orders always use `na`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum OrderGrouping {
    #[default]
    #[serde(rename = "na")]
    Na,
}

/// Builder fee attachment for an order batch. The fee is in tenths of a
/// basis point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderFee {
    #[serde(rename = "b", serialize_with = "lowercase_address")]
    pub builder: Address,
    #[serde(rename = "f")]
    pub fee: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOrder {
    pub orders: Vec<OrderRequest>,
    pub grouping: OrderGrouping,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder: Option<BuilderFee>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CancelRequest {
    #[serde(rename = "a")]
    pub asset: u32,
    #[serde(rename = "o")]
    pub oid: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCancel {
    pub cancels: Vec<CancelRequest>,
}

/// Cancel keyed by client order id. Unlike [`CancelRequest`] this uses the
/// long field names on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CancelByCloidRequest {
    pub asset: u32,
    pub cloid: Cloid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchCancelCloid {
    pub cancels: Vec<CancelByCloidRequest>,
}

/// Move USDC between the signer and a vault. `usd` is in microdollars.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultTransfer {
    #[serde(serialize_with = "lowercase_address")]
    pub vault_address: Address,
    pub is_deposit: bool,
    pub usd: u64,
}

// ---------------------------------------------------------------------------
// User-signed actions
// ---------------------------------------------------------------------------

/// Send perp-account USDC to another core address.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdSend {
    pub signature_chain_id: U256,
    pub hyperliquid_chain: Chain,
    pub destination: Address,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub time: u64,
}

impl UsdSend {
    pub fn typed_data(&self) -> Result<TypedData> {
        user_typed_data(
            "UsdSend",
            &[
                ("hyperliquidChain", "string"),
                ("destination", "string"),
                ("amount", "string"),
                ("time", "uint64"),
            ],
            self,
        )
    }
}

/// Send a spot token balance to another core address.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotSend {
    pub signature_chain_id: U256,
    pub hyperliquid_chain: Chain,
    pub destination: Address,
    pub token: SendToken,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub time: u64,
}

impl SpotSend {
    pub fn typed_data(&self) -> Result<TypedData> {
        user_typed_data(
            "SpotSend",
            &[
                ("hyperliquidChain", "string"),
                ("destination", "string"),
                ("token", "string"),
                ("amount", "string"),
                ("time", "uint64"),
            ],
            self,
        )
    }
}

/// Move USDC between the spot and perp margin accounts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsdClassTransfer {
    pub signature_chain_id: U256,
    pub hyperliquid_chain: Chain,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub to_perp: bool,
    pub nonce: u64,
}

impl UsdClassTransfer {
    pub fn typed_data(&self) -> Result<TypedData> {
        user_typed_data(
            "UsdClassTransfer",
            &[
                ("hyperliquidChain", "string"),
                ("amount", "string"),
                ("toPerp", "bool"),
                ("nonce", "uint64"),
            ],
            self,
        )
    }
}

/// Delegate or undelegate staked HYPE. `wei` is 8-decimal fixed point.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDelegate {
    pub signature_chain_id: U256,
    pub hyperliquid_chain: Chain,
    pub validator: Address,
    pub wei: u64,
    pub is_undelegate: bool,
    pub nonce: u64,
}

impl TokenDelegate {
    pub fn typed_data(&self) -> Result<TypedData> {
        user_typed_data(
            "TokenDelegate",
            &[
                ("hyperliquidChain", "string"),
                ("validator", "address"),
                ("wei", "uint64"),
                ("isUndelegate", "bool"),
                ("nonce", "uint64"),
            ],
            self,
        )
    }
}

/// Move HYPE from spot into the staking balance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CDeposit {
    pub signature_chain_id: U256,
    pub hyperliquid_chain: Chain,
    pub wei: u64,
    pub nonce: u64,
}

impl CDeposit {
    pub fn typed_data(&self) -> Result<TypedData> {
        user_typed_data(
            "CDeposit",
            &[
                ("hyperliquidChain", "string"),
                ("wei", "uint64"),
                ("nonce", "uint64"),
            ],
            self,
        )
    }
}

/// Move HYPE from the staking balance back to spot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CWithdraw {
    pub signature_chain_id: U256,
    pub hyperliquid_chain: Chain,
    pub wei: u64,
    pub nonce: u64,
}

impl CWithdraw {
    pub fn typed_data(&self) -> Result<TypedData> {
        user_typed_data(
            "CWithdraw",
            &[
                ("hyperliquidChain", "string"),
                ("wei", "uint64"),
                ("nonce", "uint64"),
            ],
            self,
        )
    }
}

/// Authorize a builder to collect fees on this account's orders.
/// `max_fee_rate` is the percent string the exchange expects, e.g. `0.001%`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveBuilderFee {
    pub signature_chain_id: U256,
    pub hyperliquid_chain: Chain,
    pub max_fee_rate: String,
    pub builder: Address,
    pub nonce: u64,
}

impl ApproveBuilderFee {
    pub fn typed_data(&self) -> Result<TypedData> {
        user_typed_data(
            "ApproveBuilderFee",
            &[
                ("hyperliquidChain", "string"),
                ("maxFeeRate", "string"),
                ("builder", "address"),
                ("nonce", "uint64"),
            ],
            self,
        )
    }
}

/// Builds the typed-data envelope for a user-signed action.
///
/// The primary type is namespaced `HyperliquidTransaction:<Name>`, which is
/// not a legal `sol!` identifier, so the types table is assembled as JSON
/// and deserialized into [`TypedData`]. Extra message fields (notably
/// `signatureChainId`) ride along for the wire but are ignored by the
/// hasher, which only reads fields listed in the types table.
fn user_typed_data<T: Serialize>(
    name: &str,
    fields: &[(&str, &str)],
    message: &T,
) -> Result<TypedData> {
    let primary = format!("HyperliquidTransaction:{name}");
    let props: Vec<serde_json::Value> = fields
        .iter()
        .map(|(name, kind)| json!({ "name": name, "type": kind }))
        .collect();
    let message = serde_json::to_value(message)?;

    let typed_data = json!({
        "types": {
            "EIP712Domain": [
                { "name": "name", "type": "string" },
                { "name": "version", "type": "string" },
                { "name": "chainId", "type": "uint256" },
                { "name": "verifyingContract", "type": "address" },
            ],
            primary.as_str(): props,
        },
        "primaryType": primary,
        "domain": USER_SIGNED_EIP712_DOMAIN,
        "message": message,
    });

    Ok(serde_json::from_value(typed_data)?)
}

// ---------------------------------------------------------------------------
// Request envelope
// ---------------------------------------------------------------------------

/// Every state-changing request the exchange accepts.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Order(BatchOrder),
    Cancel(BatchCancel),
    CancelByCloid(BatchCancelCloid),
    VaultTransfer(VaultTransfer),
    UsdSend(UsdSend),
    SpotSend(SpotSend),
    UsdClassTransfer(UsdClassTransfer),
    TokenDelegate(TokenDelegate),
    CDeposit(CDeposit),
    CWithdraw(CWithdraw),
    ApproveBuilderFee(ApproveBuilderFee),
}

impl Action {
    /// Connection id the agent envelope signs over.
    pub fn hash(
        &self,
        nonce: u64,
        vault_address: Option<Address>,
        expires_after: Option<u64>,
    ) -> Result<B256> {
        rmp_hash(self, nonce, vault_address, expires_after)
    }
}

/// Secp256k1 signature in the exchange's split form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub r: U256,
    pub s: U256,
    pub v: u64,
}

impl From<alloy::primitives::Signature> for Signature {
    fn from(sig: alloy::primitives::Signature) -> Self {
        Self {
            r: sig.r(),
            s: sig.s(),
            v: 27 + sig.v() as u64,
        }
    }
}

/// Signed action as posted to `/exchange`.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub action: Action,
    pub signature: Signature,
    pub nonce: u64,
    pub vault_address: Option<Address>,
    pub expires_after: Option<u64>,
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "status", content = "response", rename_all = "camelCase")]
pub enum ApiResponse {
    Ok(OkResponse),
    Err(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum OkResponse {
    Default,
    /// Order placements and both cancel flavors share this data shape.
    #[serde(alias = "cancel")]
    Order { statuses: Vec<OrderResponseStatus> },
}

/// Per-entry outcome inside an order or cancel batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderResponseStatus {
    Success,
    WaitingForFill,
    WaitingForTrigger,
    Resting(RestingOrder),
    Filled(FilledOrder),
    Error(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestingOrder {
    pub oid: u64,
    #[serde(default)]
    pub cloid: Option<Cloid>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilledOrder {
    pub oid: u64,
    pub total_sz: Decimal,
    pub avg_px: Decimal,
    #[serde(default)]
    pub cloid: Option<Cloid>,
}

// ---------------------------------------------------------------------------
// Market metadata
// ---------------------------------------------------------------------------

/// Perpetual contract entry from the `meta` universe. The asset id is the
/// entry's position in the universe and is filled in after parsing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerpMarket {
    pub name: String,
    pub sz_decimals: u32,
    pub max_leverage: u32,
    #[serde(default)]
    pub only_isolated: bool,
    #[serde(default)]
    pub is_delisted: bool,
    #[serde(default)]
    pub asset_id: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PerpMeta {
    pub universe: Vec<PerpMarket>,
}

/// Spot pair entry from the `spotMeta` universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotMarket {
    pub name: String,
    /// Base and quote token indices.
    pub tokens: [u32; 2],
    pub index: u32,
    #[serde(default)]
    pub is_canonical: bool,
}

impl SpotMarket {
    /// Asset id used in order actions; spot markets are offset by 10000.
    pub fn asset_id(&self) -> u32 {
        10_000 + self.index
    }
}

/// Token entry from the `spotMeta` token table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotToken {
    pub name: String,
    pub sz_decimals: u32,
    pub wei_decimals: u32,
    pub index: u32,
    pub token_id: String,
    #[serde(default)]
    pub is_canonical: bool,
    #[serde(default)]
    pub evm_contract: Option<EvmContract>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Linked HyperEVM contract for a spot token. The extra-decimals field is
/// snake_cased in the venue payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvmContract {
    pub address: Address,
    #[serde(rename = "evm_extra_wei_decimals", default)]
    pub evm_extra_wei_decimals: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SpotMeta {
    pub universe: Vec<SpotMarket>,
    pub tokens: Vec<SpotToken>,
}

/// Token in the `NAME:tokenId` form that send actions expect.
#[derive(Debug, Clone)]
pub struct SendToken(pub SpotToken);

impl fmt::Display for SendToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0.name, self.0.token_id)
    }
}

impl Serialize for SendToken {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Account state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearinghouseState {
    #[serde(default)]
    pub asset_positions: Vec<AssetPosition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetPosition {
    pub position: PositionData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionData {
    pub coin: String,
    /// Signed size; negative for shorts.
    pub szi: Decimal,
    #[serde(default)]
    pub entry_px: Option<Decimal>,
}
