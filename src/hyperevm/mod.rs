//! HyperEVM backend.
//!
//! [`Client`] drives the exchange from the EVM side: actions are encoded as
//! CoreWriter raw actions and sent either directly from the signer's account
//! or through a deployed strategy contract whose calls are guarded by merkle
//! verification payloads. Market data comes from the read precompiles, asset
//! metadata from the HyperLiquid info endpoint, and USDC moves across chains
//! over CCTP v2 (see [`bridge`]).

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, B256, Bytes},
    providers::{DynProvider, Provider, ProviderBuilder},
};
use rust_decimal::Decimal;
use serde_json::json;

pub use alloy::signers::local::PrivateKeySigner;

use crate::error::{Error, Result};
use crate::protocol::{
    ApprovalReceipt, CancelReceipt, Cloid, DelegateReceipt, OrderReceipt, PerpPosition,
    Protocol, SendReceipt, StakingReceipt, Tif, TransferReceipt,
};
use crate::units;

pub mod bridge;
pub mod config;
pub mod contracts;
pub mod corewriter;
mod metadata;
pub mod precompiles;
pub mod proofs;
mod tx;

pub use bridge::{BridgeDirection, BridgeReceipt, BridgeStage};
pub use config::{BridgeConfig, EvmConfig, ProofConfig, ProofSource, Target};
pub use contracts::{COREWRITER_ADDRESS, VerificationPayload};
pub use proofs::{ProofChain, ProofResolver};

use contracts::{BridgeStrategy, CoreWriter, FlexibleVaultVerifier, HyperliquidStrategy};
use metadata::MetadataCache;

type EvmProvider = DynProvider<Ethereum>;
type WriterInstance = CoreWriter::CoreWriterInstance<EvmProvider>;
type StrategyInstance = HyperliquidStrategy::HyperliquidStrategyInstance<EvmProvider>;
type BridgeInstance = BridgeStrategy::BridgeStrategyInstance<EvmProvider>;

/// Dispatch target resolved at connect time.
enum ResolvedTarget {
    CoreWriter {
        writer: WriterInstance,
    },
    Strategy {
        strategy: StrategyInstance,
        /// Mainnet-side CCTP endpoint, on its own provider.
        bridge: Option<BridgeInstance>,
        subvault: Address,
        hype_token_index: Option<u64>,
    },
}

/// Live connection state.
struct Connected {
    hyper: EvmProvider,
    target: ResolvedTarget,
    metadata: MetadataCache,
    proofs: Option<ProofResolver>,
}

/// HyperEVM exchange client.
pub struct Client {
    config: EvmConfig,
    http: reqwest::Client,
    state: Option<Connected>,
}

impl Client {
    pub fn new(config: EvmConfig) -> Self {
        let config = config.with_defaulted_urls();
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .tcp_nodelay(true)
            .build()
            .unwrap();

        Self {
            config,
            http,
            state: None,
        }
    }

    pub fn config(&self) -> &EvmConfig {
        &self.config
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn connected(&self) -> Result<&Connected> {
        self.state.as_ref().ok_or(Error::NotConnected)
    }

    pub(crate) fn strategy(&self) -> Result<&StrategyInstance> {
        match &self.connected()?.target {
            ResolvedTarget::Strategy { strategy, .. } => Ok(strategy),
            ResolvedTarget::CoreWriter { .. } => Err(Error::not_supported(
                "strategy call",
                "client targets CoreWriter; configure Target::Strategy",
            )),
        }
    }

    pub(crate) fn bridge_contract(&self) -> Result<&BridgeInstance> {
        match &self.connected()?.target {
            ResolvedTarget::Strategy {
                bridge: Some(bridge),
                ..
            } => Ok(bridge),
            _ => Err(Error::not_supported(
                "cctp bridge",
                "no mainnet bridge strategy configured",
            )),
        }
    }

    pub(crate) fn proof_chain(&self, domain: u32) -> ProofChain {
        if domain == bridge::HYPEREVM_DOMAIN {
            ProofChain::Hyper
        } else {
            ProofChain::Mainnet
        }
    }

    /// Payload for a guarded strategy call. With verification disabled (or
    /// no dataset configured) every call gets the default payload.
    pub(crate) fn proof_payload(
        &self,
        chain: ProofChain,
        description: &str,
    ) -> Result<VerificationPayload> {
        if self.config.disable_call_verification {
            return Ok(proofs::default_payload());
        }
        match &self.connected()?.proofs {
            Some(resolver) => resolver.resolve(chain, description),
            None => Ok(proofs::default_payload()),
        }
    }

    /// Sends a raw action through CoreWriter and waits for the receipt.
    async fn send_raw(
        &self,
        writer: &WriterInstance,
        action: &'static str,
        data: Bytes,
    ) -> Result<B256> {
        log::info!("Dispatching {action} via CoreWriter.sendRawAction");
        let pending = writer.sendRawAction(data).send().await?;
        tx::confirm(pending, action, self.config.receipt_timeout).await
    }

    /// Raw mid from the book: average of both sides, one side alone when the
    /// other is empty, `None` when the book is empty.
    fn mid_from_bbo(bid: u64, ask: u64) -> Option<u64> {
        match (bid > 0, ask > 0) {
            (true, true) => Some(((bid as u128 + ask as u128) / 2) as u64),
            (true, false) => Some(bid),
            (false, true) => Some(ask),
            (false, false) => None,
        }
    }

    fn is_hype_token(token: &str, index: u64, hype_token_index: Option<u64>) -> bool {
        token.eq_ignore_ascii_case("HYPE") || hype_token_index == Some(index)
    }
}

impl Protocol for Client {
    async fn connect(&mut self) -> Result<()> {
        let wallet = EthereumWallet::from(self.config.signer.clone());
        let hyper = ProviderBuilder::new()
            .wallet(wallet.clone())
            .connect_http(self.config.hyper_rpc_url.clone())
            .erased();

        let target = match self.config.target.clone() {
            Target::CoreWriter => ResolvedTarget::CoreWriter {
                writer: CoreWriter::new(COREWRITER_ADDRESS, hyper.clone()),
            },
            Target::Strategy {
                hyperliquid,
                bridge,
            } => {
                let strategy = HyperliquidStrategy::new(hyperliquid, hyper.clone());
                let subvault = strategy.subvault().call().await?;
                if subvault == Address::ZERO {
                    return Err(Error::validation(
                        "strategy",
                        format!("strategy {hyperliquid} has no subvault configured"),
                    ));
                }
                if !precompiles::core_user_exists(&hyper, subvault).await? {
                    return Err(Error::validation(
                        "strategy",
                        format!("subvault {subvault} does not exist on HyperCore"),
                    ));
                }
                // Older strategy deployments predate the HYPE accessor.
                let hype_token_index = strategy.hypeTokenIndex().call().await.ok();

                let bridge = match bridge {
                    Some(address) => {
                        let mainnet_url =
                            self.config.mainnet_rpc_url.clone().ok_or_else(|| {
                                Error::validation(
                                    "mainnet_rpc_url",
                                    "required when a bridge strategy is configured",
                                )
                            })?;
                        let mainnet = ProviderBuilder::new()
                            .wallet(wallet)
                            .connect_http(mainnet_url)
                            .erased();
                        Some(BridgeStrategy::new(address, mainnet))
                    }
                    None => None,
                };

                ResolvedTarget::Strategy {
                    strategy,
                    bridge,
                    subvault,
                    hype_token_index,
                }
            }
        };

        let info_url = self
            .config
            .info_url
            .clone()
            .ok_or_else(|| Error::validation("info_url", "no info endpoint configured"))?;
        let metadata = MetadataCache::new(self.http.clone(), info_url);
        metadata.load().await?;

        let proofs = match (&self.config.proofs, self.config.disable_call_verification) {
            (Some(proof_config), false) => {
                let resolver = match &proof_config.source {
                    ProofSource::Url(url) => {
                        ProofResolver::fetch(url, self.config.request_timeout).await?
                    }
                    ProofSource::Inline(value) => ProofResolver::from_value(value.clone())?,
                };
                if proof_config.check_merkle_root {
                    if let Some(verifier) = proof_config.verifier {
                        let onchain = FlexibleVaultVerifier::new(verifier, hyper.clone())
                            .merkleRoot()
                            .call()
                            .await?;
                        let expected = resolver.expected_root(ProofChain::Hyper)?;
                        if onchain != expected {
                            return Err(Error::validation(
                                "proofs",
                                format!(
                                    "merkle root mismatch: dataset {expected}, verifier {onchain}"
                                ),
                            ));
                        }
                    }
                }
                Some(resolver)
            }
            _ => None,
        };

        match &target {
            ResolvedTarget::CoreWriter { .. } => {
                log::info!(
                    "Connected to HyperEVM via CoreWriter as {}",
                    self.config.signer.address(),
                );
            }
            ResolvedTarget::Strategy { subvault, .. } => {
                log::info!("Connected to HyperEVM via strategy, subvault {subvault}");
            }
        }

        self.state = Some(Connected {
            hyper,
            target,
            metadata,
            proofs,
        });
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(state) = self.state.take() {
            state.metadata.clear();
        }
        log::info!("Disconnected from HyperEVM");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.is_some()
    }

    fn trading_address(&self) -> Result<Address> {
        match &self.connected()?.target {
            ResolvedTarget::CoreWriter { .. } => Ok(self.config.signer.address()),
            ResolvedTarget::Strategy { subvault, .. } => Ok(*subvault),
        }
    }

    async fn market_mid(&self, asset: &str) -> Result<Decimal> {
        let conn = self.connected()?;
        let asset_id = conn.metadata.resolve_asset(asset)?;

        let (bid, ask) = match precompiles::bbo(&conn.hyper, asset_id).await {
            Ok(pair) => pair,
            Err(err) => {
                log::warn!("BBO read failed for {asset}: {err}");
                (0, 0)
            }
        };
        let raw = match Self::mid_from_bbo(bid, ask) {
            Some(raw) => raw,
            // Empty book: fall back to the mark price.
            None => precompiles::mark_px(&conn.hyper, asset_id).await?,
        };

        let scale = conn.metadata.price_scale(&conn.hyper, asset_id).await?;
        scale.convert(raw)
    }

    async fn round_price(&self, asset: &str, px: Decimal) -> Result<Decimal> {
        let conn = self.connected()?;
        let asset_id = conn.metadata.resolve_asset(asset)?;
        let scale = conn.metadata.price_scale(&conn.hyper, asset_id).await?;
        scale.round_price(px)
    }

    async fn position(&self, asset: &str) -> Result<Option<PerpPosition>> {
        let conn = self.connected()?;
        let user = self.trading_address()?;
        let state: crate::hypercore::types::ClearinghouseState = conn
            .metadata
            .info(&json!({ "type": "clearinghouseState", "user": user }))
            .await?;

        Ok(state
            .asset_positions
            .into_iter()
            .map(|entry| entry.position)
            .find(|position| position.coin.eq_ignore_ascii_case(asset))
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
        let conn = self.connected()?;
        let asset_id = conn.metadata.resolve_asset(asset)?;
        let scale = conn.metadata.price_scale(&conn.hyper, asset_id).await?;

        let px8 = units::to_uint64(scale.round_price(limit_px)?, units::WEI_DECIMALS)?;
        let sz8 = units::to_uint64(sz, units::WEI_DECIMALS)?;
        let cloid_raw = cloid.map(Cloid::as_u128).unwrap_or(0);

        let tx_hash = match &conn.target {
            ResolvedTarget::CoreWriter { writer } => {
                let data = corewriter::limit_order(
                    asset_id, is_buy, px8, sz8, reduce_only, tif, cloid_raw,
                );
                self.send_raw(writer, "limit_order", data).await?
            }
            ResolvedTarget::Strategy { strategy, .. } => {
                let payload = self.proof_payload(ProofChain::Hyper, proofs::LIMIT_ORDER_PROOF)?;
                let pending = if is_buy {
                    log::info!("Dispatching limit_order via HyperliquidStrategy.placeLimitBuyOrder");
                    strategy
                        .placeLimitBuyOrder(
                            asset_id,
                            px8,
                            sz8,
                            reduce_only,
                            tif.encoding(),
                            cloid_raw,
                            payload,
                        )
                        .send()
                        .await?
                } else {
                    log::info!(
                        "Dispatching limit_order via HyperliquidStrategy.placeLimitSellOrder"
                    );
                    strategy
                        .placeLimitSellOrder(
                            asset_id,
                            px8,
                            sz8,
                            reduce_only,
                            tif.encoding(),
                            cloid_raw,
                            payload,
                        )
                        .send()
                        .await?
                };
                tx::confirm(pending, "limit_order", self.config.receipt_timeout).await?
            }
        };

        Ok(OrderReceipt {
            oid: None,
            cloid,
            filled: None,
            tx_hash: Some(tx_hash),
        })
    }

    async fn cancel_order_by_oid(&self, asset: &str, oid: u64) -> Result<CancelReceipt> {
        let conn = self.connected()?;
        let asset_id = conn.metadata.resolve_asset(asset)?;

        let tx_hash = match &conn.target {
            ResolvedTarget::CoreWriter { writer } => {
                let data = corewriter::cancel_by_oid(asset_id, oid);
                self.send_raw(writer, "cancel_order", data).await?
            }
            ResolvedTarget::Strategy { strategy, .. } => {
                let payload = self.proof_payload(ProofChain::Hyper, proofs::CANCEL_OID_PROOF)?;
                log::info!("Dispatching cancel_order via HyperliquidStrategy.cancelOrderByOid");
                let pending = strategy.cancelOrderByOid(asset_id, oid, payload).send().await?;
                tx::confirm(pending, "cancel_order", self.config.receipt_timeout).await?
            }
        };

        Ok(CancelReceipt {
            cancelled: 1,
            tx_hash: Some(tx_hash),
        })
    }

    async fn cancel_order_by_cloid(&self, asset: &str, cloid: Cloid) -> Result<CancelReceipt> {
        let conn = self.connected()?;
        let asset_id = conn.metadata.resolve_asset(asset)?;

        let tx_hash = match &conn.target {
            ResolvedTarget::CoreWriter { writer } => {
                let data = corewriter::cancel_by_cloid(asset_id, cloid.as_u128());
                self.send_raw(writer, "cancel_order", data).await?
            }
            ResolvedTarget::Strategy { strategy, .. } => {
                let payload =
                    self.proof_payload(ProofChain::Hyper, proofs::CANCEL_CLOID_PROOF)?;
                log::info!("Dispatching cancel_order via HyperliquidStrategy.cancelOrderByCloid");
                let pending = strategy
                    .cancelOrderByCloid(asset_id, cloid.as_u128(), payload)
                    .send()
                    .await?;
                tx::confirm(pending, "cancel_order", self.config.receipt_timeout).await?
            }
        };

        Ok(CancelReceipt {
            cancelled: 1,
            tx_hash: Some(tx_hash),
        })
    }

    async fn vault_transfer(
        &self,
        vault: Address,
        is_deposit: bool,
        usd: Decimal,
    ) -> Result<TransferReceipt> {
        let conn = self.connected()?;
        let ResolvedTarget::CoreWriter { writer } = &conn.target else {
            return Err(Error::not_supported(
                "vault_transfer",
                "the strategy contract exposes no vault functions",
            ));
        };

        let data =
            corewriter::vault_transfer(vault, is_deposit, units::to_uint64(usd, units::USDC_DECIMALS)?);
        let tx_hash = self.send_raw(writer, "vault_transfer", data).await?;
        Ok(TransferReceipt {
            amount: usd,
            tx_hash: Some(tx_hash),
        })
    }

    async fn spot_send(
        &self,
        recipient: Address,
        token: &str,
        amount: Decimal,
    ) -> Result<SendReceipt> {
        let conn = self.connected()?;
        let index = conn.metadata.resolve_token(token)?;
        let wei = units::to_uint64(amount, units::WEI_DECIMALS)?;

        let tx_hash = match &conn.target {
            ResolvedTarget::CoreWriter { writer } => {
                let data = corewriter::spot_send(recipient, index, wei);
                self.send_raw(writer, "spot_send", data).await?
            }
            // Strategy withdrawals always land on the subvault's EVM address;
            // `recipient` cannot be honored here.
            ResolvedTarget::Strategy {
                strategy,
                hype_token_index,
                ..
            } => {
                let payload = self.proof_payload(ProofChain::Hyper, proofs::SPOT_SEND_PROOF)?;
                let pending = if Self::is_hype_token(token, index, *hype_token_index) {
                    log::info!("Dispatching spot_send via HyperliquidStrategy.withdrawHypeToEvm");
                    strategy.withdrawHypeToEvm(wei, payload).send().await?
                } else {
                    log::info!("Dispatching spot_send via HyperliquidStrategy.withdrawTokenToEvm");
                    strategy.withdrawTokenToEvm(index, wei, payload).send().await?
                };
                tx::confirm(pending, "spot_send", self.config.receipt_timeout).await?
            }
        };

        Ok(SendReceipt {
            recipient,
            amount,
            tx_hash: Some(tx_hash),
        })
    }

    async fn perp_send(&self, recipient: Address, amount: Decimal) -> Result<SendReceipt> {
        let conn = self.connected()?;
        let ResolvedTarget::CoreWriter { writer } = &conn.target else {
            return Err(Error::not_supported(
                "perp_send",
                "the strategy contract exposes no perp send function",
            ));
        };

        let data =
            corewriter::perp_send(recipient, units::to_uint64(amount, units::USDC_DECIMALS)?);
        let tx_hash = self.send_raw(writer, "perp_send", data).await?;
        Ok(SendReceipt {
            recipient,
            amount,
            tx_hash: Some(tx_hash),
        })
    }

    async fn usd_class_transfer_to_perp(&self, amount: Decimal) -> Result<TransferReceipt> {
        let conn = self.connected()?;
        let ntl = units::to_uint64(amount, units::USDC_DECIMALS)?;

        let tx_hash = match &conn.target {
            ResolvedTarget::CoreWriter { writer } => {
                let data = corewriter::usd_class_transfer(ntl, true);
                self.send_raw(writer, "usd_class_transfer", data).await?
            }
            ResolvedTarget::Strategy { strategy, .. } => {
                let payload = self.proof_payload(ProofChain::Hyper, proofs::USD_TRANSFER_PROOF)?;
                log::info!(
                    "Dispatching usd_class_transfer via HyperliquidStrategy.transferSpotToPerp"
                );
                let pending = strategy.transferSpotToPerp(ntl, payload).send().await?;
                tx::confirm(pending, "usd_class_transfer", self.config.receipt_timeout).await?
            }
        };

        Ok(TransferReceipt {
            amount,
            tx_hash: Some(tx_hash),
        })
    }

    async fn usd_class_transfer_to_spot(&self, amount: Decimal) -> Result<TransferReceipt> {
        let conn = self.connected()?;
        let ntl = units::to_uint64(amount, units::USDC_DECIMALS)?;

        let tx_hash = match &conn.target {
            ResolvedTarget::CoreWriter { writer } => {
                let data = corewriter::usd_class_transfer(ntl, false);
                self.send_raw(writer, "usd_class_transfer", data).await?
            }
            ResolvedTarget::Strategy { strategy, .. } => {
                let payload = self.proof_payload(ProofChain::Hyper, proofs::USD_TRANSFER_PROOF)?;
                log::info!(
                    "Dispatching usd_class_transfer via HyperliquidStrategy.transferPerpToSpot"
                );
                let pending = strategy.transferPerpToSpot(ntl, payload).send().await?;
                tx::confirm(pending, "usd_class_transfer", self.config.receipt_timeout).await?
            }
        };

        Ok(TransferReceipt {
            amount,
            tx_hash: Some(tx_hash),
        })
    }

    async fn token_delegate(
        &self,
        validator: Address,
        amount: Decimal,
        is_undelegate: bool,
    ) -> Result<DelegateReceipt> {
        let conn = self.connected()?;
        let ResolvedTarget::CoreWriter { writer } = &conn.target else {
            return Err(Error::not_supported(
                "token_delegate",
                "the strategy contract exposes no staking functions",
            ));
        };

        let wei = units::to_uint64(amount, units::WEI_DECIMALS)?;
        let data = corewriter::token_delegate(validator, wei, is_undelegate);
        let tx_hash = self.send_raw(writer, "token_delegate", data).await?;
        Ok(DelegateReceipt {
            validator,
            wei,
            undelegated: is_undelegate,
            tx_hash: Some(tx_hash),
        })
    }

    async fn staking_deposit(&self, amount: Decimal) -> Result<StakingReceipt> {
        let conn = self.connected()?;
        let ResolvedTarget::CoreWriter { writer } = &conn.target else {
            return Err(Error::not_supported(
                "staking_deposit",
                "the strategy contract exposes no staking functions",
            ));
        };

        let wei = units::to_uint64(amount, units::WEI_DECIMALS)?;
        let tx_hash = self
            .send_raw(writer, "staking_deposit", corewriter::staking_deposit(wei))
            .await?;
        Ok(StakingReceipt {
            wei,
            tx_hash: Some(tx_hash),
        })
    }

    async fn staking_withdraw(&self, amount: Decimal) -> Result<StakingReceipt> {
        let conn = self.connected()?;
        let ResolvedTarget::CoreWriter { writer } = &conn.target else {
            return Err(Error::not_supported(
                "staking_withdraw",
                "the strategy contract exposes no staking functions",
            ));
        };

        let wei = units::to_uint64(amount, units::WEI_DECIMALS)?;
        let tx_hash = self
            .send_raw(writer, "staking_withdraw", corewriter::staking_withdraw(wei))
            .await?;
        Ok(StakingReceipt {
            wei,
            tx_hash: Some(tx_hash),
        })
    }

    async fn approve_builder_fee(
        &self,
        builder: Address,
        max_fee_rate: Decimal,
    ) -> Result<ApprovalReceipt> {
        let conn = self.connected()?;
        let ResolvedTarget::CoreWriter { writer } = &conn.target else {
            return Err(Error::not_supported(
                "approve_builder_fee",
                "the strategy contract exposes no builder fee function",
            ));
        };

        if max_fee_rate < Decimal::ZERO || max_fee_rate >= Decimal::ONE {
            return Err(Error::validation(
                "max_fee_rate",
                format!("must be a fraction within [0, 1), got {max_fee_rate}"),
            ));
        }

        // CoreWriter takes the rate in tenths of a basis point.
        let tenths_of_bp = units::to_uint64(max_fee_rate, 5)?;
        let data = corewriter::approve_builder_fee(builder, tenths_of_bp);
        let tx_hash = self.send_raw(writer, "approve_builder_fee", data).await?;
        Ok(ApprovalReceipt {
            builder,
            max_fee_rate,
            tx_hash: Some(tx_hash),
        })
    }
}
