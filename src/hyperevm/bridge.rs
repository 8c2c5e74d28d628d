//! CCTP v2 USDC transfers between Ethereum mainnet and HyperEVM.
//!
//! A transfer runs through six stages: amount preparation, fee quoting,
//! verification payloads, the source-side burn, Circle's IRIS attestation,
//! and the destination-side claim. Once the burn lands the funds are gone
//! from the source chain, so every later failure carries the burn hash and
//! [`Client::poll_attestation`] / [`Client::claim_usdc`] are public to let a
//! stranded transfer be finished by hand.

use alloy::primitives::{B256, Bytes, U256};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::hyperevm::proofs::CCTP_PROOFS;
use crate::hyperevm::tx;
use crate::units;

use super::Client;

/// CCTP domain ids.
pub const MAINNET_DOMAIN: u32 = 0;
pub const HYPEREVM_DOMAIN: u32 = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BridgeDirection {
    #[display("mainnet_to_hyper")]
    MainnetToHyper,
    #[display("hyper_to_mainnet")]
    HyperToMainnet,
}

impl BridgeDirection {
    pub const fn source_domain(self) -> u32 {
        match self {
            Self::MainnetToHyper => MAINNET_DOMAIN,
            Self::HyperToMainnet => HYPEREVM_DOMAIN,
        }
    }

    pub const fn destination_domain(self) -> u32 {
        match self {
            Self::MainnetToHyper => HYPEREVM_DOMAIN,
            Self::HyperToMainnet => MAINNET_DOMAIN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BridgeStage {
    #[display("prepare amount")]
    PrepareAmount,
    #[display("fee quote")]
    FeeQuote,
    #[display("verification payloads")]
    VerificationPayloads,
    #[display("burn")]
    Burn,
    #[display("attestation")]
    Attestation,
    #[display("claim")]
    Claim,
}

/// Outcome of a completed bridge run.
#[derive(Debug, Clone)]
pub struct BridgeReceipt {
    pub direction: BridgeDirection,
    /// USDC actually bridged, after truncation to 6 decimals.
    pub amount: Decimal,
    pub burn_tx: B256,
    pub claim_tx: B256,
    pub message: Bytes,
    pub attestation: Bytes,
}

/// One entry of IRIS's `/v2/burn/USDC/fees` response. `minimumFee` is in
/// basis points.
#[derive(Debug, Clone, Deserialize)]
struct FeeQuote {
    #[serde(default, rename = "finalityThreshold")]
    finality_threshold: Option<u32>,
    #[serde(default, rename = "minimumFee")]
    minimum_fee: u64,
}

/// Picks the quote matching the requested finality threshold, else the
/// first one.
fn select_quote(quotes: &[FeeQuote], threshold: u32) -> Option<&FeeQuote> {
    quotes
        .iter()
        .find(|quote| quote.finality_threshold == Some(threshold))
        .or(quotes.first())
}

/// `ceil(units * bps / 10_000)` without intermediate overflow.
fn ceiling_fee(units: u64, bps: u64) -> u64 {
    ((units as u128 * bps as u128 + 9_999) / 10_000) as u64
}

/// Truncates a USDC amount to 6 decimals and scales it to units. Extra
/// scale is dropped with a warning rather than rejected.
fn normalize_amount(amount: Decimal) -> Result<u64> {
    if amount <= Decimal::ZERO {
        return Err(Error::validation(
            "amount",
            format!("must be positive, got {amount}"),
        ));
    }
    let truncated = amount.trunc_with_scale(units::USDC_DECIMALS);
    if truncated != amount {
        log::warn!("Truncating bridge amount {amount} to {truncated} (6 decimals)");
    }
    if truncated.is_zero() {
        return Err(Error::validation(
            "amount",
            format!("{amount} is below one USDC unit"),
        ));
    }
    units::to_uint64(truncated, units::USDC_DECIMALS)
}

/// IRIS `/v2/messages` document. Depending on the deployment the messages
/// sit at the top level or under `data`.
#[derive(Debug, Default, Deserialize)]
struct IrisResponse {
    #[serde(default)]
    messages: Vec<IrisMessage>,
    #[serde(default)]
    data: Option<IrisEnvelope>,
}

#[derive(Debug, Default, Deserialize)]
struct IrisEnvelope {
    #[serde(default)]
    messages: Vec<IrisMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct IrisMessage {
    #[serde(default)]
    status: String,
    message: Option<String>,
    attestation: Option<String>,
}

impl IrisResponse {
    /// First message whose attestation is complete, as raw blobs.
    fn complete_message(&self) -> Result<Option<(Bytes, Bytes)>> {
        let nested = self.data.iter().flat_map(|data| data.messages.iter());
        for entry in self.messages.iter().chain(nested) {
            if !entry.status.is_empty() && entry.status != "complete" {
                continue;
            }
            let (Some(message), Some(attestation)) =
                (entry.message.as_deref(), entry.attestation.as_deref())
            else {
                continue;
            };
            let parse = |label: &'static str, text: &str| {
                text.parse::<Bytes>()
                    .map_err(|err| Error::validation(label, format!("invalid hex: {err}")))
            };
            return Ok(Some((
                parse("message", message)?,
                parse("attestation", attestation)?,
            )));
        }
        Ok(None)
    }
}

impl Client {
    /// Bridges USDC across CCTP v2 end to end: burn on the source chain,
    /// wait for Circle's attestation, claim on the destination chain.
    ///
    /// `max_fee` (USDC units) and `min_finality_threshold` override the fee
    /// quote and the configured threshold.
    pub async fn bridge_usdc(
        &self,
        direction: BridgeDirection,
        amount: Decimal,
        max_fee: Option<u64>,
        min_finality_threshold: Option<u32>,
    ) -> Result<BridgeReceipt> {
        let stage_err = |stage: BridgeStage, burn_tx: Option<B256>, reason: String| {
            Error::Bridge {
                direction,
                stage,
                burn_tx,
                reason,
            }
        };

        log::debug!("Stage CCTP [{direction}]: {}", BridgeStage::PrepareAmount);
        let units = normalize_amount(amount)
            .map_err(|err| stage_err(BridgeStage::PrepareAmount, None, err.to_string()))?;
        let threshold =
            min_finality_threshold.unwrap_or(self.config().bridge.finality_threshold);

        log::debug!("Stage CCTP [{direction}]: {}", BridgeStage::FeeQuote);
        let max_fee = match max_fee {
            Some(fee) => fee,
            None => {
                let quote = self
                    .fetch_fee(direction, threshold)
                    .await
                    .map_err(|err| stage_err(BridgeStage::FeeQuote, None, err.to_string()))?;
                ceiling_fee(units, quote.minimum_fee)
            }
        };
        if max_fee >= units {
            return Err(stage_err(
                BridgeStage::FeeQuote,
                None,
                format!("max fee {max_fee} consumes the whole amount {units}"),
            ));
        }

        log::debug!(
            "Stage CCTP [{direction}]: {}",
            BridgeStage::VerificationPayloads
        );
        let source_chain = self.proof_chain(direction.source_domain());
        let payloads = CCTP_PROOFS
            .iter()
            .map(|description| self.proof_payload(source_chain, description))
            .collect::<Result<Vec<_>>>()
            .map_err(|err| {
                stage_err(BridgeStage::VerificationPayloads, None, err.to_string())
            })?;

        log::debug!("Stage CCTP [{direction}]: {}", BridgeStage::Burn);
        let burn_tx = self
            .burn(direction, units, max_fee, threshold, payloads)
            .await
            .map_err(|err| stage_err(BridgeStage::Burn, None, err.to_string()))?;

        let (message, attestation) = self.poll_attestation(direction, burn_tx).await?;

        log::debug!("Stage CCTP [{direction}]: {}", BridgeStage::Claim);
        let claim_tx = self
            .claim_usdc(direction, message.clone(), attestation.clone())
            .await
            .map_err(|err| stage_err(BridgeStage::Claim, Some(burn_tx), err.to_string()))?;

        Ok(BridgeReceipt {
            direction,
            amount: units::from_uint64(units, units::USDC_DECIMALS),
            burn_tx,
            claim_tx,
            message,
            attestation,
        })
    }

    /// Polls IRIS until the burn's attestation is complete, returning the
    /// message and attestation blobs for the claim. Timeouts and transport
    /// failures keep the burn hash so the transfer can be resumed.
    pub async fn poll_attestation(
        &self,
        direction: BridgeDirection,
        burn_tx: B256,
    ) -> Result<(Bytes, Bytes)> {
        log::debug!("Stage CCTP [{direction}]: {}", BridgeStage::Attestation);
        let stage_err = |reason: String| Error::Bridge {
            direction,
            stage: BridgeStage::Attestation,
            burn_tx: Some(burn_tx),
            reason,
        };

        let bridge = &self.config().bridge;
        let mut url = bridge
            .iris_api_url
            .clone()
            .ok_or_else(|| stage_err("no IRIS API URL configured".to_string()))?;
        url.set_path(&format!("/v2/messages/{}", direction.source_domain()));
        url.set_query(Some(&format!("transactionHash={burn_tx}")));

        for _ in 0..bridge.max_polls {
            let response = self
                .http()
                .get(url.clone())
                .send()
                .await
                .map_err(|err| stage_err(err.to_string()))?;

            // 404 means the message has not been indexed yet.
            if response.status() == reqwest::StatusCode::NOT_FOUND {
                tokio::time::sleep(bridge.poll_interval).await;
                continue;
            }

            let document: IrisResponse = response
                .error_for_status()
                .map_err(|err| stage_err(err.to_string()))?
                .json()
                .await
                .map_err(|err| stage_err(err.to_string()))?;

            if let Some(pair) = document
                .complete_message()
                .map_err(|err| stage_err(err.to_string()))?
            {
                return Ok(pair);
            }
            tokio::time::sleep(bridge.poll_interval).await;
        }

        Err(stage_err(format!(
            "attestation not complete after {} polls",
            bridge.max_polls,
        )))
    }

    /// Claims an attested burn on the destination chain.
    pub async fn claim_usdc(
        &self,
        direction: BridgeDirection,
        message: Bytes,
        attestation: Bytes,
    ) -> Result<B256> {
        let timeout = self.config().receipt_timeout;
        log::info!("Dispatching claim_usdc via receiveUSDCViaCCTPv2");
        let pending = match direction {
            // Claims land on the destination chain, opposite the burn.
            BridgeDirection::MainnetToHyper => {
                self.strategy()?
                    .receiveUSDCViaCCTPv2(message, attestation)
                    .send()
                    .await?
            }
            BridgeDirection::HyperToMainnet => {
                self.bridge_contract()?
                    .receiveUSDCViaCCTPv2(message, attestation)
                    .send()
                    .await?
            }
        };
        tx::confirm(pending, "claim_usdc", timeout).await
    }

    async fn burn(
        &self,
        direction: BridgeDirection,
        units: u64,
        max_fee: u64,
        threshold: u32,
        payloads: Vec<super::contracts::VerificationPayload>,
    ) -> Result<B256> {
        let timeout = self.config().receipt_timeout;
        log::info!("Dispatching bridge_usdc via bridgeUSDCViaCCTPv2");
        let pending = match direction {
            BridgeDirection::MainnetToHyper => {
                self.bridge_contract()?
                    .bridgeUSDCViaCCTPv2(
                        U256::from(units),
                        U256::from(max_fee),
                        threshold,
                        payloads,
                    )
                    .send()
                    .await?
            }
            BridgeDirection::HyperToMainnet => {
                self.strategy()?
                    .bridgeUSDCViaCCTPv2(
                        U256::from(units),
                        U256::from(max_fee),
                        threshold,
                        payloads,
                    )
                    .send()
                    .await?
            }
        };
        tx::confirm(pending, "bridge_usdc", timeout).await
    }

    async fn fetch_fee(&self, direction: BridgeDirection, threshold: u32) -> Result<FeeQuote> {
        let bridge = &self.config().bridge;
        let mut url = bridge
            .iris_api_url
            .clone()
            .ok_or_else(|| Error::validation("iris_api_url", "no IRIS API URL configured"))?;
        url.set_path(&format!(
            "/v2/burn/USDC/fees/{}/{}",
            direction.source_domain(),
            direction.destination_domain(),
        ));
        let endpoint = url.to_string();

        let quotes: Vec<FeeQuote> = self
            .http()
            .get(url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| Error::http(&endpoint, err))?
            .json()
            .await
            .map_err(|err| Error::http(&endpoint, err))?;

        select_quote(&quotes, threshold)
            .cloned()
            .ok_or_else(|| Error::api(&endpoint, "fee response contained no quotes"))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::dec;

    use super::*;

    #[test]
    fn domains_follow_the_direction() {
        let out = BridgeDirection::HyperToMainnet;
        assert_eq!(out.source_domain(), 19);
        assert_eq!(out.destination_domain(), 0);
        assert_eq!(out.to_string(), "hyper_to_mainnet");

        let back = BridgeDirection::MainnetToHyper;
        assert_eq!(back.source_domain(), 0);
        assert_eq!(back.destination_domain(), 19);
        assert_eq!(back.to_string(), "mainnet_to_hyper");
    }

    #[test]
    fn stage_names_match_the_log_format() {
        assert_eq!(BridgeStage::PrepareAmount.to_string(), "prepare amount");
        assert_eq!(BridgeStage::VerificationPayloads.to_string(), "verification payloads");
        assert_eq!(BridgeStage::Claim.to_string(), "claim");
    }

    #[test]
    fn amounts_truncate_to_usdc_units() {
        assert_eq!(normalize_amount(dec!(12.5)).unwrap(), 12_500_000);
        assert_eq!(normalize_amount(dec!(0.1234567)).unwrap(), 123_456);
        assert!(normalize_amount(dec!(0)).is_err());
        assert!(normalize_amount(dec!(-1)).is_err());
        assert!(normalize_amount(dec!(0.0000001)).is_err());
    }

    #[test]
    fn fee_is_rounded_up() {
        assert_eq!(ceiling_fee(10_000, 1), 1);
        assert_eq!(ceiling_fee(10_001, 1), 2);
        assert_eq!(ceiling_fee(1_000_000, 25), 2_500);
        assert_eq!(ceiling_fee(u64::MAX, 10_000), u64::MAX);
    }

    #[test]
    fn quote_selection_prefers_the_matching_threshold() {
        let quotes = vec![
            FeeQuote { finality_threshold: Some(2000), minimum_fee: 10 },
            FeeQuote { finality_threshold: Some(1000), minimum_fee: 1 },
        ];
        assert_eq!(select_quote(&quotes, 1000).unwrap().minimum_fee, 1);
        assert_eq!(select_quote(&quotes, 500).unwrap().minimum_fee, 10);
        assert!(select_quote(&[], 1000).is_none());
    }

    #[test]
    fn messages_parse_at_either_nesting_level() {
        let flat: IrisResponse = serde_json::from_value(serde_json::json!({
            "messages": [
                { "status": "pending_confirmations" },
                { "status": "complete", "message": "0x01", "attestation": "0x02" }
            ]
        }))
        .unwrap();
        let (message, attestation) = flat.complete_message().unwrap().unwrap();
        assert_eq!(message.as_ref(), &[1]);
        assert_eq!(attestation.as_ref(), &[2]);

        let nested: IrisResponse = serde_json::from_value(serde_json::json!({
            "data": { "messages": [ { "message": "0xaa", "attestation": "0xbb" } ] }
        }))
        .unwrap();
        assert!(nested.complete_message().unwrap().is_some());

        let empty: IrisResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(empty.complete_message().unwrap().is_none());
    }
}
