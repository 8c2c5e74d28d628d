//! Flexible-vault proof datasets.
//!
//! Every guarded strategy call carries a [`VerificationPayload`] proving the
//! call is whitelisted under the vault's merkle root. Datasets are JSON,
//! either inlined into the config or fetched from a URL; each dataset covers
//! one chain, and entries are keyed by a human-readable call description.

use alloy::primitives::B256;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::hyperevm::contracts::VerificationPayload;

pub const LIMIT_ORDER_PROOF: &str = "CoreWriter.sendRawAction{action: limit_order}(anyBytes)";
pub const CANCEL_OID_PROOF: &str = "CoreWriter.sendRawAction{action: cancel_oid}(anyBytes)";
pub const CANCEL_CLOID_PROOF: &str = "CoreWriter.sendRawAction{action: cancel_cloid}(anyBytes)";
pub const SPOT_SEND_PROOF: &str = "CoreWriter.sendRawAction{action: spot_send}(anyBytes)";
pub const USD_TRANSFER_PROOF: &str = "CoreWriter.sendRawAction{action: usd_transfer}(anyBytes)";

/// The approve + burn pair every CCTP bridge call needs, in call order.
pub const CCTP_PROOFS: [&str; 2] = [
    "USDC.approve(TokenMessenger, anyInt)",
    "TokenMessenger.depositForBurn(anyInt)",
];

/// Which side's dataset a proof is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofChain {
    Hyper,
    Mainnet,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProofDataset {
    #[serde(default)]
    pub title: String,
    #[serde(alias = "merkleRoot")]
    pub merkle_root: B256,
    #[serde(rename = "merkle_proofs", alias = "merkleProofs")]
    pub proofs: Vec<ProofEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProofEntry {
    pub description: String,
    #[serde(default, alias = "verificationType", alias = "type")]
    pub verification_type: u8,
    #[serde(default, alias = "verificationData")]
    pub verification_data: Option<String>,
    #[serde(default, alias = "proofs")]
    pub proof: Vec<B256>,
}

impl ProofEntry {
    /// Builds the on-chain payload. `0x`-prefixed data decodes as hex,
    /// anything else is taken as raw bytes.
    pub fn payload(&self) -> Result<VerificationPayload> {
        let data = match self.verification_data.as_deref() {
            None | Some("") => Vec::new(),
            Some(text) => match text.strip_prefix("0x") {
                Some(hex) => const_hex::decode(hex).map_err(|err| {
                    Error::validation("verification_data", format!("invalid hex: {err}"))
                })?,
                None => text.as_bytes().to_vec(),
            },
        };
        Ok(VerificationPayload {
            verificationType: self.verification_type,
            verificationData: data.into(),
            proof: self.proof.clone(),
        })
    }
}

/// Payload sent when call verification is disabled.
pub fn default_payload() -> VerificationPayload {
    VerificationPayload::default()
}

/// Parsed proof datasets with per-chain selection.
#[derive(Debug, Clone)]
pub struct ProofResolver {
    datasets: Vec<ProofDataset>,
}

impl ProofResolver {
    /// Accepts a single dataset object or an array of them.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let datasets = if value.is_array() {
            serde_json::from_value(value)?
        } else {
            vec![serde_json::from_value(value)?]
        };
        Ok(Self { datasets })
    }

    /// Fetches a dataset document. Redirects are refused so a proof URL
    /// cannot silently move to a different host.
    pub async fn fetch(url: &Url, timeout: std::time::Duration) -> Result<Self> {
        let endpoint = url.to_string();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| Error::http(&endpoint, err))?;

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| Error::http(&endpoint, err))?;
        if response.status().is_redirection() {
            return Err(Error::api(
                &endpoint,
                format!("proof URL redirected ({})", response.status()),
            ));
        }
        let value = response
            .error_for_status()
            .map_err(|err| Error::http(&endpoint, err))?
            .json()
            .await
            .map_err(|err| Error::http(&endpoint, err))?;
        Self::from_value(value)
    }

    /// Picks the dataset for a chain by title keywords, falling back to the
    /// first dataset when nothing matches.
    pub fn select(&self, chain: ProofChain) -> Result<&ProofDataset> {
        let keywords: &[&str] = match chain {
            ProofChain::Hyper => &["hyperevm", "hyperliquid"],
            ProofChain::Mainnet => &["mainnet", "ethereum"],
        };
        let matched = self.datasets.iter().find(|dataset| {
            let title = dataset.title.to_ascii_lowercase();
            keywords.iter().any(|kw| title.contains(kw))
        });
        matched.or(self.datasets.first()).ok_or_else(|| {
            Error::validation("proofs", "proof document contains no datasets")
        })
    }

    pub fn expected_root(&self, chain: ProofChain) -> Result<B256> {
        Ok(self.select(chain)?.merkle_root)
    }

    /// Resolves a call description to its payload.
    pub fn resolve(&self, chain: ProofChain, description: &str) -> Result<VerificationPayload> {
        let dataset = self.select(chain)?;
        let entry = dataset
            .proofs
            .iter()
            .find(|entry| entry.description == description);
        match entry {
            Some(entry) => entry.payload(),
            None => {
                let mut available: Vec<&str> = dataset
                    .proofs
                    .iter()
                    .map(|entry| entry.description.as_str())
                    .collect();
                available.sort_unstable();
                Err(Error::validation(
                    "proof description",
                    format!("no proof for {description:?}; available: {available:?}"),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::b256;
    use serde_json::json;

    use super::*;

    fn document() -> serde_json::Value {
        json!([
            {
                "title": "HyperEVM strategy calls",
                "merkle_root": "0x1111111111111111111111111111111111111111111111111111111111111111",
                "merkle_proofs": [
                    {
                        "description": LIMIT_ORDER_PROOF,
                        "verificationType": 1,
                        "verificationData": "0xdeadbeef",
                        "proof": [
                            "0x2222222222222222222222222222222222222222222222222222222222222222"
                        ]
                    },
                    {
                        "description": CANCEL_OID_PROOF,
                        "proofs": []
                    }
                ]
            },
            {
                "title": "Ethereum mainnet bridge",
                "merkle_root": "0x3333333333333333333333333333333333333333333333333333333333333333",
                "merkle_proofs": [
                    { "description": CCTP_PROOFS[0], "proof": [] },
                    { "description": CCTP_PROOFS[1], "proof": [] }
                ]
            }
        ])
    }

    #[test]
    fn selects_datasets_by_title_keywords() {
        let resolver = ProofResolver::from_value(document()).unwrap();
        assert_eq!(
            resolver.expected_root(ProofChain::Hyper).unwrap(),
            b256!("0x1111111111111111111111111111111111111111111111111111111111111111")
        );
        assert_eq!(
            resolver.expected_root(ProofChain::Mainnet).unwrap(),
            b256!("0x3333333333333333333333333333333333333333333333333333333333333333")
        );
    }

    #[test]
    fn single_dataset_serves_both_chains() {
        let mut doc = document();
        let only = doc.as_array_mut().unwrap().remove(0);
        let resolver = ProofResolver::from_value(only).unwrap();
        assert!(resolver.resolve(ProofChain::Hyper, LIMIT_ORDER_PROOF).is_ok());
        assert!(resolver.resolve(ProofChain::Mainnet, LIMIT_ORDER_PROOF).is_ok());
    }

    #[test]
    fn resolves_payload_fields_and_aliases() {
        let resolver = ProofResolver::from_value(document()).unwrap();
        let payload = resolver.resolve(ProofChain::Hyper, LIMIT_ORDER_PROOF).unwrap();
        assert_eq!(payload.verificationType, 1);
        assert_eq!(payload.verificationData.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(payload.proof.len(), 1);

        // Entry with no data or type falls back to the defaults.
        let payload = resolver.resolve(ProofChain::Hyper, CANCEL_OID_PROOF).unwrap();
        assert_eq!(payload.verificationType, 0);
        assert!(payload.verificationData.is_empty());
        assert!(payload.proof.is_empty());
    }

    #[test]
    fn plain_text_data_passes_through_as_bytes() {
        let entry = ProofEntry {
            description: String::new(),
            verification_type: 0,
            verification_data: Some("subvault".to_string()),
            proof: vec![],
        };
        assert_eq!(entry.payload().unwrap().verificationData.as_ref(), b"subvault");
    }

    #[test]
    fn unknown_description_lists_what_is_available() {
        let resolver = ProofResolver::from_value(document()).unwrap();
        let err = resolver
            .resolve(ProofChain::Hyper, "CoreWriter.finalize()")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("CoreWriter.finalize()"));
        assert!(message.contains(LIMIT_ORDER_PROOF));
    }
}
