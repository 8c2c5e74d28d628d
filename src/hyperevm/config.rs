//! Configuration for the HyperEVM backend.

use std::time::Duration;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use url::Url;

use crate::hypercore;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_IRIS_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_IRIS_MAX_POLLS: u32 = 100;
pub const DEFAULT_FINALITY_THRESHOLD: u32 = 1000;

/// Circle's attestation API.
pub const IRIS_API_PROD: &str = "https://iris-api.circle.com";
pub const IRIS_API_SANDBOX: &str = "https://iris-api-sandbox.circle.com";

/// Where exchange actions are dispatched on HyperEVM.
#[derive(Debug, Clone)]
pub enum Target {
    /// Raw actions from the signer's own account through the CoreWriter
    /// system contract.
    CoreWriter,
    /// Typed calls into a deployed strategy contract; the traded account is
    /// the strategy's subvault. `bridge` is the mainnet-side counterpart for
    /// CCTP transfers.
    Strategy {
        hyperliquid: Address,
        bridge: Option<Address>,
    },
}

/// CCTP v2 bridge tuning. Defaults match Circle's documented cadence.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// IRIS base URL; defaulted from the network when absent.
    pub iris_api_url: Option<Url>,
    pub poll_interval: Duration,
    pub max_polls: u32,
    pub finality_threshold: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            iris_api_url: None,
            poll_interval: DEFAULT_IRIS_POLL_INTERVAL,
            max_polls: DEFAULT_IRIS_MAX_POLLS,
            finality_threshold: DEFAULT_FINALITY_THRESHOLD,
        }
    }
}

/// Where a flexible-vault proof dataset comes from.
#[derive(Debug, Clone)]
pub enum ProofSource {
    Url(Url),
    Inline(serde_json::Value),
}

#[derive(Debug, Clone)]
pub struct ProofConfig {
    pub source: ProofSource,
    /// Verifier contract whose `merkleRoot()` must match the dataset.
    pub verifier: Option<Address>,
    pub check_merkle_root: bool,
}

/// Aggregated configuration for [`super::Client`].
#[derive(Debug, Clone)]
pub struct EvmConfig {
    pub signer: PrivateKeySigner,
    pub hyper_rpc_url: Url,
    /// Required for bridging; everything else runs on HyperEVM alone.
    pub mainnet_rpc_url: Option<Url>,
    pub target: Target,
    /// HyperLiquid info endpoint; defaulted from `testnet` when absent.
    pub info_url: Option<Url>,
    pub testnet: bool,
    pub request_timeout: Duration,
    pub receipt_timeout: Duration,
    pub bridge: BridgeConfig,
    pub proofs: Option<ProofConfig>,
    /// Skip proof resolution entirely and send default payloads.
    pub disable_call_verification: bool,
}

impl EvmConfig {
    pub fn new(signer: PrivateKeySigner, hyper_rpc_url: Url) -> Self {
        Self {
            signer,
            hyper_rpc_url,
            mainnet_rpc_url: None,
            target: Target::CoreWriter,
            info_url: None,
            testnet: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
            bridge: BridgeConfig::default(),
            proofs: None,
            disable_call_verification: false,
        }
    }

    /// Fills the info and IRIS URLs from the network selection.
    pub fn with_defaulted_urls(mut self) -> Self {
        if self.info_url.is_none() {
            let base = if self.testnet {
                hypercore::TESTNET_URL
            } else {
                hypercore::MAINNET_URL
            };
            let mut url: Url = base.parse().unwrap();
            url.set_path("/info");
            self.info_url = Some(url);
        }

        if self.bridge.iris_api_url.is_none() {
            let base = if self.testnet {
                IRIS_API_SANDBOX
            } else {
                IRIS_API_PROD
            };
            self.bridge.iris_api_url = Some(base.parse().unwrap());
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EvmConfig {
        EvmConfig::new(
            PrivateKeySigner::random(),
            "http://localhost:8545".parse().unwrap(),
        )
    }

    #[test]
    fn defaults_are_the_documented_cadence() {
        let config = config();
        assert!(config.testnet);
        assert!(matches!(config.target, Target::CoreWriter));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.receipt_timeout, Duration::from_secs(120));
        assert_eq!(config.bridge.poll_interval, Duration::from_secs(2));
        assert_eq!(config.bridge.max_polls, 100);
        assert_eq!(config.bridge.finality_threshold, 1000);
    }

    #[test]
    fn urls_default_from_the_network() {
        let testnet = config().with_defaulted_urls();
        assert_eq!(
            testnet.info_url.unwrap().as_str(),
            "https://api.hyperliquid-testnet.xyz/info"
        );
        assert_eq!(
            testnet.bridge.iris_api_url.unwrap().as_str(),
            "https://iris-api-sandbox.circle.com/"
        );

        let mut mainnet = config();
        mainnet.testnet = false;
        let mainnet = mainnet.with_defaulted_urls();
        assert_eq!(
            mainnet.info_url.unwrap().as_str(),
            "https://api.hyperliquid.xyz/info"
        );
        assert_eq!(
            mainnet.bridge.iris_api_url.unwrap().as_str(),
            "https://iris-api.circle.com/"
        );
    }

    #[test]
    fn explicit_urls_survive_defaulting() {
        let mut config = config();
        config.info_url = Some("http://localhost:9000/info".parse().unwrap());
        config.bridge.iris_api_url = Some("http://localhost:9001".parse().unwrap());
        let config = config.with_defaulted_urls();
        assert_eq!(config.info_url.unwrap().as_str(), "http://localhost:9000/info");
        assert_eq!(
            config.bridge.iris_api_url.unwrap().as_str(),
            "http://localhost:9001/"
        );
    }
}
