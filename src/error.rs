use alloy::primitives::B256;
use thiserror::Error;

use crate::hyperevm::bridge::{BridgeDirection, BridgeStage};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong across both backends and the bridge.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied value failed validation before anything was sent.
    #[error("invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },

    #[error("unknown asset {0:?}")]
    UnknownAsset(String),

    #[error("unknown token {0:?}")]
    UnknownToken(String),

    #[error("client is not connected")]
    NotConnected,

    #[error("no open position in {0}")]
    NoPosition(String),

    /// The backend cannot express this operation at all.
    #[error("{operation} is not supported by this backend: {reason}")]
    NotSupported {
        operation: &'static str,
        reason: String,
    },

    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered, but not with anything we can use.
    #[error("unexpected response from {endpoint}: {reason}")]
    Api { endpoint: String, reason: String },

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("encoding failed: {0}")]
    Encoding(String),

    /// The exchange accepted the request but rejected the action.
    #[error("exchange rejected the action: {0}")]
    Exchange(String),

    /// The transaction landed on chain and reverted, or never confirmed.
    #[error("transaction {tx_hash} failed: {reason}")]
    Receipt { tx_hash: B256, reason: String },

    /// A bridge run died mid-flight. `burn_tx` is populated once funds have
    /// been burned so the transfer can be completed manually.
    #[error("bridge {direction} failed during {stage}: {reason}")]
    Bridge {
        direction: BridgeDirection,
        stage: BridgeStage,
        burn_tx: Option<B256>,
        reason: String,
    },
}

impl Error {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn not_supported(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::NotSupported {
            operation,
            reason: reason.into(),
        }
    }

    pub(crate) fn http(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub(crate) fn api(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Api {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(err: rmp_serde::encode::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}

impl From<alloy::signers::Error> for Error {
    fn from(err: alloy::signers::Error) -> Self {
        Self::Signing(err.to_string())
    }
}

impl From<alloy::contract::Error> for Error {
    fn from(err: alloy::contract::Error) -> Self {
        Self::Rpc(err.to_string())
    }
}

impl From<alloy::transports::TransportError> for Error {
    fn from(err: alloy::transports::TransportError) -> Self {
        Self::Rpc(err.to_string())
    }
}

impl From<alloy::providers::PendingTransactionError> for Error {
    fn from(err: alloy::providers::PendingTransactionError) -> Self {
        Self::Rpc(err.to_string())
    }
}

impl From<alloy::sol_types::Error> for Error {
    fn from(err: alloy::sol_types::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}
