//! Solidity struct definitions for EIP-712 signing.
//!
//! [`Agent`] is the envelope for RMP-hashed actions: the keccak digest of
//! the serialized action becomes `connectionId`, and the signature is made
//! over this struct against the core exchange domain. User-signed actions
//! do not appear here because their primary types are namespaced with a
//! colon (`HyperliquidTransaction:UsdSend`), which is not a legal Solidity
//! identifier; their typed data is assembled in the parent module instead.

use alloy::sol;

sol! {
    struct Agent {
        string source;
        bytes32 connectionId;
    }
}
