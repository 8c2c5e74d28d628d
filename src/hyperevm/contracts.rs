//! Contract bindings for the HyperEVM backend.
//!
//! CoreWriter is the system contract every HyperEVM account can push raw
//! core actions through. The strategy contracts wrap the same actions in
//! typed functions guarded by merkle [`VerificationPayload`]s; the
//! HyperLiquid-side strategy also carries the CCTP bridge pair, mirrored on
//! mainnet by [`BridgeStrategy`].

use alloy::{
    primitives::{Address, address},
    sol,
};

/// CoreWriter system contract address, identical on mainnet and testnet.
pub const COREWRITER_ADDRESS: Address = address!("0x3333333333333333333333333333333333333333");

sol! {
    /// Merkle proof attached to every guarded strategy call.
    #[derive(Debug, Default)]
    struct VerificationPayload {
        uint8 verificationType;
        bytes verificationData;
        bytes32[] proof;
    }

    #[sol(rpc)]
    contract CoreWriter {
        function sendRawAction(bytes calldata data) external;
    }

    #[sol(rpc)]
    contract HyperliquidStrategy {
        function subvault() external view returns (address);
        function hypeTokenIndex() external view returns (uint64);

        function placeLimitBuyOrder(
            uint32 asset,
            uint64 limitPx,
            uint64 sz,
            bool reduceOnly,
            uint8 tif,
            uint128 cloid,
            VerificationPayload calldata payload
        ) external;
        function placeLimitSellOrder(
            uint32 asset,
            uint64 limitPx,
            uint64 sz,
            bool reduceOnly,
            uint8 tif,
            uint128 cloid,
            VerificationPayload calldata payload
        ) external;
        function cancelOrderByOid(uint32 asset, uint64 oid, VerificationPayload calldata payload) external;
        function cancelOrderByCloid(uint32 asset, uint128 cloid, VerificationPayload calldata payload) external;

        function withdrawHypeToEvm(uint64 amount, VerificationPayload calldata payload) external;
        function withdrawTokenToEvm(uint64 tokenIndex, uint64 amount, VerificationPayload calldata payload) external;
        function transferSpotToPerp(uint64 amount, VerificationPayload calldata payload) external;
        function transferPerpToSpot(uint64 amount, VerificationPayload calldata payload) external;

        function bridgeUSDCViaCCTPv2(
            uint256 amount,
            uint256 maxFee,
            uint32 minFinalityThreshold,
            VerificationPayload[] calldata payloads
        ) external;
        function receiveUSDCViaCCTPv2(bytes calldata message, bytes calldata attestation) external;
    }

    /// Mainnet-side bridge endpoint; exposes only the CCTP pair.
    #[sol(rpc)]
    contract BridgeStrategy {
        function bridgeUSDCViaCCTPv2(
            uint256 amount,
            uint256 maxFee,
            uint32 minFinalityThreshold,
            VerificationPayload[] calldata payloads
        ) external;
        function receiveUSDCViaCCTPv2(bytes calldata message, bytes calldata attestation) external;
    }

    #[sol(rpc)]
    contract FlexibleVaultVerifier {
        function merkleRoot() external view returns (bytes32);
    }
}
