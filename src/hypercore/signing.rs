//! Action signing for the HyperCore exchange endpoint.
//!
//! Two signing families exist. Trading actions (orders, cancels, vault
//! transfers) are MessagePack-hashed and the digest is signed as the
//! `connectionId` of an EIP-712 [`solidity::Agent`] struct. User-signed
//! actions (sends, class transfers, delegation, staking, builder approval)
//! sign their own EIP-712 typed data directly.

use alloy::{
    dyn_abi::TypedData,
    primitives::{Address, B256},
    signers::SignerSync,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::hypercore::types::{
    Action, ActionRequest, ApproveBuilderFee, BatchCancel, BatchCancelCloid, BatchOrder,
    CDeposit, CORE_EIP712_DOMAIN, CWithdraw, Chain, Signature, SpotSend, TokenDelegate, UsdSend,
    UsdClassTransfer, VaultTransfer, solidity,
};

/// Supplies EIP-712 typed data for actions that sign structured data
/// directly. RMP-hashed actions use the default `None`.
pub(super) trait TypedDataProvider {
    fn typed_data(&self) -> Option<Result<TypedData>> {
        None
    }
}

impl TypedDataProvider for BatchOrder {}
impl TypedDataProvider for BatchCancel {}
impl TypedDataProvider for BatchCancelCloid {}
impl TypedDataProvider for VaultTransfer {}

macro_rules! provides_typed_data {
    ($($ty:ty),* $(,)?) => {
        $(impl TypedDataProvider for $ty {
            fn typed_data(&self) -> Option<Result<TypedData>> {
                Some(<$ty>::typed_data(self))
            }
        })*
    };
}

provides_typed_data!(
    UsdSend,
    SpotSend,
    UsdClassTransfer,
    TokenDelegate,
    CDeposit,
    CWithdraw,
    ApproveBuilderFee,
);

/// Turns an action into a signed [`ActionRequest`] ready for `/exchange`.
pub(super) trait Signable: Serialize + TypedDataProvider {
    fn sign<S: SignerSync>(
        self,
        signer: &S,
        nonce: u64,
        vault_address: Option<Address>,
        expires_after: Option<DateTime<Utc>>,
        chain: Chain,
    ) -> Result<ActionRequest>;
}

macro_rules! signable_rmp {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl Signable for $ty {
            fn sign<S: SignerSync>(
                self,
                signer: &S,
                nonce: u64,
                vault_address: Option<Address>,
                expires_after: Option<DateTime<Utc>>,
                chain: Chain,
            ) -> Result<ActionRequest> {
                sign_rmp(
                    signer,
                    Action::$variant(self),
                    nonce,
                    vault_address,
                    expires_after,
                    chain,
                )
            }
        })*
    };
}

signable_rmp!(
    BatchOrder => Order,
    BatchCancel => Cancel,
    BatchCancelCloid => CancelByCloid,
    VaultTransfer => VaultTransfer,
);

macro_rules! signable_eip712 {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl Signable for $ty {
            fn sign<S: SignerSync>(
                self,
                signer: &S,
                nonce: u64,
                _vault_address: Option<Address>,
                _expires_after: Option<DateTime<Utc>>,
                _chain: Chain,
            ) -> Result<ActionRequest> {
                let typed_data = <$ty>::typed_data(&self)?;
                sign_eip712(signer, Action::$variant(self), typed_data, nonce)
            }
        })*
    };
}

signable_eip712!(
    UsdSend => UsdSend,
    SpotSend => SpotSend,
    UsdClassTransfer => UsdClassTransfer,
    TokenDelegate => TokenDelegate,
    CDeposit => CDeposit,
    CWithdraw => CWithdraw,
    ApproveBuilderFee => ApproveBuilderFee,
);

/// Signs an action whose typed data is the message itself.
pub(super) fn sign_eip712<S: SignerSync>(
    signer: &S,
    action: Action,
    typed_data: TypedData,
    nonce: u64,
) -> Result<ActionRequest> {
    let signature = signer.sign_dynamic_typed_data_sync(&typed_data)?;

    Ok(ActionRequest {
        action,
        signature: signature.into(),
        nonce,
        vault_address: None,
        expires_after: None,
    })
}

/// Signs an action through the MessagePack hash + Agent envelope.
pub(super) fn sign_rmp<S: SignerSync>(
    signer: &S,
    action: Action,
    nonce: u64,
    vault_address: Option<Address>,
    expires_after: Option<DateTime<Utc>>,
    chain: Chain,
) -> Result<ActionRequest> {
    let expires_after = expires_after.map(|after| after.timestamp_millis() as u64);
    let connection_id = action.hash(nonce, vault_address, expires_after)?;
    let signature = sign_l1_action(signer, chain, connection_id)?;

    Ok(ActionRequest {
        action,
        signature,
        nonce,
        vault_address,
        expires_after,
    })
}

/// Signs a connection id against the core exchange domain. The agent
/// `source` selects mainnet ("a") or testnet ("b").
pub(super) fn sign_l1_action<S: SignerSync>(
    signer: &S,
    chain: Chain,
    connection_id: B256,
) -> Result<Signature> {
    let sig = signer.sign_typed_data_sync(
        &solidity::Agent {
            source: if chain.is_mainnet() { "a" } else { "b" }.to_string(),
            connectionId: connection_id,
        },
        &CORE_EIP712_DOMAIN,
    )?;
    Ok(sig.into())
}

#[cfg(test)]
mod tests {
    use alloy::signers::local::PrivateKeySigner;
    use rust_decimal::dec;

    use super::*;
    use crate::hypercore::types::{self, SIGNATURE_CHAIN_ID};

    fn get_signer() -> PrivateKeySigner {
        let priv_key = "e908f86dbb4d55ac876378565aafeabc187f6690f046459397b17d9b9a19688e";
        priv_key.parse::<PrivateKeySigner>().unwrap()
    }

    #[test]
    fn test_sign_usd_transfer_action() {
        let signer = get_signer();

        let usd_send = types::UsdSend {
            signature_chain_id: SIGNATURE_CHAIN_ID,
            hyperliquid_chain: Chain::Mainnet,
            destination: "0x0D1d9635D0640821d15e323ac8AdADfA9c111414"
                .parse()
                .unwrap(),
            amount: rust_decimal::Decimal::ONE,
            time: 1690393044548,
        };
        let typed_data = usd_send.typed_data().unwrap();
        let signature = signer.sign_dynamic_typed_data_sync(&typed_data).unwrap();

        let expected_sig = "0xeca6267bcaadc4c0ae1aed73f5a2c45fcdbb7271f2e9356992404e5d4bad75a3572e08fe93f17755abadb7f84be7d1e9c4ce48bb5633e339bc430c672d5a20ed1b";
        assert_eq!(signature.to_string(), expected_sig);
    }

    #[test]
    fn rmp_and_user_signed_requests_carry_the_nonce() {
        let signer = get_signer();

        let cancel = BatchCancel {
            cancels: vec![types::CancelRequest {
                asset: 1,
                oid: 82382,
            }],
        };
        let req = cancel
            .sign(&signer, 1583838, None, None, Chain::Mainnet)
            .unwrap();
        assert_eq!(req.nonce, 1583838);
        assert!(req.vault_address.is_none());

        let transfer = UsdClassTransfer {
            signature_chain_id: SIGNATURE_CHAIN_ID,
            hyperliquid_chain: Chain::Testnet,
            amount: dec!(25),
            to_perp: true,
            nonce: 1583839,
        };
        let req = transfer
            .sign(&signer, 1583839, None, None, Chain::Testnet)
            .unwrap();
        assert_eq!(req.nonce, 1583839);
    }

    #[test]
    fn network_selects_the_agent_source() {
        let signer = get_signer();
        let id = B256::repeat_byte(7);

        let mainnet = sign_l1_action(&signer, Chain::Mainnet, id).unwrap();
        let testnet = sign_l1_action(&signer, Chain::Testnet, id).unwrap();
        assert_ne!(mainnet, testnet);
    }
}
