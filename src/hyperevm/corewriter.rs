//! Raw action encoding for the CoreWriter system contract.
//!
//! Every action is `0x01` (encoding version), a 3-byte big-endian action
//! index, then the ABI-encoded argument tuple. Prices and sizes arrive
//! already scaled to the venue's 8-decimal fixed point; USDC amounts to 6.

use alloy::{
    primitives::{Address, Bytes},
    sol_types::{SolType, SolValue, sol_data},
};

use crate::protocol::Tif;

const ENCODING_VERSION: u8 = 1;

/// CoreWriter action indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ActionId {
    LimitOrder = 1,
    VaultTransfer = 2,
    TokenDelegate = 3,
    StakingDeposit = 4,
    StakingWithdraw = 5,
    SpotSend = 6,
    PerpSend = 7,
    UsdClassToPerp = 8,
    UsdClassToSpot = 9,
    CancelByOid = 10,
    CancelByCloid = 11,
    ApproveBuilderFee = 12,
}

impl ActionId {
    pub const fn index(self) -> u32 {
        self as u32
    }
}

fn encode(id: ActionId, args: Vec<u8>) -> Bytes {
    let mut data = Vec::with_capacity(4 + args.len());
    data.push(ENCODING_VERSION);
    data.extend_from_slice(&id.index().to_be_bytes()[1..]);
    data.extend_from_slice(&args);
    data.into()
}

/// Limit order. An absent cloid encodes as zero.
pub fn limit_order(
    asset: u32,
    is_buy: bool,
    limit_px: u64,
    sz: u64,
    reduce_only: bool,
    tif: Tif,
    cloid: u128,
) -> Bytes {
    encode(
        ActionId::LimitOrder,
        <(
            sol_data::Uint<32>,
            sol_data::Bool,
            sol_data::Uint<64>,
            sol_data::Uint<64>,
            sol_data::Bool,
            sol_data::Uint<8>,
            sol_data::Uint<128>,
        )>::abi_encode_params(&(
            asset,
            is_buy,
            limit_px,
            sz,
            reduce_only,
            tif.encoding(),
            cloid,
        )),
    )
}

pub fn cancel_by_oid(asset: u32, oid: u64) -> Bytes {
    encode(ActionId::CancelByOid, (asset, oid).abi_encode_params())
}

pub fn cancel_by_cloid(asset: u32, cloid: u128) -> Bytes {
    encode(ActionId::CancelByCloid, (asset, cloid).abi_encode_params())
}

/// `usd` is in microdollars.
pub fn vault_transfer(vault: Address, is_deposit: bool, usd: u64) -> Bytes {
    encode(
        ActionId::VaultTransfer,
        (vault, is_deposit, usd).abi_encode_params(),
    )
}

/// `wei` is the venue's 8-decimal fixed point.
pub fn spot_send(destination: Address, token: u64, wei: u64) -> Bytes {
    encode(
        ActionId::SpotSend,
        (destination, token, wei).abi_encode_params(),
    )
}

pub fn perp_send(destination: Address, usd: u64) -> Bytes {
    encode(ActionId::PerpSend, (destination, usd).abi_encode_params())
}

pub fn usd_class_transfer(ntl: u64, to_perp: bool) -> Bytes {
    let id = if to_perp {
        ActionId::UsdClassToPerp
    } else {
        ActionId::UsdClassToSpot
    };
    encode(id, (ntl,).abi_encode_params())
}

pub fn token_delegate(validator: Address, wei: u64, is_undelegate: bool) -> Bytes {
    encode(
        ActionId::TokenDelegate,
        (validator, wei, is_undelegate).abi_encode_params(),
    )
}

pub fn staking_deposit(wei: u64) -> Bytes {
    encode(ActionId::StakingDeposit, (wei,).abi_encode_params())
}

pub fn staking_withdraw(wei: u64) -> Bytes {
    encode(ActionId::StakingWithdraw, (wei,).abi_encode_params())
}

/// `max_fee_rate` is in tenths of a basis point.
pub fn approve_builder_fee(builder: Address, max_fee_rate: u64) -> Bytes {
    encode(
        ActionId::ApproveBuilderFee,
        (builder, max_fee_rate).abi_encode_params(),
    )
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;
    use hex_literal::hex;

    use super::*;

    #[test]
    fn header_carries_version_and_index() {
        for (data, index) in [
            (staking_deposit(1), 4u32),
            (staking_withdraw(1), 5),
            (usd_class_transfer(1, true), 8),
            (usd_class_transfer(1, false), 9),
            (cancel_by_cloid(0, 0), 11),
        ] {
            assert_eq!(data[0], 1);
            assert_eq!(&data[1..4], &index.to_be_bytes()[1..]);
        }
    }

    #[test]
    fn limit_order_encoding() {
        // 1.0 @ 8 decimals, 0.5 @ 8 decimals, GTC, no cloid.
        let data = limit_order(4, true, 100_000_000, 50_000_000, false, Tif::Gtc, 0);
        assert_eq!(
            data.as_ref(),
            hex!(
                "01" "000001"
                "0000000000000000000000000000000000000000000000000000000000000004"
                "0000000000000000000000000000000000000000000000000000000000000001"
                "0000000000000000000000000000000000000000000000000000000005f5e100"
                "0000000000000000000000000000000000000000000000000000000002faf080"
                "0000000000000000000000000000000000000000000000000000000000000000"
                "0000000000000000000000000000000000000000000000000000000000000002"
                "0000000000000000000000000000000000000000000000000000000000000000"
            )
        );
    }

    #[test]
    fn cancel_by_oid_encoding() {
        let data = cancel_by_oid(4, 82382);
        assert_eq!(
            data.as_ref(),
            hex!(
                "01" "00000a"
                "0000000000000000000000000000000000000000000000000000000000000004"
                "00000000000000000000000000000000000000000000000000000000000141ce"
            )
        );
    }

    #[test]
    fn vault_transfer_encoding() {
        let data = vault_transfer(
            address!("0xa15099a30bbf2e68942d6f4c43d70d04faeab0a0"),
            true,
            5_000_000,
        );
        assert_eq!(
            data.as_ref(),
            hex!(
                "01" "000002"
                "000000000000000000000000a15099a30bbf2e68942d6f4c43d70d04faeab0a0"
                "0000000000000000000000000000000000000000000000000000000000000001"
                "00000000000000000000000000000000000000000000000000000000004c4b40"
            )
        );
    }

    #[test]
    fn cloid_occupies_the_last_word() {
        let data = limit_order(0, false, 1, 1, false, Tif::Ioc, 0x3039);
        let words = &data[4..];
        assert_eq!(words.len(), 7 * 32);
        assert_eq!(&words[6 * 32 + 30..], &[0x30, 0x39]);
    }
}
