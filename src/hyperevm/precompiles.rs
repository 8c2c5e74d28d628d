//! HyperCore read precompiles.
//!
//! The `0x…0800` address block exposes core state to HyperEVM through plain
//! `eth_call`s: no selectors, the calldata is the ABI-encoded argument and
//! the return data the ABI-encoded result.

use alloy::{
    network::{Ethereum, TransactionBuilder},
    primitives::{Address, Bytes, address},
    providers::{DynProvider, Provider},
    rpc::types::TransactionRequest,
    sol_types::{SolType, SolValue, sol_data},
};

use crate::error::Result;

pub const MARK_PX: Address = address!("0x0000000000000000000000000000000000000806");
pub const PERP_ASSET_INFO: Address = address!("0x000000000000000000000000000000000000080a");
pub const SPOT_INFO: Address = address!("0x000000000000000000000000000000000000080b");
pub const TOKEN_INFO: Address = address!("0x000000000000000000000000000000000000080C");
pub const BBO: Address = address!("0x000000000000000000000000000000000000080e");
pub const CORE_USER_EXISTS: Address = address!("0x0000000000000000000000000000000000000810");

async fn read(
    provider: &DynProvider<Ethereum>,
    precompile: Address,
    calldata: Bytes,
) -> Result<Bytes> {
    let request = TransactionRequest::default()
        .with_to(precompile)
        .with_input(calldata);
    Ok(provider.call(request).await?)
}

/// Best bid and ask in the asset's raw price scale. Either side may be zero
/// when the book is empty.
pub async fn bbo(provider: &DynProvider<Ethereum>, asset: u32) -> Result<(u64, u64)> {
    let out = read(provider, BBO, asset.abi_encode().into()).await?;
    Ok(<(u64, u64)>::abi_decode_params(&out)?)
}

pub async fn mark_px(provider: &DynProvider<Ethereum>, asset: u32) -> Result<u64> {
    let out = read(provider, MARK_PX, asset.abi_encode().into()).await?;
    Ok(u64::abi_decode(&out)?)
}

/// Size decimals of a perp asset, from `perpAssetInfo`.
pub async fn perp_sz_decimals(provider: &DynProvider<Ethereum>, asset: u32) -> Result<u32> {
    let out = read(provider, PERP_ASSET_INFO, asset.abi_encode().into()).await?;
    // (coin, marginTableId, szDecimals, maxLeverage, onlyIsolated)
    let ((_, _, sz_decimals, _, _),) = <((
        sol_data::String,
        sol_data::Uint<32>,
        sol_data::Uint<8>,
        sol_data::Uint<8>,
        sol_data::Bool,
    ),)>::abi_decode_params(&out)?;
    Ok(sz_decimals as u32)
}

/// Base token index of a spot pair, from `spotInfo`.
pub async fn spot_base_token(provider: &DynProvider<Ethereum>, spot: u32) -> Result<u64> {
    let out = read(provider, SPOT_INFO, spot.abi_encode().into()).await?;
    let ((_, tokens),) = <((String, [u64; 2]),)>::abi_decode_params(&out)?;
    Ok(tokens[0])
}

/// Size decimals of a spot token, from `tokenInfo`.
pub async fn token_sz_decimals(provider: &DynProvider<Ethereum>, token: u64) -> Result<u32> {
    let out = read(provider, TOKEN_INFO, (token as u32).abi_encode().into()).await?;
    // (name, spots, deployerTradingFeeShare, deployer, evmContract,
    //  szDecimals, weiDecimals, evmExtraWeiDecimals)
    let (_, _, _, _, _, sz_decimals, _, _) = <(
        sol_data::String,
        sol_data::Array<sol_data::Uint<64>>,
        sol_data::Uint<64>,
        sol_data::Address,
        sol_data::Address,
        sol_data::Uint<8>,
        sol_data::Uint<8>,
        sol_data::Int<8>,
    )>::abi_decode_params(&out)?;
    Ok(sz_decimals as u32)
}

pub async fn core_user_exists(provider: &DynProvider<Ethereum>, user: Address) -> Result<bool> {
    let out = read(provider, CORE_USER_EXISTS, user.abi_encode().into()).await?;
    Ok(bool::abi_decode(&out)?)
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn arguments_encode_as_single_words() {
        let calldata: Bytes = 4u32.abi_encode().into();
        assert_eq!(
            calldata.as_ref(),
            hex!("0000000000000000000000000000000000000000000000000000000000000004")
        );

        let user = address!("0x0d1d9635d0640821d15e323ac8adadfa9c111414");
        let calldata: Bytes = user.abi_encode().into();
        assert_eq!(
            calldata.as_ref(),
            hex!("0000000000000000000000000d1d9635d0640821d15e323ac8adadfa9c111414")
        );
    }

    #[test]
    fn bbo_words_decode_as_two_uint64() {
        let raw = hex!(
            "00000000000000000000000000000000000000000000000000000000000186a0"
            "00000000000000000000000000000000000000000000000000000000000186aa"
        );
        let (bid, ask) = <(u64, u64)>::abi_decode_params(&raw).unwrap();
        assert_eq!((bid, ask), (100_000, 100_010));
    }
}
