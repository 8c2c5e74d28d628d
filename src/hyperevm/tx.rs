//! Transaction dispatch helpers shared by the CoreWriter and strategy paths.

use std::time::Duration;

use alloy::{
    network::Ethereum,
    primitives::B256,
    providers::PendingTransactionBuilder,
};

use crate::error::{Error, Result};

/// Waits out a pending transaction and checks its receipt status.
pub(super) async fn confirm(
    pending: PendingTransactionBuilder<Ethereum>,
    action: &'static str,
    timeout: Duration,
) -> Result<B256> {
    let tx_hash = *pending.tx_hash();
    log::info!("Transaction sent for action={action} hash={tx_hash}");

    let receipt = pending.with_timeout(Some(timeout)).get_receipt().await?;
    if !receipt.status() {
        return Err(Error::Receipt {
            tx_hash,
            reason: "transaction reverted".to_string(),
        });
    }

    log::info!(
        "Transaction confirmed for action={action} hash={tx_hash} block={}",
        receipt.block_number.unwrap_or_default(),
    );
    Ok(tx_hash)
}
