//! # hl-unified
//!
//! A unified Rust client for trading on HyperLiquid from either side of the
//! venue:
//! - **HyperCore**: actions are EIP-712/msgpack signed locally and posted to
//!   the exchange REST API.
//! - **HyperEVM**: the same actions are submitted as EVM transactions, either
//!   raw through the CoreWriter system contract or as typed calls into a
//!   strategy contract guarded by merkle verification payloads.
//!
//! Both backends implement [`protocol::Protocol`], so strategy code is
//! written once and runs against either. The EVM side additionally moves
//! USDC between Ethereum mainnet and HyperEVM over CCTP v2
//! ([`hyperevm::Client::bridge_usdc`]).
//!
//! ## Quick start
//!
//! ```no_run
//! use hl_unified::{hypercore, Protocol, Tif};
//! use rust_decimal::dec;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let signer = "0x...".parse()?;
//! let mut client = hypercore::Client::testnet(signer);
//! client.connect().await?;
//!
//! let mid = client.market_mid("ETH").await?;
//! let px = client.round_price("ETH", mid * dec!(0.99)).await?;
//! let receipt = client
//!     .limit_order("ETH", true, px, dec!(0.01), false, Tif::Gtc, None)
//!     .await?;
//! println!("resting oid {:?}", receipt.oid);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: the venue-independent trading surface
//! - [`hypercore`]: native REST backend with local signing
//! - [`hyperevm`]: EVM backend (CoreWriter, strategy contracts, CCTP bridge)
//! - [`units`]: fixed-point scaling and tick rounding

pub mod error;
pub mod hypercore;
pub mod hyperevm;
pub mod protocol;
pub mod units;

pub use alloy::primitives::{Address, B256, address};
pub use rust_decimal::Decimal;

pub use error::{Error, Result};
pub use protocol::{
    ApprovalReceipt, CancelReceipt, Cloid, DelegateReceipt, FillSummary, OidOrCloid,
    OrderReceipt, PerpPosition, Protocol, SendReceipt, StakingReceipt, Tif, TransferReceipt,
    DEFAULT_CLOSE_SLIPPAGE, DEFAULT_SLIPPAGE,
};
