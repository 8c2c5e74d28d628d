//! Places a resting limit order on the native backend and cancels it.
//!
//! Reads `PRIVATE_KEY` (and optionally `HL_API_TESTNET`) from the
//! environment or a `.env` file.

use clap::Parser;
use hl_unified::{
    Cloid, Protocol, Tif,
    hypercore::{self, PrivateKeySigner},
};
use rust_decimal::Decimal;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Asset to trade (perp symbol or numeric id).
    #[arg(long, default_value = "ETH")]
    asset: String,
    /// Order size in base units.
    #[arg(long, default_value = "0.01")]
    size: Decimal,
    /// Fractional discount below mid for the resting bid.
    #[arg(long, default_value = "0.05")]
    discount: Decimal,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _ = simple_logger::init_with_level(log::Level::Info);

    let args = Cli::parse();
    let signer: PrivateKeySigner = std::env::var("PRIVATE_KEY")?.parse()?;
    let testnet = std::env::var("HL_API_TESTNET")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(true);

    let mut client = if testnet {
        hypercore::Client::testnet(signer)
    } else {
        hypercore::Client::mainnet(signer)
    };
    client.connect().await?;

    let mid = client.market_mid(&args.asset).await?;
    let px = client
        .round_price(&args.asset, mid * (Decimal::ONE - args.discount))
        .await?;
    let cloid = Cloid::random();

    println!("Placing {} {} @ {px} (mid {mid}), cloid {cloid}", args.size, args.asset);
    let receipt = client
        .limit_order(&args.asset, true, px, args.size, false, Tif::Gtc, Some(cloid))
        .await?;
    println!("Placed: oid={:?} cloid={:?}", receipt.oid, receipt.cloid);

    let cancel = match receipt.oid {
        Some(oid) => client.cancel_order_by_oid(&args.asset, oid).await?,
        None => client.cancel_order_by_cloid(&args.asset, cloid).await?,
    };
    println!("Cancelled {} order(s)", cancel.cancelled);

    Ok(())
}
