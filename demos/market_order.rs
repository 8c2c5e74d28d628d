//! Opens and closes a perp position from the EVM side through CoreWriter.
//!
//! Reads `PRIVATE_KEY` and `HYPER_EVM_RPC` from the environment or a `.env`
//! file. The signer's HyperCore account must be funded.

use clap::Parser;
use hl_unified::{
    DEFAULT_CLOSE_SLIPPAGE, DEFAULT_SLIPPAGE, Protocol,
    hyperevm::{self, EvmConfig, PrivateKeySigner},
};
use rust_decimal::Decimal;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Asset to trade.
    #[arg(long, default_value = "ETH")]
    asset: String,
    /// Position size in base units.
    #[arg(long, default_value = "0.01")]
    size: Decimal,
    /// Sell instead of buy.
    #[arg(long)]
    sell: bool,
    /// Close the resulting position again.
    #[arg(long)]
    close: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _ = simple_logger::init_with_level(log::Level::Info);

    let args = Cli::parse();
    let signer: PrivateKeySigner = std::env::var("PRIVATE_KEY")?.parse()?;
    let rpc = std::env::var("HYPER_EVM_RPC")?.parse()?;

    let mut client = hyperevm::Client::new(EvmConfig::new(signer, rpc));
    client.connect().await?;
    println!("Trading as {}", client.trading_address()?);

    let mid = client.market_mid(&args.asset).await?;
    println!("{} mid: {mid}", args.asset);

    let receipt = client
        .market_order(&args.asset, !args.sell, args.size, DEFAULT_SLIPPAGE, None)
        .await?;
    println!("Order sent: tx={:?}", receipt.tx_hash);

    if args.close {
        // CoreWriter actions land on core asynchronously; give the fill a
        // moment before reading the position back.
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        match client.position(&args.asset).await? {
            Some(position) => {
                println!("Open position: szi={} entry={:?}", position.szi, position.entry_px);
                let close = client
                    .market_close_position(&args.asset, None, DEFAULT_CLOSE_SLIPPAGE, None)
                    .await?;
                println!("Close sent: tx={:?}", close.tx_hash);
            }
            None => println!("No position to close (order may not have filled)"),
        }
    }

    Ok(())
}
