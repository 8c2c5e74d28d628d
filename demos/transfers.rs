//! Moves USDC between the spot and perp accounts on the native backend, and
//! optionally sends spot tokens or perp USDC to another address.
//!
//! Reads `PRIVATE_KEY` (and optionally `HL_API_TESTNET`) from the
//! environment or a `.env` file.

use clap::Parser;
use hl_unified::{
    Address, Protocol,
    hypercore::{self, PrivateKeySigner},
};
use rust_decimal::Decimal;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// USDC to round-trip between spot and perp.
    #[arg(long, default_value = "5")]
    amount: Decimal,
    /// Optional recipient for a perp USDC send.
    #[arg(long)]
    send_to: Option<Address>,
    /// Spot token to send instead of perp USDC (requires --send-to).
    #[arg(long)]
    token: Option<String>,
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

    let user = client.trading_address()?;
    for balance in client.spot_balances(user).await? {
        println!("Spot {}: total={} hold={}", balance.coin, balance.total, balance.hold);
    }

    println!("Moving {} USDC spot -> perp", args.amount);
    client.usd_class_transfer_to_perp(args.amount).await?;
    println!("Moving {} USDC perp -> spot", args.amount);
    client.usd_class_transfer_to_spot(args.amount).await?;

    if let Some(recipient) = args.send_to {
        let receipt = match &args.token {
            Some(token) => {
                println!("Sending {} {token} to {recipient}", args.amount);
                client.spot_send(recipient, token, args.amount).await?
            }
            None => {
                println!("Sending {} perp USDC to {recipient}", args.amount);
                client.perp_send(recipient, args.amount).await?
            }
        };
        println!("Sent {} to {}", receipt.amount, receipt.recipient);
    }

    Ok(())
}
