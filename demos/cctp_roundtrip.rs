//! Bridges USDC from Ethereum mainnet to HyperEVM over CCTP v2 and back.
//!
//! Reads `PRIVATE_KEY`, `HYPER_EVM_RPC`, `MN_EVM_RPC`,
//! `HYPERLIQUID_STRATEGY`, `BRIDGE_STRATEGY` and optionally
//! `BRIDGE_AMOUNT_USDC` from the environment or a `.env` file.

use clap::Parser;
use hl_unified::{
    Error, Protocol,
    hyperevm::{self, BridgeDirection, EvmConfig, PrivateKeySigner, Target},
};
use rust_decimal::{Decimal, dec};

/// Runs one bridge leg, resuming by hand when the run dies after the burn.
async fn bridge_leg(
    client: &hyperevm::Client,
    direction: BridgeDirection,
    amount: Decimal,
) -> anyhow::Result<()> {
    match client.bridge_usdc(direction, amount, None, None).await {
        Ok(receipt) => {
            println!(
                "Bridged {} USDC [{direction}]: burn={} claim={}",
                receipt.amount, receipt.burn_tx, receipt.claim_tx,
            );
            Ok(())
        }
        Err(Error::Bridge {
            burn_tx: Some(burn_tx),
            stage,
            ..
        }) => {
            // Funds are already burned; finish the transfer manually.
            println!("Bridge failed during {stage} (burn {burn_tx}), resuming");
            let (message, attestation) = client.poll_attestation(direction, burn_tx).await?;
            let claim_tx = client.claim_usdc(direction, message, attestation).await?;
            println!("Resumed claim landed: {claim_tx}");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Bridge back to mainnet after the inbound leg settles.
    #[arg(long)]
    round_trip: bool,
    /// Send default verification payloads instead of resolving proofs.
    #[arg(long)]
    no_verification: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _ = simple_logger::init_with_level(log::Level::Debug);

    let args = Cli::parse();
    let signer: PrivateKeySigner = std::env::var("PRIVATE_KEY")?.parse()?;
    let amount: Decimal = std::env::var("BRIDGE_AMOUNT_USDC")
        .map(|value| value.parse())
        .unwrap_or(Ok(dec!(10)))?;

    let mut config = EvmConfig::new(signer, std::env::var("HYPER_EVM_RPC")?.parse()?);
    config.mainnet_rpc_url = Some(std::env::var("MN_EVM_RPC")?.parse()?);
    config.target = Target::Strategy {
        hyperliquid: std::env::var("HYPERLIQUID_STRATEGY")?.parse()?,
        bridge: Some(std::env::var("BRIDGE_STRATEGY")?.parse()?),
    };
    config.disable_call_verification = args.no_verification;

    let mut client = hyperevm::Client::new(config);
    client.connect().await?;
    println!("Subvault: {}", client.trading_address()?);

    bridge_leg(&client, BridgeDirection::MainnetToHyper, amount).await?;
    if args.round_trip {
        bridge_leg(&client, BridgeDirection::HyperToMainnet, amount).await?;
    }

    Ok(())
}
