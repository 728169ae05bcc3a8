//! # Codec Subcommands
//!
//! - `codec split <asset-id>` prints `{"low": .., "high": ..}`.
//! - `codec join <low> <high>` prints the decimal asset id.
//! - `payload` prints the encoded transfer payload as a JSON array of
//!   field elements, in the layout carried by deposit messages.
//!
//! Numbers are accepted in decimal or `0x`-prefixed hex.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use xnft_core::{join_asset_id, split_asset_id, Address, AssetId, Felt, SplitAssetId, TransferPayload};

/// Arguments for `xnft codec`.
#[derive(Args, Debug)]
pub struct CodecArgs {
    #[command(subcommand)]
    pub command: CodecCommand,
}

/// Codec subcommands.
#[derive(Subcommand, Debug)]
pub enum CodecCommand {
    /// Split a 256-bit asset id into two 128-bit limbs.
    Split {
        /// Asset id.
        asset_id: String,
    },

    /// Join two 128-bit limbs into an asset id.
    Join {
        /// Lower 128 bits.
        low: String,
        /// Upper 128 bits.
        high: String,
    },
}

/// Arguments for `xnft payload`.
#[derive(Args, Debug)]
pub struct PayloadArgs {
    /// Collection on the remote domain.
    #[arg(long)]
    pub remote_collection: String,

    /// Remote recipient of the assets.
    #[arg(long)]
    pub counterparty: String,

    /// Collection on the local domain.
    #[arg(long)]
    pub collection: String,

    /// Comma-separated asset ids.
    #[arg(long, value_delimiter = ',', required = true)]
    pub ids: Vec<String>,
}

/// Execute `xnft codec`.
pub fn run_codec(args: &CodecArgs) -> Result<u8> {
    match &args.command {
        CodecCommand::Split { asset_id } => {
            let split = split(asset_id)?;
            println!("{}", serde_json::to_string(&split)?);
        }
        CodecCommand::Join { low, high } => {
            println!("{}", join(low, high)?);
        }
    }
    Ok(0)
}

/// Execute `xnft payload`.
pub fn run_payload(args: &PayloadArgs) -> Result<u8> {
    let words = encode_payload(args)?;
    println!("{}", serde_json::to_string_pretty(&words)?);
    Ok(0)
}

pub fn split(asset_id: &str) -> Result<SplitAssetId> {
    let id: AssetId = asset_id
        .parse()
        .with_context(|| format!("invalid asset id {asset_id:?}"))?;
    Ok(split_asset_id(&id))
}

pub fn join(low: &str, high: &str) -> Result<AssetId> {
    let low: Felt = low.parse().with_context(|| format!("invalid low limb {low:?}"))?;
    let high: Felt = high.parse().with_context(|| format!("invalid high limb {high:?}"))?;
    Ok(join_asset_id(&low, &high)?)
}

pub fn encode_payload(args: &PayloadArgs) -> Result<Vec<Felt>> {
    let remote_collection: Felt = args
        .remote_collection
        .parse()
        .context("invalid --remote-collection")?;
    let counterparty: Felt = args.counterparty.parse().context("invalid --counterparty")?;
    let collection: Address = args.collection.parse().context("invalid --collection")?;
    let ids = args
        .ids
        .iter()
        .map(|id| id.parse::<AssetId>().with_context(|| format!("invalid asset id {id:?}")))
        .collect::<Result<Vec<_>>>()?;
    Ok(TransferPayload::deposit(remote_collection, counterparty, &collection, &ids).encode())
}
