//! # xnft-cli: Command Line Tool for the Bridge
//!
//! Provides the `xnft` binary.
//!
//! ## Subcommands
//!
//! - `xnft codec split|join`: the 256-to-128 asset id codec.
//! - `xnft payload`: encode a transfer payload as field elements.
//! - `xnft simulate`: run a YAML scenario against an in-memory deployment
//!   and print every emitted event as a JSON line.
//!
//! ```bash
//! xnft codec split 0x704885973187
//! xnft payload --remote-collection 0x1234 --counterparty 0xabc \
//!     --collection 0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0 --ids 1,2,3
//! xnft simulate crates/xnft-cli/scenarios/round_trip.yaml
//! ```

pub mod codec;
pub mod simulate;
