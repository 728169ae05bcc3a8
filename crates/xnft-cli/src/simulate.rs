//! # Simulate Subcommand
//!
//! Replays a YAML scenario against a [`LocalDeployment`] and prints every
//! event the controller emits as one JSON line on stdout.
//!
//! ```yaml
//! name: round trip
//! port:
//!   cancellation_delay_secs: 0
//! collections:
//!   - address: "0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0"
//!     accessor: { kind: ownable, owner: "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a" }
//!     holder: "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"
//!     mint: 2
//! steps:
//!   - action: deposit
//!     caller: "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"
//!     collection: "0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0"
//!     ids: ["1", "2"]
//!     recipient: "0x1"
//!   - action: withdraw
//!     collection: "0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0"
//!     ids: ["1", "2"]
//!     claimant: "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"
//!     expect_error: invalid message
//! ```
//!
//! Addresses, field elements and asset ids are quoted strings. A step with
//! `expect_error` must fail with an error whose message contains that text.
//! The run stops at the first step that does not behave as scripted.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use serde::Deserialize;

use xnft_bridge::{DepositReceipt, LocalDeployment, LocalDeploymentOptions};
use xnft_core::{Address, AssetId, Felt};
use xnft_ledger::{AssetLedger, OwnerAccessor};
use xnft_messaging::PortConfig;

/// Arguments for `xnft simulate`.
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Path to the scenario YAML file.
    pub scenario: PathBuf,
}

/// A scripted run.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Free-form label, logged at start.
    #[serde(default)]
    pub name: Option<String>,
    /// In-memory port settings.
    #[serde(default)]
    pub port: PortConfig,
    /// Override of the per-message asset limit.
    #[serde(default)]
    pub max_assets_per_message: Option<usize>,
    /// Collections deployed before the first step.
    #[serde(default)]
    pub collections: Vec<CollectionSetup>,
    /// Steps, run in order.
    pub steps: Vec<Step>,
}

/// A collection deployed at scenario start. Registration with the bridge
/// is a step of its own.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionSetup {
    pub address: Address,
    pub accessor: OwnerAccessor,
    /// Receives the minted assets and approves the controller as operator.
    pub holder: Address,
    /// Number of assets minted, with ids from 1.
    pub mint: u64,
}

/// One scenario step.
#[derive(Debug, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,
    #[serde(default)]
    pub expect_error: Option<String>,
}

/// What a step does.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    RegisterToken {
        caller: Address,
        collection: Address,
        remote: Felt,
    },
    Deposit {
        caller: Address,
        collection: Address,
        ids: Vec<AssetId>,
        recipient: Felt,
    },
    /// The remote bridge handles the deposit sent with `nonce`.
    RelayDeposit {
        nonce: u64,
    },
    InitiateCancel {
        caller: Address,
        collection: Address,
        ids: Vec<AssetId>,
        recipient: Felt,
        nonce: u64,
    },
    CompleteCancel {
        caller: Address,
        collection: Address,
        ids: Vec<AssetId>,
        recipient: Felt,
        nonce: u64,
        return_to: Address,
    },
    /// The remote bridge sends a withdrawal message.
    BridgeBack {
        collection: Address,
        ids: Vec<AssetId>,
        claimant: Address,
    },
    Withdraw {
        collection: Address,
        ids: Vec<AssetId>,
        claimant: Address,
    },
    AdvanceClock {
        secs: u64,
    },
    /// The escrow admin grants the controller `Withdrawer`.
    GrantWithdrawer,
    /// The escrow admin revokes the controller's `Withdrawer`.
    RevokeWithdrawer,
    AssertOwner {
        collection: Address,
        asset: AssetId,
        owner: Address,
    },
    AssertWithdrawable {
        collection: Address,
        ids: Vec<AssetId>,
        claimant: Address,
        expected: bool,
    },
}

impl Action {
    /// Step name as written in the scenario.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RegisterToken { .. } => "register_token",
            Self::Deposit { .. } => "deposit",
            Self::RelayDeposit { .. } => "relay_deposit",
            Self::InitiateCancel { .. } => "initiate_cancel",
            Self::CompleteCancel { .. } => "complete_cancel",
            Self::BridgeBack { .. } => "bridge_back",
            Self::Withdraw { .. } => "withdraw",
            Self::AdvanceClock { .. } => "advance_clock",
            Self::GrantWithdrawer => "grant_withdrawer",
            Self::RevokeWithdrawer => "revoke_withdrawer",
            Self::AssertOwner { .. } => "assert_owner",
            Self::AssertWithdrawable { .. } => "assert_withdrawable",
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationReport {
    pub steps: usize,
    pub expected_failures: usize,
    pub events: usize,
}

impl Scenario {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }
}

/// Execute `xnft simulate`.
pub fn run_simulate(args: &SimulateArgs) -> Result<u8> {
    let scenario = Scenario::load(&args.scenario)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let report = run_scenario(&scenario, &mut out)?;
    tracing::info!(
        steps = report.steps,
        expected_failures = report.expected_failures,
        events = report.events,
        "scenario complete"
    );
    Ok(0)
}

/// Run every step of `scenario`, writing emitted events to `out`.
pub fn run_scenario(scenario: &Scenario, out: &mut dyn Write) -> Result<SimulationReport> {
    let mut sim = Simulator::new(scenario)?;
    if let Some(name) = &scenario.name {
        tracing::info!(%name, steps = scenario.steps.len(), "running scenario");
    }

    let mut report = SimulationReport {
        steps: 0,
        expected_failures: 0,
        events: 0,
    };
    for (index, step) in scenario.steps.iter().enumerate() {
        let kind = step.action.kind();
        let outcome = sim.apply(&step.action);
        match (&step.expect_error, outcome) {
            (None, Ok(())) => {}
            (None, Err(err)) => {
                return Err(err.context(format!("step {index} ({kind}) failed")));
            }
            (Some(expected), Ok(())) => {
                bail!("step {index} ({kind}) succeeded, expected an error containing {expected:?}");
            }
            (Some(expected), Err(err)) => {
                let message = format!("{err:#}");
                if !message.contains(expected.as_str()) {
                    bail!("step {index} ({kind}) failed with {message:?}, expected an error containing {expected:?}");
                }
                tracing::debug!(index, kind, error = %message, "step failed as expected");
                report.expected_failures += 1;
            }
        }
        for event in sim.deployment.controller.drain_events() {
            writeln!(out, "{}", serde_json::to_string(&event)?)?;
            report.events += 1;
        }
        report.steps += 1;
    }
    Ok(report)
}

struct Simulator {
    deployment: LocalDeployment,
    receipts: BTreeMap<u64, DepositReceipt>,
}

impl Simulator {
    fn new(scenario: &Scenario) -> Result<Self> {
        let mut options = LocalDeploymentOptions {
            port: scenario.port.clone(),
            ..LocalDeploymentOptions::default()
        };
        if let Some(max) = scenario.max_assets_per_message {
            options.bridge.max_assets_per_message = max;
        }
        options.bridge.validate()?;

        let mut deployment = LocalDeployment::new(options)?;
        for setup in &scenario.collections {
            deployment
                .collection_with_holder(setup.address, setup.accessor, &setup.holder, setup.mint)
                .with_context(|| format!("failed to deploy collection {}", setup.address))?;
        }
        // Wiring events are not part of the scripted output.
        deployment.controller.drain_events();
        Ok(Self {
            deployment,
            receipts: BTreeMap::new(),
        })
    }

    fn apply(&mut self, action: &Action) -> Result<()> {
        let controller = &mut self.deployment.controller;
        match action {
            Action::RegisterToken {
                caller,
                collection,
                remote,
            } => controller.register_token(caller, *collection, *remote)?,
            Action::Deposit {
                caller,
                collection,
                ids,
                recipient,
            } => {
                let receipt = controller.deposit(caller, collection, ids, *recipient)?;
                self.receipts.insert(receipt.nonce, receipt);
            }
            Action::RelayDeposit { nonce } => {
                let receipt = self
                    .receipts
                    .get(nonce)
                    .ok_or_else(|| anyhow!("no deposit with nonce {nonce} in this scenario"))?;
                self.deployment.relay_deposit(&receipt.message_hash)?;
            }
            Action::InitiateCancel {
                caller,
                collection,
                ids,
                recipient,
                nonce,
            } => {
                controller.initiate_cancel_deposit(caller, collection, ids, *recipient, *nonce)?;
            }
            Action::CompleteCancel {
                caller,
                collection,
                ids,
                recipient,
                nonce,
                return_to,
            } => controller.complete_cancel_deposit(caller, collection, ids, *recipient, *nonce, return_to)?,
            Action::BridgeBack {
                collection,
                ids,
                claimant,
            } => {
                self.deployment.bridge_back(collection, ids, claimant)?;
            }
            Action::Withdraw {
                collection,
                ids,
                claimant,
            } => controller.withdraw(collection, ids, claimant)?,
            Action::AdvanceClock { secs } => self.deployment.clock.advance(*secs),
            Action::GrantWithdrawer => {
                let bridge = controller.address();
                controller.escrow().grant_withdrawer(&self.deployment.admin, bridge)?;
            }
            Action::RevokeWithdrawer => {
                let bridge = controller.address();
                controller.escrow().revoke_withdrawer(&self.deployment.admin, &bridge)?;
            }
            Action::AssertOwner {
                collection,
                asset,
                owner,
            } => {
                let actual = controller.ledger().owner_of(collection, asset)?;
                if actual != *owner {
                    bail!("asset {asset} of {collection} is owned by {actual}, not {owner}");
                }
            }
            Action::AssertWithdrawable {
                collection,
                ids,
                claimant,
                expected,
            } => {
                let actual = controller.is_withdrawable(collection, ids, claimant);
                if actual != *expected {
                    bail!("is_withdrawable returned {actual}, expected {expected}");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROUND_TRIP: &str = include_str!("../scenarios/round_trip.yaml");
    const CANCEL: &str = include_str!("../scenarios/cancel_deposit.yaml");
    const OWNERLESS: &str = include_str!("../scenarios/ownerless_collection.yaml");

    fn run(yaml: &str) -> Result<(SimulationReport, Vec<serde_json::Value>)> {
        let scenario = Scenario::from_yaml_str(yaml)?;
        let mut out = Vec::new();
        let report = run_scenario(&scenario, &mut out)?;
        let events = String::from_utf8(out)?
            .lines()
            .map(serde_json::from_str)
            .collect::<Result<Vec<serde_json::Value>, _>>()?;
        Ok((report, events))
    }

    fn kinds(events: &[serde_json::Value]) -> Vec<&str> {
        events.iter().filter_map(|e| e["event"].as_str()).collect()
    }

    #[test]
    fn bundled_round_trip_runs() {
        let (report, events) = run(ROUND_TRIP).unwrap();
        assert_eq!(report.events, events.len());
        assert_eq!(kinds(&events), vec!["token_registered", "deposit", "withdraw"]);
        assert_eq!(events[1]["asset_ids"], serde_json::json!(["1", "2", "3"]));
        assert!(report.expected_failures >= 1);
    }

    #[test]
    fn bundled_cancel_runs() {
        let (_, events) = run(CANCEL).unwrap();
        assert_eq!(
            kinds(&events),
            vec!["token_registered", "deposit", "deposit_cancel_initiated", "deposit_cancelled"]
        );
    }

    #[test]
    fn bundled_ownerless_runs() {
        let (report, _) = run(OWNERLESS).unwrap();
        assert_eq!(report.expected_failures, 1);
    }

    #[test]
    fn unexpected_failure_stops_the_run() {
        let yaml = r#"
steps:
  - action: withdraw
    collection: "0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0"
    ids: ["1"]
    claimant: "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1"
  - action: advance_clock
    secs: 1
"#;
        let err = run(yaml).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("step 0 (withdraw) failed"), "got: {message}");
        assert!(message.contains("invalid message to consume"), "got: {message}");
    }

    #[test]
    fn missing_expected_error_fails() {
        let yaml = r#"
steps:
  - action: advance_clock
    secs: 5
    expect_error: anything
"#;
        let err = run(yaml).unwrap_err();
        assert!(format!("{err}").contains("succeeded"));
    }

    #[test]
    fn wrong_expected_error_fails() {
        let yaml = r#"
steps:
  - action: relay_deposit
    nonce: 3
    expect_error: invalid message
"#;
        let err = run(yaml).unwrap_err();
        assert!(format!("{err}").contains("no deposit with nonce 3"));
    }

    #[test]
    fn unknown_action_is_a_parse_error() {
        assert!(Scenario::from_yaml_str("steps:\n  - action: mint_more\n").is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Scenario::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(format!("{err}").contains("failed to read scenario"));
    }

    #[test]
    fn run_simulate_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.yaml");
        std::fs::write(&path, "steps:\n  - action: advance_clock\n    secs: 10\n").unwrap();
        let code = run_simulate(&SimulateArgs { scenario: path }).unwrap();
        assert_eq!(code, 0);
    }
}
