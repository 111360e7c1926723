/// Multisig Kernel v1: Scenario Harness
///
/// Loads a JSON scenario (owners, threshold, commands), applies every
/// command through the engine and prints each outcome plus the final
/// canonical hash. Refusals are expected outcomes and are printed, not fatal.
///
/// Usage: multisig_engine [scenario.json]

use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use serde::Deserialize;

use multisig_engine::domain::Address;
use multisig_engine::engine::MultisigEngine;
use multisig_engine::events::WalletCommand;
use multisig_engine::hashing::canonical_hash;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Scenario {
    owners: Vec<Address>,
    threshold: u32,
    commands: Vec<WalletCommand>,
    /// When present, the run fails unless the final hash matches.
    #[serde(default)]
    expected_hash: Option<String>,
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let scenario_paths = [
        "scenario.json",
        "scenarios/quorum_walkthrough.json",
        "multisig_engine/scenarios/quorum_walkthrough.json",
    ];

    let path = match std::env::args().nth(1) {
        Some(p) => p,
        None => scenario_paths
            .iter()
            .find(|p| Path::new(p).exists())
            .map(|p| p.to_string())
            .ok_or("no scenario file given and none found in the default locations")?,
    };
    println!("Loaded scenario from: {}", path);

    let scenario: Scenario = serde_json::from_str(&fs::read_to_string(&path)?)?;
    let mut engine = MultisigEngine::new(scenario.owners, scenario.threshold)?;

    let mut accepted = 0usize;
    let mut refused = 0usize;
    for command in scenario.commands {
        let name = command.name();
        match engine.dispatch(command) {
            Ok(event) => {
                accepted += 1;
                println!(
                    "[OK]      seq={} {} by {} index={} amount={}",
                    engine.last_sequence(),
                    event.kind.as_str(),
                    event.actor,
                    event.index.map_or("-".to_string(), |i| i.to_string()),
                    event.amount.map_or("-".to_string(), |a| a.to_string()),
                );
            }
            Err(err) => {
                refused += 1;
                println!("[REFUSED] {}: {} ({})", name, err.code(), err);
            }
        }
    }

    let state = engine.state();
    let hash = canonical_hash(state);
    println!("\n===========================================");
    println!("Accepted: {}  Refused: {}", accepted, refused);
    println!(
        "Balance: {}  Transactions: {}  Pending: {}",
        state.balance(),
        state.transaction_count(),
        state.pending().len()
    );
    println!("Hash: {}", hash);

    match scenario.expected_hash {
        Some(expected) if expected != hash => {
            println!("[FAIL] expected hash {}", expected);
            Ok(ExitCode::FAILURE)
        }
        _ => Ok(ExitCode::SUCCESS),
    }
}
