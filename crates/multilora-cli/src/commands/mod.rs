//! Subcommands

pub mod apply;
pub mod collect;
pub mod fingerprint;
pub mod inspect;
pub mod list;
pub mod schema;

use clap::Args;
use multilora_core::{AdapterSlot, AdapterSlots, Scope};
use std::path::PathBuf;

/// Slot configuration, from a JSON file or `--lora` flags
#[derive(Args, Debug)]
pub struct SlotArgs {
    /// JSON file with up to four `{"lora", "strength", "blocks_type"}` slots
    #[arg(short, long, conflicts_with = "lora")]
    pub config: Option<PathBuf>,

    /// Slot as NAME[:STRENGTH[:SCOPE]], repeatable up to four times
    #[arg(short, long, value_parser = parse_slot)]
    pub lora: Vec<AdapterSlot>,
}

impl SlotArgs {
    /// Build the four slots
    pub fn load(&self) -> Result<AdapterSlots, Box<dyn std::error::Error>> {
        match &self.config {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&content)?)
            }
            None => Ok(AdapterSlots::from_slots(self.lora.clone())?),
        }
    }
}

/// Parse `NAME[:STRENGTH[:SCOPE]]`
pub fn parse_slot(spec: &str) -> Result<AdapterSlot, String> {
    let mut parts = spec.splitn(3, ':');
    let name = parts.next().unwrap_or_default();
    let mut slot = AdapterSlot::new(name);

    if let Some(strength) = parts.next() {
        slot.strength = strength
            .parse()
            .map_err(|e| format!("invalid strength '{strength}': {e}"))?;
    }
    if let Some(scope) = parts.next() {
        slot.scope = scope.parse::<Scope>().map_err(|e| e.to_string())?;
    }

    Ok(slot)
}
