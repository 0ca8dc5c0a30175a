//! Descriptor collection

use multilora_core::AdapterSlots;
use multilora_lora::{LoraRegistry, MultiLoraWrapperNode};

pub fn run(registry: &LoraRegistry, slots: &AdapterSlots) -> Result<(), Box<dyn std::error::Error>> {
    let descriptors = MultiLoraWrapperNode::new(registry).execute(slots)?;
    println!("{}", serde_json::to_string_pretty(&descriptors)?);
    Ok(())
}
