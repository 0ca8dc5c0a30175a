//! Descriptor collection
//!
//! Turns the active slots into descriptors for a model loader that applies
//! adapters itself. No adapter file is read and no model is needed.

use crate::registry::{LoraRegistry, RegistryError};
use multilora_core::{fingerprint, AdapterDescriptor, AdapterSlots};
use tracing::debug;

/// Collects adapter descriptors from slot configuration
#[derive(Debug, Clone, Copy)]
pub struct DescriptorCollector<'a> {
    registry: &'a LoraRegistry,
}

impl<'a> DescriptorCollector<'a> {
    /// Create a collector resolving names through `registry`
    pub fn new(registry: &'a LoraRegistry) -> Self {
        Self { registry }
    }

    /// One descriptor per active slot, in slot order
    pub fn collect(&self, slots: &AdapterSlots) -> Result<Vec<AdapterDescriptor>, RegistryError> {
        let mut descriptors = Vec::new();

        for (number, slot) in slots.active() {
            let Some(name) = slot.lora.name() else {
                continue;
            };

            let path = self.registry.resolve(name)?;
            debug!(slot = number, lora = name, path = %path.display(), "collected LoRA");
            descriptors.push(AdapterDescriptor::new(path, name, slot.strength, slot.scope));
        }

        Ok(descriptors)
    }

    /// Cache key over all slot fields
    pub fn fingerprint(&self, slots: &AdapterSlots) -> String {
        fingerprint(slots)
    }
}
