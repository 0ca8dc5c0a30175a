//! Adapter application
//!
//! Loads each active slot's adapter, filters it to the slot's scope and merges
//! it into the model. Slots run strictly in order; each merge receives the
//! model returned by the previous one.

use crate::error::{LoraError, Result};
use crate::loader::{DeltaLoader, SafetensorsLoader};
use crate::merge::{LowRankMerger, ModelMerger};
use crate::registry::LoraRegistry;
use multilora_core::{filter_by_scope, fingerprint, AdapterSlots};
use tracing::{debug, info};

/// Applies up to four adapters to a model
pub struct LoraApplicator<'a, L, M> {
    registry: &'a LoraRegistry,
    loader: L,
    merger: M,
}

impl<'a> LoraApplicator<'a, SafetensorsLoader, LowRankMerger> {
    /// Safetensors adapters merged into in-memory model weights
    pub fn with_defaults(registry: &'a LoraRegistry) -> Self {
        Self::new(registry, SafetensorsLoader::default(), LowRankMerger::new())
    }
}

impl<'a, L, M> LoraApplicator<'a, L, M>
where
    L: DeltaLoader,
    M: ModelMerger<L::Tensor>,
{
    /// Create an applicator from its collaborators
    pub fn new(registry: &'a LoraRegistry, loader: L, merger: M) -> Self {
        Self {
            registry,
            loader,
            merger,
        }
    }

    /// Get the loader
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Get the merger
    pub fn merger(&self) -> &M {
        &self.merger
    }

    /// Apply every active slot to `model`, in slot order.
    ///
    /// The first failure aborts the remaining slots.
    pub fn apply(&self, mut model: M::Model, slots: &AdapterSlots) -> Result<M::Model> {
        for (number, slot) in slots.active() {
            let Some(name) = slot.lora.name() else {
                continue;
            };

            let path = self.registry.resolve(name)?;
            if !path.exists() {
                return Err(LoraError::MissingFile(path));
            }

            let delta = self.loader.load(&path)?;
            let loaded = delta.len();
            let filtered = filter_by_scope(delta, slot.scope);

            if filtered.is_empty() {
                debug!(
                    slot = number,
                    lora = name,
                    scope = %slot.scope,
                    loaded,
                    "no keys in scope, skipping"
                );
                continue;
            }

            info!(
                slot = number,
                lora = name,
                strength = slot.strength,
                scope = %slot.scope,
                keys = filtered.len(),
                loaded,
                "applying LoRA"
            );
            model = self.merger.merge(model, &filtered, slot.strength)?;
        }

        Ok(model)
    }

    /// Cache key over all slot fields
    pub fn fingerprint(&self, slots: &AdapterSlots) -> String {
        fingerprint(slots)
    }
}
