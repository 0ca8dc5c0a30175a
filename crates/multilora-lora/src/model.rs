//! In-memory model parameters
//!
//! A model is a flat set of named tensors, loaded from and saved to a
//! safetensors checkpoint.

use crate::loader::{DeltaLoader, LoaderConfig, LoaderError, SafetensorsLoader};
use crate::tensor::WeightTensor;
use multilora_core::canonical_key;
use safetensors::tensor::TensorView;
use safetensors::Dtype;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Module name prefix written by kohya-style trainers
const KOHYA_PREFIX: &str = "lora_unet_";

/// Named model parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelWeights {
    tensors: BTreeMap<String, WeightTensor>,
}

impl ModelWeights {
    /// Create an empty model
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every tensor of a safetensors checkpoint
    pub fn load_safetensors(path: impl AsRef<Path>) -> Result<Self, LoaderError> {
        let loader = SafetensorsLoader::new(LoaderConfig::unlimited());
        let tensors = loader.load(path.as_ref())?;
        Ok(Self { tensors })
    }

    /// Write all tensors as f32 to a safetensors file
    pub fn save_safetensors(&self, path: impl AsRef<Path>) -> Result<(), LoaderError> {
        let encoded: Vec<(&str, Vec<u8>, &[usize])> = self
            .tensors
            .iter()
            .map(|(name, tensor)| (name.as_str(), tensor.to_le_bytes(), tensor.shape()))
            .collect();

        let views = encoded
            .iter()
            .map(|(name, bytes, shape)| {
                TensorView::new(Dtype::F32, shape.to_vec(), bytes)
                    .map(|view| (*name, view))
                    .map_err(|e| LoaderError::Serialize(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut metadata = HashMap::new();
        metadata.insert("format".to_string(), "pt".to_string());

        let bytes = safetensors::serialize(views, Some(metadata))
            .map_err(|e| LoaderError::Serialize(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Insert or replace a parameter
    pub fn insert(&mut self, name: impl Into<String>, tensor: WeightTensor) {
        self.tensors.insert(name.into(), tensor);
    }

    /// Get a parameter
    pub fn get(&self, name: &str) -> Option<&WeightTensor> {
        self.tensors.get(name)
    }

    /// Get a mutable parameter
    pub fn get_mut(&mut self, name: &str) -> Option<&mut WeightTensor> {
        self.tensors.get_mut(name)
    }

    /// Parameter names in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Total element count
    pub fn param_count(&self) -> u64 {
        self.tensors.values().map(|t| t.numel() as u64).sum()
    }

    /// Canonical key → actual parameter name.
    ///
    /// Every `.weight`/`.bias` parameter is also indexed under its kohya
    /// alias, `lora_unet_` followed by the canonical module path with `.`
    /// replaced by `_` (`double_blocks.0.img_attn.qkv.weight` is reachable as
    /// `lora_unet_double_blocks_0_img_attn_qkv.weight`). When two parameters
    /// share a key, the first in key order wins.
    pub fn canonical_index(&self) -> HashMap<String, String> {
        let mut index = HashMap::with_capacity(self.tensors.len() * 2);
        for name in self.keys() {
            let canonical = canonical_key(name);
            index
                .entry(canonical.to_string())
                .or_insert_with(|| name.to_string());
            if let Some(alias) = kohya_alias(canonical) {
                index.entry(alias).or_insert_with(|| name.to_string());
            }
        }
        index
    }
}

/// `lora_unet_<module path with '_' separators>.<weight|bias>`
fn kohya_alias(canonical: &str) -> Option<String> {
    [".weight", ".bias"].iter().find_map(|suffix| {
        canonical
            .strip_suffix(suffix)
            .map(|module| format!("{KOHYA_PREFIX}{}{suffix}", module.replace('.', "_")))
    })
}

impl FromIterator<(String, WeightTensor)> for ModelWeights {
    fn from_iter<I: IntoIterator<Item = (String, WeightTensor)>>(iter: I) -> Self {
        Self {
            tensors: iter.into_iter().collect(),
        }
    }
}
