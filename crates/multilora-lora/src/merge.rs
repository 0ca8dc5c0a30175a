//! Merging adapter deltas into model weights
//!
//! The merger consumes the model and hands back the updated one, so a chain
//! of merges always threads a single owned value from slot to slot.

use crate::model::ModelWeights;
use crate::tensor::WeightTensor;
use multilora_core::{canonical_key, WeightDelta};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

/// Merge errors
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Shape mismatch for '{key}': model has {expected} elements, delta has {actual}")]
    ShapeMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("Rank mismatch for '{key}': up {up:?} does not chain with down {down:?}")]
    InvalidRank {
        key: String,
        up: Vec<usize>,
        down: Vec<usize>,
    },
}

/// Applies a weight delta to a model at a given strength
pub trait ModelMerger<T> {
    /// Model type threaded through successive merges
    type Model;

    /// Merge `delta` into `model`, returning the updated model
    fn merge(
        &self,
        model: Self::Model,
        delta: &WeightDelta<T>,
        strength: f64,
    ) -> Result<Self::Model, MergeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Up,
    Down,
    Alpha,
    Diff,
    DiffBias,
}

/// Recognized key suffixes; the remainder is the patched module's name
const SUFFIXES: [(&str, Part); 7] = [
    (".lora_up.weight", Part::Up),
    (".lora_down.weight", Part::Down),
    (".lora_B.weight", Part::Up),
    (".lora_A.weight", Part::Down),
    (".alpha", Part::Alpha),
    (".diff_b", Part::DiffBias),
    (".diff", Part::Diff),
];

/// Delta entries that patch one module
#[derive(Debug, Default)]
struct ModulePatch<'a> {
    up: Option<&'a WeightTensor>,
    down: Option<&'a WeightTensor>,
    alpha: Option<f32>,
    diff: Option<&'a WeightTensor>,
    diff_bias: Option<&'a WeightTensor>,
}

fn split_key(key: &str) -> Option<(&str, Part)> {
    SUFFIXES
        .iter()
        .find_map(|(suffix, part)| key.strip_suffix(suffix).map(|base| (base, *part)))
}

fn group_patches(delta: &WeightDelta<WeightTensor>) -> BTreeMap<&str, ModulePatch<'_>> {
    let mut patches: BTreeMap<&str, ModulePatch<'_>> = BTreeMap::new();

    for (key, tensor) in delta {
        let Some((base, part)) = split_key(key) else {
            warn!(key = %key, "unrecognized lora key, not loaded");
            continue;
        };

        let patch = patches.entry(base).or_default();
        match part {
            Part::Up => patch.up = Some(tensor),
            Part::Down => patch.down = Some(tensor),
            Part::Alpha => patch.alpha = tensor.as_scalar(),
            Part::Diff => patch.diff = Some(tensor),
            Part::DiffBias => patch.diff_bias = Some(tensor),
        }
    }

    patches
}

/// `up @ down`, flattened to `[out, in...]`.
///
/// Returns the product and the rank.
fn low_rank_product(
    key: &str,
    up: &WeightTensor,
    down: &WeightTensor,
) -> Result<(Vec<f32>, usize), MergeError> {
    let rank = down.rows();
    if rank == 0 || up.cols() != rank {
        return Err(MergeError::InvalidRank {
            key: key.to_string(),
            up: up.shape().to_vec(),
            down: down.shape().to_vec(),
        });
    }

    let out_dim = up.rows();
    let in_dim = down.cols();
    let (a, b) = (up.data(), down.data());
    let mut product = vec![0.0; out_dim * in_dim];

    for o in 0..out_dim {
        for r in 0..rank {
            let a_val = a[o * rank + r];
            if a_val == 0.0 {
                continue;
            }
            let row = &b[r * in_dim..(r + 1) * in_dim];
            for (p, b_val) in product[o * in_dim..(o + 1) * in_dim].iter_mut().zip(row) {
                *p += a_val * b_val;
            }
        }
    }

    Ok((product, rank))
}

/// W' = W + scale * delta
fn add_scaled(
    target: &mut WeightTensor,
    key: &str,
    delta: &[f32],
    scale: f32,
) -> Result<(), MergeError> {
    if target.numel() != delta.len() {
        return Err(MergeError::ShapeMismatch {
            key: key.to_string(),
            expected: target.numel(),
            actual: delta.len(),
        });
    }

    for (w, d) in target.data_mut().iter_mut().zip(delta) {
        *w += scale * d;
    }
    Ok(())
}

/// Merges low-rank (`lora_up`/`lora_down`, `lora_B`/`lora_A`) and full
/// (`diff`, `diff_b`) deltas into [`ModelWeights`]
///
/// Delta modules are matched to model parameters by canonical key, or by the
/// kohya `lora_unet_` alias (see [`ModelWeights::canonical_index`]). Modules
/// with no matching parameter, or with only one half of a low-rank pair, are
/// logged and skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowRankMerger;

impl LowRankMerger {
    /// Create a new merger
    pub fn new() -> Self {
        Self
    }
}

impl ModelMerger<WeightTensor> for LowRankMerger {
    type Model = ModelWeights;

    fn merge(
        &self,
        mut model: ModelWeights,
        delta: &WeightDelta<WeightTensor>,
        strength: f64,
    ) -> Result<ModelWeights, MergeError> {
        let strength = strength as f32;
        let index = model.canonical_index();
        let mut patched = 0usize;
        let mut skipped = 0usize;

        for (base, patch) in group_patches(delta) {
            let module = canonical_key(base);
            let weight_key = index.get(&format!("{module}.weight"));
            let bias_key = index.get(&format!("{module}.bias"));

            match (patch.up, patch.down) {
                (Some(up), Some(down)) => match weight_key {
                    Some(key) => {
                        let (product, rank) = low_rank_product(base, up, down)?;
                        let alpha_scale = patch.alpha.map_or(1.0, |alpha| alpha / rank as f32);
                        if let Some(target) = model.get_mut(key) {
                            add_scaled(target, key, &product, strength * alpha_scale)?;
                            patched += 1;
                        }
                    }
                    None => {
                        warn!(module = %base, "lora key not loaded");
                        skipped += 1;
                    }
                },
                (None, None) => {}
                _ => {
                    warn!(module = %base, "incomplete low-rank pair, not loaded");
                    skipped += 1;
                }
            }

            for (tensor, key) in [(patch.diff, weight_key), (patch.diff_bias, bias_key)] {
                let Some(tensor) = tensor else { continue };
                match key.and_then(|key| model.get_mut(key).map(|target| (key, target))) {
                    Some((key, target)) => {
                        add_scaled(target, key, tensor.data(), strength)?;
                        patched += 1;
                    }
                    None => {
                        warn!(module = %base, "lora diff key not loaded");
                        skipped += 1;
                    }
                }
            }
        }

        debug!(patched, skipped, strength, "merged weight delta");
        Ok(model)
    }
}
