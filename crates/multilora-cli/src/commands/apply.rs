//! Merge adapters into a model file

use multilora_core::AdapterSlots;
use multilora_lora::{
    LowRankMerger, LoraRegistry, ModelWeights, MultiLoraLoaderNode, SafetensorsLoader,
};
use std::path::Path;
use tracing::info;

pub fn run(
    registry: &LoraRegistry,
    model_path: &Path,
    output: &Path,
    slots: &AdapterSlots,
) -> Result<(), Box<dyn std::error::Error>> {
    let model = ModelWeights::load_safetensors(model_path)?;
    info!(
        model = %model_path.display(),
        tensors = model.len(),
        params = model.param_count(),
        "loaded base model"
    );

    let node = MultiLoraLoaderNode::new(registry, SafetensorsLoader::default(), LowRankMerger);
    let merged = node.execute(model, slots)?;

    merged.save_safetensors(output)?;
    println!(
        "Applied {} LoRA slot(s), wrote {}",
        slots.active_count(),
        output.display()
    );
    Ok(())
}
