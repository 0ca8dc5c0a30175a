//! Node schema output

use multilora_lora::{
    LowRankMerger, LoraRegistry, MultiLoraLoaderNode, MultiLoraWrapperNode, SafetensorsLoader,
};

pub fn run(registry: &LoraRegistry) -> Result<(), Box<dyn std::error::Error>> {
    let wrapper = MultiLoraWrapperNode::new(registry);
    let loader = MultiLoraLoaderNode::new(registry, SafetensorsLoader::default(), LowRankMerger);

    let schemas = vec![wrapper.input_schema(), loader.input_schema()];
    println!("{}", serde_json::to_string_pretty(&schemas)?);
    Ok(())
}
