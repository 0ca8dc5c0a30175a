//! LoRA key inspection

use multilora_core::{canonical_key, filter_by_scope, Scope};
use multilora_lora::{DeltaLoader, LoraRegistry, SafetensorsLoader};
use std::path::PathBuf;

pub fn run(
    registry: &LoraRegistry,
    file: &str,
    samples: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let direct = PathBuf::from(file);
    let path = if direct.is_file() {
        direct
    } else {
        registry.resolve(file)?
    };

    println!("Inspecting LoRA at: {}", path.display());

    let delta = SafetensorsLoader::default().load(&path)?;

    println!("Total keys: {}", delta.len());
    for scope in Scope::ALL {
        let filtered = filter_by_scope(delta.clone(), scope);
        println!();
        println!("{}: {} key(s)", scope, filtered.len());
        for key in filtered.keys().take(samples) {
            println!("  - {}", canonical_key(key));
        }
    }

    Ok(())
}
