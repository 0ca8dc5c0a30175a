//! LoRA listing

use multilora_lora::LoraRegistry;

pub fn run(registry: &LoraRegistry) {
    println!("LoRA Search Paths:");
    for path in registry.search_paths() {
        println!("  - {}", path.display());
    }

    println!();

    let found = registry.filename_list();
    if found.is_empty() {
        println!("No LoRAs found.");
        return;
    }

    println!("Found {} LoRA(s):", found.len());
    for name in found {
        println!("  - {}", name);
    }
}
