//! Node-graph entry points
//!
//! Two nodes share the same four-slot input surface. The wrapper node emits
//! descriptors for a downstream model loader; the loader node takes a model
//! and returns it with the adapters merged in.

use crate::applicator::LoraApplicator;
use crate::collector::DescriptorCollector;
use crate::error::{LoraError, Result};
use crate::loader::DeltaLoader;
use crate::merge::ModelMerger;
use crate::registry::LoraRegistry;
use crate::validator::{SlotValidator, ValidationResult};
use multilora_core::slot::{DEFAULT_STRENGTH, STRENGTH_MAX, STRENGTH_MIN, STRENGTH_STEP};
use multilora_core::{fingerprint, AdapterDescriptor, AdapterSlots, Scope, SLOT_COUNT};
use serde::Serialize;
use tracing::warn;

/// Node category shared by both entry points
pub const CATEGORY: &str = "loaders/hunyuan";

/// Output type name of the descriptor list
pub const LORA_LIST_TYPE: &str = "HYVIDLORA";

/// Output type name of a model
pub const MODEL_TYPE: &str = "MODEL";

/// Declared input of a node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputSpec {
    /// Upstream model connection
    Model { name: String },
    /// Selection from a fixed list
    Choice {
        name: String,
        choices: Vec<String>,
        default: String,
    },
    /// Bounded real number
    Float {
        name: String,
        default: f64,
        min: f64,
        max: f64,
        step: f64,
    },
}

impl InputSpec {
    /// Input name
    pub fn name(&self) -> &str {
        match self {
            Self::Model { name } | Self::Choice { name, .. } | Self::Float { name, .. } => name,
        }
    }
}

/// Declared output of a node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Everything a host needs to present a node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSchema {
    pub name: String,
    pub display_name: String,
    pub category: String,
    pub description: String,
    pub inputs: Vec<InputSpec>,
    pub outputs: Vec<OutputSpec>,
}

/// `lora_0N`, `strength_0N` and `blocks_type_0N` for every slot
fn slot_inputs(registry: &LoraRegistry) -> Vec<InputSpec> {
    let files = registry.choices();
    let scopes: Vec<String> = Scope::ALL.iter().map(ToString::to_string).collect();

    (1..=SLOT_COUNT)
        .flat_map(|n| {
            [
                InputSpec::Choice {
                    name: format!("lora_{n:02}"),
                    choices: files.clone(),
                    default: multilora_core::slot::UNUSED.to_string(),
                },
                InputSpec::Float {
                    name: format!("strength_{n:02}"),
                    default: DEFAULT_STRENGTH,
                    min: STRENGTH_MIN,
                    max: STRENGTH_MAX,
                    step: STRENGTH_STEP,
                },
                InputSpec::Choice {
                    name: format!("blocks_type_{n:02}"),
                    choices: scopes.clone(),
                    default: Scope::All.to_string(),
                },
            ]
        })
        .collect()
}

/// Fail on validation errors, log warnings
fn check(result: ValidationResult) -> Result<()> {
    for warning in &result.warnings {
        warn!("{warning}");
    }
    if result.valid {
        Ok(())
    } else {
        Err(LoraError::InvalidSlot(result.error_summary()))
    }
}

/// Descriptor-producing node: no model in, adapter list out
pub struct MultiLoraWrapperNode<'a> {
    registry: &'a LoraRegistry,
    validator: SlotValidator,
}

impl<'a> MultiLoraWrapperNode<'a> {
    pub const NAME: &'static str = "HunyuanMultiLoraLoaderWrapper";
    pub const DISPLAY_NAME: &'static str = "Hunyuan Multi-Lora Loader (Wrapper)";
    pub const DESCRIPTION: &'static str = "Output LoRA information in HYVIDLORA format for \
        compatibility with HunyuanVideo Model Loader.";

    /// Create the node over `registry`
    pub fn new(registry: &'a LoraRegistry) -> Self {
        Self {
            registry,
            validator: SlotValidator::new(),
        }
    }

    /// Input and output declaration, with a fresh file list
    pub fn input_schema(&self) -> NodeSchema {
        NodeSchema {
            name: Self::NAME.to_string(),
            display_name: Self::DISPLAY_NAME.to_string(),
            category: CATEGORY.to_string(),
            description: Self::DESCRIPTION.to_string(),
            inputs: slot_inputs(self.registry),
            outputs: vec![OutputSpec {
                name: "lora".to_string(),
                type_name: LORA_LIST_TYPE.to_string(),
            }],
        }
    }

    /// Validate the slots and collect their descriptors
    pub fn execute(&self, slots: &AdapterSlots) -> Result<Vec<AdapterDescriptor>> {
        check(self.validator.validate_with_registry(slots, self.registry))?;
        Ok(DescriptorCollector::new(self.registry).collect(slots)?)
    }

    /// Re-execution fingerprint
    pub fn is_changed(&self, slots: &AdapterSlots) -> String {
        fingerprint(slots)
    }
}

/// Model-mutating node: model in, merged model out
pub struct MultiLoraLoaderNode<'a, L, M> {
    registry: &'a LoraRegistry,
    applicator: LoraApplicator<'a, L, M>,
    validator: SlotValidator,
}

impl<'a, L, M> MultiLoraLoaderNode<'a, L, M>
where
    L: DeltaLoader,
    M: ModelMerger<L::Tensor>,
{
    pub const NAME: &'static str = "HunyuanMultiLoraLoader";
    pub const DISPLAY_NAME: &'static str = "Hunyuan Multi-Lora Loader";
    pub const DESCRIPTION: &'static str = "Load and apply multiple LoRA models with different \
        strengths and block types. Model input is required.";

    /// Create the node from its collaborators
    pub fn new(registry: &'a LoraRegistry, loader: L, merger: M) -> Self {
        Self {
            registry,
            applicator: LoraApplicator::new(registry, loader, merger),
            validator: SlotValidator::new(),
        }
    }

    /// Input and output declaration, with a fresh file list
    pub fn input_schema(&self) -> NodeSchema {
        let mut inputs = vec![InputSpec::Model {
            name: "model".to_string(),
        }];
        inputs.extend(slot_inputs(self.registry));

        NodeSchema {
            name: Self::NAME.to_string(),
            display_name: Self::DISPLAY_NAME.to_string(),
            category: CATEGORY.to_string(),
            description: Self::DESCRIPTION.to_string(),
            inputs,
            outputs: vec![OutputSpec {
                name: "model".to_string(),
                type_name: MODEL_TYPE.to_string(),
            }],
        }
    }

    /// Validate the slots and merge them into `model`
    pub fn execute(&self, model: M::Model, slots: &AdapterSlots) -> Result<M::Model> {
        check(self.validator.validate_with_registry(slots, self.registry))?;
        self.applicator.apply(model, slots)
    }

    /// Re-execution fingerprint
    pub fn is_changed(&self, slots: &AdapterSlots) -> String {
        fingerprint(slots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::SafetensorsLoader;
    use crate::merge::LowRankMerger;
    use crate::model::ModelWeights;
    use multilora_core::AdapterSlot;
    use tempfile::TempDir;

    fn registry_with(files: &[&str]) -> (TempDir, LoraRegistry) {
        let dir = TempDir::new().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), b"").unwrap();
        }
        let registry = LoraRegistry::with_search_paths([dir.path()]);
        (dir, registry)
    }

    #[test]
    fn test_wrapper_schema() {
        let (_dir, registry) = registry_with(&["ink.safetensors"]);
        let schema = MultiLoraWrapperNode::new(&registry).input_schema();

        assert_eq!(schema.category, CATEGORY);
        assert_eq!(schema.inputs.len(), 12);
        assert_eq!(schema.outputs[0].type_name, LORA_LIST_TYPE);

        let names: Vec<&str> = schema.inputs.iter().take(3).map(InputSpec::name).collect();
        assert_eq!(names, vec!["lora_01", "strength_01", "blocks_type_01"]);
        assert_eq!(schema.inputs[11].name(), "blocks_type_04");

        match &schema.inputs[0] {
            InputSpec::Choice {
                choices, default, ..
            } => {
                assert_eq!(choices, &vec!["None".to_string(), "ink.safetensors".to_string()]);
                assert_eq!(default, "None");
            }
            other => panic!("unexpected input {other:?}"),
        }

        assert_eq!(
            schema.inputs[1],
            InputSpec::Float {
                name: "strength_01".to_string(),
                default: 1.0,
                min: -10.0,
                max: 10.0,
                step: 0.01,
            }
        );
    }

    #[test]
    fn test_loader_schema_starts_with_model() {
        let (_dir, registry) = registry_with(&[]);
        let node = MultiLoraLoaderNode::new(&registry, SafetensorsLoader::default(), LowRankMerger);
        let schema = node.input_schema();

        assert_eq!(schema.inputs.len(), 13);
        assert_eq!(schema.inputs[0].name(), "model");
        assert_eq!(schema.outputs[0].type_name, MODEL_TYPE);

        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["inputs"][0]["kind"], "model");
        assert_eq!(json["inputs"][3]["choices"][2], "double_blocks");
        assert_eq!(json["outputs"][0]["type"], "MODEL");
    }

    #[test]
    fn test_wrapper_execute_rejects_bad_strength() {
        let (_dir, registry) = registry_with(&["ink.safetensors"]);
        let slots = AdapterSlots::from_slots(vec![
            AdapterSlot::new("ink.safetensors").with_strength(12.0)
        ])
        .unwrap();

        let result = MultiLoraWrapperNode::new(&registry).execute(&slots);
        assert!(matches!(result, Err(LoraError::InvalidSlot(_))));
    }

    #[test]
    fn test_wrapper_execute_collects() {
        let (_dir, registry) = registry_with(&["ink.safetensors"]);
        let slots = AdapterSlots::from_slots(vec![
            AdapterSlot::unused(),
            AdapterSlot::new("ink.safetensors").with_scope(Scope::DoubleBlocks),
        ])
        .unwrap();

        let descriptors = MultiLoraWrapperNode::new(&registry).execute(&slots).unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].name, "ink");
        assert_eq!(descriptors[0].scope, Scope::DoubleBlocks);
    }

    #[test]
    fn test_loader_execute_all_unused() {
        let (_dir, registry) = registry_with(&[]);
        let node = MultiLoraLoaderNode::new(&registry, SafetensorsLoader::default(), LowRankMerger);
        let model = ModelWeights::new();

        let result = node.execute(model.clone(), &AdapterSlots::default()).unwrap();
        assert_eq!(result, model);
    }

    #[test]
    fn test_is_changed_matches_between_nodes() {
        let (_dir, registry) = registry_with(&[]);
        let wrapper = MultiLoraWrapperNode::new(&registry);
        let loader =
            MultiLoraLoaderNode::new(&registry, SafetensorsLoader::default(), LowRankMerger);
        let slots = AdapterSlots::from_slots(vec![AdapterSlot::new("a.safetensors")]).unwrap();

        assert_eq!(wrapper.is_changed(&slots), loader.is_changed(&slots));
    }
}
