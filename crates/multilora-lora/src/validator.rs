//! Slot validation
//!
//! Checks slot configuration against the strength bounds and the current
//! registry contents before anything is loaded.

use crate::registry::{has_supported_extension, LoraRegistry};
use multilora_core::slot::{STRENGTH_MAX, STRENGTH_MIN, STRENGTH_STEP};
use multilora_core::{AdapterSlot, AdapterSlots};
use std::fmt;

/// Validation result
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Is the configuration usable?
    pub valid: bool,
    /// Validation errors
    pub errors: Vec<ValidationError>,
    /// Validation warnings
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Create a successful result
    pub fn success() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        for error in other.errors {
            self.add_error(error);
        }
        self.warnings.extend(other.warnings);
    }

    /// Errors joined into one line
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validation error
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Strength is NaN or infinite
    NonFiniteStrength { slot: usize },
    /// Strength outside the accepted range
    StrengthOutOfRange { slot: usize, strength: f64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteStrength { slot } => {
                write!(f, "slot {slot}: strength must be a finite number")
            }
            Self::StrengthOutOfRange { slot, strength } => write!(
                f,
                "slot {slot}: strength {strength} outside [{STRENGTH_MIN}, {STRENGTH_MAX}]"
            ),
        }
    }
}

/// Validation warning
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    /// Strength not on the UI step grid
    OffStep { slot: usize, strength: f64 },
    /// Adapter not present in the registry
    UnknownAdapter { slot: usize, name: String },
    /// File extension not recognized as an adapter
    UnsupportedExtension { slot: usize, name: String },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OffStep { slot, strength } => {
                write!(f, "slot {slot}: strength {strength} is not a multiple of {STRENGTH_STEP}")
            }
            Self::UnknownAdapter { slot, name } => {
                write!(f, "slot {slot}: '{name}' is not in the LoRA registry")
            }
            Self::UnsupportedExtension { slot, name } => {
                write!(f, "slot {slot}: '{name}' does not look like an adapter file")
            }
        }
    }
}

/// Slot validator
#[derive(Debug, Clone, Copy, Default)]
pub struct SlotValidator;

impl SlotValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Check one slot's numeric fields and file extension
    pub fn validate_slot(&self, number: usize, slot: &AdapterSlot) -> ValidationResult {
        let mut result = ValidationResult::success();

        if !slot.strength.is_finite() {
            result.add_error(ValidationError::NonFiniteStrength { slot: number });
        } else if !(STRENGTH_MIN..=STRENGTH_MAX).contains(&slot.strength) {
            result.add_error(ValidationError::StrengthOutOfRange {
                slot: number,
                strength: slot.strength,
            });
        } else if !on_step(slot.strength) {
            result.add_warning(ValidationWarning::OffStep {
                slot: number,
                strength: slot.strength,
            });
        }

        if let Some(name) = slot.lora.name() {
            if !has_supported_extension(name) {
                result.add_warning(ValidationWarning::UnsupportedExtension {
                    slot: number,
                    name: name.to_string(),
                });
            }
        }

        result
    }

    /// Check all slots
    pub fn validate(&self, slots: &AdapterSlots) -> ValidationResult {
        let mut result = ValidationResult::success();
        for (number, slot) in slots.iter() {
            result.merge(self.validate_slot(number, slot));
        }
        result
    }

    /// Check all slots, and that active slots name registered adapters
    pub fn validate_with_registry(
        &self,
        slots: &AdapterSlots,
        registry: &LoraRegistry,
    ) -> ValidationResult {
        let mut result = self.validate(slots);

        for (number, slot) in slots.active() {
            if let Some(name) = slot.lora.name() {
                if !registry.contains(name) {
                    result.add_warning(ValidationWarning::UnknownAdapter {
                        slot: number,
                        name: name.to_string(),
                    });
                }
            }
        }

        result
    }
}

fn on_step(strength: f64) -> bool {
    let steps = strength / STRENGTH_STEP;
    (steps - steps.round()).abs() < 1e-6
}
