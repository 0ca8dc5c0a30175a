//! Adapter slot configuration
//!
//! Exactly four slots are configured per invocation. Each one names an
//! adapter file (or nothing), a strength, and a block scope.

use crate::scope::Scope;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of adapter slots per invocation
pub const SLOT_COUNT: usize = 4;

/// Sentinel selector value meaning "no adapter in this slot"
pub const UNUSED: &str = "None";

/// Default slot strength
pub const DEFAULT_STRENGTH: f64 = 1.0;

/// Smallest accepted strength
pub const STRENGTH_MIN: f64 = -10.0;

/// Largest accepted strength
pub const STRENGTH_MAX: f64 = 10.0;

/// UI step for strength values
pub const STRENGTH_STEP: f64 = 0.01;

/// Reference to an adapter file in the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AdapterRef {
    /// Slot left empty
    #[default]
    Unused,
    /// Blank selector; inactive like [`AdapterRef::Unused`] but kept distinct
    /// so it round-trips as `""`
    Blank,
    /// Registry name of an adapter file, e.g. `style/ink.safetensors`
    File(String),
}

impl AdapterRef {
    /// Create a reference to a registry file
    pub fn file(name: impl Into<String>) -> Self {
        Self::from(name.into())
    }

    /// Registry name, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Unused | Self::Blank => None,
            Self::File(name) => Some(name),
        }
    }

    /// Whether the selector names no file
    pub fn is_unused(&self) -> bool {
        !matches!(self, Self::File(_))
    }

    /// Selector text as received
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unused => UNUSED,
            Self::Blank => "",
            Self::File(name) => name,
        }
    }
}

impl From<String> for AdapterRef {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Self::Blank
        } else if value == UNUSED {
            Self::Unused
        } else {
            Self::File(value)
        }
    }
}

impl From<&str> for AdapterRef {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<AdapterRef> for String {
    fn from(value: AdapterRef) -> Self {
        match value {
            AdapterRef::File(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for AdapterRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One adapter slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterSlot {
    /// Selected adapter file
    pub lora: AdapterRef,
    /// Merge strength (may be negative)
    pub strength: f64,
    /// Blocks the adapter is restricted to
    #[serde(rename = "blocks_type")]
    pub scope: Scope,
}

impl Default for AdapterSlot {
    fn default() -> Self {
        Self {
            lora: AdapterRef::Unused,
            strength: DEFAULT_STRENGTH,
            scope: Scope::All,
        }
    }
}

impl AdapterSlot {
    /// Slot for `name` at full strength over all blocks
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            lora: AdapterRef::file(name),
            ..Default::default()
        }
    }

    /// An empty slot
    pub fn unused() -> Self {
        Self::default()
    }

    /// Set the strength
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    /// Set the scope
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// A slot is active when it names a file and has non-zero strength
    pub fn is_active(&self) -> bool {
        !self.lora.is_unused() && self.strength != 0.0
    }
}

/// Slot list errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotsError {
    #[error("At most 4 adapter slots are supported, got {0}")]
    TooMany(usize),
}

/// The four adapter slots of one invocation, in slot order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<AdapterSlot>", into = "Vec<AdapterSlot>")]
pub struct AdapterSlots([AdapterSlot; SLOT_COUNT]);

impl AdapterSlots {
    /// Wrap four slots
    pub fn new(slots: [AdapterSlot; SLOT_COUNT]) -> Self {
        Self(slots)
    }

    /// Fill the leading slots from `slots`; the rest stay unused
    pub fn from_slots(slots: Vec<AdapterSlot>) -> Result<Self, SlotsError> {
        if slots.len() > SLOT_COUNT {
            return Err(SlotsError::TooMany(slots.len()));
        }

        let mut all: [AdapterSlot; SLOT_COUNT] = Default::default();
        for (target, slot) in all.iter_mut().zip(slots) {
            *target = slot;
        }
        Ok(Self(all))
    }

    /// Slot by 1-based number
    pub fn get(&self, number: usize) -> Option<&AdapterSlot> {
        number.checked_sub(1).and_then(|idx| self.0.get(idx))
    }

    /// Mutable slot by 1-based number
    pub fn get_mut(&mut self, number: usize) -> Option<&mut AdapterSlot> {
        let idx = number.checked_sub(1)?;
        self.0.get_mut(idx)
    }

    /// Iterate all slots with their 1-based numbers
    pub fn iter(&self) -> impl Iterator<Item = (usize, &AdapterSlot)> {
        self.0.iter().enumerate().map(|(idx, slot)| (idx + 1, slot))
    }

    /// Iterate active slots with their 1-based numbers, in slot order
    pub fn active(&self) -> impl Iterator<Item = (usize, &AdapterSlot)> {
        self.iter().filter(|(_, slot)| slot.is_active())
    }

    /// Number of active slots
    pub fn active_count(&self) -> usize {
        self.active().count()
    }
}

impl From<[AdapterSlot; SLOT_COUNT]> for AdapterSlots {
    fn from(slots: [AdapterSlot; SLOT_COUNT]) -> Self {
        Self(slots)
    }
}

impl TryFrom<Vec<AdapterSlot>> for AdapterSlots {
    type Error = SlotsError;

    fn try_from(slots: Vec<AdapterSlot>) -> Result<Self, Self::Error> {
        Self::from_slots(slots)
    }
}

impl From<AdapterSlots> for Vec<AdapterSlot> {
    fn from(slots: AdapterSlots) -> Self {
        slots.0.into()
    }
}
