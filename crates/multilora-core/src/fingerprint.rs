//! Re-execution fingerprint
//!
//! Hosts that cache node outputs compare this string between runs: equal
//! strings mean the cached result can be reused.

use crate::slot::AdapterSlots;

/// Join the raw file, strength and scope of all four slots with `_`.
///
/// Strengths use their `Debug` form so `1.0` and `1` never collide with
/// neighbouring fields and `-0.0` stays distinct from `0.0`.
pub fn fingerprint(slots: &AdapterSlots) -> String {
    slots
        .iter()
        .map(|(_, slot)| {
            format!(
                "{}_{:?}_{}",
                slot.lora.as_str(),
                slot.strength,
                slot.scope
            )
        })
        .collect::<Vec<_>>()
        .join("_")
}
