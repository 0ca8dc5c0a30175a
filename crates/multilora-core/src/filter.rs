//! Scope filtering of weight deltas

use crate::keys::canonical_key;
use crate::scope::Scope;
use std::collections::BTreeMap;

/// Parameter name → tensor, as read from one adapter file.
///
/// Iteration follows key order, which keeps filtering deterministic.
pub type WeightDelta<T> = BTreeMap<String, T>;

/// Keep only the entries of `delta` that fall inside `scope`.
///
/// [`Scope::All`] hands the input back untouched. Other scopes keep an entry
/// when its canonical key contains the scope marker anywhere; original key
/// names are preserved. An empty result means "nothing to apply".
pub fn filter_by_scope<T>(delta: WeightDelta<T>, scope: Scope) -> WeightDelta<T> {
    let Some(marker) = scope.marker() else {
        return delta;
    };

    delta
        .into_iter()
        .filter(|(key, _)| canonical_key(key).contains(marker))
        .collect()
}
