//! Parameter key normalization
//!
//! Adapter files name the same parameter differently depending on the tool
//! that produced them. Stripping the known wrapper prefixes gives a
//! canonical name that scope matching and model lookup can agree on.

/// Wrapper prefixes, checked in order. Only the first match is stripped.
pub const KNOWN_PREFIXES: [&str; 2] = ["diffusion_model.", "transformer."];

/// Strip the first matching known prefix from `name`.
///
/// Names without a known prefix are returned unchanged.
pub fn canonical_key(name: &str) -> &str {
    KNOWN_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name)
}
