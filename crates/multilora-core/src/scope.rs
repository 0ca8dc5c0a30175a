//! Block scope selection
//!
//! A scope restricts which parameters of an adapter are merged: every
//! parameter, only those of the single-stream blocks, or only those of the
//! double-stream blocks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which model blocks an adapter should affect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Every parameter in the adapter
    #[default]
    All,
    /// Parameters of the single-stream blocks
    SingleBlocks,
    /// Parameters of the double-stream blocks
    DoubleBlocks,
}

impl Scope {
    /// All scopes in presentation order
    pub const ALL: [Scope; 3] = [Scope::All, Scope::SingleBlocks, Scope::DoubleBlocks];

    /// The substring a canonical key must contain to fall in this scope.
    ///
    /// `None` for [`Scope::All`], which keeps everything.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::SingleBlocks => Some("single_blocks"),
            Self::DoubleBlocks => Some("double_blocks"),
        }
    }

    /// Wire name, as used in slot configuration and descriptors
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::SingleBlocks => "single_blocks",
            Self::DoubleBlocks => "double_blocks",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown scope name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown block scope '{0}' (expected all, single_blocks or double_blocks)")]
pub struct ParseScopeError(pub String);

impl FromStr for Scope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == s)
            .ok_or_else(|| ParseScopeError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_markers() {
        assert_eq!(Scope::All.marker(), None);
        assert_eq!(Scope::SingleBlocks.marker(), Some("single_blocks"));
        assert_eq!(Scope::DoubleBlocks.marker(), Some("double_blocks"));
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!("all".parse::<Scope>().unwrap(), Scope::All);
        assert_eq!(
            "double_blocks".parse::<Scope>().unwrap(),
            Scope::DoubleBlocks
        );
        assert!("single".parse::<Scope>().is_err());
        assert!("ALL".parse::<Scope>().is_err());
    }

    #[test]
    fn test_scope_serde_names_match_display() {
        for scope in Scope::ALL {
            let json = serde_json::to_string(&scope).unwrap();
            assert_eq!(json, format!("\"{}\"", scope));
        }
    }

    #[test]
    fn test_scope_default() {
        assert_eq!(Scope::default(), Scope::All);
    }
}
