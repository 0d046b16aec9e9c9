//! DID parsing functionality.
//!
//! This module recognises DID:SOV identifiers and extracts the method-specific
//! identifier that is addressed on the ledger.

use std::fmt;

const DID_SOV_PREFIX: &str = "did:sov:";

/// Represents a parsed DID:SOV identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SovDid {
    /// The method-specific identifier, i.e. the ledger DID being looked up
    pub target_id: String,
}

impl SovDid {
    /// Creates a new SovDid instance
    pub fn new(target_id: String) -> Self {
        Self { target_id }
    }

    /// Parses a DID:SOV string.
    ///
    /// Returns `None` when the identifier does not belong to this method. The
    /// method-specific identifier may be any run of non-whitespace characters,
    /// including an empty one.
    pub fn parse(did: &str) -> Option<Self> {
        let target_id = did.strip_prefix(DID_SOV_PREFIX)?;
        if target_id.chars().any(is_pattern_whitespace) {
            return None;
        }

        Some(Self::new(target_id.to_string()))
    }
}

impl fmt::Display for SovDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", DID_SOV_PREFIX, self.target_id)
    }
}

// Regex `\s` class: no Unicode spaces, but includes vertical tab.
fn is_pattern_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r')
}
