//! Numeric SNMP object identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved, numeric object identifier.
///
/// Produced once by the resolver from a configuration string and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Oid(Vec<u32>);

impl Oid {
    /// Creates a new OID from a slice of sub-identifiers.
    pub fn from_slice(subs: &[u32]) -> Self {
        Oid(subs.to_vec())
    }

    /// Creates a new OID taking ownership of the sub-identifiers.
    pub fn from_vec(subs: Vec<u32>) -> Self {
        Oid(subs)
    }

    /// The sub-identifiers of this OID.
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    /// Returns true if this OID starts with `prefix`.
    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// Returns a new OID with `suffix` appended.
    pub fn child(&self, suffix: &[u32]) -> Oid {
        let mut subs = Vec::with_capacity(self.0.len() + suffix.len());
        subs.extend_from_slice(&self.0);
        subs.extend_from_slice(suffix);
        Oid(subs)
    }

    /// Returns the number of sub-identifiers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the OID has no sub-identifiers.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sub in &self.0 {
            write!(f, ".{}", sub)?;
        }
        Ok(())
    }
}
