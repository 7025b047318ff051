use std::fmt::{self, Display, Formatter};

use const_fnv1a_hash::fnv1a_hash_str_64;
use serde::{Deserialize, Serialize};

/// A compact, serializable identifier for a named interpretation.
///
/// `InterpretationId` wraps a 64-bit FNV-1a hash of the interpretation name.
/// The same name always produces the same id, so callers can store ids
/// instead of names and still look trees up in any catalog snapshot.
///
/// # Example
///
/// ```
/// use fuzzy_interp::InterpretationId;
///
/// const DWELLINGS: InterpretationId = InterpretationId::from_name("Dwellings With Basements");
///
/// let runtime = InterpretationId::from_name("Dwellings With Basements");
/// assert_eq!(DWELLINGS, runtime);
/// ```
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct InterpretationId(u64);

impl InterpretationId {
    /// Create an id from an interpretation name at compile time.
    pub const fn from_name(name: &str) -> Self {
        Self(fnv1a_hash_str_64(name))
    }

    /// Get the raw hash value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for InterpretationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "InterpretationId({:016x})", self.0)
    }
}
