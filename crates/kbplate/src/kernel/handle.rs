use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Opaque reference to a solid owned by a [`super::PlateKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolidHandle(Ulid);

impl SolidHandle {
    /// Create a new handle with a random ULID.
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SolidHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SolidHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
