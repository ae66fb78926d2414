use serde::{Deserialize, Serialize};

use crate::errors::ShareListError;

/// Share permission bitmask
///
/// Always one of the canonical combinations of the five permission bits
/// (`1..=31`). Serialized as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Permissions(u8);

impl Permissions {
    pub const READ: Permissions = Permissions(1);
    pub const UPDATE: Permissions = Permissions(2);
    pub const CREATE: Permissions = Permissions(4);
    pub const DELETE: Permissions = Permissions(8);
    pub const SHARE: Permissions = Permissions(16);
    pub const ALL: Permissions = Permissions(31);

    /// Human-readable legend sent alongside reports
    pub const LEGEND: [(u8, &'static str); 6] = [
        (1, "read"),
        (2, "update"),
        (4, "create"),
        (8, "delete"),
        (16, "share"),
        (31, "all (default: 31, for public shares: 1)"),
    ];

    /// Build a bitmask, rejecting anything outside `1..=31`
    ///
    /// # Errors
    ///
    /// `InvalidPermissions` if the value is zero or sets unknown bits.
    pub fn new(value: u32) -> Result<Self, ShareListError> {
        if value == 0 || value > u32::from(Self::ALL.0) {
            return Err(ShareListError::InvalidPermissions { value });
        }
        Ok(Permissions(value as u8))
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    /// True if every bit of `other` is set in `self`
    pub fn contains(&self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }

    /// Union of two bitmasks
    pub fn union(self, other: Permissions) -> Permissions {
        Permissions(self.0 | other.0)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::ALL
    }
}

impl TryFrom<u32> for Permissions {
    type Error = ShareListError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Permissions::new(value)
    }
}

impl From<Permissions> for u32 {
    fn from(p: Permissions) -> Self {
        u32::from(p.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_and_unknown_bits() {
        assert!(Permissions::new(0).is_err());
        assert!(Permissions::new(32).is_err());
        assert!(Permissions::new(255).is_err());
        assert_eq!(Permissions::new(31).unwrap(), Permissions::ALL);
    }

    #[test]
    fn test_contains_and_union() {
        let rw = Permissions::READ.union(Permissions::UPDATE);
        assert_eq!(rw.bits(), 3);
        assert!(rw.contains(Permissions::READ));
        assert!(!rw.contains(Permissions::SHARE));
        assert!(Permissions::ALL.contains(rw));
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Permissions::new(17).unwrap()).unwrap();
        assert_eq!(json, "17");
        let back: Permissions = serde_json::from_str("17").unwrap();
        assert_eq!(back.bits(), 17);
        assert!(serde_json::from_str::<Permissions>("64").is_err());
    }
}
