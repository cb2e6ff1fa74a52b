//! Peripheral device identity type

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a peripheral device, assigned by the hub
///
/// Identifiers sort lexicographically; the inventory's iteration order and
/// the scheduler's round-robin cursor are both defined by that order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into().trim().to_string())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        DeviceId::new(s)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        DeviceId::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_whitespace() {
        let id = DeviceId::new("  AmpRack1 ");
        assert_eq!(id.as_str(), "AmpRack1");
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut ids = vec![
            DeviceId::new("Cam2"),
            DeviceId::new("Amp1"),
            DeviceId::new("Amp10"),
        ];
        ids.sort();
        assert_eq!(ids[0].as_str(), "Amp1");
        assert_eq!(ids[1].as_str(), "Amp10");
        assert_eq!(ids[2].as_str(), "Cam2");
    }

    #[test]
    fn test_display() {
        let id = DeviceId::new("Display3");
        assert_eq!(format!("{}", id), "Display3");
    }
}
