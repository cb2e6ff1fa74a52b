//! Supported peripheral type tags
//!
//! The hub reports a string type tag for every attached component. Only a
//! fixed set of tags becomes inventoried peripheral devices; the gain stage
//! is distinguished (rendered inline by discovery, never inventoried) and
//! everything else is skipped with a warning.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of the distinguished gain stage component
pub const GAIN_TAG: &str = "gain";

/// Declared type of an inventoried peripheral device
///
/// Immutable after the device record is created. Classification is a plain
/// tag match; there is deliberately no reflective or registry-driven lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Amplifier,
    Microphone,
    Camera,
    Display,
    MediaPlayer,
}

impl DeviceType {
    /// Resolve a wire type tag to a supported device type
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "amp" => Some(DeviceType::Amplifier),
            "mic" => Some(DeviceType::Microphone),
            "camera" => Some(DeviceType::Camera),
            "display" => Some(DeviceType::Display),
            "media_player" => Some(DeviceType::MediaPlayer),
            _ => None,
        }
    }

    /// The wire tag for this type
    pub fn tag(&self) -> &'static str {
        match self {
            DeviceType::Amplifier => "amp",
            DeviceType::Microphone => "mic",
            DeviceType::Camera => "camera",
            DeviceType::Display => "display",
            DeviceType::MediaPlayer => "media_player",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
