use crate::{
    DEFAULT_GODOT3_MINIMUM_MINOR, DEFAULT_GODOT4_MINIMUM_MINOR, GODOT3_MAJOR, GODOT4_MAJOR,
};

use serde::Deserialize;

/// Oldest minor release accepted for each supported major line.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VersionPolicyConfig {
    pub godot3_minimum_minor: u32,
    pub godot4_minimum_minor: u32,
}

impl Default for VersionPolicyConfig {
    fn default() -> Self {
        Self {
            godot3_minimum_minor: DEFAULT_GODOT3_MINIMUM_MINOR,
            godot4_minimum_minor: DEFAULT_GODOT4_MINIMUM_MINOR,
        }
    }
}

impl VersionPolicyConfig {
    /// Minimum minor for a major line, None for unsupported majors.
    pub fn minimum_minor(&self, major: u32) -> Option<u32> {
        match major {
            GODOT3_MAJOR => Some(self.godot3_minimum_minor),
            GODOT4_MAJOR => Some(self.godot4_minimum_minor),
            _ => None,
        }
    }
}
