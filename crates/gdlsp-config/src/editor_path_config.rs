use crate::{GODOT3_MAJOR, GODOT4_MAJOR};

use serde::Deserialize;

/// Godot executables, one per supported major version.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EditorPathConfig {
    pub godot3: Option<String>,
    pub godot4: Option<String>,
}

impl EditorPathConfig {
    /// Configured executable for a major version. Blank entries count as unset.
    pub fn for_major(&self, major: u32) -> Option<&str> {
        let path = match major {
            GODOT3_MAJOR => self.godot3.as_deref(),
            GODOT4_MAJOR => self.godot4.as_deref(),
            _ => None,
        };
        path.map(str::trim).filter(|p| !p.is_empty())
    }

    pub fn set_for_major(&mut self, major: u32, path: impl Into<String>) {
        match major {
            GODOT3_MAJOR => self.godot3 = Some(path.into()),
            GODOT4_MAJOR => self.godot4 = Some(path.into()),
            _ => {}
        }
    }
}
