use crate::{LspError, LspResult};

use std::panic::Location;
use std::path::{Path, PathBuf};

use error_location::ErrorLocation;
use gdlsp_config::{GODOT3_MAJOR, GODOT4_MAJOR};
use tracing::{debug, warn};

pub const PROJECT_FILE: &str = "project.godot";

/// First `config_version` written by Godot 4.
const GODOT4_CONFIG_VERSION: u32 = 5;

/// The Godot project the session works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub project_dir: PathBuf,
    pub godot_major: u32,
}

impl ProjectInfo {
    pub fn new(project_dir: impl Into<PathBuf>, godot_major: u32) -> Self {
        Self {
            project_dir: project_dir.into(),
            godot_major,
        }
    }

    /// Walk up from `start` to the nearest directory holding `project.godot`.
    pub fn discover(start: &Path) -> LspResult<Self> {
        let start = std::path::absolute(start)?;

        let Some(project_dir) = start
            .ancestors()
            .find(|dir| dir.join(PROJECT_FILE).is_file())
        else {
            return Err(LspError::ProjectNotFound {
                start,
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let contents = std::fs::read_to_string(project_dir.join(PROJECT_FILE))?;
        let godot_major = Self::detect_major(&contents);
        debug!(
            "Found Godot {godot_major} project at {}",
            project_dir.display()
        );

        Ok(Self::new(project_dir, godot_major))
    }

    /// Major version from the `config_version` key of `project.godot`.
    pub fn detect_major(contents: &str) -> u32 {
        let config_version = contents.lines().find_map(|line| {
            let (key, value) = line.split_once('=')?;
            (key.trim() == "config_version")
                .then(|| value.trim().parse::<u32>().ok())
                .flatten()
        });

        match config_version {
            Some(version) if version >= GODOT4_CONFIG_VERSION => GODOT4_MAJOR,
            Some(_) => GODOT3_MAJOR,
            None => {
                warn!("project.godot has no config_version, assuming Godot {GODOT4_MAJOR}");
                GODOT4_MAJOR
            }
        }
    }
}
