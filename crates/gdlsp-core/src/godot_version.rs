use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?\.(\w+)\.(\w+)\.([0-9a-f]{9})")
        .expect("valid Godot version regex")
});

/// Parsed output of `godot --version`, e.g. `4.2.1.stable.official.b09f793f5`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GodotVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
    /// `stable`, `rc1`, `beta3`, ...
    pub status: String,
    /// `official`, `custom_build`, ...
    pub build: String,
    pub hash: String,
    pub raw: String,
}

impl GodotVersion {
    /// Find the first version string in `text`.
    pub fn parse(text: &str) -> Option<Self> {
        let captures = VERSION_PATTERN.captures(text)?;
        let number = |index: usize| captures.get(index).and_then(|m| m.as_str().parse().ok());

        Some(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3),
            status: captures.get(4)?.as_str().to_string(),
            build: captures.get(5)?.as_str().to_string(),
            hash: captures.get(6)?.as_str().to_string(),
            raw: captures.get(0)?.as_str().to_string(),
        })
    }

    /// `major.minor[.patch]`
    pub fn short(&self) -> String {
        match self.patch {
            Some(patch) => format!("{}.{}.{}", self.major, self.minor, patch),
            None => format!("{}.{}", self.major, self.minor),
        }
    }
}

impl fmt::Display for GodotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
