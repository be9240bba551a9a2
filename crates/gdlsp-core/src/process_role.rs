use std::fmt;

/// Known child process roles. At most one live process per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessRole {
    /// Headless Godot editor serving the language server
    LanguageServer,
    /// Interactive Godot editor opened for the user
    Editor,
}

impl ProcessRole {
    /// Tag attached to forwarded output lines
    pub fn tag(self) -> &'static str {
        match self {
            Self::LanguageServer => "LSP",
            Self::Editor => "Editor",
        }
    }
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
