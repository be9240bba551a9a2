use crate::LspError;

/// What a prompt is about. Used to suppress duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    InvalidExecutable,
    WrongVersion,
    TooOldVersion,
    ConnectionLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    SelectExecutable,
    DisableHeadless,
    Ignore,
    Retry,
}

impl PromptKind {
    pub fn actions(self) -> &'static [PromptAction] {
        match self {
            Self::InvalidExecutable | Self::WrongVersion => {
                &[PromptAction::SelectExecutable, PromptAction::Ignore]
            }
            Self::TooOldVersion => &[
                PromptAction::SelectExecutable,
                PromptAction::DisableHeadless,
                PromptAction::Ignore,
            ],
            Self::ConnectionLost => &[PromptAction::Retry, PromptAction::Ignore],
        }
    }
}

/// A single actionable message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub id: u64,
    pub kind: PromptKind,
    pub message: String,
    pub actions: Vec<PromptAction>,
}

impl Prompt {
    pub fn new(id: u64, kind: PromptKind, message: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            message: message.into(),
            actions: kind.actions().to_vec(),
        }
    }

    /// Prompt for an executable or version error, None for any other error.
    pub fn for_executable_error(id: u64, error: &LspError, godot_major: u32) -> Option<Self> {
        let (kind, message) = match error {
            LspError::InvalidExecutable { path, reason, .. } => (
                PromptKind::InvalidExecutable,
                format!(
                    "Cannot start the headless language server: '{path}' is not a usable Godot {godot_major} executable ({reason})."
                ),
            ),
            LspError::WrongVersion {
                expected, actual, ..
            } => (
                PromptKind::WrongVersion,
                format!(
                    "The configured executable is Godot {actual}, but this project needs Godot {expected}."
                ),
            ),
            LspError::TooOldVersion {
                minimum, actual, ..
            } => (
                PromptKind::TooOldVersion,
                format!(
                    "Godot {actual} cannot run a headless language server; {minimum} or newer is required."
                ),
            ),
            _ => return None,
        };
        Some(Self::new(id, kind, message))
    }

    pub fn connection_lost(id: u64, target: &str, attempts: u32) -> Self {
        let message = if attempts == 0 {
            format!("Couldn't connect to the GDScript language server at {target}.")
        } else {
            format!(
                "Couldn't connect to the GDScript language server at {target} after {attempts} attempts. Is the Godot editor running?"
            )
        };
        Self::new(id, PromptKind::ConnectionLost, message)
    }
}

/// User's answer to a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResponse {
    SelectExecutable { path: String },
    DisableHeadless,
    Ignore,
    Retry,
}
