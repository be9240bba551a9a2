#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnOptions {
    /// Run through `sh -c` (`cmd /C` on Windows)
    pub shell: bool,
    /// Allow the process to outlive the supervisor
    pub detached: bool,
}

impl SpawnOptions {
    pub fn attached() -> Self {
        Self::default()
    }

    pub fn detached() -> Self {
        Self {
            shell: false,
            detached: true,
        }
    }
}
