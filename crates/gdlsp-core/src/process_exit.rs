use crate::ProcessRole;

/// Emitted once for every supervised process that terminates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    pub role: ProcessRole,
    pub pid: u32,
    /// None when the process was terminated by a signal
    pub exit_code: Option<i32>,
}
