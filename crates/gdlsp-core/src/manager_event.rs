use crate::LspResult;

/// Reports from connect sequences back to the manager task.
#[derive(Debug)]
pub(crate) enum ManagerEvent {
    ServerSpawned { sequence: u64, port: u16, pid: u32 },
    SequenceFinished { sequence: u64, result: LspResult<()> },
}
