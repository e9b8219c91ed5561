//! Task lifecycle state machine.

use crate::error::{Error, Result};

/// Local mirror of where a task is in its remote lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    #[default]
    Unstarted,
    Started,
    Processed,
    Downloaded,
    Deleted,
}

/// Operations that move a task through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start,
    AddFile,
    DeleteFile,
    Process,
    Download,
    Delete,
    Connect,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::AddFile => "add a file to",
            Self::DeleteFile => "delete a file from",
            Self::Process => "process",
            Self::Download => "download",
            Self::Delete => "delete",
            Self::Connect => "connect",
        }
    }
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unstarted => "unstarted",
            Self::Started => "started",
            Self::Processed => "processed",
            Self::Downloaded => "downloaded",
            Self::Deleted => "deleted",
        }
    }

    pub fn allows(&self, op: Operation) -> bool {
        use Operation::*;
        use TaskState::*;
        match (self, op) {
            (Deleted, _) => false,
            (_, Start) => true,
            (Unstarted, _) => false,
            (Started | Processed | Downloaded, AddFile | DeleteFile | Process | Delete) => true,
            (Processed | Downloaded, Download | Connect) => true,
            (Started, Download | Connect) => false,
        }
    }

    /// Fail unless `op` is legal in this state.
    pub fn check(&self, op: Operation) -> Result<()> {
        if *self == TaskState::Unstarted && op != Operation::Start {
            return Err(Error::TaskNotStarted);
        }
        if self.allows(op) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                operation: op.as_str(),
                state: self.as_str(),
            })
        }
    }

    /// State after `op` succeeded.
    pub fn after(&self, op: Operation) -> TaskState {
        match op {
            Operation::Start => TaskState::Started,
            // Changing the inputs invalidates the processed output.
            Operation::AddFile | Operation::DeleteFile => TaskState::Started,
            Operation::Process => TaskState::Processed,
            Operation::Download => TaskState::Downloaded,
            Operation::Delete => TaskState::Deleted,
            Operation::Connect => *self,
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_OPS: [Operation; 7] = [
        Operation::Start,
        Operation::AddFile,
        Operation::DeleteFile,
        Operation::Process,
        Operation::Download,
        Operation::Delete,
        Operation::Connect,
    ];

    #[test]
    fn test_unstarted_only_allows_start() {
        for op in ALL_OPS {
            let result = TaskState::Unstarted.check(op);
            if op == Operation::Start {
                assert!(result.is_ok());
            } else {
                assert!(matches!(result, Err(Error::TaskNotStarted)), "{op:?}");
            }
        }
    }

    #[test]
    fn test_deleted_is_terminal() {
        for op in ALL_OPS {
            assert!(matches!(
                TaskState::Deleted.check(op),
                Err(Error::InvalidState { state: "deleted", .. })
            ));
        }
    }

    #[test]
    fn test_download_and_connect_need_processing() {
        assert!(TaskState::Started.check(Operation::Download).is_err());
        assert!(TaskState::Started.check(Operation::Connect).is_err());
        assert!(TaskState::Processed.check(Operation::Download).is_ok());
        assert!(TaskState::Downloaded.check(Operation::Download).is_ok());
        assert!(TaskState::Downloaded.check(Operation::Connect).is_ok());
    }

    #[test]
    fn test_transitions() {
        let state = TaskState::Unstarted.after(Operation::Start);
        assert_eq!(state, TaskState::Started);
        let state = state.after(Operation::Process);
        assert_eq!(state, TaskState::Processed);
        assert_eq!(state.after(Operation::Connect), TaskState::Processed);
        assert_eq!(state.after(Operation::AddFile), TaskState::Started);
        let state = state.after(Operation::Download);
        assert_eq!(state, TaskState::Downloaded);
        assert_eq!(state.after(Operation::Delete), TaskState::Deleted);
    }
}
