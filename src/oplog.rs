use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

pub const LOG_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Verify,
    Decrypt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Create => "create",
            Self::Verify => "verify",
            Self::Decrypt => "decrypt",
        })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Success => "success",
            Self::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: String,
    pub kind: OperationKind,
    pub subject_name: String,
    /// Milliseconds since the unix epoch.
    pub timestamp: u64,
    pub outcome: Outcome,
}

/// Most-recent-first record of user operations, capped at [`LOG_CAPACITY`].
#[derive(Debug, Default)]
pub struct OperationLog {
    entries: RwLock<VecDeque<OperationRecord>>,
    ids: crate::utils::IdGenerator,
}

impl OperationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, kind: OperationKind, subject_name: &str, outcome: Outcome) -> OperationRecord {
        let stamp = self.ids.next();
        let record = OperationRecord {
            id: stamp.to_string(),
            kind,
            subject_name: subject_name.to_string(),
            timestamp: stamp,
            outcome,
        };
        let mut entries = self.entries.write();
        entries.push_front(record.clone());
        entries.truncate(LOG_CAPACITY);
        record
    }

    pub fn entries(&self) -> Vec<OperationRecord> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn head(&self) -> Option<OperationRecord> {
        self.entries.read().front().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
