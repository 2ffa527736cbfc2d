use super::OnceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keyword arguments passed to a named invocation.
pub type Arguments = BTreeMap<String, String>;

/// One configured operation: the identifier is used verbatim as the ledger key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationEntry {
    pub identifier: String,
    pub version: String,
}

impl OperationEntry {
    pub fn new(identifier: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            version: version.into(),
        }
    }
}

/// Last successfully executed version of a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub command: String,
    pub version: String,
}

impl LedgerRecord {
    pub fn new(command: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            version: version.into(),
        }
    }
}

#[derive(Debug)]
pub enum ExecutionOutcome {
    Skipped,
    Succeeded,
    Failed(OnceError),
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn failure(&self) -> Option<&OnceError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct EntryReport {
    pub identifier: String,
    pub version: String,
    pub outcome: ExecutionOutcome,
}

/// Result of one pass over the configured operations, in declaration order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub entries: Vec<EntryReport>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: &OperationEntry, outcome: ExecutionOutcome) {
        self.entries.push(EntryReport {
            identifier: entry.identifier.clone(),
            version: entry.version.clone(),
            outcome,
        });
    }

    pub fn executed(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_success()).count()
    }

    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, ExecutionOutcome::Skipped))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_failure()).count()
    }

    /// Attempted entries, i.e. everything that was not skipped.
    pub fn attempted(&self) -> usize {
        self.executed() + self.failed()
    }

    pub fn outcome_of(&self, identifier: &str) -> Option<&ExecutionOutcome> {
        self.entries
            .iter()
            .find(|e| e.identifier == identifier)
            .map(|e| &e.outcome)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
