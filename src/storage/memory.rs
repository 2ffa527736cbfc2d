use super::engine::{ExecutionLedger, VersionMap};
use super::table::LedgerTable;
use crate::core::{LedgerRecord, Result};

/// Number of ledger operations issued against a backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub loads: usize,
    pub writes: usize,
    pub clears: usize,
}

/// Non-durable ledger, for embedding and tests
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    table: LedgerTable,
    stats: LedgerStats,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger pre-populated with `(command, version)` pairs
    pub fn with_records<C, V>(records: impl IntoIterator<Item = (C, V)>) -> Self
    where
        C: Into<String>,
        V: Into<String>,
    {
        let table = LedgerTable::from_records(
            records
                .into_iter()
                .map(|(command, version)| LedgerRecord::new(command, version)),
        );
        Self {
            table,
            stats: LedgerStats::default(),
        }
    }

    pub fn version_of(&self, command: &str) -> Option<&str> {
        self.table.get(command)
    }

    pub fn records(&self) -> Vec<LedgerRecord> {
        self.table.records()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn stats(&self) -> LedgerStats {
        self.stats
    }
}

impl ExecutionLedger for InMemoryLedger {
    fn load_all(&mut self) -> Result<VersionMap> {
        self.stats.loads += 1;
        Ok(self.table.to_version_map())
    }

    fn record_success(&mut self, command: &str, version: &str) -> Result<()> {
        self.stats.writes += 1;
        self.table.upsert(command, version);
        Ok(())
    }

    fn clear_all(&mut self) -> Result<()> {
        self.stats.clears += 1;
        self.table.clear();
        Ok(())
    }
}
