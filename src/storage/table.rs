use super::engine::VersionMap;
use crate::core::LedgerRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What `LedgerTable::upsert` did to the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated { previous: String },
    Unchanged,
}

/// The `command_once` table: `command` is the unique key, `version` the only column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerTable {
    rows: BTreeMap<String, String>,
}

impl LedgerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = LedgerRecord>) -> Self {
        let mut table = Self::new();
        for record in records {
            table.upsert(&record.command, &record.version);
        }
        table
    }

    pub fn get(&self, command: &str) -> Option<&str> {
        self.rows.get(command).map(String::as_str)
    }

    /// Insert-or-update-by-key.
    pub fn upsert(&mut self, command: &str, version: &str) -> Upsert {
        match self.rows.get_mut(command) {
            None => {
                self.rows.insert(command.to_string(), version.to_string());
                Upsert::Inserted
            }
            Some(existing) if existing == version => Upsert::Unchanged,
            Some(existing) => {
                let previous = std::mem::replace(existing, version.to_string());
                Upsert::Updated { previous }
            }
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn records(&self) -> Vec<LedgerRecord> {
        self.rows
            .iter()
            .map(|(command, version)| LedgerRecord::new(command.clone(), version.clone()))
            .collect()
    }

    pub fn to_version_map(&self) -> VersionMap {
        self.rows
            .iter()
            .map(|(command, version)| (command.clone(), version.clone()))
            .collect()
    }
}
