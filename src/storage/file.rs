use super::engine::{ExecutionLedger, VersionMap};
use super::persistence::{DurabilityMode, PersistenceManager, WalEntry};
use super::table::{LedgerTable, Upsert};
use crate::config::LedgerConfig;
use crate::core::{LedgerRecord, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Durable ledger: every write is a WAL record, periodically compacted into a snapshot.
pub struct FileLedger {
    data_dir: PathBuf,
    table: LedgerTable,
    persistence: PersistenceManager,
}

impl FileLedger {
    /// Open (or create) the ledger under `data_dir` and recover its records.
    pub fn open<P: AsRef<Path>>(data_dir: P, durability_mode: DurabilityMode) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let mut persistence = PersistenceManager::new(&data_dir, durability_mode)?;
        let table = persistence.recover()?;
        debug!(dir = %data_dir.display(), records = table.len(), "ledger opened");

        Ok(Self {
            data_dir,
            table,
            persistence,
        })
    }

    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        let mut ledger = Self::open(&config.data_dir, config.durability)?;
        ledger
            .persistence
            .wal_mut()
            .set_checkpoint_threshold(config.checkpoint_threshold);
        Ok(ledger)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn durability_mode(&self) -> DurabilityMode {
        self.persistence.durability_mode()
    }

    pub fn records(&self) -> Vec<LedgerRecord> {
        self.table.records()
    }

    pub fn version_of(&self, command: &str) -> Option<&str> {
        self.table.get(command)
    }

    /// Compact the WAL into a fresh snapshot.
    pub fn checkpoint(&mut self) -> Result<()> {
        self.persistence.checkpoint(&self.table)
    }

    /// The WAL record is already durable; a failed compaction only delays
    /// the next one.
    fn maybe_checkpoint(&mut self) {
        if !self.persistence.needs_checkpoint() {
            return;
        }
        if let Err(err) = self.checkpoint() {
            log::warn!(
                "ledger checkpoint failed: dir='{}' error='{}'",
                self.data_dir.display(),
                err
            );
        }
    }
}

impl ExecutionLedger for FileLedger {
    fn load_all(&mut self) -> Result<VersionMap> {
        self.table = self.persistence.recover()?;
        Ok(self.table.to_version_map())
    }

    fn record_success(&mut self, command: &str, version: &str) -> Result<()> {
        let entry = match self.table.get(command) {
            None => WalEntry::Insert(LedgerRecord::new(command, version)),
            Some(existing) if existing == version => return Ok(()),
            Some(existing) => WalEntry::Update {
                command: command.to_string(),
                old_version: existing.to_string(),
                new_version: version.to_string(),
            },
        };

        // Log BEFORE making changes
        self.persistence.log(&entry)?;
        let applied = self.table.upsert(command, version);
        debug!(command, version, ?applied, "ledger record written");
        debug_assert!(applied != Upsert::Unchanged);

        self.maybe_checkpoint();
        Ok(())
    }

    fn clear_all(&mut self) -> Result<()> {
        self.persistence.log(&WalEntry::Truncate)?;
        self.table.clear();
        debug!(dir = %self.data_dir.display(), "ledger cleared");

        if let Err(err) = self.checkpoint() {
            log::warn!(
                "ledger checkpoint after clear failed: dir='{}' error='{}'",
                self.data_dir.display(),
                err
            );
        }
        Ok(())
    }
}
