//! Write-Ahead Logging (WAL) and snapshots for the durable ledger

use super::engine::LEDGER_TABLE;
use super::table::LedgerTable;
use crate::core::{LedgerRecord, OnceError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

// ============================================================================
// WAL Entry Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalEntry {
    Insert(LedgerRecord),
    Update { command: String, old_version: String, new_version: String },
    Truncate,
}

impl WalEntry {
    /// Replay is idempotent: an entry already reflected in a snapshot can be
    /// applied again without changing the result.
    pub fn apply(&self, table: &mut LedgerTable) {
        match self {
            WalEntry::Insert(record) => {
                table.upsert(&record.command, &record.version);
            }
            WalEntry::Update { command, new_version, .. } => {
                table.upsert(command, new_version);
            }
            WalEntry::Truncate => table.clear(),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

// ============================================================================
// Ledger Snapshot
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: u32,
    pub records: Vec<LedgerRecord>,
    pub metadata: SnapshotMetadata,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub created_at: u64,
    pub record_count: usize,
}

impl LedgerSnapshot {
    pub fn new(table: &LedgerTable) -> Self {
        let records = table.records();
        let record_count = records.len();

        Self {
            version: 1,
            records,
            metadata: SnapshotMetadata { created_at: now_millis(), record_count },
        }
    }
}

// ============================================================================
// Durability Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurabilityMode {
    /// fsync after every WAL append
    #[default]
    Sync,
    /// flush to the OS, no fsync
    Async,
    /// nothing touches disk
    None,
}

// ============================================================================
// WAL Manager
// ============================================================================

pub struct WalManager {
    wal_path: PathBuf,
    wal_file: Option<BufWriter<File>>,
    durability_mode: DurabilityMode,
    entries_since_checkpoint: usize,
    checkpoint_threshold: usize,
}

impl WalManager {
    pub fn new<P: AsRef<Path>>(wal_path: P, durability_mode: DurabilityMode) -> Result<Self> {
        let wal_path = wal_path.as_ref().to_path_buf();

        let wal_file = if durability_mode != DurabilityMode::None {
            if let Some(parent) = wal_path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    OnceError::StorageUnavailable(format!("Failed to create ledger directory: {}", e))
                })?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&wal_path).map_err(|e| {
                OnceError::StorageUnavailable(format!("Failed to open WAL file '{}': {}", wal_path.display(), e))
            })?;
            Some(BufWriter::new(file))
        } else {
            None
        };

        Ok(Self {
            wal_path,
            wal_file,
            durability_mode,
            entries_since_checkpoint: 0,
            checkpoint_threshold: 256,
        })
    }

    /// Length-prefixed MessagePack record; flushed (and synced in `Sync`
    /// mode) before returning.
    pub fn append(&mut self, entry: &WalEntry) -> Result<()> {
        if self.durability_mode == DurabilityMode::None { return Ok(()); }
        let file = self.wal_file.as_mut().ok_or_else(|| OnceError::StorageWrite("WAL file not initialized".to_string()))?;
        let serialized = rmp_serde::to_vec(entry).map_err(|e| OnceError::Serialization(format!("Failed to serialize WAL entry: {}", e)))?;

        // One buffer, one write: the length prefix never lands without its payload in the buffer.
        let mut frame = Vec::with_capacity(serialized.len() + 4);
        frame.extend_from_slice(&(serialized.len() as u32).to_le_bytes());
        frame.extend_from_slice(&serialized);

        file.write_all(&frame).map_err(|e| OnceError::StorageWrite(format!("Failed to write WAL: {}", e)))?;
        file.flush().map_err(|e| OnceError::StorageWrite(format!("Failed to flush WAL: {}", e)))?;
        if self.durability_mode == DurabilityMode::Sync {
            file.get_mut().sync_all().map_err(|e| OnceError::StorageWrite(format!("Failed to sync WAL: {}", e)))?;
        }
        self.entries_since_checkpoint += 1;
        Ok(())
    }

    /// Reads every complete entry. A torn trailing record is dropped.
    pub fn read_all(&self) -> Result<Vec<WalEntry>> {
        self.read_frames().map(|(entries, _)| entries)
    }

    /// Complete entries plus the byte offset where the last one ends.
    fn read_frames(&self) -> Result<(Vec<WalEntry>, u64)> {
        if self.durability_mode == DurabilityMode::None || !self.wal_path.exists() {
            return Ok((Vec::new(), 0));
        }
        let file = File::open(&self.wal_path).map_err(|e| OnceError::StorageUnavailable(format!("Failed to open WAL for reading: {}", e)))?;
        let mut reader = BufReader::new(file);
        let mut entries = Vec::new();
        let mut valid_len = 0u64;
        loop {
            let mut len_bytes = [0u8; 4];
            match reader.read_exact(&mut len_bytes) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(OnceError::StorageUnavailable(format!("Failed to read WAL entry length: {}", e))),
            }
            let len = u32::from_le_bytes(len_bytes) as usize;
            let mut data = vec![0u8; len];
            match reader.read_exact(&mut data) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                    log::warn!("ignoring torn WAL record at end of '{}'", self.wal_path.display());
                    break;
                }
                Err(e) => return Err(OnceError::StorageUnavailable(format!("Failed to read WAL entry data: {}", e))),
            }
            let entry: WalEntry = rmp_serde::from_slice(&data).map_err(|e| OnceError::StorageUnavailable(format!("Failed to deserialize WAL entry: {}", e)))?;
            entries.push(entry);
            valid_len += 4 + len as u64;
        }
        Ok((entries, valid_len))
    }

    /// Like `read_all`, but also cuts a torn tail off the file so the next
    /// append lands right after the last complete record.
    pub fn recover_entries(&mut self) -> Result<Vec<WalEntry>> {
        let (entries, valid_len) = self.read_frames()?;
        let Some(writer) = self.wal_file.as_mut() else {
            return Ok(entries);
        };
        let file = writer.get_mut();
        let file_len = file
            .metadata()
            .map_err(|e| OnceError::StorageUnavailable(format!("Failed to stat WAL: {}", e)))?
            .len();
        if file_len > valid_len {
            log::warn!(
                "truncating WAL '{}' from {} to {} bytes",
                self.wal_path.display(),
                file_len,
                valid_len
            );
            file.set_len(valid_len)
                .and_then(|_| file.sync_all())
                .map_err(|e| OnceError::StorageUnavailable(format!("Failed to truncate torn WAL tail: {}", e)))?;
        }
        Ok(entries)
    }

    pub fn clear(&mut self) -> Result<()> {
        if self.durability_mode == DurabilityMode::None { return Ok(()); }
        self.wal_file = None;
        let file = OpenOptions::new().write(true).truncate(true).open(&self.wal_path)
            .map_err(|e| OnceError::StorageWrite(format!("Failed to truncate WAL: {}", e)))?;
        if self.durability_mode == DurabilityMode::Sync {
            file.sync_all().map_err(|e| OnceError::StorageWrite(format!("Failed to sync WAL: {}", e)))?;
        }
        let file = OpenOptions::new().append(true).open(&self.wal_path)
            .map_err(|e| OnceError::StorageWrite(format!("Failed to reopen WAL: {}", e)))?;
        self.wal_file = Some(BufWriter::new(file));
        self.entries_since_checkpoint = 0;
        Ok(())
    }

    pub fn needs_checkpoint(&self) -> bool {
        self.entries_since_checkpoint >= self.checkpoint_threshold
    }

    pub fn entries_since_checkpoint(&self) -> usize {
        self.entries_since_checkpoint
    }

    pub fn set_checkpoint_threshold(&mut self, threshold: usize) {
        self.checkpoint_threshold = threshold.max(1);
    }

    pub fn path(&self) -> &Path {
        &self.wal_path
    }
}

// ============================================================================
// Snapshot Manager
// ============================================================================

pub struct SnapshotManager {
    snapshot_path: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
        }
    }

    /// Write to a temp file, sync, then rename over the snapshot.
    pub fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        if let Some(parent) = self.snapshot_path.parent() {
            fs::create_dir_all(parent).map_err(|e| OnceError::StorageWrite(format!("Failed to create snapshot directory: {}", e)))?;
        }
        let temp_path = self.snapshot_path.with_extension("tmp");
        let temp_file = File::create(&temp_path).map_err(|e| OnceError::StorageWrite(format!("Failed to create temp file: {}", e)))?;
        let mut writer = BufWriter::new(temp_file);
        let serialized = rmp_serde::to_vec(snapshot).map_err(|e| OnceError::Serialization(format!("Failed to serialize snapshot: {}", e)))?;
        writer.write_all(&serialized).map_err(|e| OnceError::StorageWrite(format!("Failed to write snapshot: {}", e)))?;
        writer.flush().map_err(|e| OnceError::StorageWrite(format!("Failed to flush snapshot: {}", e)))?;
        writer.get_mut().sync_all().map_err(|e| OnceError::StorageWrite(format!("Failed to sync snapshot: {}", e)))?;
        fs::rename(&temp_path, &self.snapshot_path).map_err(|e| OnceError::StorageWrite(format!("Failed to rename snapshot: {}", e)))?;
        Ok(())
    }

    pub fn load(&self) -> Result<Option<LedgerSnapshot>> {
        if !self.snapshot_path.exists() { return Ok(None); }
        let mut file = File::open(&self.snapshot_path).map_err(|e| OnceError::StorageUnavailable(format!("Failed to open snapshot: {}", e)))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(|e| OnceError::StorageUnavailable(format!("Failed to read snapshot: {}", e)))?;
        let snapshot: LedgerSnapshot = rmp_serde::from_slice(&data).map_err(|e| OnceError::StorageUnavailable(format!("Failed to deserialize snapshot: {}", e)))?;
        Ok(Some(snapshot))
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path.exists()
    }

    pub fn path(&self) -> &Path {
        &self.snapshot_path
    }
}

// ============================================================================
// Persistence Manager
// ============================================================================

pub struct PersistenceManager {
    wal: WalManager,
    snapshot: SnapshotManager,
    durability_mode: DurabilityMode,
}

impl PersistenceManager {
    pub fn new<P: AsRef<Path>>(data_dir: P, durability_mode: DurabilityMode) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        let wal_path = data_dir.join(format!("{}.wal", LEDGER_TABLE));
        let snapshot_path = data_dir.join(format!("{}.snapshot", LEDGER_TABLE));
        let wal = WalManager::new(wal_path, durability_mode)?;
        let snapshot = SnapshotManager::new(snapshot_path);
        Ok(Self { wal, snapshot, durability_mode })
    }

    pub fn log(&mut self, entry: &WalEntry) -> Result<()> {
        self.wal.append(entry)
    }

    pub fn checkpoint(&mut self, table: &LedgerTable) -> Result<()> {
        if self.durability_mode == DurabilityMode::None { return Ok(()); }
        self.snapshot.save(&LedgerSnapshot::new(table))?;
        self.wal.clear()?;
        Ok(())
    }

    pub fn needs_checkpoint(&self) -> bool {
        self.wal.needs_checkpoint()
    }

    /// Snapshot first, then every WAL entry on top of it.
    pub fn recover(&mut self) -> Result<LedgerTable> {
        if self.durability_mode == DurabilityMode::None {
            return Ok(LedgerTable::new());
        }

        let mut table = match self.snapshot.load()? {
            Some(snapshot) => LedgerTable::from_records(snapshot.records),
            None => LedgerTable::new(),
        };

        for entry in self.wal.recover_entries()? {
            entry.apply(&mut table);
        }
        Ok(table)
    }

    pub fn wal(&self) -> &WalManager { &self.wal }
    pub fn wal_mut(&mut self) -> &mut WalManager { &mut self.wal }
    pub fn snapshot(&self) -> &SnapshotManager { &self.snapshot }
    pub fn durability_mode(&self) -> DurabilityMode { self.durability_mode }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_wal_append_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let wal_path = temp_dir.path().join("test.wal");
        let mut wal = WalManager::new(&wal_path, DurabilityMode::Sync).unwrap();
        wal.append(&WalEntry::Insert(LedgerRecord::new("!echo hi", "1"))).unwrap();
        wal.append(&WalEntry::Update {
            command: "!echo hi".to_string(),
            old_version: "1".to_string(),
            new_version: "2".to_string(),
        }).unwrap();
        wal.append(&WalEntry::Truncate).unwrap();
        let entries = wal.read_all().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2], WalEntry::Truncate);
    }

    #[test]
    fn test_torn_tail_record_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let wal_path = temp_dir.path().join("test.wal");
        {
            let mut wal = WalManager::new(&wal_path, DurabilityMode::Sync).unwrap();
            wal.append(&WalEntry::Insert(LedgerRecord::new("a", "1"))).unwrap();
        }
        // A length prefix promising more bytes than were written.
        let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
        file.write_all(&64u32.to_le_bytes()).unwrap();
        file.write_all(&[0x92, 0xa1]).unwrap();
        drop(file);

        let wal = WalManager::new(&wal_path, DurabilityMode::Sync).unwrap();
        let entries = wal.read_all().unwrap();
        assert_eq!(entries, vec![WalEntry::Insert(LedgerRecord::new("a", "1"))]);
    }

    #[test]
    fn test_appends_after_torn_tail_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let wal_path = temp_dir.path().join(format!("{}.wal", LEDGER_TABLE));
        {
            let mut persistence = PersistenceManager::new(temp_dir.path(), DurabilityMode::Sync).unwrap();
            persistence.log(&WalEntry::Insert(LedgerRecord::new("a", "1"))).unwrap();
        }
        let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
        file.write_all(&64u32.to_le_bytes()).unwrap();
        file.write_all(&[0x92, 0xa1]).unwrap();
        drop(file);

        {
            let mut persistence = PersistenceManager::new(temp_dir.path(), DurabilityMode::Sync).unwrap();
            assert_eq!(persistence.recover().unwrap().len(), 1);
            persistence.log(&WalEntry::Insert(LedgerRecord::new("b", "1"))).unwrap();
            persistence.log(&WalEntry::Insert(LedgerRecord::new("c", "1"))).unwrap();
        }

        let mut persistence = PersistenceManager::new(temp_dir.path(), DurabilityMode::Sync).unwrap();
        let recovered = persistence.recover().unwrap();
        assert_eq!(recovered.len(), 3);
        assert_eq!(recovered.get("b"), Some("1"));
        assert_eq!(recovered.get("c"), Some("1"));
    }

    #[test]
    fn test_torn_length_prefix_is_cut() {
        let temp_dir = TempDir::new().unwrap();
        let wal_path = temp_dir.path().join("test.wal");
        {
            let mut wal = WalManager::new(&wal_path, DurabilityMode::Sync).unwrap();
            wal.append(&WalEntry::Truncate).unwrap();
        }
        let intact = fs::metadata(&wal_path).unwrap().len();
        let mut file = OpenOptions::new().append(true).open(&wal_path).unwrap();
        file.write_all(&[0x10, 0x00]).unwrap();
        drop(file);

        let mut wal = WalManager::new(&wal_path, DurabilityMode::Sync).unwrap();
        assert_eq!(wal.recover_entries().unwrap(), vec![WalEntry::Truncate]);
        assert_eq!(fs::metadata(&wal_path).unwrap().len(), intact);
    }

    #[test]
    fn test_snapshot_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let snapshot_mgr = SnapshotManager::new(temp_dir.path().join("test.snapshot"));
        let table = LedgerTable::from_records(vec![LedgerRecord::new("migrate", "3")]);
        snapshot_mgr.save(&LedgerSnapshot::new(&table)).unwrap();
        assert!(snapshot_mgr.exists());
        assert!(!temp_dir.path().join("test.tmp").exists());
        let loaded = snapshot_mgr.load().unwrap().unwrap();
        assert_eq!(loaded.metadata.record_count, 1);
        assert_eq!(loaded.records, vec![LedgerRecord::new("migrate", "3")]);
    }

    #[test]
    fn test_checkpoint_clears_wal() {
        let temp_dir = TempDir::new().unwrap();
        let mut persistence = PersistenceManager::new(temp_dir.path(), DurabilityMode::Sync).unwrap();
        persistence.log(&WalEntry::Insert(LedgerRecord::new("a", "1"))).unwrap();
        persistence.log(&WalEntry::Insert(LedgerRecord::new("b", "1"))).unwrap();
        assert_eq!(persistence.wal().entries_since_checkpoint(), 2);

        let table = persistence.recover().unwrap();
        persistence.checkpoint(&table).unwrap();
        assert_eq!(persistence.wal().entries_since_checkpoint(), 0);
        assert!(persistence.wal().read_all().unwrap().is_empty());
        assert_eq!(persistence.recover().unwrap().len(), 2);
    }

    #[test]
    fn test_recovery_applies_wal_over_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let mut persistence = PersistenceManager::new(temp_dir.path(), DurabilityMode::Sync).unwrap();
        let table = LedgerTable::from_records(vec![LedgerRecord::new("a", "1"), LedgerRecord::new("b", "1")]);
        persistence.checkpoint(&table).unwrap();

        persistence.log(&WalEntry::Update {
            command: "a".to_string(),
            old_version: "1".to_string(),
            new_version: "2".to_string(),
        }).unwrap();
        persistence.log(&WalEntry::Insert(LedgerRecord::new("c", "1"))).unwrap();

        let recovered = persistence.recover().unwrap();
        assert_eq!(recovered.len(), 3);
        assert_eq!(recovered.get("a"), Some("2"));
        assert_eq!(recovered.get("c"), Some("1"));
    }

    #[test]
    fn test_truncate_entry_wipes_snapshot_records() {
        let temp_dir = TempDir::new().unwrap();
        let mut persistence = PersistenceManager::new(temp_dir.path(), DurabilityMode::Sync).unwrap();
        let table = LedgerTable::from_records(vec![LedgerRecord::new("a", "1")]);
        persistence.checkpoint(&table).unwrap();
        persistence.log(&WalEntry::Truncate).unwrap();
        persistence.log(&WalEntry::Insert(LedgerRecord::new("b", "1"))).unwrap();

        let recovered = persistence.recover().unwrap();
        assert_eq!(recovered.records(), vec![LedgerRecord::new("b", "1")]);
    }

    #[test]
    fn test_none_mode_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("ledger");
        let mut persistence = PersistenceManager::new(&data_dir, DurabilityMode::None).unwrap();
        persistence.log(&WalEntry::Insert(LedgerRecord::new("a", "1"))).unwrap();
        persistence.checkpoint(&LedgerTable::new()).unwrap();
        assert!(!data_dir.exists());
        assert!(persistence.recover().unwrap().is_empty());
    }
}
