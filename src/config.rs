use crate::core::{OnceError, OperationEntry, Result};
use crate::storage::DurabilityMode;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "command_once.json";
pub const DEFAULT_DATA_DIR: &str = ".command_once";

/// Runner configuration file
///
/// ```json
/// {
///   "execs": {
///     "cache:warm {scope:all}": "1",
///     "!php artisan storage:link": 2
///   },
///   "ledger": { "data_dir": "storage/command_once", "durability": "sync" }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OnceConfig {
    #[serde(default)]
    pub execs: ExecList,

    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl OnceConfig {
    pub fn new(execs: ExecList) -> Self {
        Self {
            execs,
            ledger: LedgerConfig::default(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| OnceError::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            OnceError::Config(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        serde_json::from_str(&contents)
            .map_err(|e| OnceError::Config(format!("Invalid configuration '{}': {}", path.display(), e)))
    }

    /// Set the ledger configuration
    pub fn ledger(mut self, ledger: LedgerConfig) -> Self {
        self.ledger = ledger;
        self
    }
}

/// Where and how the version ledger is stored
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Directory holding `command_once.wal` and `command_once.snapshot`
    pub data_dir: PathBuf,

    pub durability: DurabilityMode,

    /// WAL records written before they are compacted into a snapshot
    pub checkpoint_threshold: usize,
}

impl LedgerConfig {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Set the ledger directory
    pub fn data_dir<P: AsRef<Path>>(mut self, data_dir: P) -> Self {
        self.data_dir = data_dir.as_ref().to_path_buf();
        self
    }

    /// Set durability mode
    pub fn durability(mut self, mode: DurabilityMode) -> Self {
        self.durability = mode;
        self
    }

    pub fn checkpoint_threshold(mut self, threshold: usize) -> Self {
        self.checkpoint_threshold = threshold;
        self
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            durability: DurabilityMode::Sync,
            checkpoint_threshold: 256,
        }
    }
}

/// Operations in declaration order.
///
/// Deserialized from a JSON object whose keys are operation identifiers and
/// whose values are versions. Versions may be strings, numbers or booleans;
/// non-strings are compared by their JSON text (`1` and `"1"` are the same
/// version). A repeated key keeps its first position and its last version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecList(Vec<OperationEntry>);

impl ExecList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, or replace the version of an existing identifier.
    pub fn push(&mut self, identifier: impl Into<String>, version: impl Into<String>) {
        let entry = OperationEntry::new(identifier, version);
        match self.0.iter_mut().find(|e| e.identifier == entry.identifier) {
            Some(existing) => existing.version = entry.version,
            None => self.0.push(entry),
        }
    }

    pub fn with(mut self, identifier: impl Into<String>, version: impl Into<String>) -> Self {
        self.push(identifier, version);
        self
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OperationEntry> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> &[OperationEntry] {
        &self.0
    }
}

impl<I, V> FromIterator<(I, V)> for ExecList
where
    I: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (I, V)>>(iter: T) -> Self {
        let mut list = Self::new();
        for (identifier, version) in iter {
            list.push(identifier, version);
        }
        list
    }
}

impl<'a> IntoIterator for &'a ExecList {
    type Item = &'a OperationEntry;
    type IntoIter = std::slice::Iter<'a, OperationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VersionValue {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Flag(bool),
}

impl VersionValue {
    fn into_version(self) -> String {
        match self {
            VersionValue::Text(s) => s,
            VersionValue::Integer(i) => i.to_string(),
            VersionValue::Unsigned(u) => u.to_string(),
            VersionValue::Float(f) => f.to_string(),
            VersionValue::Flag(b) => b.to_string(),
        }
    }
}

struct ExecListVisitor;

impl<'de> Visitor<'de> for ExecListVisitor {
    type Value = ExecList;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping operation identifiers to versions")
    }

    fn visit_map<A>(self, mut map: A) -> std::result::Result<ExecList, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut list = ExecList::new();
        while let Some((identifier, version)) = map.next_entry::<String, VersionValue>()? {
            if identifier.is_empty() {
                return Err(de::Error::custom("operation identifier must not be empty"));
            }
            list.push(identifier, version.into_version());
        }
        Ok(list)
    }
}

impl<'de> Deserialize<'de> for ExecList {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ExecListVisitor)
    }
}
