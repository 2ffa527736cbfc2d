pub mod engine;
pub mod file;
pub mod memory;
pub mod persistence;
pub mod table;

pub use engine::{ExecutionLedger, LEDGER_TABLE, VersionMap};
pub use file::FileLedger;
pub use memory::{InMemoryLedger, LedgerStats};
pub use persistence::{DurabilityMode, PersistenceManager, WalEntry};
pub use table::LedgerTable;
