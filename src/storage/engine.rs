use crate::core::Result;
use std::collections::HashMap;

/// Name of the ledger table; also the file stem of the durable backend.
pub const LEDGER_TABLE: &str = "command_once";

/// command -> last successfully executed version
pub type VersionMap = HashMap<String, String>;

/// Ledger trait - allows pluggable storage backends
pub trait ExecutionLedger {
    /// Read every record. Fails with `StorageUnavailable` if the backing
    /// store cannot be reached.
    fn load_all(&mut self) -> Result<VersionMap>;

    /// Insert `(command, version)` or update the existing record's version.
    /// A record is either fully written or not at all.
    fn record_success(&mut self, command: &str, version: &str) -> Result<()>;

    /// Remove every record.
    fn clear_all(&mut self) -> Result<()>;
}

impl<L: ExecutionLedger + ?Sized> ExecutionLedger for &mut L {
    fn load_all(&mut self) -> Result<VersionMap> {
        (**self).load_all()
    }

    fn record_success(&mut self, command: &str, version: &str) -> Result<()> {
        (**self).record_success(command, version)
    }

    fn clear_all(&mut self) -> Result<()> {
        (**self).clear_all()
    }
}

impl<L: ExecutionLedger + ?Sized> ExecutionLedger for Box<L> {
    fn load_all(&mut self) -> Result<VersionMap> {
        (**self).load_all()
    }

    fn record_success(&mut self, command: &str, version: &str) -> Result<()> {
        (**self).record_success(command, version)
    }

    fn clear_all(&mut self) -> Result<()> {
        (**self).clear_all()
    }
}
