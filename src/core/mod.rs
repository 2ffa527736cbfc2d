pub mod error;
pub mod types;

pub use error::{OnceError, Result};
pub use types::{Arguments, EntryReport, ExecutionOutcome, LedgerRecord, OperationEntry, RunSummary};
