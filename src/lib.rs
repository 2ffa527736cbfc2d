// ============================================================================
// command-once Library
// ============================================================================

pub mod config;
pub mod core;
pub mod executor;
pub mod output;
pub mod parser;
pub mod runner;
pub mod storage;

// Re-export main types for convenience
pub use config::{ExecList, LedgerConfig, OnceConfig};
pub use crate::core::{Arguments, ExecutionOutcome, LedgerRecord, OnceError, OperationEntry, Result, RunSummary};
pub use executor::{InvocationRegistry, Invokable, OperationExecutor};
pub use output::{BufferSink, ConsoleSink, OutputSink};
pub use parser::{CommandSpecParser, ParsedInvocation};
pub use runner::RunController;
pub use storage::{DurabilityMode, ExecutionLedger, FileLedger, InMemoryLedger};

/// Run a loaded configuration against its durable ledger.
///
/// With an empty `execs` list the ledger is not even opened.
///
/// # Examples
///
/// ```no_run
/// use command_once::{ConsoleSink, InvocationRegistry, OnceConfig, run_configured};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = OnceConfig::from_file("command_once.json")?;
/// let summary = run_configured(&config, InvocationRegistry::new(), false, ConsoleSink::new())?;
/// println!("{} executed, {} failed", summary.executed(), summary.failed());
/// # Ok(())
/// # }
/// ```
pub fn run_configured<S: OutputSink>(
    config: &OnceConfig,
    registry: InvocationRegistry,
    force_reset: bool,
    mut sink: S,
) -> Result<RunSummary> {
    if config.execs.is_empty() {
        sink.info(runner::NOTHING_TO_DO);
        return Ok(RunSummary::new());
    }

    let ledger = FileLedger::from_config(&config.ledger)?;
    let mut controller = RunController::new(ledger, OperationExecutor::new(registry), sink);
    controller.run(&config.execs, force_reset)
}
