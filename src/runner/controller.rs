use crate::config::ExecList;
use crate::core::{ExecutionOutcome, OperationEntry, Result, RunSummary};
use crate::executor::OperationExecutor;
use crate::output::OutputSink;
use crate::parser::CommandSpecParser;
use crate::storage::{ExecutionLedger, VersionMap};
use tracing::{debug, info, info_span, warn};

pub const NOTHING_TO_DO: &str = "The execs array is empty now, we have nothing to do.";
pub const ALL_EXECUTED: &str = "All command executed.";

/// Runs the configured operations once per version.
///
/// The ledger is read once per run; each successful operation is recorded
/// immediately, so an interrupted run resumes at the first unrecorded entry.
/// Operation failures are reported and the pass continues. Only ledger
/// failures end a run early.
pub struct RunController<L, S> {
    ledger: L,
    executor: OperationExecutor,
    parser: CommandSpecParser,
    sink: S,
}

impl<L: ExecutionLedger, S: OutputSink> RunController<L, S> {
    pub fn new(ledger: L, executor: OperationExecutor, sink: S) -> Self {
        Self {
            ledger,
            executor,
            parser: CommandSpecParser::new(),
            sink,
        }
    }

    pub fn run(&mut self, execs: &ExecList, force_reset: bool) -> Result<RunSummary> {
        let _span = info_span!("command_once", entries = execs.len(), force_reset).entered();

        if execs.is_empty() {
            self.sink.info(NOTHING_TO_DO);
            return Ok(RunSummary::new());
        }

        if force_reset {
            self.ledger.clear_all()?;
            info!("ledger cleared before run");
        }

        let mut processed = self.ledger.load_all()?;
        debug!(records = processed.len(), "ledger loaded");

        let mut summary = RunSummary::new();
        for entry in execs {
            let outcome = self.process_entry(entry, &mut processed)?;
            summary.push(entry, outcome);
        }

        self.sink.info(ALL_EXECUTED);
        info!(
            executed = summary.executed(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            "run finished"
        );
        Ok(summary)
    }

    fn process_entry(
        &mut self,
        entry: &OperationEntry,
        processed: &mut VersionMap,
    ) -> Result<ExecutionOutcome> {
        if processed.get(&entry.identifier) == Some(&entry.version) {
            debug!(identifier = %entry.identifier, version = %entry.version, "already executed");
            return Ok(ExecutionOutcome::Skipped);
        }

        self.sink.info("");
        self.sink.info(&format!("Start execute command: {}", entry.identifier));

        let outcome = match self.parser.parse(&entry.identifier) {
            Ok(parsed) => self.executor.execute(&parsed, &mut self.sink),
            Err(err) => ExecutionOutcome::Failed(err),
        };

        match &outcome {
            ExecutionOutcome::Succeeded => {
                self.sink.info(&format!("Execute command {} Success.", entry.identifier));
                self.sink.info("");
                self.ledger.record_success(&entry.identifier, &entry.version)?;
                processed.insert(entry.identifier.clone(), entry.version.clone());
            }
            ExecutionOutcome::Failed(err) => {
                self.sink.error(&err.to_string());
                warn!(identifier = %entry.identifier, error = %err, "command failed");
            }
            ExecutionOutcome::Skipped => {}
        }

        Ok(outcome)
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn executor(&self) -> &OperationExecutor {
        &self.executor
    }

    pub fn into_parts(self) -> (L, OperationExecutor, S) {
        (self.ledger, self.executor, self.sink)
    }
}
