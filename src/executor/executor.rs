use super::named::NamedCallExecutor;
use super::registry::InvocationRegistry;
use super::shell::{ProcessRunner, ShellExecutor, ShellProcessRunner};
use crate::core::{ExecutionOutcome, OnceError};
use crate::output::OutputSink;
use crate::parser::ParsedInvocation;

pub trait Executor {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    fn can_handle(&self, parsed: &ParsedInvocation) -> bool;

    /// Runs to completion. Failures come back as `ExecutionOutcome::Failed`,
    /// never as a panic or an early return.
    fn execute(&self, parsed: &ParsedInvocation, sink: &mut dyn OutputSink) -> ExecutionOutcome;
}

/// Dispatches a parsed operation to the first executor that can handle it.
pub struct OperationExecutor {
    pub executors: Vec<Box<dyn Executor>>,
}

impl OperationExecutor {
    pub fn empty() -> Self {
        Self {
            executors: Vec::new(),
        }
    }

    /// Named calls go to `registry`, shell commands to the platform shell.
    pub fn new(registry: InvocationRegistry) -> Self {
        Self::with_process_runner(registry, ShellProcessRunner::new())
    }

    pub fn with_process_runner(
        registry: InvocationRegistry,
        runner: impl ProcessRunner + 'static,
    ) -> Self {
        let mut pipeline = Self::empty();
        pipeline.register(Box::new(NamedCallExecutor::new(registry)));
        pipeline.register(Box::new(ShellExecutor::new(runner)));
        pipeline
    }

    pub fn register(&mut self, executor: Box<dyn Executor>) {
        self.executors.push(executor);
    }

    pub fn execute(&self, parsed: &ParsedInvocation, sink: &mut dyn OutputSink) -> ExecutionOutcome {
        for executor in &self.executors {
            if executor.can_handle(parsed) {
                tracing::debug!(executor = executor.name(), ?parsed, "dispatching");
                return executor.execute(parsed, sink);
            }
        }

        ExecutionOutcome::Failed(OnceError::InvocationFailure {
            name: describe(parsed),
            message: "no executor registered for this kind of operation".to_string(),
        })
    }

    pub fn list_executors(&self) -> Vec<&str> {
        self.executors.iter().map(|e| e.name()).collect()
    }
}

fn describe(parsed: &ParsedInvocation) -> String {
    match parsed {
        ParsedInvocation::NamedCall { name, .. } => name.clone(),
        ParsedInvocation::ShellCommand { text } => text.clone(),
    }
}

impl Default for OperationExecutor {
    fn default() -> Self {
        Self::new(InvocationRegistry::new())
    }
}
