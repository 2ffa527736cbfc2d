use super::executor::Executor;
use super::registry::InvocationRegistry;
use crate::core::{ExecutionOutcome, OnceError};
use crate::output::OutputSink;
use crate::parser::ParsedInvocation;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Invokes registered in-process operations by name.
pub struct NamedCallExecutor {
    registry: InvocationRegistry,
}

impl NamedCallExecutor {
    pub fn new(registry: InvocationRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &InvocationRegistry {
        &self.registry
    }
}

impl Executor for NamedCallExecutor {
    fn name(&self) -> &'static str {
        "named_call"
    }

    fn can_handle(&self, parsed: &ParsedInvocation) -> bool {
        matches!(parsed, ParsedInvocation::NamedCall { .. })
    }

    fn execute(&self, parsed: &ParsedInvocation, sink: &mut dyn OutputSink) -> ExecutionOutcome {
        let ParsedInvocation::NamedCall { name, arguments } = parsed else {
            return ExecutionOutcome::Failed(OnceError::InvocationFailure {
                name: String::new(),
                message: "not a named call".to_string(),
            });
        };

        let Some(invokable) = self.registry.get(name) else {
            return ExecutionOutcome::Failed(OnceError::InvocationFailure {
                name: name.clone(),
                message: format!("Command \"{}\" is not defined.", name),
            });
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| invokable.invoke(arguments)))
            .unwrap_or_else(|payload| Err(panic_message(payload.as_ref())));

        match result {
            Ok(()) => {
                let serialized = serde_json::to_string(arguments).unwrap_or_default();
                sink.info(&format!("Command: {}", name));
                sink.info(&format!("Arguments: {}", serialized));
                ExecutionOutcome::Succeeded
            }
            Err(message) => ExecutionOutcome::Failed(OnceError::InvocationFailure {
                name: name.clone(),
                message,
            }),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
