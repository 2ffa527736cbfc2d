use super::executor::Executor;
use crate::core::{ExecutionOutcome, OnceError};
use crate::output::OutputSink;
use crate::parser::ParsedInvocation;
use std::io;
use std::process::Command;

/// Result of running a shell command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs a command line to completion. `Err` only when the process could not be started.
pub trait ProcessRunner {
    fn run(&self, command_line: &str) -> io::Result<ProcessOutput>;
}

/// `/bin/sh -c` on Unix, `cmd /C` on Windows. Blocks until the child exits;
/// there is no timeout.
#[derive(Debug, Clone, Default)]
pub struct ShellProcessRunner;

impl ShellProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(command_line: &str) -> Command {
        if cfg!(windows) {
            let mut command = Command::new("cmd");
            command.arg("/C").arg(command_line);
            command
        } else {
            let mut command = Command::new("/bin/sh");
            command.arg("-c").arg(command_line);
            command
        }
    }
}

impl ProcessRunner for ShellProcessRunner {
    fn run(&self, command_line: &str) -> io::Result<ProcessOutput> {
        let output = Self::command(command_line).output()?;

        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Runs shell commands through a `ProcessRunner`.
pub struct ShellExecutor {
    runner: Box<dyn ProcessRunner>,
}

impl ShellExecutor {
    pub fn new(runner: impl ProcessRunner + 'static) -> Self {
        Self {
            runner: Box::new(runner),
        }
    }
}

impl Executor for ShellExecutor {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn can_handle(&self, parsed: &ParsedInvocation) -> bool {
        parsed.is_shell()
    }

    fn execute(&self, parsed: &ParsedInvocation, sink: &mut dyn OutputSink) -> ExecutionOutcome {
        let ParsedInvocation::ShellCommand { text } = parsed else {
            return ExecutionOutcome::Failed(OnceError::ProcessFailure {
                code: None,
                stderr: "not a shell command".to_string(),
            });
        };

        let output = match self.runner.run(text) {
            Ok(output) => output,
            Err(err) => {
                return ExecutionOutcome::Failed(OnceError::ProcessFailure {
                    code: None,
                    stderr: format!("failed to spawn shell: {}", err),
                });
            }
        };

        if !output.success {
            tracing::debug!(command = %text, code = ?output.code, "shell command failed");
            return ExecutionOutcome::Failed(OnceError::ProcessFailure {
                code: output.code,
                stderr: output.stderr,
            });
        }

        sink.info(&output.stdout);
        ExecutionOutcome::Succeeded
    }
}
