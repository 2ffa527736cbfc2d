pub mod builtin;
pub mod executor;
pub mod named;
pub mod registry;
pub mod shell;

pub use executor::{Executor, OperationExecutor};
pub use named::NamedCallExecutor;
pub use registry::{InvocationRegistry, Invokable};
pub use shell::{ProcessOutput, ProcessRunner, ShellExecutor, ShellProcessRunner};
