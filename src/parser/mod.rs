pub mod adapter;
pub mod ast;

pub use adapter::{CommandSpecParser, SHELL_SENTINEL, parse};
pub use ast::ParsedInvocation;
