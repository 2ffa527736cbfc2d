// ============================================================================
// src/parser/adapter.rs - operation identifier -> ParsedInvocation
// ============================================================================

use crate::core::{Arguments, OnceError, Result};
use crate::parser::ast::ParsedInvocation;

/// Marks an identifier as an external shell command.
pub const SHELL_SENTINEL: char = '!';

/// Parses configured operation identifiers.
///
/// Identifiers without a `!` are named calls: `name {key:value} {key:value}`.
/// Identifiers with a `!` anywhere are shell commands. Only the text after the
/// *first* `!` is kept, so `"deploy !now"` becomes the shell command `"now"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandSpecParser;

impl CommandSpecParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, identifier: &str) -> Result<ParsedInvocation> {
        match identifier.split_once(SHELL_SENTINEL) {
            Some((_, text)) => Ok(ParsedInvocation::shell(text)),
            None => self.parse_named_call(identifier),
        }
    }

    fn parse_named_call(&self, identifier: &str) -> Result<ParsedInvocation> {
        // Split on single spaces: the name is the first token even when empty.
        let mut tokens = identifier.split(' ');
        let name = tokens.next().unwrap_or_default();

        let mut arguments = Arguments::new();
        for token in tokens.filter(|t| !t.is_empty()) {
            let (key, value) = Self::parse_placeholder(token)?;
            arguments.insert(key, value);
        }

        Ok(ParsedInvocation::named(name, arguments))
    }

    /// `{key:value}` -> `(key, value)`. Braces are stripped independently:
    /// leading `{` first, then trailing `}`.
    fn parse_placeholder(token: &str) -> Result<(String, String)> {
        let stripped = token.trim_start_matches('{').trim_end_matches('}');
        stripped
            .split_once(':')
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .ok_or_else(|| OnceError::MalformedArgument(token.to_string()))
    }
}

/// Shorthand for `CommandSpecParser::new().parse(identifier)`.
pub fn parse(identifier: &str) -> Result<ParsedInvocation> {
    CommandSpecParser::new().parse(identifier)
}
