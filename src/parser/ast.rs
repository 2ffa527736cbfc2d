use crate::core::Arguments;

/// Executable form of an operation identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedInvocation {
    /// In-process invocation looked up by name in the registry.
    NamedCall { name: String, arguments: Arguments },
    /// Opaque command line handed to the platform shell.
    ShellCommand { text: String },
}

impl ParsedInvocation {
    pub fn named(name: impl Into<String>, arguments: Arguments) -> Self {
        Self::NamedCall {
            name: name.into(),
            arguments,
        }
    }

    pub fn shell(text: impl Into<String>) -> Self {
        Self::ShellCommand { text: text.into() }
    }

    pub fn is_shell(&self) -> bool {
        matches!(self, Self::ShellCommand { .. })
    }
}
