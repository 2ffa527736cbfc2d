use thiserror::Error;

#[derive(Error, Debug)]
pub enum OnceError {
    #[error("Malformed argument '{0}': expected {{key:value}}")]
    MalformedArgument(String),

    #[error("Command '{name}' failed: {message}")]
    InvocationFailure { name: String, message: String },

    /// Displays as the captured stderr of the failed process.
    #[error("{stderr}")]
    ProcessFailure { code: Option<i32>, stderr: String },

    #[error("Ledger storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Ledger write failed: {0}")]
    StorageWrite(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OnceError {
    /// Per-entry failures are reported and the pass continues; everything
    /// else aborts the run.
    pub fn is_entry_failure(&self) -> bool {
        matches!(
            self,
            Self::MalformedArgument(_) | Self::InvocationFailure { .. } | Self::ProcessFailure { .. }
        )
    }
}

impl From<serde_json::Error> for OnceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OnceError>;
