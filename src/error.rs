// Error taxonomy shared by the snapshot sources

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// The OS call or the accounting subprocess failed; callers degrade to empty data.
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    /// A single accounting line did not match the field grammar.
    #[error("skipped line {line:?}: {reason}")]
    ParseSkipped { line: String, reason: &'static str },
}

impl SourceError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        SourceError::SourceUnavailable(msg.into())
    }
}
