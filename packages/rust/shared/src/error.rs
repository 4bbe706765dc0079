//! Error types for ContractForge.
//!
//! Library crates use [`ContractForgeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all ContractForge operations.
#[derive(Debug, thiserror::Error)]
pub enum ContractForgeError {
    /// Malformed or incomplete input configuration. Fatal, reported before
    /// any external call is made.
    #[error("config error: {message}")]
    Configuration { message: String },

    /// The text-generation collaborator is unreachable or returned an error
    /// status. Fatal for the run once the client's bounded retries are spent.
    #[error("text generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// The text-generation collaborator returned blank or unusable text.
    /// Recovered locally via placeholder substitution.
    #[error("generation returned no usable text: {0}")]
    GenerationEmpty(String),

    /// A canonical section is missing, duplicated, out of order, or empty
    /// after assembly. Indicates an upstream defect, not bad input.
    #[error("incomplete document: {message}")]
    IncompleteDocument { message: String },

    /// The external HTML-to-PDF tool is not available. Fatal, no fallback.
    #[error("PDF render tool missing: {0}")]
    RenderToolMissing(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ContractForgeError>;

impl ContractForgeError {
    /// Create a configuration error from any displayable message.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    /// Create an incomplete-document error from any displayable message.
    pub fn incomplete(msg: impl Into<String>) -> Self {
        Self::IncompleteDocument {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ContractForgeError::configuration("missing service_regions");
        assert_eq!(err.to_string(), "config error: missing service_regions");

        let err = ContractForgeError::incomplete("section 'Signatures' missing");
        assert!(err.to_string().contains("Signatures"));
    }

    #[test]
    fn generation_empty_carries_context() {
        let err = ContractForgeError::GenerationEmpty("blank response body".into());
        assert!(err.to_string().contains("blank response body"));
    }
}
