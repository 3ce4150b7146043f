//! The shell's typed error surface.
//!
//! Every fallible operation below the binary boundary returns
//! `Result<T, ShellError>`. `shell-bin`'s `main` deals in `anyhow::Result`
//! and converts at the edge: precise per-crate error enums below, `anyhow`
//! at the binary.

use std::io;

/// The shell's error kinds.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("{message}")]
    InvalidUsage { message: String },

    #[error("{message}")]
    InvalidArgument { message: String },

    #[error("script failure: {cause}")]
    ScriptFailure { cause: String },

    #[error("shutdown in progress")]
    ShutdownInProgress,

    #[error("io error ({context}): {source}")]
    IoFailure { context: String, source: io::Error },

    #[error("state backend error: {message}")]
    StateBackendFailure { message: String },
}

impl ShellError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn invalid_usage(message: impl Into<String>) -> Self {
        Self::InvalidUsage {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn script_failure(cause: impl Into<String>) -> Self {
        Self::ScriptFailure {
            cause: cause.into(),
        }
    }

    pub fn io_failure(context: impl Into<String>, source: io::Error) -> Self {
        Self::IoFailure {
            context: context.into(),
            source,
        }
    }

    pub fn state_backend_failure(message: impl Into<String>) -> Self {
        Self::StateBackendFailure {
            message: message.into(),
        }
    }

    /// Merge a secondary error (e.g. a deferred-cleanup failure) into this
    /// one for presentation, per "deferred-cleanup errors are merged into
    /// any primary handler error".
    pub fn merge(self, other: Option<ShellError>) -> ShellError {
        match other {
            None => self,
            Some(other) => ShellError::ScriptFailure {
                cause: format!("{self}; {other}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_never_debug_dumps() {
        let errs = [
            ShellError::not_found("mode foo"),
            ShellError::invalid_usage("usage: reset (takes no arguments)"),
            ShellError::invalid_argument("value for key x is not a string: got Int"),
            ShellError::script_failure("boom"),
            ShellError::ShutdownInProgress,
            ShellError::io_failure("reading README.md", io::Error::other("denied")),
            ShellError::state_backend_failure("locked"),
        ];
        for e in errs {
            let rendered = e.to_string();
            assert!(!rendered.contains("Debug"));
            assert!(!rendered.is_empty());
        }
    }

    #[test]
    fn merge_combines_messages() {
        let primary = ShellError::invalid_usage("bad args");
        let secondary = ShellError::script_failure("cleanup failed");
        let merged = primary.merge(Some(secondary));
        let rendered = merged.to_string();
        assert!(rendered.contains("bad args"));
        assert!(rendered.contains("cleanup failed"));
    }

    #[test]
    fn merge_with_none_is_identity() {
        let primary = ShellError::not_found("x");
        let merged = primary.merge(None);
        assert_eq!(merged.to_string(), "x not found");
    }
}
