//! Error types for the state store and the collaborator contracts
//!
//! Providers report failures as loosely specified string codes. Those codes
//! are turned into a [`StoreError`] in exactly one place, [`classify`], so
//! nothing above the backend layer ever inspects a raw code.

use thiserror::Error;

/// The specified bucket does not exist
pub const CODE_NO_SUCH_BUCKET: &str = "NoSuchBucket";
/// The specified key does not exist
pub const CODE_NO_SUCH_KEY: &str = "NoSuchKey";
/// Returned when calling HEAD on a missing bucket or object
pub const CODE_NOT_FOUND: &str = "NotFound";

/// Raw failure as reported by a provider backend, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{}] {message}", code.as_deref().unwrap_or("Unknown"))]
pub struct ProviderError {
    /// Provider error code, absent for failures below the protocol
    /// (connection resets, body read errors, ...)
    pub code: Option<String>,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn uncoded(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

/// Coarse outcome of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Transport,
}

impl ErrorKind {
    /// Map a provider code onto the closed set of kinds the store understands.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(CODE_NO_SUCH_BUCKET) | Some(CODE_NO_SUCH_KEY) | Some(CODE_NOT_FOUND) => {
                ErrorKind::NotFound
            }
            _ => ErrorKind::Transport,
        }
    }
}

/// Errors surfaced by every state store operation
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The addressed container or object does not exist
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Any other provider failure, carrying the original code and message
    #[error("{operation} failed for {resource}: {source}")]
    Transport {
        operation: &'static str,
        resource: String,
        #[source]
        source: ProviderError,
    },

    /// A container teardown stopped while removing its versions; `deleted`
    /// may be zero.
    /// Retrying the destroy finishes the job; recreating is not required.
    #[error("teardown of {container} aborted after deleting {deleted} of {total} versions: {source}")]
    PartialTeardown {
        container: String,
        deleted: usize,
        total: usize,
        #[source]
        source: Box<StoreError>,
    },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            _ => ErrorKind::Transport,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Translate a provider failure into a [`StoreError`].
pub fn classify(operation: &'static str, resource: &str, err: ProviderError) -> StoreError {
    match ErrorKind::from_code(err.code()) {
        ErrorKind::NotFound => StoreError::NotFound {
            resource: resource.to_string(),
        },
        ErrorKind::Transport => StoreError::Transport {
            operation,
            resource: resource.to_string(),
            source: err,
        },
    }
}

/// Errors from the deployment collaborators and the orchestration above them
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{client} {operation} failed: {message}")]
    Failed {
        client: &'static str,
        operation: &'static str,
        message: String,
    },

    /// A test double was called without a scripted behaviour for the call
    #[error("no behaviour scripted for {0}")]
    Unscripted(&'static str),

    #[error("invalid deploy arguments: {0}")]
    InvalidArgs(String),

    #[error("malformed config document: {0}")]
    Document(#[from] serde_json::Error),
}

impl ClientError {
    pub fn failed(client: &'static str, operation: &'static str, message: impl Into<String>) -> Self {
        ClientError::Failed {
            client,
            operation,
            message: message.into(),
        }
    }
}

/// Errors raised while loading settings or wiring up a backend
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {variable}: {message}")]
    InvalidValue { variable: String, message: String },

    #[error("failed to start I/O runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("the S3 backend cannot be built inside an async runtime; construct it from a blocking thread")]
    NestedRuntime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_codes_collapse_to_one_kind() {
        for code in [CODE_NO_SUCH_BUCKET, CODE_NO_SUCH_KEY, CODE_NOT_FOUND] {
            let err = classify("load", "cfg-store/state.json", ProviderError::new(code, "missing"));
            assert!(err.is_not_found(), "{} should classify as not found", code);
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }
    }

    #[test]
    fn test_other_codes_keep_original_message() {
        let err = classify(
            "write",
            "cfg-store/state.json",
            ProviderError::new("AccessDenied", "Access Denied"),
        );
        match err {
            StoreError::Transport { operation, resource, source } => {
                assert_eq!(operation, "write");
                assert_eq!(resource, "cfg-store/state.json");
                assert_eq!(source.code(), Some("AccessDenied"));
                assert_eq!(source.message, "Access Denied");
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_uncoded_failures_are_transport() {
        let err = classify("load", "b/k", ProviderError::uncoded("connection reset"));
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_partial_teardown_reports_counts() {
        let cause = classify("delete version", "b/a", ProviderError::new("SlowDown", "slow down"));
        let err = StoreError::PartialTeardown {
            container: "b".to_string(),
            deleted: 2,
            total: 4,
            source: Box::new(cause),
        };
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("2 of 4"));
    }
}
