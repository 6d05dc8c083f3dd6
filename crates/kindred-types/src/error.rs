use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("kind must not be empty")]
    EmptyKind,

    #[error("key name must not be empty for kind {kind}")]
    EmptyName { kind: String },

    #[error("key path must contain at least one segment")]
    EmptyPath,
}
