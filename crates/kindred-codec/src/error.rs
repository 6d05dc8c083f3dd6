use thiserror::Error;

/// Errors from marshalling and unmarshalling.
///
/// Coercion misses are not errors: a value with no conversion onto a field's
/// declared kind leaves the field unmodified.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The target type has no registered no-argument constructor.
    #[error("cannot instantiate {type_name}: no constructor registered")]
    Instantiation { type_name: String },
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
