use thiserror::Error;

use crate::condition::Operator;
use crate::method::Subject;

/// Errors from query derivation and translation.
///
/// All of these are fatal for the one query being compiled.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    /// The method name does not follow the `<verb>By<predicate>` shape.
    #[error("invalid query method name `{name}`: {reason}")]
    InvalidMethodName { name: String, reason: String },

    /// The method name uses a keyword with no condition form.
    #[error("keyword `{keyword}` in query method `{name}` not supported")]
    UnsupportedKeyword { name: String, keyword: String },

    /// OR is never supported.
    #[error("Or operator in query method not supported")]
    UnsupportedOr,

    /// Comparison operators other than equality are not supported.
    #[error("operator {0} not supported")]
    UnsupportedOperator(Operator),

    /// An equality literal of a type with no filter form.
    #[error("value type not supported: {value} : {type_name}")]
    UnsupportedValue {
        value: String,
        type_name: &'static str,
    },

    /// The number of bound arguments does not match the predicates.
    #[error("query method `{name}` expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// The method was invoked through an entry point for another verb.
    #[error("query method `{name}` is a {found} method, expected a {expected} method")]
    WrongSubject {
        name: String,
        expected: Subject,
        found: Subject,
    },
}

/// Result alias for query operations.
pub type QueryResult<T> = Result<T, QueryError>;
