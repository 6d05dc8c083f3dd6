//! Declarative queries for Kindred.
//!
//! A query starts as a method name such as `findByEmailAddressAndLastName`
//! or as a hand-built [`Condition`] tree. [`QueryMethod`] parses the name and
//! binds call arguments into a [`PredicateQuery`]; [`translate`] turns the
//! condition into a store [`Filter`](kindred_store::Filter), and [`finalize`]
//! scopes it to an entity kind and an optional ancestor.
//!
//! Only equality, null checks and conjunction translate. Or, comparison
//! operators and unsupported literal types are rejected. Sort
//! specifications are parsed and carried but never applied.

pub mod condition;
pub mod error;
pub mod method;
pub mod translator;

pub use condition::{Condition, Direction, Operator, Order, PredicateQuery, PropertyPath, Sort};
pub use error::{QueryError, QueryResult};
pub use method::{Keyword, Part, QueryMethod, Subject};
pub use translator::{compile, finalize, translate};
