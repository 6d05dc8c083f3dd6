//! Translation of condition trees into store filters and queries.

use kindred_codec::Native;
use kindred_store::{Filter, Query};
use kindred_types::Value;
use tracing::debug;

use crate::condition::{Condition, PredicateQuery, PropertyPath};
use crate::error::{QueryError, QueryResult};

/// Translate a condition tree into a filter.
///
/// Only equality, null checks and conjunction translate. `Or` and every
/// comparison operator fail, as does an equality literal that is not a
/// boolean, number or string. A null literal becomes a null check.
pub fn translate(condition: &Condition) -> QueryResult<Filter> {
    match condition {
        Condition::EqualTo { path, value } => equal_to(path, value),
        Condition::IsNull { path } => Ok(Filter::is_null(path.dotted())),
        Condition::And(left, right) => Ok(Filter::and(translate(left)?, translate(right)?)),
        Condition::Or(..) => Err(QueryError::UnsupportedOr),
        Condition::Comparison { operator, .. } => Err(QueryError::UnsupportedOperator(*operator)),
    }
}

fn equal_to(path: &PropertyPath, value: &Native) -> QueryResult<Filter> {
    let property = path.dotted();
    let literal = match value {
        Native::Null => return Ok(Filter::is_null(property)),
        Native::Bool(b) => Value::Boolean(*b),
        Native::F32(x) => Value::Float(f64::from(*x)),
        Native::F64(x) => Value::Float(*x),
        Native::I8(i) => Value::Integer(i64::from(*i)),
        Native::I16(i) => Value::Integer(i64::from(*i)),
        Native::I32(i) => Value::Integer(i64::from(*i)),
        Native::I64(i) => Value::Integer(*i),
        Native::String(s) => Value::String(s.clone()),
        other => {
            return Err(QueryError::UnsupportedValue {
                value: other.to_string(),
                type_name: other.type_name(),
            })
        }
    };
    Ok(Filter::Eq {
        property,
        value: literal,
    })
}

/// Build the runnable query: AND the ancestor filter onto `filter` when
/// present, and restrict to `kind`.
pub fn finalize(filter: Option<Filter>, kind: &str, ancestor: Option<Filter>) -> Query {
    let filter = match (filter, ancestor) {
        (Some(filter), Some(ancestor)) => Some(Filter::and(filter, ancestor)),
        (filter, ancestor) => filter.or(ancestor),
    };
    let mut query = Query::of_kind(kind);
    if let Some(filter) = filter {
        query = query.with_filter(filter);
    }
    debug!(query = %query, "compiled query");
    query
}

/// Translate and finalize a predicate query. The sort specification is
/// accepted and ignored.
pub fn compile(query: &PredicateQuery, kind: &str, ancestor: Option<Filter>) -> QueryResult<Query> {
    let filter = translate(&query.condition)?;
    if !query.sort.is_unsorted() {
        debug!(sort = %query.sort, "sort not applied to store query");
    }
    Ok(finalize(Some(filter), kind, ancestor))
}
