use std::fmt;

use kindred_types::Entity;
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::filter::Filter;

/// A runnable store query.
///
/// A query without a kind matches entities of every kind. Results come back
/// in key order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    kind: Option<String>,
    filter: Option<Filter>,
    keys_only: bool,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// A query over entities of one kind.
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self::new().with_kind(kind)
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Replace the filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// AND `filter` onto the current filter, if any.
    pub fn and_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(current) => Filter::and(current, filter),
            None => filter,
        });
        self
    }

    /// Return keys without properties.
    pub fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn is_keys_only(&self) -> bool {
        self.keys_only
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Returns `true` if `entity` satisfies the kind and filter.
    pub fn matches(&self, entity: &Entity) -> bool {
        if let Some(kind) = self.kind.as_deref() {
            if entity.key.kind() != kind {
                return false;
            }
        }
        self.filter.as_ref().map_or(true, |f| f.matches(entity))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.keys_only {
            "SELECT __key__"
        } else {
            "SELECT *"
        })?;
        if let Some(kind) = &self.kind {
            write!(f, " FROM {kind}")?;
        }
        if let Some(filter) = &self.filter {
            write!(f, " WHERE {filter}")?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        Ok(())
    }
}

/// The results of one query run: finite, consumed once.
pub struct QueryResults {
    inner: Box<dyn Iterator<Item = StoreResult<Entity>> + Send>,
}

impl QueryResults {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = StoreResult<Entity>> + Send + 'static,
    {
        Self {
            inner: Box::new(iter),
        }
    }

    /// Results from an already materialized list of entities.
    pub fn from_entities(entities: Vec<Entity>) -> Self {
        Self::new(entities.into_iter().map(Ok))
    }

    pub fn empty() -> Self {
        Self::from_entities(Vec::new())
    }
}

impl Iterator for QueryResults {
    type Item = StoreResult<Entity>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl fmt::Debug for QueryResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResults").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindred_types::{KeyFactory, Record};

    #[test]
    fn kind_restricts_matches() {
        let person = Entity::new(KeyFactory::new("Person").new_key(1).unwrap(), Record::new());
        assert!(Query::of_kind("Person").matches(&person));
        assert!(!Query::of_kind("Pet").matches(&person));
        assert!(Query::new().matches(&person));
    }

    #[test]
    fn and_filter_composes() {
        let query = Query::of_kind("Person")
            .and_filter(Filter::eq("a", 1i64))
            .and_filter(Filter::eq("b", 2i64));
        assert_eq!(
            query.filter(),
            Some(&Filter::and(Filter::eq("a", 1i64), Filter::eq("b", 2i64)))
        );
    }

    #[test]
    fn display_as_gql() {
        let query = Query::of_kind("Person")
            .with_filter(Filter::eq("firstName", "John"))
            .keys_only()
            .with_limit(5);
        assert_eq!(
            query.to_string(),
            "SELECT __key__ FROM Person WHERE firstName = \"John\" LIMIT 5"
        );
        assert_eq!(Query::new().to_string(), "SELECT *");
    }

    #[test]
    fn results_are_consumed_once() {
        let entity = Entity::key_only(KeyFactory::new("Person").new_key(1).unwrap());
        let mut results = QueryResults::from_entities(vec![entity]);
        assert!(results.next().is_some());
        assert!(results.next().is_none());
        assert_eq!(QueryResults::empty().count(), 0);
    }

    #[test]
    fn serde_roundtrip() {
        let query = Query::of_kind("Person").with_filter(Filter::is_null("a"));
        let json = serde_json::to_string(&query).unwrap();
        let parsed: Query = serde_json::from_str(&json).unwrap();
        assert_eq!(query, parsed);
    }
}
