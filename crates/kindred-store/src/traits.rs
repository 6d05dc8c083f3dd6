use std::sync::Arc;

use kindred_types::{Entity, Key, KeyFactory};

use crate::error::StoreResult;
use crate::query::{Query, QueryResults};

/// Client of a hierarchical key-value document store.
///
/// All implementations must satisfy these invariants:
/// - Calls block until the store has answered.
/// - `put` and `delete` apply a whole batch or fail; a batch larger than the
///   backend's limit is rejected, never split.
/// - Query results are finite and can be consumed once.
/// - Errors are returned as-is, never retried or swallowed.
pub trait Datastore: Send + Sync {
    /// Look up one entity. Returns `Ok(None)` if no entity has this key.
    fn get(&self, key: &Key) -> StoreResult<Option<Entity>>;

    /// Run a query and return its results lazily.
    fn run_query(&self, query: &Query) -> StoreResult<QueryResults>;

    /// Insert or replace every entity in the batch.
    fn put(&self, entities: &[Entity]) -> StoreResult<()>;

    /// Delete every key in the batch. Missing keys are not an error.
    fn delete(&self, keys: &[Key]) -> StoreResult<()>;

    /// A key builder for `kind`, to which callers add ancestors.
    fn new_key_factory(&self, kind: &str) -> KeyFactory {
        KeyFactory::new(kind)
    }

    /// Look up several entities.
    ///
    /// Default implementation calls `get()` for each key. Backends may
    /// override for fewer round-trips.
    fn get_batch(&self, keys: &[Key]) -> StoreResult<Vec<Option<Entity>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }
}

impl<S: Datastore + ?Sized> Datastore for Arc<S> {
    fn get(&self, key: &Key) -> StoreResult<Option<Entity>> {
        (**self).get(key)
    }

    fn run_query(&self, query: &Query) -> StoreResult<QueryResults> {
        (**self).run_query(query)
    }

    fn put(&self, entities: &[Entity]) -> StoreResult<()> {
        (**self).put(entities)
    }

    fn delete(&self, keys: &[Key]) -> StoreResult<()> {
        (**self).delete(keys)
    }

    fn new_key_factory(&self, kind: &str) -> KeyFactory {
        (**self).new_key_factory(kind)
    }

    fn get_batch(&self, keys: &[Key]) -> StoreResult<Vec<Option<Entity>>> {
        (**self).get_batch(keys)
    }
}
