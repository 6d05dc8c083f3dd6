use std::collections::BTreeMap;
use std::sync::RwLock;

use kindred_types::{Entity, Key, Record};

use crate::error::{StoreError, StoreResult};
use crate::query::{Query, QueryResults};
use crate::traits::Datastore;

/// Per-call mutation limit of the hosted store.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 500;

/// In-memory, BTreeMap-based datastore.
///
/// Intended for tests and embedding. Entities are held in key order behind a
/// `RwLock` and cloned on read/write. Put and delete calls larger than
/// `max_batch_size` are rejected, like the hosted store's mutation limit.
pub struct InMemoryDatastore {
    entities: RwLock<BTreeMap<Key, Record>>,
    max_batch_size: usize,
}

impl InMemoryDatastore {
    /// Create a new empty datastore with the default batch limit.
    pub fn new() -> Self {
        Self::with_max_batch_size(DEFAULT_MAX_BATCH_SIZE)
    }

    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            entities: RwLock::new(BTreeMap::new()),
            max_batch_size,
        }
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Number of entities currently stored.
    pub fn len(&self) -> usize {
        self.entities.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.read().expect("lock poisoned").is_empty()
    }

    /// Remove all entities from the store.
    pub fn clear(&self) {
        self.entities.write().expect("lock poisoned").clear();
    }

    /// All keys in the store, in key order.
    pub fn all_keys(&self) -> Vec<Key> {
        let map = self.entities.read().expect("lock poisoned");
        map.keys().cloned().collect()
    }

    fn check_batch(&self, size: usize) -> StoreResult<()> {
        if size > self.max_batch_size {
            return Err(StoreError::BatchTooLarge {
                size,
                max: self.max_batch_size,
            });
        }
        Ok(())
    }
}

impl Default for InMemoryDatastore {
    fn default() -> Self {
        Self::new()
    }
}

impl Datastore for InMemoryDatastore {
    fn get(&self, key: &Key) -> StoreResult<Option<Entity>> {
        let map = self.entities.read().expect("lock poisoned");
        Ok(map
            .get(key)
            .map(|properties| Entity::new(key.clone(), properties.clone())))
    }

    fn run_query(&self, query: &Query) -> StoreResult<QueryResults> {
        let map = self.entities.read().expect("lock poisoned");
        let limit = query.limit().unwrap_or(usize::MAX);
        let entities: Vec<Entity> = map
            .iter()
            .map(|(key, properties)| Entity::new(key.clone(), properties.clone()))
            .filter(|entity| query.matches(entity))
            .take(limit)
            .map(|entity| {
                if query.is_keys_only() {
                    Entity::key_only(entity.key)
                } else {
                    entity
                }
            })
            .collect();
        Ok(QueryResults::from_entities(entities))
    }

    fn put(&self, entities: &[Entity]) -> StoreResult<()> {
        self.check_batch(entities.len())?;
        let mut map = self.entities.write().expect("lock poisoned");
        for entity in entities {
            map.insert(entity.key.clone(), entity.properties.clone());
        }
        Ok(())
    }

    fn delete(&self, keys: &[Key]) -> StoreResult<()> {
        self.check_batch(keys.len())?;
        let mut map = self.entities.write().expect("lock poisoned");
        for key in keys {
            map.remove(key);
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryDatastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryDatastore")
            .field("entity_count", &count)
            .field("max_batch_size", &self.max_batch_size)
            .finish()
    }
}
