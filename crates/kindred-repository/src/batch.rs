use kindred_store::{Datastore, StoreError};
use kindred_types::{Entity, Key};
use tracing::debug;

use crate::config::DEFAULT_BATCH_SIZE;

/// Buffers puts and deletes and flushes them to the store in batches.
///
/// A batch is flushed whenever the buffer reaches the ceiling, and once more
/// for any remainder. Flush failures are returned as-is; batches flushed
/// before the failure stay written.
#[derive(Debug)]
pub struct BatchedMutator<'a, S: ?Sized> {
    store: &'a S,
    batch_size: usize,
}

impl<'a, S: Datastore + ?Sized> BatchedMutator<'a, S> {
    /// A ceiling of zero is treated as one.
    pub fn new(store: &'a S, batch_size: usize) -> Self {
        Self {
            store,
            batch_size: batch_size.max(1),
        }
    }

    pub fn with_default_size(store: &'a S) -> Self {
        Self::new(store, DEFAULT_BATCH_SIZE)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Put every entity. Returns the number written.
    ///
    /// An `Err` item stops the run at that point.
    pub fn put_all<I, E>(&self, entities: I) -> Result<usize, E>
    where
        I: IntoIterator<Item = Result<Entity, E>>,
        E: From<StoreError>,
    {
        drain(entities, self.batch_size, |batch| {
            debug!(op = "put", size = batch.len(), "flushing batch");
            self.store.put(batch).map_err(E::from)
        })
    }

    /// Delete every key. Returns the number of keys sent.
    pub fn delete_keys<I, E>(&self, keys: I) -> Result<usize, E>
    where
        I: IntoIterator<Item = Result<Key, E>>,
        E: From<StoreError>,
    {
        drain(keys, self.batch_size, |batch| {
            debug!(op = "delete", size = batch.len(), "flushing batch");
            self.store.delete(batch).map_err(E::from)
        })
    }
}

fn drain<T, E, I, F>(items: I, ceiling: usize, mut flush: F) -> Result<usize, E>
where
    I: IntoIterator<Item = Result<T, E>>,
    F: FnMut(&[T]) -> Result<(), E>,
{
    let mut buffer = Vec::with_capacity(ceiling);
    let mut total = 0;
    for item in items {
        buffer.push(item?);
        if buffer.len() >= ceiling {
            flush(&buffer)?;
            total += buffer.len();
            buffer.clear();
        }
    }
    if !buffer.is_empty() {
        flush(&buffer)?;
        total += buffer.len();
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use kindred_store::{Query, QueryResults, StoreResult};
    use kindred_types::{KeyFactory, Record};
    use proptest::prelude::*;

    /// Records every batch it receives; optionally fails from the nth call.
    #[derive(Default)]
    struct RecordingStore {
        puts: Mutex<Vec<Vec<Key>>>,
        deletes: Mutex<Vec<Vec<Key>>>,
        fail_from: Option<usize>,
    }

    impl RecordingStore {
        fn failing_from(call: usize) -> Self {
            Self {
                fail_from: Some(call),
                ..Self::default()
            }
        }

        fn check(&self, calls: usize) -> StoreResult<()> {
            match self.fail_from {
                Some(n) if calls >= n => Err(StoreError::Unavailable("injected".into())),
                _ => Ok(()),
            }
        }
    }

    impl Datastore for RecordingStore {
        fn get(&self, _key: &Key) -> StoreResult<Option<Entity>> {
            Ok(None)
        }

        fn run_query(&self, _query: &Query) -> StoreResult<QueryResults> {
            Ok(QueryResults::empty())
        }

        fn put(&self, entities: &[Entity]) -> StoreResult<()> {
            let mut puts = self.puts.lock().unwrap();
            self.check(puts.len())?;
            puts.push(entities.iter().map(|e| e.key.clone()).collect());
            Ok(())
        }

        fn delete(&self, keys: &[Key]) -> StoreResult<()> {
            let mut deletes = self.deletes.lock().unwrap();
            self.check(deletes.len())?;
            deletes.push(keys.to_vec());
            Ok(())
        }
    }

    fn keys(n: usize) -> Vec<Key> {
        let factory = KeyFactory::new("Item");
        (0..n).map(|i| factory.new_key(i as i64 + 1).unwrap()).collect()
    }

    fn entities(keys: &[Key]) -> impl Iterator<Item = Result<Entity, StoreError>> + '_ {
        keys.iter().map(|k| Ok(Entity::new(k.clone(), Record::new())))
    }

    // -----------------------------------------------------------------------
    // Flushing
    // -----------------------------------------------------------------------

    #[test]
    fn default_ceiling_is_fifty() {
        let store = RecordingStore::default();
        assert_eq!(BatchedMutator::with_default_size(&store).batch_size(), 50);
    }

    #[test]
    fn flushes_at_ceiling_and_remainder() {
        let store = RecordingStore::default();
        let keys = keys(120);
        let written = BatchedMutator::with_default_size(&store)
            .put_all(entities(&keys))
            .unwrap();
        assert_eq!(written, 120);
        let sizes: Vec<_> = store.puts.lock().unwrap().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![50, 50, 20]);
    }

    #[test]
    fn exact_multiple_has_no_trailing_flush() {
        let store = RecordingStore::default();
        let keys = keys(100);
        BatchedMutator::with_default_size(&store)
            .delete_keys(keys.iter().cloned().map(Ok::<_, StoreError>))
            .unwrap();
        assert_eq!(store.deletes.lock().unwrap().len(), 2);
    }

    #[test]
    fn empty_input_never_flushes() {
        let store = RecordingStore::default();
        let written = BatchedMutator::new(&store, 10)
            .put_all(std::iter::empty::<Result<Entity, StoreError>>())
            .unwrap();
        assert_eq!(written, 0);
        assert!(store.puts.lock().unwrap().is_empty());
    }

    #[test]
    fn zero_ceiling_is_one() {
        let store = RecordingStore::default();
        assert_eq!(BatchedMutator::new(&store, 0).batch_size(), 1);
    }

    // -----------------------------------------------------------------------
    // Failures
    // -----------------------------------------------------------------------

    #[test]
    fn flush_failure_propagates_after_earlier_batches() {
        let store = RecordingStore::failing_from(1);
        let keys = keys(5);
        let err = BatchedMutator::new(&store, 2).put_all(entities(&keys)).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert_eq!(store.puts.lock().unwrap().len(), 1);
    }

    #[test]
    fn item_error_stops_the_run() {
        let store = RecordingStore::default();
        let keys = keys(3);
        let items = vec![
            Ok(keys[0].clone()),
            Ok(keys[1].clone()),
            Err(StoreError::InvalidRequest("bad key".into())),
            Ok(keys[2].clone()),
        ];
        let err = BatchedMutator::new(&store, 2).delete_keys(items).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRequest(_)));
        assert_eq!(*store.deletes.lock().unwrap(), vec![keys[..2].to_vec()]);
    }

    // -----------------------------------------------------------------------
    // Flush law
    // -----------------------------------------------------------------------

    proptest! {
        #[test]
        fn batches_partition_input_in_order(n in 0usize..300, ceiling in 1usize..60) {
            let store = RecordingStore::default();
            let keys = keys(n);
            let written = BatchedMutator::new(&store, ceiling).put_all(entities(&keys)).unwrap();
            prop_assert_eq!(written, n);

            let batches = store.puts.lock().unwrap().clone();
            prop_assert_eq!(batches.len(), n.div_ceil(ceiling));
            if let Some((_, full)) = batches.split_last() {
                for batch in full {
                    prop_assert_eq!(batch.len(), ceiling);
                }
            }
            let flattened: Vec<Key> = batches.into_iter().flatten().collect();
            prop_assert_eq!(flattened, keys);
        }
    }
}
