use std::marker::PhantomData;

use kindred_codec::{marshal_entity, unmarshal, Native, Schema};
use kindred_query::{compile, finalize, PredicateQuery, QueryMethod, Subject};
use kindred_store::{Datastore, Query, QueryResults};
use kindred_types::{Entity, Identifier, Key};
use tracing::debug;

use crate::batch::BatchedMutator;
use crate::config::RepositoryConfig;
use crate::context::AncestorContext;
use crate::entity::Persistent;
use crate::error::{RepositoryError, RepositoryResult};
use crate::keys::KeyDeriver;

/// Typed repository of `T` over a datastore.
///
/// Every operation takes the caller's [`AncestorContext`]: keys are derived
/// under its segments and queries are restricted to entities below its
/// innermost segment. An empty context means root keys and unscoped queries.
pub struct DatastoreRepository<T, S> {
    store: S,
    keys: KeyDeriver,
    config: RepositoryConfig,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Persistent, S: Datastore> DatastoreRepository<T, S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            keys: KeyDeriver::new(T::kind()),
            config: RepositoryConfig::default(),
            _marker: PhantomData,
        }
    }

    pub fn with_config(store: S, config: RepositoryConfig) -> RepositoryResult<Self> {
        config.validate()?;
        let kind = config.kind.clone().unwrap_or_else(|| T::kind().to_string());
        Ok(Self {
            store,
            keys: KeyDeriver::new(kind),
            config,
            _marker: PhantomData,
        })
    }

    /// The entity kind objects are stored under.
    pub fn kind(&self) -> &str {
        self.keys.kind()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// The key an object with `id` has under `context`.
    pub fn key(&self, context: &AncestorContext, id: impl Into<Identifier>) -> RepositoryResult<Key> {
        Ok(self.keys.derive_key(&self.store, context, id)?)
    }

    fn entity(&self, context: &AncestorContext, object: &T) -> RepositoryResult<Entity> {
        let key = self.key(context, object.id())?;
        Ok(marshal_entity(object, key))
    }

    fn mutator(&self) -> BatchedMutator<'_, S> {
        BatchedMutator::new(&self.store, self.config.batch_size)
    }

    // ---- Writes ----

    pub fn save(&self, context: &AncestorContext, object: &T) -> RepositoryResult<()> {
        let entity = self.entity(context, object)?;
        self.store.put(std::slice::from_ref(&entity))?;
        Ok(())
    }

    /// Save every object in batches. Returns the number saved.
    pub fn save_all<'o, I>(&self, context: &AncestorContext, objects: I) -> RepositoryResult<usize>
    where
        I: IntoIterator<Item = &'o T>,
        T: 'o,
    {
        let entities = objects.into_iter().map(|object| self.entity(context, object));
        self.mutator().put_all(entities)
    }

    pub fn delete(&self, context: &AncestorContext, object: &T) -> RepositoryResult<()> {
        self.delete_by_id(context, object.id())
    }

    pub fn delete_by_id(&self, context: &AncestorContext, id: impl Into<Identifier>) -> RepositoryResult<()> {
        let key = self.key(context, id)?;
        self.store.delete(std::slice::from_ref(&key))?;
        Ok(())
    }

    /// Delete every object in batches. Returns the number of keys sent.
    pub fn delete_all_of<'o, I>(&self, context: &AncestorContext, objects: I) -> RepositoryResult<usize>
    where
        I: IntoIterator<Item = &'o T>,
        T: 'o,
    {
        let keys = objects.into_iter().map(|object| self.key(context, object.id()));
        self.mutator().delete_keys(keys)
    }

    pub fn delete_all_by_id<I>(&self, context: &AncestorContext, ids: I) -> RepositoryResult<usize>
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        let keys = ids.into_iter().map(|id| self.key(context, id));
        self.mutator().delete_keys(keys)
    }

    /// Delete every entity of this kind in scope. Returns the number deleted.
    pub fn delete_all(&self, context: &AncestorContext) -> RepositoryResult<usize> {
        let query = self.scoped_query(context)?.keys_only();
        let keys = self.store.run_query(&query)?.map(|entity| -> RepositoryResult<Key> { Ok(entity?.key) });
        self.mutator().delete_keys(keys)
    }

    // ---- Reads ----

    /// Number of entities of this kind in scope.
    pub fn count(&self, context: &AncestorContext) -> RepositoryResult<usize> {
        let query = self.scoped_query(context)?.keys_only();
        count_results(self.store.run_query(&query)?)
    }

    pub fn exists(&self, context: &AncestorContext, id: impl Into<Identifier>) -> RepositoryResult<bool> {
        let key = self.key(context, id)?;
        Ok(self.store.get(&key)?.is_some())
    }

    pub fn find_one(&self, context: &AncestorContext, id: impl Into<Identifier>) -> RepositoryResult<Option<T>> {
        let key = self.key(context, id)?;
        match self.store.get(&key)? {
            Some(entity) => Ok(Some(unmarshal(&entity.properties)?)),
            None => Ok(None),
        }
    }

    /// Every entity of this kind in scope, decoded lazily.
    pub fn find_all(&self, context: &AncestorContext) -> RepositoryResult<Entities<T>> {
        let query = self.scoped_query(context)?;
        self.query(&query)
    }

    /// Look up each id lazily, yielding only the objects that exist.
    ///
    /// Keys are derived up front, so an invalid id fails before any lookup.
    pub fn find_all_by_id<I>(
        &self,
        context: &AncestorContext,
        ids: I,
    ) -> RepositoryResult<impl Iterator<Item = RepositoryResult<T>> + '_>
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        let keys = ids
            .into_iter()
            .map(|id| self.key(context, id))
            .collect::<RepositoryResult<Vec<_>>>()?;
        Ok(keys.into_iter().filter_map(move |key| match self.store.get(&key) {
            Ok(Some(entity)) => Some(unmarshal(&entity.properties).map_err(RepositoryError::from)),
            Ok(None) => None,
            Err(e) => Some(Err(e.into())),
        }))
    }

    /// Run a compiled query and decode its results lazily.
    pub fn query(&self, query: &Query) -> RepositoryResult<Entities<T>> {
        Ok(Entities::new(self.store.run_query(query)?))
    }

    // ---- Derived queries ----

    /// Objects matching a predicate query, scoped to `context`.
    pub fn find_by(&self, context: &AncestorContext, predicate: &PredicateQuery) -> RepositoryResult<Entities<T>> {
        let query = self.compile_scoped(context, predicate)?;
        self.query(&query)
    }

    pub fn count_by(&self, context: &AncestorContext, predicate: &PredicateQuery) -> RepositoryResult<usize> {
        let query = self.compile_scoped(context, predicate)?.keys_only();
        count_results(self.store.run_query(&query)?)
    }

    pub fn exists_by(&self, context: &AncestorContext, predicate: &PredicateQuery) -> RepositoryResult<bool> {
        let query = self.compile_scoped(context, predicate)?.keys_only().with_limit(1);
        Ok(count_results(self.store.run_query(&query)?)? > 0)
    }

    pub fn delete_by(&self, context: &AncestorContext, predicate: &PredicateQuery) -> RepositoryResult<usize> {
        let query = self.compile_scoped(context, predicate)?.keys_only();
        let keys = self.store.run_query(&query)?.map(|entity| -> RepositoryResult<Key> { Ok(entity?.key) });
        self.mutator().delete_keys(keys)
    }

    /// Run a `find…By…` method name with its arguments.
    ///
    /// ```ignore
    /// let people = repository.find_by_method(&ctx, "findByLastName", vec!["Doe".into()])?;
    /// ```
    pub fn find_by_method(
        &self,
        context: &AncestorContext,
        method: &str,
        args: Vec<Native>,
    ) -> RepositoryResult<Entities<T>> {
        let predicate = bind_method(method, Subject::Find, args)?;
        self.find_by(context, &predicate)
    }

    pub fn count_by_method(&self, context: &AncestorContext, method: &str, args: Vec<Native>) -> RepositoryResult<usize> {
        let predicate = bind_method(method, Subject::Count, args)?;
        self.count_by(context, &predicate)
    }

    pub fn exists_by_method(&self, context: &AncestorContext, method: &str, args: Vec<Native>) -> RepositoryResult<bool> {
        let predicate = bind_method(method, Subject::Exists, args)?;
        self.exists_by(context, &predicate)
    }

    pub fn delete_by_method(&self, context: &AncestorContext, method: &str, args: Vec<Native>) -> RepositoryResult<usize> {
        let predicate = bind_method(method, Subject::Delete, args)?;
        self.delete_by(context, &predicate)
    }

    fn compile_scoped(&self, context: &AncestorContext, predicate: &PredicateQuery) -> RepositoryResult<Query> {
        let ancestor = KeyDeriver::ancestor_filter(&self.store, context)?;
        Ok(compile(predicate, self.kind(), ancestor)?)
    }

    fn scoped_query(&self, context: &AncestorContext) -> RepositoryResult<Query> {
        let ancestor = KeyDeriver::ancestor_filter(&self.store, context)?;
        Ok(finalize(None, self.kind(), ancestor))
    }
}

fn bind_method(method: &str, subject: Subject, args: Vec<Native>) -> RepositoryResult<PredicateQuery> {
    let parsed = QueryMethod::parse(method)?;
    let predicate = parsed.expect_subject(subject)?.bind(args)?;
    debug!(method, condition = %predicate.condition, "bound query method");
    Ok(predicate)
}

fn count_results(results: QueryResults) -> RepositoryResult<usize> {
    let mut count = 0;
    for entity in results {
        entity?;
        count += 1;
    }
    Ok(count)
}

/// Lazily decoded query results.
///
/// Wraps the store's single-pass results; each item is decoded when it is
/// pulled.
pub struct Entities<T> {
    results: QueryResults,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Entities<T> {
    fn new(results: QueryResults) -> Self {
        Self {
            results,
            _marker: PhantomData,
        }
    }
}

impl<T: Schema> Iterator for Entities<T> {
    type Item = RepositoryResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let entity = match self.results.next()? {
            Ok(entity) => entity,
            Err(e) => return Some(Err(e.into())),
        };
        Some(unmarshal(&entity.properties).map_err(RepositoryError::from))
    }
}

impl<T> std::fmt::Debug for Entities<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entities").field("results", &self.results).finish()
    }
}
