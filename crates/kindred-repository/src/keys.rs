use kindred_store::{Datastore, Filter};
use kindred_types::{Identifier, Key, TypeError};
use tracing::trace;

use crate::context::AncestorContext;

/// Derives keys of one kind from the ancestor context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyDeriver {
    kind: String,
}

impl KeyDeriver {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The key `context segments... / (kind, id)`.
    ///
    /// Integer identifiers use the numeric form, everything else the named
    /// form.
    pub fn derive_key<S>(
        &self,
        store: &S,
        context: &AncestorContext,
        id: impl Into<Identifier>,
    ) -> Result<Key, TypeError>
    where
        S: Datastore + ?Sized,
    {
        let key = store
            .new_key_factory(&self.kind)
            .add_ancestors(context.segments().iter().cloned())
            .new_key(id)?;
        trace!(key = %key, "derived key");
        Ok(key)
    }

    /// The key of the innermost ancestor in `context`, if any.
    pub fn ancestor_key<S>(store: &S, context: &AncestorContext) -> Result<Option<Key>, TypeError>
    where
        S: Datastore + ?Sized,
    {
        let Some((last, ancestors)) = context.segments().split_last() else {
            return Ok(None);
        };
        let key = store
            .new_key_factory(last.kind())
            .add_ancestors(ancestors.iter().cloned())
            .new_key(last.id().clone())?;
        Ok(Some(key))
    }

    /// A has-ancestor filter on the innermost ancestor, or `None` when the
    /// context is empty and queries run unscoped.
    pub fn ancestor_filter<S>(store: &S, context: &AncestorContext) -> Result<Option<Filter>, TypeError>
    where
        S: Datastore + ?Sized,
    {
        Ok(Self::ancestor_key(store, context)?.map(Filter::has_ancestor))
    }
}
