//! Store-client boundary for Kindred.
//!
//! Kindred does not talk to a hosted store itself. Everything above this
//! crate goes through the [`Datastore`] trait: key lookups, queries, and
//! batched puts and deletes.
//!
//! # Key Types
//!
//! - [`Datastore`] -- the client trait
//! - [`Filter`] -- store-native filter expression (equality, null, ancestry, AND)
//! - [`Query`] -- a runnable query: kind, filter, keys-only, limit
//! - [`QueryResults`] -- finite, consume-once result stream
//!
//! # Storage Backends
//!
//! - [`InMemoryDatastore`] -- `BTreeMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Calls are synchronous and block until the store answers.
//! 2. A put or delete batch is applied whole or rejected whole.
//! 3. All errors are propagated, never retried here.

pub mod error;
pub mod filter;
pub mod memory;
pub mod query;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use filter::Filter;
pub use memory::{InMemoryDatastore, DEFAULT_MAX_BATCH_SIZE};
pub use query::{Query, QueryResults};
pub use traits::Datastore;
