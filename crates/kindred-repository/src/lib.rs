//! Typed repositories for Kindred.
//!
//! A [`DatastoreRepository`] stores values of one domain type `T` as entities
//! of one kind. Callers carry an [`AncestorContext`]: keys are derived under
//! its segments and reads are restricted to entities below its innermost
//! segment.
//!
//! ```ignore
//! let repo = DatastoreRepository::<Person, _>::new(InMemoryDatastore::new());
//! let mut ctx = AncestorContext::new();
//! let scope = ctx.with(PathSegment::new("Kind", 1));
//! repo.save(&scope, &person)?;
//! let does = repo.find_by_method(&scope, "findByLastName", vec!["Doe".into()])?;
//! ```
//!
//! # Key Types
//!
//! - [`AncestorContext`] / [`AncestorScope`]: scoped ancestor segments
//! - [`KeyDeriver`]: keys and ancestor filters from the context
//! - [`BatchedMutator`]: batched puts and deletes
//! - [`Persistent`]: a domain type with an identifier
//! - [`RepositoryConfig`]: batch size and kind override, loadable from TOML

pub mod batch;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod keys;
pub mod repository;

pub use batch::BatchedMutator;
pub use config::{RepositoryConfig, DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE};
pub use context::{AncestorContext, AncestorScope};
pub use entity::Persistent;
pub use error::{RepositoryError, RepositoryResult};
pub use keys::KeyDeriver;
pub use repository::{DatastoreRepository, Entities};
