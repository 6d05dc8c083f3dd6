//! Foundation types for Kindred.
//!
//! Kindred stores plain domain objects in a hierarchical key-value document
//! store. This crate holds the store's data model, shared by every other
//! Kindred crate.
//!
//! # Key Types
//!
//! - [`Identifier`]: numeric or named identifier of one key segment
//! - [`PathSegment`]: `(kind, identifier)` element of a key path
//! - [`Key`]: complete hierarchical key; the last segment is the entity itself
//! - [`KeyFactory`]: builds keys of one kind under an ancestor path
//! - [`Value`]: closed union of wire value kinds
//! - [`Record`]: named values, possibly nested inside other values
//! - [`Entity`]: a record stored under a key

pub mod error;
pub mod identifier;
pub mod key;
pub mod record;
pub mod value;

pub use error::TypeError;
pub use identifier::Identifier;
pub use key::{Key, KeyFactory, PathSegment};
pub use record::{Entity, Record};
pub use value::{LatLng, Value, ValueKind};
