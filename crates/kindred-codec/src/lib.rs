//! Marshalling engine for Kindred.
//!
//! Converts domain objects into [`Record`](kindred_types::Record)s and back.
//! Each domain type declares a [`TypeSchema`]: an ordered table of named
//! fields, each with a declared [`FieldKind`] that directs decoding.
//!
//! # Key Types
//!
//! - [`Native`]: language-level value, the input of encoding and output of decoding
//! - [`FieldKind`]: declared kind of a decode target
//! - [`Field`]: field types that can be stored as a property
//! - [`Schema`] / [`TypeSchema`]: per-type field descriptor tables
//!
//! Decoding is permissive: a value with no conversion onto a field's kind
//! leaves the field as it was, and record properties with no matching field
//! are dropped. The only codec error is a failed construction.

pub mod codec;
pub mod error;
pub mod field;
pub mod marshal;
pub mod native;
pub mod schema;
pub mod unmarshal;

pub use codec::{decode, decode_generic, encode, FieldKind};
pub use error::{CodecError, CodecResult};
pub use field::Field;
pub use marshal::{marshal, marshal_entity, marshal_map, RESERVED_PROPERTY};
pub use native::{EpochSeconds, Native};
pub use schema::{simple_type_name, FieldDescriptor, Schema, SchemaBuilder, TypeSchema};
pub use unmarshal::{unmarshal, unmarshal_map, unmarshal_to_map, unmarshal_to_object, unmarshal_value};
