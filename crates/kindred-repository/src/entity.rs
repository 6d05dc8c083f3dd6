use kindred_codec::Schema;
use kindred_types::Identifier;

/// A domain type stored as one entity per object.
///
/// The kind defaults to the schema's type name, which is the type's simple
/// name unless the schema overrides it.
pub trait Persistent: Schema {
    type Id: Into<Identifier> + Clone;

    fn id(&self) -> Self::Id;

    fn kind() -> &'static str {
        Self::schema().type_name()
    }
}
