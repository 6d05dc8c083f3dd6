use std::fmt;

use serde::{Deserialize, Serialize};

/// The identifier component of a key path segment.
///
/// The store supports two key forms: a numeric id and a string name. Numeric
/// identifiers order before named ones, matching the store's key ordering.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Identifier {
    /// Numeric-key form.
    Id(i64),
    /// Named-key form.
    Name(String),
}

impl Identifier {
    /// Build a named identifier from anything with a string form.
    ///
    /// Used for identifier types that are neither integers nor strings: the
    /// value is converted to its `Display` form and stored as a name.
    pub fn named(value: impl fmt::Display) -> Self {
        Self::Name(value.to_string())
    }

    /// Returns the numeric id, if this is the numeric form.
    pub fn as_id(&self) -> Option<i64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Name(_) => None,
        }
    }

    /// Returns the name, if this is the named form.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Id(_) => None,
            Self::Name(name) => Some(name),
        }
    }

    /// Returns `true` if this is the numeric form.
    pub fn is_id(&self) -> bool {
        matches!(self, Self::Id(_))
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => write!(f, "{name:?}"),
        }
    }
}

macro_rules! numeric_identifier {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Identifier {
                fn from(value: $ty) -> Self {
                    Self::Id(i64::from(value))
                }
            }
        )*
    };
}

numeric_identifier!(i8, i16, i32, i64, u8, u16, u32);

impl From<String> for Identifier {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl From<&str> for Identifier {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<&String> for Identifier {
    fn from(value: &String) -> Self {
        Self::Name(value.clone())
    }
}
