use std::collections::HashMap;
use std::fmt;

use kindred_types::Value;
use tracing::warn;

use crate::codec::{self, FieldKind};
use crate::error::{CodecError, CodecResult};
use crate::field::Field;
use crate::marshal::{marshal, RESERVED_PROPERTY};
use crate::native::Native;
use crate::unmarshal::{unmarshal, unmarshal_to_object};

/// A domain type with a field descriptor table.
///
/// Implementations build the table once and cache it:
///
/// ```ignore
/// impl Schema for Person {
///     fn schema() -> &'static TypeSchema<Self> {
///         static SCHEMA: OnceLock<TypeSchema<Person>> = OnceLock::new();
///         SCHEMA.get_or_init(|| {
///             TypeSchema::<Person>::builder()
///                 .constructor(Person::default)
///                 .field("firstName", |p| &p.first_name, |p| &mut p.first_name)
///                 .build()
///         })
///     }
/// }
/// ```
pub trait Schema: Sized + Send + Sync + 'static {
    fn schema() -> &'static TypeSchema<Self>;
}

type Encoder<T> = Box<dyn Fn(&T) -> Value + Send + Sync>;
type Decoder<T> = Box<dyn Fn(&mut T, &Value) -> bool + Send + Sync>;

/// One named property of a domain type.
pub struct FieldDescriptor<T> {
    name: &'static str,
    kind: FieldKind,
    encode: Encoder<T>,
    decode: Decoder<T>,
}

impl<T> FieldDescriptor<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Read the field from `object` as a wire value.
    pub fn get(&self, object: &T) -> Value {
        (self.encode)(object)
    }

    /// Write a wire value onto the field. Returns `false` on a coercion miss,
    /// in which case the field is unmodified.
    pub fn set(&self, object: &mut T, value: &Value) -> bool {
        (self.decode)(object, value)
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// The field table of a domain type, with a by-name index.
pub struct TypeSchema<T> {
    type_name: &'static str,
    constructor: Option<fn() -> T>,
    fields: Vec<FieldDescriptor<T>>,
    index: HashMap<&'static str, usize>,
}

impl<T: Send + Sync + 'static> TypeSchema<T> {
    pub fn builder() -> SchemaBuilder<T> {
        SchemaBuilder {
            type_name: simple_type_name::<T>(),
            constructor: None,
            fields: Vec::new(),
        }
    }

    /// Unqualified type name, without module path or generic arguments.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor<T>> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Build a fresh instance through the registered constructor.
    pub fn instantiate(&self) -> CodecResult<T> {
        match self.constructor {
            Some(constructor) => Ok(constructor()),
            None => Err(CodecError::Instantiation {
                type_name: self.type_name.to_string(),
            }),
        }
    }
}

impl<T> fmt::Debug for TypeSchema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSchema")
            .field("type_name", &self.type_name)
            .field("constructor", &self.constructor.is_some())
            .field("fields", &self.fields)
            .finish()
    }
}

/// Builder for [`TypeSchema`].
pub struct SchemaBuilder<T> {
    type_name: &'static str,
    constructor: Option<fn() -> T>,
    fields: Vec<FieldDescriptor<T>>,
}

impl<T: Send + Sync + 'static> SchemaBuilder<T> {
    pub fn type_name(mut self, type_name: &'static str) -> Self {
        self.type_name = type_name;
        self
    }

    /// Register the no-argument constructor used by unmarshalling.
    pub fn constructor(mut self, constructor: fn() -> T) -> Self {
        self.constructor = Some(constructor);
        self
    }

    /// Declare a field whose type implements [`Field`].
    pub fn field<F, G, M>(self, name: &'static str, get: G, get_mut: M) -> Self
    where
        F: Field,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.push(
            name,
            F::KIND,
            Box::new(move |object: &T| codec::encode(get(object).to_native())),
            Box::new(move |object: &mut T, value: &Value| get_mut(object).decode_into(value)),
        )
    }

    /// Declare a nested domain object. A Record value is merged into the
    /// existing instance.
    pub fn embedded<E, G, M>(self, name: &'static str, get: G, get_mut: M) -> Self
    where
        E: Schema,
        G: Fn(&T) -> &E + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut E + Send + Sync + 'static,
    {
        self.push(
            name,
            FieldKind::Record,
            Box::new(move |object: &T| codec::encode(Native::Record(marshal(get(object))))),
            Box::new(move |object: &mut T, value: &Value| match value {
                Value::Record(record) => {
                    unmarshal_to_object(record, get_mut(object));
                    true
                }
                _ => false,
            }),
        )
    }

    /// Declare an optional nested domain object. Null clears it; a Record
    /// merges into the current instance or into a newly constructed one.
    pub fn optional_embedded<E, G, M>(self, name: &'static str, get: G, get_mut: M) -> Self
    where
        E: Schema,
        G: Fn(&T) -> &Option<E> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Option<E> + Send + Sync + 'static,
    {
        self.push(
            name,
            FieldKind::Record,
            Box::new(move |object: &T| match get(object) {
                Some(nested) => codec::encode(Native::Record(marshal(nested))),
                None => Value::Null,
            }),
            Box::new(move |object: &mut T, value: &Value| {
                let slot = get_mut(object);
                match value {
                    Value::Null => {
                        *slot = None;
                        true
                    }
                    Value::Record(record) => {
                        if let Some(nested) = slot.as_mut() {
                            unmarshal_to_object(record, nested);
                            return true;
                        }
                        match unmarshal::<E>(record) {
                            Ok(nested) => {
                                *slot = Some(nested);
                                true
                            }
                            Err(_) => false,
                        }
                    }
                    _ => false,
                }
            }),
        )
    }

    /// Declare a list of nested domain objects. Every element must be a
    /// Record that can be constructed, otherwise the field is unmodified.
    pub fn embedded_list<E, G, M>(self, name: &'static str, get: G, get_mut: M) -> Self
    where
        E: Schema,
        G: Fn(&T) -> &Vec<E> + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut Vec<E> + Send + Sync + 'static,
    {
        self.push(
            name,
            FieldKind::List,
            Box::new(move |object: &T| {
                Value::List(
                    get(object)
                        .iter()
                        .map(|nested| codec::encode(Native::Record(marshal(nested))))
                        .collect(),
                )
            }),
            Box::new(move |object: &mut T, value: &Value| {
                let Value::List(items) = value else {
                    return false;
                };
                let decoded: Option<Vec<E>> = items
                    .iter()
                    .filter(|item| !matches!(item, Value::Key(_)))
                    .map(|item| match item {
                        Value::Record(record) => unmarshal::<E>(record).ok(),
                        _ => None,
                    })
                    .collect();
                match decoded {
                    Some(nested) => {
                        let slot = get_mut(object);
                        slot.clear();
                        slot.extend(nested);
                        true
                    }
                    None => false,
                }
            }),
        )
    }

    pub fn build(self) -> TypeSchema<T> {
        let index = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| (field.name, i))
            .collect();
        TypeSchema {
            type_name: self.type_name,
            constructor: self.constructor,
            fields: self.fields,
            index,
        }
    }

    fn push(
        mut self,
        name: &'static str,
        kind: FieldKind,
        encode: Encoder<T>,
        decode: Decoder<T>,
    ) -> Self {
        if name == RESERVED_PROPERTY {
            warn!(type_name = self.type_name, "field name `{name}` is reserved; not mapped");
            return self;
        }
        let descriptor = FieldDescriptor {
            name,
            kind,
            encode,
            decode,
        };
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(existing) => *existing = descriptor,
            None => self.fields.push(descriptor),
        }
        self
    }
}

/// The last path component of `T`'s type name, generic arguments removed.
pub fn simple_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
