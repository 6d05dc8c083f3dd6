use kindred_types::{Entity, Key, Record};

use crate::codec;
use crate::native::Native;
use crate::schema::Schema;

/// Property name that never maps to a field.
pub const RESERVED_PROPERTY: &str = "class";

/// Encode every declared field of `object` into a record.
pub fn marshal<T: Schema>(object: &T) -> Record {
    T::schema()
        .fields()
        .iter()
        .map(|field| (field.name().to_string(), field.get(object)))
        .collect()
}

/// Encode `object` into an entity stored under `key`.
pub fn marshal_entity<T: Schema>(object: &T, key: Key) -> Entity {
    Entity::new(key, marshal(object))
}

/// Encode the pairs of a generic mapping into a record.
///
/// Map keys are passed through unfiltered; a `"class"` entry is kept, unlike
/// schema fields of that name.
pub fn marshal_map<'a, I>(entries: I) -> Record
where
    I: IntoIterator<Item = (&'a String, &'a Native)>,
{
    entries
        .into_iter()
        .map(|(name, value)| (name.clone(), codec::encode(value.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::OnceLock;

    use kindred_types::{KeyFactory, Value};

    use crate::schema::TypeSchema;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Address {
        city: String,
        zip: Option<String>,
    }

    impl Schema for Address {
        fn schema() -> &'static TypeSchema<Self> {
            static SCHEMA: OnceLock<TypeSchema<Address>> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                TypeSchema::<Address>::builder()
                    .constructor(Address::default)
                    .field("city", |a| &a.city, |a| &mut a.city)
                    .field("zip", |a| &a.zip, |a| &mut a.zip)
                    .build()
            })
        }
    }

    #[derive(Debug, Default)]
    struct Customer {
        name: String,
        tags: Vec<String>,
        address: Address,
        billing: Option<Address>,
    }

    impl Schema for Customer {
        fn schema() -> &'static TypeSchema<Self> {
            static SCHEMA: OnceLock<TypeSchema<Customer>> = OnceLock::new();
            SCHEMA.get_or_init(|| {
                TypeSchema::<Customer>::builder()
                    .constructor(Customer::default)
                    .field("name", |c| &c.name, |c| &mut c.name)
                    .field("tags", |c| &c.tags, |c| &mut c.tags)
                    .embedded("address", |c| &c.address, |c| &mut c.address)
                    .optional_embedded("billing", |c| &c.billing, |c| &mut c.billing)
                    .build()
            })
        }
    }

    fn customer() -> Customer {
        Customer {
            name: "Ada".into(),
            tags: vec!["a".into(), "b".into()],
            address: Address {
                city: "London".into(),
                zip: None,
            },
            billing: None,
        }
    }

    #[test]
    fn marshal_encodes_every_field() {
        let record = marshal(&customer());
        assert_eq!(record.len(), 4);
        assert_eq!(record.get("name"), Some(&Value::from("Ada")));
        assert_eq!(
            record.get("tags"),
            Some(&Value::List(vec![Value::from("a"), Value::from("b")]))
        );
        assert_eq!(record.get("billing"), Some(&Value::Null));
    }

    #[test]
    fn marshal_nests_embedded_objects() {
        let record = marshal(&customer());
        assert_eq!(record.lookup("address.city"), Some(&Value::from("London")));
        assert_eq!(record.lookup("address.zip"), Some(&Value::Null));
    }

    #[test]
    fn marshal_is_stable() {
        let c = customer();
        assert_eq!(marshal(&c), marshal(&c));
    }

    #[test]
    fn marshal_entity_attaches_key() {
        let key = KeyFactory::new("Customer").new_key("ada").unwrap();
        let entity = marshal_entity(&customer(), key.clone());
        assert_eq!(entity.key, key);
        assert_eq!(entity.properties, marshal(&customer()));
    }

    #[test]
    fn marshal_generic_maps() {
        let mut inner = BTreeMap::new();
        inner.insert("n".to_string(), Native::I32(1));
        let mut map = HashMap::new();
        map.insert("inner".to_string(), Native::Map(inner));
        map.insert("flag".to_string(), Native::Bool(false));

        let record = marshal_map(&map);
        assert_eq!(record.get("flag"), Some(&Value::Boolean(false)));
        assert_eq!(record.lookup("inner.n"), Some(&Value::Integer(1)));
    }

    #[test]
    fn marshal_map_keeps_reserved_name() {
        let mut map = BTreeMap::new();
        map.insert(RESERVED_PROPERTY.to_string(), Native::from("Customer"));

        let record = marshal_map(&map);
        assert_eq!(record.get(RESERVED_PROPERTY), Some(&Value::from("Customer")));
    }
}
