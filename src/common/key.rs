use crate::{
    common::value::{Value, WireItem},
    error::CodecError,
    schema::AttributeDefinition,
};

/// Key component: a key attribute definition and the value looked up for it.
///
/// ```rust
/// use dynamodb_store::common::{key, value::WireType};
/// use dynamodb_store::schema::AttributeDefinition;
///
/// let key = key::Key {
///     definition: AttributeDefinition::new("id", WireType::Number),
///     value: 1.into(),
/// };
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Key {
    /// The key attribute and its declared type.
    pub definition: AttributeDefinition,
    /// The value of the key.
    pub value: Value,
}

/// Primary key (hash key and optional range key).
#[derive(Clone, Debug, PartialEq)]
pub struct Keys {
    /// The hash key (required).
    pub partition_key: Key,
    /// The range key, only for tables with composite primary keys.
    pub sort_key: Option<Key>,
}

impl TryFrom<Keys> for WireItem {
    type Error = CodecError;

    fn try_from(keys: Keys) -> Result<Self, Self::Error> {
        let partition_key = keys.partition_key;
        let partition_key_value = partition_key
            .value
            .encode_as(partition_key.definition.wire_type)?;
        let mut wire_keys = Self::from([(partition_key.definition.name, partition_key_value)]);
        if let Some(sort_key) = keys.sort_key {
            let sort_key_value = sort_key.value.encode_as(sort_key.definition.wire_type)?;
            wire_keys.insert(sort_key.definition.name, sort_key_value);
        }
        Ok(wire_keys)
    }
}
