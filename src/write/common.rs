use crate::{
    common::{
        self,
        value::{Value, WireItem},
    },
    error::{CodecError, ValidationError},
    schema::TableSchema,
};

use indexmap::IndexMap;
use std::collections;

/// Expected state of an attribute before a put is applied.
#[derive(Clone, Debug, PartialEq)]
pub enum Precondition {
    /// The attribute must exist on the stored item.
    Exists,
    /// The attribute must not exist, e.g. to refuse overwriting an item.
    NotExists,
    /// The stored attribute must equal the value.
    Equals(Value),
}

impl Precondition {
    fn get_expression_input(&self, name: &str) -> Result<common::ExpressionInput, CodecError> {
        let name_placeholder = format!("#e_{name}");
        let (expression, expression_attribute_values) = match self {
            Self::Exists => (
                format!("attribute_exists({name_placeholder})"),
                collections::HashMap::new(),
            ),
            Self::NotExists => (
                format!("attribute_not_exists({name_placeholder})"),
                collections::HashMap::new(),
            ),
            Self::Equals(value) => {
                let value_placeholder = format!(":e_{name}");
                let expression = format!("{name_placeholder} = {value_placeholder}");
                (
                    expression,
                    collections::HashMap::from([(value_placeholder, value.encode()?)]),
                )
            }
        };
        let operation = common::ExpressionInput {
            expression,
            expression_attribute_names: collections::HashMap::from([(
                name_placeholder,
                name.to_string(),
            )]),
            expression_attribute_values,
        };
        Ok(operation)
    }
}

/// One staged write: an encoded item plus its preconditions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WriteEntry {
    /// The item in wire form.
    pub item: WireItem,
    /// Preconditions keyed by attribute name, rendered in insertion order.
    pub expected: IndexMap<String, Precondition>,
}

impl WriteEntry {
    /// An entry without preconditions.
    pub fn new(item: WireItem) -> Self {
        Self {
            item,
            expected: IndexMap::new(),
        }
    }

    /// Check the key attributes of the item against `schema`, and the names the
    /// preconditions refer to.
    pub fn validate(&self, schema: &TableSchema) -> Result<(), ValidationError> {
        for name in self.expected.keys() {
            common::check_attribute_name(name)?;
        }
        schema.key_of(&self.item).map(|_| ())
    }

    /// The preconditions joined with AND.
    pub(crate) fn condition_expression(&self) -> Result<common::ExpressionInput, CodecError> {
        let items = self
            .expected
            .iter()
            .map(|(name, precondition)| precondition.get_expression_input(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(common::ExpressionInput::merge(" AND ", items))
    }
}
