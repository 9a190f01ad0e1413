//! Table schema: primary key, attribute catalog, secondary indexes and throughput.
//!
//! A [`TableSchema`] renders to a `CreateTableInput` with [`TableSchema::to_create_request`]
//! and is rebuilt from a `TableDescription` with [`TableSchema::from_description`].

use crate::{
    common::{
        key,
        value::{Value, WireItem, WireType},
    },
    error::{Error, SchemaError, ValidationError},
};

use aws_sdk_dynamodb::{operation, types};
use indexmap::IndexMap;

/// Projection type applied to indexes that do not set one.
const DEFAULT_PROJECTION: Projection = Projection::All;

/// A named attribute and its wire type.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct AttributeDefinition {
    /// Attribute name.
    pub name: String,
    /// Wire type of the attribute.
    pub wire_type: WireType,
}

impl AttributeDefinition {
    /// Define an attribute.
    pub fn new(name: impl Into<String>, wire_type: WireType) -> Self {
        Self {
            name: name.into(),
            wire_type,
        }
    }
}

impl TryFrom<&AttributeDefinition> for types::AttributeDefinition {
    type Error = Error;

    fn try_from(definition: &AttributeDefinition) -> Result<Self, Self::Error> {
        Self::builder()
            .attribute_name(&definition.name)
            .attribute_type(definition.wire_type.into())
            .build()
            .map_err(Error::build("attribute definition"))
    }
}

impl TryFrom<&types::AttributeDefinition> for AttributeDefinition {
    type Error = SchemaError;

    fn try_from(definition: &types::AttributeDefinition) -> Result<Self, Self::Error> {
        let wire_type = WireType::try_from(definition.attribute_type()).map_err(|_| {
            SchemaError::UnknownAttributeType {
                attribute: definition.attribute_name().to_string(),
                kind: definition.attribute_type().as_str().to_string(),
            }
        })?;
        Ok(Self::new(definition.attribute_name(), wire_type))
    }
}

/// Provisioned read and write capacity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Throughput {
    /// Read capacity units.
    pub read: i64,
    /// Write capacity units.
    pub write: i64,
}

impl Default for Throughput {
    fn default() -> Self {
        Self { read: 1, write: 1 }
    }
}

impl TryFrom<Throughput> for types::ProvisionedThroughput {
    type Error = Error;

    fn try_from(throughput: Throughput) -> Result<Self, Self::Error> {
        Self::builder()
            .read_capacity_units(throughput.read)
            .write_capacity_units(throughput.write)
            .build()
            .map_err(Error::build("provisioned throughput"))
    }
}

impl From<&types::ProvisionedThroughputDescription> for Throughput {
    fn from(description: &types::ProvisionedThroughputDescription) -> Self {
        let default = Self::default();
        Self {
            read: description.read_capacity_units().unwrap_or(default.read),
            write: description.write_capacity_units().unwrap_or(default.write),
        }
    }
}

/// Attributes copied into an index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Projection {
    /// Every attribute.
    All,
    /// Only the table and index keys.
    KeysOnly,
    /// The keys plus the listed attributes.
    Include(Vec<String>),
}

impl From<&Projection> for types::Projection {
    fn from(projection: &Projection) -> Self {
        let builder = Self::builder();
        match projection {
            Projection::All => builder.projection_type(types::ProjectionType::All),
            Projection::KeysOnly => builder.projection_type(types::ProjectionType::KeysOnly),
            Projection::Include(attributes) => builder
                .projection_type(types::ProjectionType::Include)
                .set_non_key_attributes(Some(attributes.clone())),
        }
        .build()
    }
}

impl From<Option<&types::Projection>> for Projection {
    fn from(projection: Option<&types::Projection>) -> Self {
        match projection.and_then(|projection| projection.projection_type()) {
            Some(types::ProjectionType::KeysOnly) => Self::KeysOnly,
            Some(types::ProjectionType::Include) => Self::Include(
                projection
                    .map(|projection| projection.non_key_attributes().to_vec())
                    .unwrap_or_default(),
            ),
            _ => DEFAULT_PROJECTION,
        }
    }
}

/// Local or global secondary index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexKind {
    /// Shares the table's hash key, alternate range key.
    Local,
    /// Independent hash and range key with its own throughput.
    Global,
}

/// Secondary index.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Index {
    /// Index name.
    pub name: String,
    /// Local or global.
    pub kind: IndexKind,
    /// Hash key attribute name.
    pub hash_key: String,
    /// Range key attribute name.
    pub range_key: Option<String>,
    /// Attributes copied into the index.
    pub projection: Projection,
    /// Provisioned capacity, global indexes only.
    pub throughput: Option<Throughput>,
}

impl Index {
    fn key_schema(&self) -> Result<Vec<types::KeySchemaElement>, Error> {
        key_schema(&self.hash_key, self.range_key.as_deref())
    }
}

fn key_schema(
    hash_key: &str,
    range_key: Option<&str>,
) -> Result<Vec<types::KeySchemaElement>, Error> {
    let mut elements = vec![
        types::KeySchemaElement::builder()
            .attribute_name(hash_key)
            .key_type(types::KeyType::Hash)
            .build()
            .map_err(Error::build("key schema element"))?,
    ];
    if let Some(range_key) = range_key {
        elements.push(
            types::KeySchemaElement::builder()
                .attribute_name(range_key)
                .key_type(types::KeyType::Range)
                .build()
                .map_err(Error::build("key schema element"))?,
        );
    }
    Ok(elements)
}

fn key_names(elements: &[types::KeySchemaElement]) -> (Option<&str>, Option<&str>) {
    let find = |key_type: types::KeyType| {
        elements
            .iter()
            .find(|element| *element.key_type() == key_type)
            .map(|element| element.attribute_name())
    };
    (find(types::KeyType::Hash), find(types::KeyType::Range))
}

/// Schema of one table.
///
/// ```rust
/// use dynamodb_store::common::value::WireType;
/// use dynamodb_store::schema::{AttributeDefinition, TableSchema};
///
/// let mut schema = TableSchema::with_hash_key("events", "id", WireType::Number);
/// schema.add_range_key("time", WireType::Number);
/// schema
///     .add_global_index("by_user", &[AttributeDefinition::new("user", WireType::String)])
///     .unwrap();
/// assert_eq!(schema.attributes.len(), 3);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct TableSchema {
    /// Table name without prefix.
    pub name: String,
    /// Hash key.
    pub hash_key: AttributeDefinition,
    /// Range key, if the primary key is composite.
    pub range_key: Option<AttributeDefinition>,
    /// Local secondary indexes.
    pub local_indexes: Vec<Index>,
    /// Global secondary indexes.
    pub global_indexes: Vec<Index>,
    /// Every attribute referenced by a key, in registration order.
    pub attributes: IndexMap<String, AttributeDefinition>,
    /// Provisioned capacity of the table.
    pub throughput: Throughput,
    /// Server-side status, filled from descriptions.
    pub status: Option<types::TableStatus>,
    /// Approximate item count, filled from descriptions.
    pub item_count: i64,
    /// Throughput decreases so far today, filled from descriptions.
    pub decreases_today: i64,
}

impl TableSchema {
    /// A schema whose only attribute is its hash key.
    pub fn with_hash_key(
        name: impl Into<String>,
        key_name: impl Into<String>,
        key_type: WireType,
    ) -> Self {
        let hash_key = AttributeDefinition::new(key_name, key_type);
        Self {
            name: name.into(),
            attributes: IndexMap::from([(hash_key.name.clone(), hash_key.clone())]),
            hash_key,
            range_key: None,
            local_indexes: Vec::new(),
            global_indexes: Vec::new(),
            throughput: Throughput::default(),
            status: None,
            item_count: 0,
            decreases_today: 0,
        }
    }

    /// Register an attribute unless one with the same name exists.
    pub fn add_attribute(&mut self, definition: AttributeDefinition) -> &mut Self {
        self.attributes
            .entry(definition.name.clone())
            .or_insert(definition);
        self
    }

    /// Make the primary key composite.
    pub fn add_range_key(&mut self, key_name: impl Into<String>, key_type: WireType) -> &mut Self {
        let range_key = AttributeDefinition::new(key_name, key_type);
        self.add_attribute(range_key.clone());
        self.range_key = Some(range_key);
        self
    }

    /// Set the table's provisioned capacity.
    pub fn set_throughput(&mut self, read: i64, write: i64) -> &mut Self {
        self.throughput = Throughput { read, write };
        self
    }

    /// Add a local index keyed by the table's hash key and `range_key`.
    pub fn add_local_index(
        &mut self,
        name: impl Into<String>,
        range_key: AttributeDefinition,
    ) -> Result<&mut Self, SchemaError> {
        let name = name.into();
        if self.range_key.is_none() {
            return Err(SchemaError::LocalIndexWithoutRangeKey { index: name });
        }
        let index = Index {
            name,
            kind: IndexKind::Local,
            hash_key: self.hash_key.name.clone(),
            range_key: Some(range_key.name.clone()),
            projection: DEFAULT_PROJECTION,
            throughput: None,
        };
        self.add_attribute(range_key);
        self.local_indexes.push(index);
        Ok(self)
    }

    /// Add a global index keyed by `keys`: a hash key and an optional range key.
    pub fn add_global_index(
        &mut self,
        name: impl Into<String>,
        keys: &[AttributeDefinition],
    ) -> Result<&mut Self, SchemaError> {
        let name = name.into();
        let (hash_key, range_key) = match keys {
            [hash_key] => (hash_key, None),
            [hash_key, range_key] => (hash_key, Some(range_key)),
            _ => {
                return Err(SchemaError::IndexKeyCount {
                    index: name,
                    count: keys.len(),
                });
            }
        };
        let index = Index {
            name,
            kind: IndexKind::Global,
            hash_key: hash_key.name.clone(),
            range_key: range_key.map(|range_key| range_key.name.clone()),
            projection: DEFAULT_PROJECTION,
            throughput: Some(Throughput::default()),
        };
        self.add_attribute(hash_key.clone());
        if let Some(range_key) = range_key {
            self.add_attribute(range_key.clone());
        }
        self.global_indexes.push(index);
        Ok(self)
    }

    /// Look up a local or global index by name.
    pub fn index(&self, name: &str) -> Option<&Index> {
        self.local_indexes
            .iter()
            .chain(&self.global_indexes)
            .find(|index| index.name == name)
    }

    /// Mutable access to a local or global index by name.
    pub fn index_mut(&mut self, name: &str) -> Option<&mut Index> {
        self.local_indexes
            .iter_mut()
            .chain(&mut self.global_indexes)
            .find(|index| index.name == name)
    }

    /// Table name qualified by `prefix`.
    pub fn full_name(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.name)
    }

    /// Build the primary key of one item from its hash and range values.
    pub fn keys(&self, hash_value: Value, range_value: Option<Value>) -> Result<key::Keys, ValidationError> {
        let sort_key = match (&self.range_key, range_value) {
            (Some(definition), Some(value)) => Some(key::Key {
                definition: definition.clone(),
                value,
            }),
            (Some(definition), None) => {
                return Err(ValidationError::MissingKey {
                    table: self.name.clone(),
                    attribute: definition.name.clone(),
                });
            }
            (None, Some(_)) => {
                return Err(ValidationError::UnexpectedRangeKey {
                    table: self.name.clone(),
                });
            }
            (None, None) => None,
        };
        Ok(key::Keys {
            partition_key: key::Key {
                definition: self.hash_key.clone(),
                value: hash_value,
            },
            sort_key,
        })
    }

    /// Extract the primary key of a wire item, checking that each key attribute is
    /// present with its declared type.
    pub fn key_of(&self, item: &WireItem) -> Result<WireItem, ValidationError> {
        let mut keys = WireItem::with_capacity(2);
        for definition in std::iter::once(&self.hash_key).chain(&self.range_key) {
            let attribute_value =
                item.get(&definition.name)
                    .ok_or_else(|| ValidationError::MissingKey {
                        table: self.name.clone(),
                        attribute: definition.name.clone(),
                    })?;
            let actual = Value::decode(attribute_value).wire_type();
            if actual != definition.wire_type {
                return Err(ValidationError::KeyType {
                    table: self.name.clone(),
                    attribute: definition.name.clone(),
                    expected: definition.wire_type,
                    actual,
                });
            }
            keys.insert(definition.name.clone(), attribute_value.clone());
        }
        Ok(keys)
    }

    /// Render the create-table request for the table named `prefix + name`.
    pub fn to_create_request(
        &self,
        prefix: &str,
    ) -> Result<operation::create_table::CreateTableInput, Error> {
        let attribute_definitions = self
            .attributes
            .values()
            .map(types::AttributeDefinition::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let key_schema = key_schema(
            &self.hash_key.name,
            self.range_key.as_ref().map(|range_key| range_key.name.as_str()),
        )?;
        let mut local_indexes = Vec::with_capacity(self.local_indexes.len());
        for index in &self.local_indexes {
            let local_index = types::LocalSecondaryIndex::builder()
                .index_name(&index.name)
                .set_key_schema(Some(index.key_schema()?))
                .projection((&index.projection).into())
                .build()
                .map_err(Error::build("local secondary index"))?;
            local_indexes.push(local_index);
        }
        let mut global_indexes = Vec::with_capacity(self.global_indexes.len());
        for index in &self.global_indexes {
            let throughput = index.throughput.unwrap_or_default().try_into()?;
            let global_index = types::GlobalSecondaryIndex::builder()
                .index_name(&index.name)
                .set_key_schema(Some(index.key_schema()?))
                .projection((&index.projection).into())
                .provisioned_throughput(throughput)
                .build()
                .map_err(Error::build("global secondary index"))?;
            global_indexes.push(global_index);
        }
        operation::create_table::CreateTableInput::builder()
            .table_name(self.full_name(prefix))
            .set_attribute_definitions(Some(attribute_definitions))
            .set_key_schema(Some(key_schema))
            .provisioned_throughput(self.throughput.try_into()?)
            .set_local_secondary_indexes((!local_indexes.is_empty()).then_some(local_indexes))
            .set_global_secondary_indexes((!global_indexes.is_empty()).then_some(global_indexes))
            .build()
            .map_err(Error::build("create table request"))
    }

    /// Rebuild a schema from a describe-table response. `prefix` is stripped from the
    /// described table name.
    pub fn from_description(
        description: &types::TableDescription,
        prefix: &str,
    ) -> Result<Self, SchemaError> {
        let full_name = description.table_name().unwrap_or_default();
        let name = full_name.strip_prefix(prefix).unwrap_or(full_name).to_string();
        let mut attributes = IndexMap::new();
        for definition in description.attribute_definitions() {
            let definition = AttributeDefinition::try_from(definition)?;
            attributes.insert(definition.name.clone(), definition);
        }
        let lookup = |owner: &str, attribute: &str| {
            attributes
                .get(attribute)
                .cloned()
                .ok_or_else(|| SchemaError::UndefinedAttribute {
                    owner: owner.to_string(),
                    attribute: attribute.to_string(),
                })
        };
        let (hash_key, range_key) = key_names(description.key_schema());
        let hash_key = hash_key.ok_or_else(|| SchemaError::MissingHashKey {
            table: name.clone(),
        })?;
        let hash_key = lookup(&name, hash_key)?;
        let range_key = range_key
            .map(|range_key| lookup(&name, range_key))
            .transpose()?;

        let mut local_indexes = Vec::new();
        for index in description.local_secondary_indexes() {
            let index_name = index.index_name().unwrap_or_default();
            let (index_hash_key, index_range_key) = key_names(index.key_schema());
            local_indexes.push(Index {
                name: index_name.to_string(),
                kind: IndexKind::Local,
                hash_key: index_hash_key.unwrap_or(&hash_key.name).to_string(),
                range_key: index_range_key.map(str::to_string),
                projection: index.projection().into(),
                throughput: None,
            });
        }
        let mut global_indexes = Vec::new();
        for index in description.global_secondary_indexes() {
            let index_name = index.index_name().unwrap_or_default();
            let (index_hash_key, index_range_key) = key_names(index.key_schema());
            let index_hash_key = index_hash_key.ok_or_else(|| SchemaError::MissingHashKey {
                table: index_name.to_string(),
            })?;
            global_indexes.push(Index {
                name: index_name.to_string(),
                kind: IndexKind::Global,
                hash_key: index_hash_key.to_string(),
                range_key: index_range_key.map(str::to_string),
                projection: index.projection().into(),
                throughput: Some(
                    index
                        .provisioned_throughput()
                        .map(Throughput::from)
                        .unwrap_or_default(),
                ),
            });
        }
        for index in local_indexes.iter().chain(&global_indexes) {
            lookup(&index.name, &index.hash_key)?;
            if let Some(range_key) = &index.range_key {
                lookup(&index.name, range_key)?;
            }
        }

        let provisioned_throughput = description.provisioned_throughput();
        Ok(Self {
            name,
            hash_key,
            range_key,
            local_indexes,
            global_indexes,
            attributes,
            throughput: provisioned_throughput
                .map(Throughput::from)
                .unwrap_or_default(),
            status: description.table_status().cloned(),
            item_count: description.item_count().unwrap_or_default(),
            decreases_today: provisioned_throughput
                .and_then(|throughput| throughput.number_of_decreases_today())
                .unwrap_or_default(),
        })
    }
}
