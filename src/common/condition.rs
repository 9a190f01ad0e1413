use crate::{
    common::{
        self,
        value::{Item, Value, WireType},
    },
    error::{CodecError, Error, ValidationError},
    schema::AttributeDefinition,
};

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use std::{collections, ops};

/// Logical operator for combining conditions.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogicalOperator {
    /// Logical AND - all conditions must be true.
    #[default]
    And,
    /// Logical OR - at least one condition must be true.
    Or,
}

impl ops::Deref for LogicalOperator {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Whether a condition belongs to the key-condition clause or the filter clause.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Role {
    /// Part of the key-condition expression of a query.
    Key,
    /// Part of the filter expression, applied after items are read.
    Filter,
}

impl Role {
    /// `"key"` or `"filter"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Filter => "filter",
        }
    }

    fn alias_prefix(&self) -> &'static str {
        match self {
            Self::Key => "c",
            Self::Filter => "f",
        }
    }

    fn upper_alias_prefix(&self) -> &'static str {
        match self {
            Self::Key => "cs",
            Self::Filter => "fs",
        }
    }
}

/// Comparison applied to an attribute.
///
/// ```rust
/// use dynamodb_store::common::condition;
///
/// let eq = condition::Comparison::Equals(5.into());
/// let between = condition::Comparison::Between(3.into(), 9.into());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Comparison {
    /// `attribute = value`
    Equals(Value),
    /// `attribute < value`
    LessThan(Value),
    /// `attribute <= value`
    LessThanOrEqual(Value),
    /// `attribute > value`
    GreaterThan(Value),
    /// `attribute >= value`
    GreaterThanOrEqual(Value),
    /// `attribute BETWEEN lower AND upper`, both bounds inclusive.
    Between(Value, Value),
}

impl Comparison {
    fn get_expression(
        &self,
        name_placeholder: &str,
        value_placeholder: String,
        upper_placeholder: String,
        declared: Option<WireType>,
    ) -> Result<(String, collections::HashMap<String, types::AttributeValue>), CodecError> {
        let encode = |value: &Value| match declared {
            Some(wire_type) => value.encode_as(wire_type),
            None => value.encode(),
        };
        let (symbol, value) = match self {
            Self::Equals(value) => ("=", value),
            Self::LessThan(value) => ("<", value),
            Self::LessThanOrEqual(value) => ("<=", value),
            Self::GreaterThan(value) => (">", value),
            Self::GreaterThanOrEqual(value) => (">=", value),
            Self::Between(lower, upper) => {
                let lower = encode(lower)?;
                let upper = encode(upper)?;
                let expression = format!(
                    "{name_placeholder} BETWEEN {value_placeholder} AND {upper_placeholder}"
                );
                let values =
                    collections::HashMap::from([(value_placeholder, lower), (upper_placeholder, upper)]);
                return Ok((expression, values));
            }
        };
        let value = encode(value)?;
        let expression = format!("{name_placeholder} {symbol} {value_placeholder}");
        Ok((expression, collections::HashMap::from([(value_placeholder, value)])))
    }
}

/// Condition applied to a named attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    /// The name of the attribute to apply the condition to.
    pub name: String,
    /// The comparison to apply.
    pub comparison: Comparison,
    /// Key-condition or filter clause.
    pub role: Role,
    /// Operator joining this condition to the one added before it.
    pub logical_operator: LogicalOperator,
}

impl Condition {
    /// A condition joined to its predecessor with AND.
    pub fn new(role: Role, name: impl Into<String>, comparison: Comparison) -> Self {
        Self {
            name: name.into(),
            comparison,
            role,
            logical_operator: LogicalOperator::And,
        }
    }

    /// Join this condition to its predecessor with OR instead of AND.
    pub fn or(mut self) -> Self {
        self.logical_operator = LogicalOperator::Or;
        self
    }

    fn get_expression_input(
        &self,
        declared: Option<WireType>,
    ) -> Result<common::ExpressionInput, CodecError> {
        let prefix = self.role.alias_prefix();
        let name_placeholder = format!("#{prefix}_{}", self.name);
        let value_placeholder = format!(":{prefix}_{}", self.name);
        let upper_placeholder = format!(":{}_{}", self.role.upper_alias_prefix(), self.name);
        let (expression, expression_attribute_values) = self.comparison.get_expression(
            &name_placeholder,
            value_placeholder,
            upper_placeholder,
            declared,
        )?;
        let operation = common::ExpressionInput {
            expression,
            expression_attribute_names: collections::HashMap::from([(
                name_placeholder,
                self.name.clone(),
            )]),
            expression_attribute_values,
        };
        Ok(operation)
    }
}

/// Kind of read a builder is rendered for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadKind {
    /// Query: key conditions are mandatory and form the key-condition expression.
    Query,
    /// Scan: key conditions are optional and are folded into the filter expression.
    Scan,
}

/// Expressions and placeholder maps rendered from a [`ConditionBuilder`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderedConditions {
    /// `KeyConditionExpression`, queries only.
    pub key_condition_expression: Option<String>,
    /// `FilterExpression`.
    pub filter_expression: Option<String>,
    /// `ProjectionExpression`.
    pub projection_expression: Option<String>,
    /// `ExpressionAttributeNames`.
    pub expression_attribute_names: Option<collections::HashMap<String, String>>,
    /// `ExpressionAttributeValues`.
    pub expression_attribute_values: Option<collections::HashMap<String, types::AttributeValue>>,
}

/// Accumulates key conditions, filter conditions and read options for a query or scan.
///
/// Conditions render in the order they were added. At most one condition is kept per
/// attribute and role; adding a second one keeps the first and makes [`Self::render`]
/// fail.
///
/// ```rust
/// use dynamodb_store::common::condition::ConditionBuilder;
///
/// let conditions = ConditionBuilder::new()
///     .and_eq("id", 5)
///     .and_between("time", 3, 9)
///     .filter_gt("score", 10)
///     .set_limit(3);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConditionBuilder {
    key_conditions: IndexMap<String, Condition>,
    filter_conditions: IndexMap<String, Condition>,
    rejected: Vec<(String, Role)>,
    index_name: Option<String>,
    limit: Option<i32>,
    consistent_read: Option<bool>,
    descending: bool,
    start_key: Option<Item>,
    projection: Vec<String>,
}

impl ConditionBuilder {
    /// An empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition under its own role.
    pub fn add(mut self, condition: Condition) -> Self {
        let conditions = match condition.role {
            Role::Key => &mut self.key_conditions,
            Role::Filter => &mut self.filter_conditions,
        };
        if conditions.contains_key(&condition.name) {
            self.rejected.push((condition.name, condition.role));
        } else {
            conditions.insert(condition.name.clone(), condition);
        }
        self
    }

    fn key(self, name: impl Into<String>, comparison: Comparison) -> Self {
        self.add(Condition::new(Role::Key, name, comparison))
    }

    fn filter(self, name: impl Into<String>, comparison: Comparison) -> Self {
        self.add(Condition::new(Role::Filter, name, comparison))
    }

    /// Key condition `name = value`.
    pub fn and_eq(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.key(name, Comparison::Equals(value.into()))
    }

    /// Key condition `name <= value`.
    pub fn and_le(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.key(name, Comparison::LessThanOrEqual(value.into()))
    }

    /// Key condition `name < value`.
    pub fn and_lt(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.key(name, Comparison::LessThan(value.into()))
    }

    /// Key condition `name >= value`.
    pub fn and_ge(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.key(name, Comparison::GreaterThanOrEqual(value.into()))
    }

    /// Key condition `name > value`.
    pub fn and_gt(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.key(name, Comparison::GreaterThan(value.into()))
    }

    /// Key condition `name BETWEEN from AND to`.
    pub fn and_between(
        self,
        name: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        self.key(name, Comparison::Between(from.into(), to.into()))
    }

    /// Filter condition `name = value`.
    pub fn filter_eq(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(name, Comparison::Equals(value.into()))
    }

    /// Filter condition `name <= value`.
    pub fn filter_le(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(name, Comparison::LessThanOrEqual(value.into()))
    }

    /// Filter condition `name < value`.
    pub fn filter_lt(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(name, Comparison::LessThan(value.into()))
    }

    /// Filter condition `name >= value`.
    pub fn filter_ge(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(name, Comparison::GreaterThanOrEqual(value.into()))
    }

    /// Filter condition `name > value`.
    pub fn filter_gt(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(name, Comparison::GreaterThan(value.into()))
    }

    /// Filter condition `name BETWEEN from AND to`.
    pub fn filter_between(
        self,
        name: impl Into<String>,
        from: impl Into<Value>,
        to: impl Into<Value>,
    ) -> Self {
        self.filter(name, Comparison::Between(from.into(), to.into()))
    }

    /// Read from a secondary index instead of the base table.
    pub fn set_index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    /// Maximum number of items to evaluate.
    pub fn set_limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Strongly consistent reads.
    pub fn set_consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = Some(consistent_read);
        self
    }

    /// Return query results in descending range-key order.
    pub fn set_descending(mut self, descending: bool) -> Self {
        self.descending = descending;
        self
    }

    /// Continue from the `last_evaluated_key` of a previous page.
    pub fn set_start_key(mut self, start_key: Item) -> Self {
        self.start_key = Some(start_key);
        self
    }

    /// Only return these attributes.
    pub fn set_projection<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Key conditions in the order they were added.
    pub fn key_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.key_conditions.values()
    }

    /// Filter conditions in the order they were added.
    pub fn filter_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.filter_conditions.values()
    }

    /// Index to read from, if any.
    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    /// Evaluation limit, if any.
    pub fn limit(&self) -> Option<i32> {
        self.limit
    }

    /// Consistent-read flag, if set.
    pub fn consistent_read(&self) -> Option<bool> {
        self.consistent_read
    }

    /// Whether results come back in descending order.
    pub fn descending(&self) -> bool {
        self.descending
    }

    /// Start key, if any.
    pub fn start_key(&self) -> Option<&Item> {
        self.start_key.as_ref()
    }

    /// Projected attributes; empty means all.
    pub fn projection(&self) -> &[String] {
        &self.projection
    }

    /// Render the expressions for `kind`. Operands of attributes found in `attributes`
    /// are encoded as their declared type, all others by their own variant.
    pub fn render(
        &self,
        kind: ReadKind,
        attributes: &IndexMap<String, AttributeDefinition>,
    ) -> Result<RenderedConditions, Error> {
        if let Some((attribute, role)) = self.rejected.first() {
            let err = ValidationError::DuplicateCondition {
                attribute: attribute.clone(),
                role: role.as_str(),
            };
            return Err(err.into());
        }
        if let Some(condition) = self
            .key_conditions
            .values()
            .find(|condition| condition.logical_operator == LogicalOperator::Or)
        {
            let err = ValidationError::OrInKeyCondition {
                attribute: condition.name.clone(),
            };
            return Err(err.into());
        }
        for name in self
            .key_conditions
            .keys()
            .chain(self.filter_conditions.keys())
            .chain(&self.projection)
        {
            common::check_attribute_name(name)?;
        }
        let declared = |name: &str| attributes.get(name).map(|definition| definition.wire_type);
        let key_operation = get_expression_operation(&self.key_conditions, &declared)?;
        let mut filter_operation = get_expression_operation(&self.filter_conditions, &declared)?;
        let mut rendered = RenderedConditions::default();
        match kind {
            ReadKind::Query => {
                if key_operation.is_empty() {
                    return Err(ValidationError::NoCondition.into());
                }
                rendered.key_condition_expression = key_operation.merge_into(
                    &mut rendered.expression_attribute_names,
                    &mut rendered.expression_attribute_values,
                );
            }
            ReadKind::Scan => {
                let has_or = self
                    .filter_conditions
                    .values()
                    .skip(1)
                    .any(|condition| condition.logical_operator == LogicalOperator::Or);
                if has_or && !key_operation.is_empty() {
                    filter_operation.expression = format!("({})", filter_operation.expression);
                }
                let mut operation = key_operation;
                operation.absorb(filter_operation, &LogicalOperator::And);
                filter_operation = operation;
            }
        }
        rendered.filter_expression = filter_operation.merge_into(
            &mut rendered.expression_attribute_names,
            &mut rendered.expression_attribute_values,
        );
        rendered.projection_expression = common::ExpressionInput::projection(&self.projection)
            .merge_into(
                &mut rendered.expression_attribute_names,
                &mut rendered.expression_attribute_values,
            );
        Ok(rendered)
    }
}

fn get_expression_operation(
    conditions: &IndexMap<String, Condition>,
    declared: &dyn Fn(&str) -> Option<WireType>,
) -> Result<common::ExpressionInput, CodecError> {
    let mut operation = common::ExpressionInput::default();
    for condition in conditions.values() {
        let condition_operation = condition.get_expression_input(declared(&condition.name))?;
        operation.absorb(condition_operation, &condition.logical_operator);
    }
    Ok(operation)
}
