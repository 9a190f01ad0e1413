use crate::{
    common::{
        condition::{ConditionBuilder, ReadKind},
        value,
    },
    error::Error,
    schema::AttributeDefinition,
};

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use std::collections;

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct MultipleReadInput {
    pub(crate) consistent_read: Option<bool>,
    pub(crate) exclusive_start_key: Option<collections::HashMap<String, types::AttributeValue>>,
    pub(crate) expression_attribute_names: Option<collections::HashMap<String, String>>,
    pub(crate) expression_attribute_values:
        Option<collections::HashMap<String, types::AttributeValue>>,
    pub(crate) filter_expression: Option<String>,
    pub(crate) index_name: Option<String>,
    pub(crate) key_condition_expression: Option<String>,
    pub(crate) limit: Option<i32>,
    pub(crate) projection_expression: Option<String>,
    pub(crate) scan_index_forward: Option<bool>,
    pub(crate) select: Option<types::Select>,
    pub(crate) table_name: String,
}

/// Arguments for multiple-item reads (Query, Scan).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MultipleReadArgs {
    /// Conditions and read options.
    pub conditions: ConditionBuilder,
    /// Declared attribute types; operands of these attributes are encoded as declared.
    pub attributes: IndexMap<String, AttributeDefinition>,
    /// `Select::Count` counts matches without returning them.
    pub select: Option<types::Select>,
    /// Fully qualified table name.
    pub table_name: String,
}

impl MultipleReadArgs {
    pub(crate) fn into_input(self, kind: ReadKind) -> Result<MultipleReadInput, Error> {
        let rendered = self.conditions.render(kind, &self.attributes)?;
        let exclusive_start_key = self
            .conditions
            .start_key()
            .map(value::encode_item)
            .transpose()?;
        let scan_index_forward = match kind {
            ReadKind::Query if self.conditions.descending() => Some(false),
            _ => None,
        };
        let operation = MultipleReadInput {
            consistent_read: self.conditions.consistent_read(),
            exclusive_start_key,
            expression_attribute_names: rendered.expression_attribute_names,
            expression_attribute_values: rendered.expression_attribute_values,
            filter_expression: rendered.filter_expression,
            index_name: self.conditions.index_name().map(str::to_string),
            key_condition_expression: rendered.key_condition_expression,
            limit: self.conditions.limit(),
            projection_expression: rendered.projection_expression,
            scan_index_forward,
            select: self.select,
            table_name: self.table_name,
        };
        Ok(operation)
    }
}

/// Apply the settings shared by query and scan to a request builder.
macro_rules! apply_multiple_read_operation {
    ($builder:expr, $multiple_read_operation:expr) => {
        $builder
            .set_consistent_read($multiple_read_operation.consistent_read)
            .set_exclusive_start_key($multiple_read_operation.exclusive_start_key)
            .set_expression_attribute_names($multiple_read_operation.expression_attribute_names)
            .set_expression_attribute_values($multiple_read_operation.expression_attribute_values)
            .set_filter_expression($multiple_read_operation.filter_expression)
            .set_index_name($multiple_read_operation.index_name)
            .set_limit($multiple_read_operation.limit)
            .set_projection_expression($multiple_read_operation.projection_expression)
            .set_select($multiple_read_operation.select)
            .table_name($multiple_read_operation.table_name)
    };
}

pub(crate) use apply_multiple_read_operation;
