//! Common building blocks shared by reads and writes.
//!
//! This module holds the value codec, primary key encoding and the condition builder,
//! plus the expression plumbing they render into.

/// Condition builder for key-condition and filter expressions.
pub mod condition;

/// Primary key values encoded through their declared attribute types.
pub mod key;

/// Dynamic value model and its wire codec.
pub mod value;

use crate::error::ValidationError;

use aws_sdk_dynamodb::types;
use std::collections;

/// Reject names that cannot be spliced into a `#x_name` placeholder.
pub(crate) fn check_attribute_name(name: &str) -> Result<(), ValidationError> {
    let valid = !name.is_empty()
        && name
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidAttributeName {
            attribute: name.to_string(),
        })
    }
}

fn get_expression(left: String, operator: &str, right: String) -> String {
    if left.is_empty() {
        right
    } else if right.is_empty() {
        left
    } else {
        format!("{left}{operator}{right}")
    }
}

/// An expression string with the placeholder maps it refers to.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ExpressionInput {
    pub(crate) expression: String,
    pub(crate) expression_attribute_names: collections::HashMap<String, String>,
    pub(crate) expression_attribute_values: collections::HashMap<String, types::AttributeValue>,
}

impl ExpressionInput {
    pub(crate) fn is_empty(&self) -> bool {
        self.expression.is_empty()
    }

    /// Projection of `attributes` through `#p_` aliases.
    pub(crate) fn projection(attributes: &[String]) -> Self {
        let mut operation = Self::default();
        for name in attributes {
            let placeholder = format!("#p_{name}");
            operation
                .expression_attribute_names
                .insert(placeholder.clone(), name.clone());
            operation.expression = get_expression(operation.expression, ", ", placeholder);
        }
        operation
    }

    /// Join `items` with `operator`, skipping empty expressions.
    pub(crate) fn merge(operator: &str, items: Vec<Self>) -> Self {
        let mut operation = Self::default();
        for item in items {
            operation.absorb(item, operator);
        }
        operation
    }

    /// Append `item` to this expression with `operator` and take over its placeholders.
    pub(crate) fn absorb(&mut self, item: Self, operator: &str) {
        self.expression_attribute_names
            .extend(item.expression_attribute_names);
        self.expression_attribute_values
            .extend(item.expression_attribute_values);
        let expression = std::mem::take(&mut self.expression);
        self.expression = get_expression(expression, operator, item.expression);
    }

    /// Move the placeholders into request-level maps and return the expression, or
    /// `None` when it is empty.
    pub(crate) fn merge_into(
        self,
        names: &mut Option<collections::HashMap<String, String>>,
        values: &mut Option<collections::HashMap<String, types::AttributeValue>>,
    ) -> Option<String> {
        if !self.expression_attribute_names.is_empty() {
            match names {
                Some(existing) => existing.extend(self.expression_attribute_names),
                None => *names = Some(self.expression_attribute_names),
            }
        }
        if !self.expression_attribute_values.is_empty() {
            match values {
                Some(existing) => existing.extend(self.expression_attribute_values),
                None => *values = Some(self.expression_attribute_values),
            }
        }
        if self.expression.is_empty() {
            None
        } else {
            Some(self.expression)
        }
    }
}
