use crate::{backend::Backend, error::Error, write};

use aws_sdk_dynamodb::operation;

/// Put item operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use dynamodb_store::{backend::Backend, write};
/// use std::collections::HashMap;
///
/// # async fn example(backend: &dyn Backend) -> Result<(), Box<dyn std::error::Error>> {
/// let put_item = write::put_item::PutItem {
///     entry: write::common::WriteEntry::new(HashMap::from([(
///         "id".to_string(),
///         AttributeValue::S("1".to_string()),
///     )])),
///     table_name: "users".to_string(),
/// };
/// put_item.send(backend).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PutItem {
    /// The item and its preconditions.
    pub entry: write::common::WriteEntry,
    /// Fully qualified table name.
    pub table_name: String,
}

impl TryFrom<PutItem> for operation::put_item::PutItemInput {
    type Error = Error;

    fn try_from(put_item: PutItem) -> Result<Self, Self::Error> {
        let mut expression_attribute_names = None;
        let mut expression_attribute_values = None;
        let condition_expression = put_item
            .entry
            .condition_expression()?
            .merge_into(&mut expression_attribute_names, &mut expression_attribute_values);
        Self::builder()
            .set_item(Some(put_item.entry.item))
            .set_condition_expression(condition_expression)
            .set_expression_attribute_names(expression_attribute_names)
            .set_expression_attribute_values(expression_attribute_values)
            .table_name(put_item.table_name)
            .build()
            .map_err(Error::build("put item request"))
    }
}

impl PutItem {
    /// Execute the put item operation.
    pub async fn send(self, backend: &dyn Backend) -> Result<(), Error> {
        let table_name = self.table_name.clone();
        let input: operation::put_item::PutItemInput = self.try_into()?;
        backend
            .put_item(input)
            .await
            .map_err(Error::wire("put_item", table_name))?;
        Ok(())
    }
}
