use crate::{backend::Backend, common::value::WireItem, error::Error};

use aws_sdk_dynamodb::operation;

/// Delete item operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use dynamodb_store::{backend::Backend, write};
/// use std::collections::HashMap;
///
/// # async fn example(backend: &dyn Backend) -> Result<(), Box<dyn std::error::Error>> {
/// let delete_item = write::delete_item::DeleteItem {
///     key: HashMap::from([("id".to_string(), AttributeValue::S("1".to_string()))]),
///     table_name: "users".to_string(),
/// };
/// delete_item.send(backend).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeleteItem {
    /// Primary key of the item in wire form.
    pub key: WireItem,
    /// Fully qualified table name.
    pub table_name: String,
}

impl TryFrom<DeleteItem> for operation::delete_item::DeleteItemInput {
    type Error = Error;

    fn try_from(delete_item: DeleteItem) -> Result<Self, Self::Error> {
        Self::builder()
            .set_key(Some(delete_item.key))
            .table_name(delete_item.table_name)
            .build()
            .map_err(Error::build("delete item request"))
    }
}

impl DeleteItem {
    /// Execute the delete item operation. Deleting a missing item succeeds.
    pub async fn send(self, backend: &dyn Backend) -> Result<(), Error> {
        let table_name = self.table_name.clone();
        let input: operation::delete_item::DeleteItemInput = self.try_into()?;
        backend
            .delete_item(input)
            .await
            .map_err(Error::wire("delete_item", table_name))?;
        Ok(())
    }
}
