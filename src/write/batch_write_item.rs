use crate::{backend::Backend, common::value::WireItem, error::Error};

use aws_sdk_dynamodb::{operation, types};
use std::collections;

/// Most requests the store accepts in one batch write call.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// A single request within a batch write operation.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchWriteItemRequest {
    /// Create or replace an item.
    PutItem(WireItem),
    /// Remove the item with this primary key.
    DeleteItem(WireItem),
}

impl TryFrom<BatchWriteItemRequest> for types::WriteRequest {
    type Error = Error;

    fn try_from(write_request: BatchWriteItemRequest) -> Result<Self, Self::Error> {
        let builder = match write_request {
            BatchWriteItemRequest::PutItem(item) => {
                let put_request = types::PutRequest::builder()
                    .set_item(Some(item))
                    .build()
                    .map_err(Error::build("put request"))?;
                Self::builder().put_request(put_request)
            }
            BatchWriteItemRequest::DeleteItem(key) => {
                let delete_request = types::DeleteRequest::builder()
                    .set_key(Some(key))
                    .build()
                    .map_err(Error::build("delete request"))?;
                Self::builder().delete_request(delete_request)
            }
        };
        Ok(builder.build())
    }
}

impl BatchWriteItemRequest {
    /// The item of a put or the key of a delete.
    pub fn into_item(self) -> WireItem {
        match self {
            Self::PutItem(item) | Self::DeleteItem(item) => item,
        }
    }
}

impl From<types::WriteRequest> for BatchWriteItemRequest {
    fn from(write_request: types::WriteRequest) -> Self {
        match (write_request.put_request, write_request.delete_request) {
            (Some(put_request), _) => Self::PutItem(put_request.item),
            (None, Some(delete_request)) => Self::DeleteItem(delete_request.key),
            (None, None) => Self::PutItem(WireItem::new()),
        }
    }
}

/// Batch write item operation against one table.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use dynamodb_store::{backend::Backend, write::batch_write_item};
/// use std::collections::HashMap;
///
/// # async fn example(backend: &dyn Backend) -> Result<(), Box<dyn std::error::Error>> {
/// let requests = (0..30)
///     .map(|id| {
///         batch_write_item::BatchWriteItemRequest::PutItem(HashMap::from([(
///             "id".to_string(),
///             AttributeValue::N(id.to_string()),
///         )]))
///     })
///     .collect();
/// for batch in batch_write_item::BatchWriteItem::chunks("users", requests) {
///     let unprocessed = batch.send(backend).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchWriteItem {
    /// Fully qualified table name.
    pub table_name: String,
    /// At most [`MAX_BATCH_WRITE_ITEMS`] requests.
    pub requests: Vec<BatchWriteItemRequest>,
}

impl BatchWriteItem {
    /// Partition `requests` into batches of at most [`MAX_BATCH_WRITE_ITEMS`], keeping
    /// their order.
    pub fn chunks(table_name: impl Into<String>, requests: Vec<BatchWriteItemRequest>) -> Vec<Self> {
        let table_name = table_name.into();
        let mut chunks = Vec::with_capacity(requests.len().div_ceil(MAX_BATCH_WRITE_ITEMS));
        let mut requests = requests.into_iter().peekable();
        while requests.peek().is_some() {
            chunks.push(Self {
                table_name: table_name.clone(),
                requests: requests.by_ref().take(MAX_BATCH_WRITE_ITEMS).collect(),
            });
        }
        chunks
    }
}

impl TryFrom<BatchWriteItem> for operation::batch_write_item::BatchWriteItemInput {
    type Error = Error;

    fn try_from(batch_write_item: BatchWriteItem) -> Result<Self, Self::Error> {
        let mut table_request_items = Vec::with_capacity(batch_write_item.requests.len());
        for request in batch_write_item.requests {
            table_request_items.push(request.try_into()?);
        }
        let request_items =
            collections::HashMap::from([(batch_write_item.table_name, table_request_items)]);
        Self::builder()
            .set_request_items(Some(request_items))
            .build()
            .map_err(Error::build("batch write request"))
    }
}

impl BatchWriteItem {
    /// Execute the batch. Returns the requests the store left unprocessed.
    pub async fn send(self, backend: &dyn Backend) -> Result<Vec<BatchWriteItemRequest>, Error> {
        let table_name = self.table_name.clone();
        let input: operation::batch_write_item::BatchWriteItemInput = self.try_into()?;
        let output = backend
            .batch_write_item(input)
            .await
            .map_err(Error::wire("batch_write_item", table_name.clone()))?;
        let unprocessed = output
            .unprocessed_items
            .and_then(|mut unprocessed_items| unprocessed_items.remove(&table_name))
            .unwrap_or_default()
            .into_iter()
            .map(BatchWriteItemRequest::from)
            .collect();
        Ok(unprocessed)
    }
}
