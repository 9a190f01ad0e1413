//! A table handle: schema-aware reads and a spool of staged writes.

use crate::{
    backend::Backend,
    common::{
        condition::ConditionBuilder,
        key::Keys,
        value::{self, Item, Value, WireItem},
    },
    error::{AggregateError, CodecError, Error, Result, SERVICE_NAME, SchemaError, ValidationError},
    read::{
        common::MultipleReadArgs, get_item::GetItem, query::Query, result_set::ReadOutput,
        scan::Scan,
    },
    schema::{TableSchema, Throughput},
    write::{
        batch_write_item::{BatchWriteItem, BatchWriteItemRequest, MAX_BATCH_WRITE_ITEMS},
        common::{Precondition, WriteEntry},
        delete_item::DeleteItem,
        put_item::PutItem,
    },
};

use aws_sdk_dynamodb::{operation, types};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::{collections, mem, sync::Arc};
use tracing::{debug, info, warn};

/// Describe `table_name` and rebuild its schema.
pub(crate) async fn describe(
    backend: &dyn Backend,
    prefix: &str,
    table_name: &str,
) -> Result<TableSchema> {
    let input = operation::describe_table::DescribeTableInput::builder()
        .table_name(table_name)
        .build()
        .map_err(Error::build("describe table request"))?;
    let output = backend
        .describe_table(input)
        .await
        .map_err(Error::wire("describe_table", table_name.to_string()))?;
    let description = output.table.ok_or_else(|| SchemaError::MissingDescription {
        table: table_name.to_string(),
    })?;
    Ok(TableSchema::from_description(&description, prefix)?)
}

/// Hashable form of an encoded primary key.
fn key_identity(key: &WireItem) -> Vec<(String, Vec<u8>)> {
    let mut identity: Vec<_> = key
        .iter()
        .map(|(name, attribute_value)| {
            let bytes = match attribute_value {
                types::AttributeValue::S(text) | types::AttributeValue::N(text) => {
                    text.as_bytes().to_vec()
                }
                types::AttributeValue::B(blob) => blob.as_ref().to_vec(),
                _ => Vec::new(),
            };
            (name.clone(), bytes)
        })
        .collect();
    identity.sort();
    identity
}

/// Handle to one table.
///
/// Writes are staged with [`Table::add_item`] and sent by [`Table::put`] or
/// [`Table::batch_put`]. Both flushes take the whole spool, try every entry, and
/// report failures as one [`AggregateError`]; failed entries stay available through
/// [`Table::error_items`] until the next flush.
///
/// ```rust,no_run
/// use dynamodb_store::{common::condition::ConditionBuilder, common::value::Item, table::Table};
///
/// # async fn example(table: &Table) -> Result<(), Box<dyn std::error::Error>> {
/// table.add_item(Item::from([
///     ("id".to_string(), 5.into()),
///     ("time".to_string(), 1.into()),
/// ]))?;
/// table.batch_put().await?;
///
/// let output = table
///     .query(ConditionBuilder::new().and_eq("id", 5).and_ge("time", 1))
///     .await?;
/// for row in output.result_set.to_rows() {
///     println!("{row:?}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Table {
    backend: Arc<dyn Backend>,
    prefix: String,
    schema: RwLock<TableSchema>,
    spool: Mutex<Vec<WriteEntry>>,
    error_items: Mutex<Vec<WriteEntry>>,
}

impl Table {
    /// A handle for the table described by `schema`, named `prefix + schema.name`.
    pub fn new(backend: Arc<dyn Backend>, prefix: impl Into<String>, schema: TableSchema) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
            schema: RwLock::new(schema),
            spool: Mutex::new(Vec::new()),
            error_items: Mutex::new(Vec::new()),
        }
    }

    /// Create the table on the store and return a handle for it.
    pub(crate) async fn create(
        backend: Arc<dyn Backend>,
        prefix: String,
        schema: TableSchema,
    ) -> Result<Self> {
        let table_name = schema.full_name(&prefix);
        let input = schema.to_create_request(&prefix)?;
        let output = backend
            .create_table(input)
            .await
            .map_err(Error::wire("create_table", table_name.clone()))?;
        let schema = match output.table_description {
            Some(description) => TableSchema::from_description(&description, &prefix)?,
            None => schema,
        };
        info!(
            service = SERVICE_NAME,
            table = %table_name,
            operation = "create_table",
            "created table"
        );
        Ok(Self::new(backend, prefix, schema))
    }

    /// Describe an existing table and return a handle for it.
    pub(crate) async fn open(backend: Arc<dyn Backend>, prefix: String, name: &str) -> Result<Self> {
        let table_name = format!("{prefix}{name}");
        let schema = describe(backend.as_ref(), &prefix, &table_name).await?;
        Ok(Self::new(backend, prefix, schema))
    }

    /// Table name without prefix.
    pub fn name(&self) -> String {
        self.schema.read().name.clone()
    }

    /// Table name including prefix.
    pub fn full_name(&self) -> String {
        self.schema.read().full_name(&self.prefix)
    }

    /// A snapshot of the cached schema.
    pub fn schema(&self) -> TableSchema {
        self.schema.read().clone()
    }

    fn keys(&self, hash_value: Value, range_value: Option<Value>) -> Result<(Keys, String)> {
        let schema = self.schema.read();
        let keys = schema.keys(hash_value, range_value)?;
        Ok((keys, schema.full_name(&self.prefix)))
    }

    fn multiple_read_args(
        &self,
        conditions: ConditionBuilder,
        select: Option<types::Select>,
    ) -> MultipleReadArgs {
        let schema = self.schema.read();
        MultipleReadArgs {
            conditions,
            attributes: schema.attributes.clone(),
            select,
            table_name: schema.full_name(&self.prefix),
        }
    }

    /// Point lookup by primary key. A missing item is `Ok(None)`.
    pub async fn get_one(
        &self,
        hash_value: impl Into<Value>,
        range_value: Option<Value>,
    ) -> Result<Option<Item>> {
        let (keys, table_name) = self.keys(hash_value.into(), range_value)?;
        let get_item = GetItem {
            keys,
            table_name,
            consistent_read: None,
            projection: Vec::new(),
        };
        get_item.send(self.backend.as_ref()).await
    }

    /// One page of items matching the key conditions and filters.
    pub async fn query(&self, conditions: ConditionBuilder) -> Result<ReadOutput> {
        let query = Query {
            multiple_read_args: self.multiple_read_args(conditions, None),
        };
        query.send(self.backend.as_ref()).await
    }

    /// Like [`Table::query`], but only counts; the result set is empty. Any projection
    /// on `conditions` is dropped.
    pub async fn count(&self, conditions: ConditionBuilder) -> Result<ReadOutput> {
        let conditions = conditions.set_projection(Vec::<String>::new());
        let query = Query {
            multiple_read_args: self.multiple_read_args(conditions, Some(types::Select::Count)),
        };
        query.send(self.backend.as_ref()).await
    }

    /// One page of the whole table. Key conditions act as filters.
    pub async fn scan(&self, conditions: ConditionBuilder) -> Result<ReadOutput> {
        let scan = Scan {
            multiple_read_args: self.multiple_read_args(conditions, None),
        };
        scan.send(self.backend.as_ref()).await
    }

    /// Delete one item by primary key.
    pub async fn delete(&self, hash_value: impl Into<Value>, range_value: Option<Value>) -> Result<()> {
        let (keys, table_name) = self.keys(hash_value.into(), range_value)?;
        let key: WireItem = keys.try_into()?;
        let delete_item = DeleteItem { key, table_name };
        delete_item.send(self.backend.as_ref()).await
    }

    /// Stage an item.
    pub fn add_item(&self, item: Item) -> Result<()> {
        self.add_item_with(item, IndexMap::new())
    }

    /// Stage an item that is only written when `expected` holds. Only [`Table::put`]
    /// can send such entries.
    pub fn add_item_with(&self, item: Item, expected: IndexMap<String, Precondition>) -> Result<()> {
        let item = value::encode_item(&item)?;
        self.add_entry(WriteEntry { item, expected });
        Ok(())
    }

    /// Stage a serializable record.
    pub fn add_record<T: Serialize>(&self, record: T) -> Result<()> {
        let item: WireItem = serde_dynamo::to_item(record).map_err(CodecError::from)?;
        self.add_entry(WriteEntry::new(item));
        Ok(())
    }

    /// Stage an already encoded entry.
    pub fn add_entry(&self, entry: WriteEntry) {
        self.spool.lock().push(entry);
    }

    /// Number of staged entries.
    pub fn spool_len(&self) -> usize {
        self.spool.lock().len()
    }

    /// Entries that failed during the last flush.
    pub fn error_items(&self) -> Vec<WriteEntry> {
        self.error_items.lock().clone()
    }

    fn take_spool(&self) -> Vec<WriteEntry> {
        mem::take(&mut *self.spool.lock())
    }

    /// Send every staged entry with its own put call.
    pub async fn put(&self) -> Result<()> {
        let entries = self.take_spool();
        let schema = self.schema();
        let table_name = schema.full_name(&self.prefix);
        debug!(
            service = SERVICE_NAME,
            table = %table_name,
            operation = "put",
            entries = entries.len(),
            "flushing spool"
        );
        let mut errors = AggregateError::new(SERVICE_NAME);
        let mut error_items = Vec::new();
        for entry in entries {
            if let Err(err) = entry.validate(&schema) {
                errors.add(err);
                error_items.push(entry);
                continue;
            }
            let put_item = PutItem {
                entry: entry.clone(),
                table_name: table_name.clone(),
            };
            if let Err(err) = put_item.send(self.backend.as_ref()).await {
                errors.add(err);
                error_items.push(entry);
            }
        }
        *self.error_items.lock() = error_items;
        errors.into_result()
    }

    /// Send the staged entries in batches of at most 25. A failed batch does not stop
    /// the following ones. An entry whose key is already in its batch is rejected.
    pub async fn batch_put(&self) -> Result<()> {
        let entries = self.take_spool();
        let schema = self.schema();
        let table_name = schema.full_name(&self.prefix);
        debug!(
            service = SERVICE_NAME,
            table = %table_name,
            operation = "batch_put",
            entries = entries.len(),
            "flushing spool"
        );
        let mut errors = AggregateError::new(SERVICE_NAME);
        let mut error_items = Vec::new();
        let mut requests = Vec::with_capacity(entries.len());
        let mut batch_keys = collections::HashSet::new();
        for entry in entries {
            if requests.len() % MAX_BATCH_WRITE_ITEMS == 0 {
                batch_keys.clear();
            }
            let validation = if entry.expected.is_empty() {
                schema.key_of(&entry.item).and_then(|key| {
                    if batch_keys.insert(key_identity(&key)) {
                        Ok(())
                    } else {
                        Err(ValidationError::DuplicateKey {
                            table: schema.name.clone(),
                        })
                    }
                })
            } else {
                Err(ValidationError::PreconditionInBatch {
                    table: schema.name.clone(),
                })
            };
            match validation {
                Ok(()) => requests.push(BatchWriteItemRequest::PutItem(entry.item)),
                Err(err) => {
                    errors.add(err);
                    error_items.push(entry);
                }
            }
        }
        for batch in BatchWriteItem::chunks(table_name.clone(), requests) {
            let sent = batch.requests.clone();
            match batch.send(self.backend.as_ref()).await {
                Ok(unprocessed) if unprocessed.is_empty() => {}
                Ok(unprocessed) => {
                    warn!(
                        service = SERVICE_NAME,
                        table = %table_name,
                        operation = "batch_write_item",
                        count = unprocessed.len(),
                        "items left unprocessed"
                    );
                    errors.add(Error::Unprocessed {
                        table: table_name.clone(),
                        count: unprocessed.len(),
                    });
                    error_items.extend(
                        unprocessed
                            .into_iter()
                            .map(|request| WriteEntry::new(request.into_item())),
                    );
                }
                Err(err) => {
                    errors.add(err);
                    error_items.extend(
                        sent.into_iter()
                            .map(|request| WriteEntry::new(request.into_item())),
                    );
                }
            }
        }
        *self.error_items.lock() = error_items;
        errors.into_result()
    }

    /// Delete every item, one call per item. Returns how many were deleted.
    ///
    /// A failed delete does not stop the others. A failed scan ends the walk; it is
    /// reported together with the delete failures collected before it.
    pub async fn force_delete_all(&self) -> Result<usize> {
        let schema = self.schema();
        let table_name = schema.full_name(&self.prefix);
        let key_names: Vec<_> = std::iter::once(&schema.hash_key)
            .chain(&schema.range_key)
            .map(|definition| definition.name.clone())
            .collect();
        let mut errors = AggregateError::new(SERVICE_NAME);
        let mut deleted = 0;
        let mut start_key = None;
        loop {
            let mut conditions = ConditionBuilder::new()
                .set_consistent_read(true)
                .set_projection(key_names.iter().cloned());
            if let Some(start_key) = start_key.take() {
                conditions = conditions.set_start_key(start_key);
            }
            let output = match self.scan(conditions).await {
                Ok(output) => output,
                Err(err) => {
                    errors.add(err);
                    break;
                }
            };
            for row in output.result_set.raw() {
                let key = match schema.key_of(row) {
                    Ok(key) => key,
                    Err(err) => {
                        errors.add(err);
                        continue;
                    }
                };
                let delete_item = DeleteItem {
                    key,
                    table_name: table_name.clone(),
                };
                match delete_item.send(self.backend.as_ref()).await {
                    Ok(()) => deleted += 1,
                    Err(err) => errors.add(err),
                }
            }
            match output.last_evaluated_key {
                Some(last_evaluated_key) => start_key = Some(last_evaluated_key),
                None => break,
            }
        }
        info!(
            service = SERVICE_NAME,
            table = %table_name,
            operation = "force_delete_all",
            deleted,
            failed = errors.len(),
            "deleted all items"
        );
        errors.into_result().map(|()| deleted)
    }

    /// Re-describe the table and replace the cached schema.
    pub async fn refresh(&self) -> Result<()> {
        let table_name = self.full_name();
        let schema = describe(self.backend.as_ref(), &self.prefix, &table_name).await?;
        *self.schema.write() = schema;
        Ok(())
    }

    /// Change the read capacity, keeping the write capacity.
    pub async fn update_read_throughput(&self, read: i64) -> Result<()> {
        let write = self.schema.read().throughput.write;
        self.update_throughput(read, write).await
    }

    /// Change the write capacity, keeping the read capacity.
    pub async fn update_write_throughput(&self, write: i64) -> Result<()> {
        let read = self.schema.read().throughput.read;
        self.update_throughput(read, write).await
    }

    /// Change both capacities, then refresh the cached schema. The table must be
    /// `ACTIVE`.
    pub async fn update_throughput(&self, read: i64, write: i64) -> Result<()> {
        let (table_name, status) = {
            let schema = self.schema.read();
            (schema.full_name(&self.prefix), schema.status.clone())
        };
        if status != Some(types::TableStatus::Active) {
            return Err(Error::NotActive {
                table: table_name,
                status: status.map_or_else(|| "UNKNOWN".to_string(), |status| status.as_str().to_string()),
            });
        }
        let input = operation::update_table::UpdateTableInput::builder()
            .table_name(&table_name)
            .provisioned_throughput(Throughput { read, write }.try_into()?)
            .build()
            .map_err(Error::build("update table request"))?;
        self.backend
            .update_table(input)
            .await
            .map_err(Error::wire("update_table", table_name))?;
        self.refresh().await
    }
}
