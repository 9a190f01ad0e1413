//! Entry point: a registry of [`Table`] handles sharing one backend and one table prefix.

use crate::{
    backend::Backend,
    config::Config,
    error::{Error, Result, SERVICE_NAME},
    schema::TableSchema,
    table::Table,
};

use aws_sdk_dynamodb::operation;
use parking_lot::RwLock;
use std::{collections, sync::Arc};
use tracing::info;

/// Table registry.
///
/// Handles are cached by full table name; the first lookup of a table describes it,
/// later lookups reuse the handle.
///
/// ```rust,no_run
/// use dynamodb_store::{common::value::WireType, config::Config, schema::TableSchema, service::Service};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let service = Service::connect(&Config::from_env()).await;
/// let mut schema = TableSchema::with_hash_key("events", "id", WireType::Number);
/// schema.add_range_key("time", WireType::Number);
/// service.create_table(schema).await?;
///
/// let events = service.table("events").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Service {
    backend: Arc<dyn Backend>,
    prefix: String,
    tables: RwLock<collections::HashMap<String, Arc<Table>>>,
}

impl Service {
    /// A registry over `backend`, qualifying table names with `prefix`.
    pub fn new(backend: Arc<dyn Backend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
            tables: RwLock::new(collections::HashMap::new()),
        }
    }

    /// A registry over an SDK client built from `config`.
    pub async fn connect(config: &Config) -> Self {
        let client = config.load().await;
        Self::new(Arc::new(client), config.table_prefix.clone())
    }

    /// Prefix prepended to every table name.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn full_name(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }

    fn cache(&self, table: Table) -> Arc<Table> {
        let mut tables = self.tables.write();
        tables
            .entry(table.full_name())
            .or_insert_with(|| Arc::new(table))
            .clone()
    }

    /// The handle for an existing table. Tables are never created implicitly.
    pub async fn table(&self, name: &str) -> Result<Arc<Table>> {
        let cached = self.tables.read().get(&self.full_name(name)).cloned();
        if let Some(table) = cached {
            return Ok(table);
        }
        let table = Table::open(self.backend.clone(), self.prefix.clone(), name).await?;
        Ok(self.cache(table))
    }

    /// Create a table and cache its handle.
    pub async fn create_table(&self, schema: TableSchema) -> Result<Arc<Table>> {
        let table = Table::create(self.backend.clone(), self.prefix.clone(), schema).await?;
        Ok(self.cache(table))
    }

    /// Delete a table and drop its handle.
    pub async fn delete_table(&self, name: &str) -> Result<()> {
        let table_name = self.full_name(name);
        let input = operation::delete_table::DeleteTableInput::builder()
            .table_name(&table_name)
            .build()
            .map_err(Error::build("delete table request"))?;
        self.backend
            .delete_table(input)
            .await
            .map_err(Error::wire("delete_table", table_name.clone()))?;
        self.tables.write().remove(&table_name);
        info!(
            service = SERVICE_NAME,
            table = %table_name,
            operation = "delete_table",
            "deleted table"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::memory::MemoryBackend,
        common::value::{Item, WireType},
        error::SchemaError,
        schema::AttributeDefinition,
    };

    fn schema() -> TableSchema {
        let mut schema = TableSchema::with_hash_key("events", "id", WireType::Number);
        schema.add_range_key("time", WireType::Number);
        schema
            .add_local_index("by_score", AttributeDefinition::new("score", WireType::Number))
            .unwrap();
        schema
    }

    #[tokio::test]
    async fn test_table_is_described_once() {
        let backend = Arc::new(MemoryBackend::default());
        Service::new(backend.clone(), "test_")
            .create_table(schema())
            .await
            .unwrap();

        let service = Service::new(backend.clone(), "test_");
        let first = service.table("events").await.unwrap();
        let second = service.table("events").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(backend.describe_calls(), 1);

        let described = first.schema();
        assert_eq!(described.name, "events");
        assert_eq!(described.attributes, schema().attributes);
        assert_eq!(described.local_indexes.len(), 1);
    }

    #[tokio::test]
    async fn test_created_table_is_cached() {
        let backend = Arc::new(MemoryBackend::default());
        let service = Service::new(backend.clone(), "test_");
        let created = service.create_table(schema()).await.unwrap();
        let found = service.table("events").await.unwrap();
        assert!(Arc::ptr_eq(&created, &found));
        assert_eq!(backend.describe_calls(), 0);
        assert_eq!(created.full_name(), "test_events");
    }

    #[tokio::test]
    async fn test_missing_table() {
        let service = Service::new(Arc::new(MemoryBackend::default()), "test_");
        let err = service.table("missing").await.unwrap_err();
        assert!(matches!(err, Error::Wire { operation: "describe_table", table, .. } if table == "test_missing"));
    }

    #[tokio::test]
    async fn test_create_existing_table() {
        let service = Service::new(Arc::new(MemoryBackend::default()), "test_");
        service.create_table(schema()).await.unwrap();
        let err = service.create_table(schema()).await.unwrap_err();
        assert!(matches!(err, Error::Wire { operation: "create_table", .. }));
    }

    #[tokio::test]
    async fn test_rejected_index_leaves_schema_unchanged() {
        let backend = Arc::new(MemoryBackend::default());
        let service = Service::new(backend.clone(), "test_");
        let mut schema = TableSchema::with_hash_key("events", "id", WireType::Number);
        let err = schema.add_global_index("broken", &[]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::IndexKeyCount {
                index: "broken".to_string(),
                count: 0,
            }
        );
        service.create_table(schema).await.unwrap();
        assert!(service.table("events").await.unwrap().schema().global_indexes.is_empty());
    }

    #[tokio::test]
    async fn test_delete_table() {
        let backend = Arc::new(MemoryBackend::default());
        let service = Service::new(backend.clone(), "test_");
        let table = service.create_table(schema()).await.unwrap();
        table
            .add_item(Item::from([
                ("id".to_string(), 1.into()),
                ("time".to_string(), 1.into()),
            ]))
            .unwrap();
        table.batch_put().await.unwrap();

        service.delete_table("events").await.unwrap();
        assert!(service.table("events").await.is_err());
        assert!(backend.items("test_events").is_empty());

        let err = service.delete_table("events").await.unwrap_err();
        assert!(matches!(err, Error::Wire { operation: "delete_table", .. }));
    }
}
