#![deny(missing_docs)]
#![deny(warnings)]

//! # DynamoDB Store
//!
//! A typed data-access layer for DynamoDB tables.
//!
//! ## Overview
//!
//! The crate sits between application code and the store:
//! - A closed [`Value`](common::value::Value) model and its codec to and from the wire format
//! - A condition builder that renders key-condition, filter and projection expressions
//!   with their placeholder maps
//! - A table schema model (keys, local and global indexes, throughput) that round-trips
//!   through the create and describe calls
//! - A per-table write spool that validates entries, batches them by 25 and reports every
//!   failure at once
//!
//! ## Quick Example
//!
//! ```no_run
//! use dynamodb_store::{
//!     common::{condition::ConditionBuilder, value::{Item, WireType}},
//!     config::Config,
//!     schema::TableSchema,
//!     service::Service,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = Service::connect(&Config::from_env()).await;
//!
//! let mut schema = TableSchema::with_hash_key("events", "id", WireType::Number);
//! schema.add_range_key("time", WireType::Number);
//! let events = service.create_table(schema).await?;
//!
//! for time in 1..=10 {
//!     events.add_item(Item::from([
//!         ("id".to_string(), 5.into()),
//!         ("time".to_string(), time.into()),
//!     ]))?;
//! }
//! // Sent as one batch write call
//! events.batch_put().await?;
//!
//! // Renders "#c_id = :c_id AND #c_time BETWEEN :c_time AND :cs_time"
//! let output = events
//!     .query(ConditionBuilder::new().and_eq("id", 5).and_between("time", 3, 9))
//!     .await?;
//! assert_eq!(output.count, 7);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@common`] - Values, keys, and the condition builder
//! - [`mod@schema`] - Table schema and its wire round trip
//! - [`mod@read`] - Read operations (GetItem, Query, Scan) and result sets
//! - [`mod@write`] - Write operations (PutItem, DeleteItem, BatchWriteItem)
//! - [`mod@table`] - Table handle with the write spool
//! - [`mod@service`] - Table registry
//! - [`mod@backend`] - The seam every wire call goes through

pub mod backend;

/// Common utilities for values, keys, and conditions.
pub mod common;

pub mod config;

pub mod error;

/// Read operations for retrieving data from DynamoDB tables.
///
/// This module provides operations for:
/// - Getting individual items by key
/// - Querying items with key conditions
/// - Scanning entire tables
/// - Decoding result rows
pub mod read;

/// Table schema: keys, indexes, throughput.
pub mod schema;

pub mod service;

pub mod table;

/// Write operations for modifying data in DynamoDB tables.
///
/// This module provides operations for:
/// - Putting new items or replacing existing ones, optionally guarded by preconditions
/// - Deleting items by key
/// - Batch writing multiple items
pub mod write;
