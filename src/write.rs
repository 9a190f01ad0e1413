//! Write operations for modifying data in DynamoDB tables.
//!
//! This module provides operations for writing data to DynamoDB:
//! - Putting new items or replacing existing ones
//! - Deleting items by primary key
//! - Batch writing multiple items

/// Batch write item operation for writing up to 25 items per call.
pub mod batch_write_item;

/// Staged write entries and their preconditions.
pub mod common;

/// Delete item operation for removing items from tables.
pub mod delete_item;

/// Put item operation for creating or replacing items.
pub mod put_item;
