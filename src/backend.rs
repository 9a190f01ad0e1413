//! The wire seam between the data layer and the store.
//!
//! Every call the layer makes goes through [`Backend`], which takes the SDK's request
//! types and returns its response types. [`aws_sdk_dynamodb::Client`] implements it by
//! forwarding to the fluent builders.

use crate::error::BackendError;

use async_trait::async_trait;
use aws_sdk_dynamodb::{Client, operation};
use std::fmt;

#[cfg(test)]
pub(crate) mod memory;

/// Remote table store.
#[async_trait]
pub trait Backend: fmt::Debug + Send + Sync {
    /// Create a table.
    async fn create_table(
        &self,
        input: operation::create_table::CreateTableInput,
    ) -> Result<operation::create_table::CreateTableOutput, BackendError>;

    /// Describe a table.
    async fn describe_table(
        &self,
        input: operation::describe_table::DescribeTableInput,
    ) -> Result<operation::describe_table::DescribeTableOutput, BackendError>;

    /// Change a table's provisioned throughput.
    async fn update_table(
        &self,
        input: operation::update_table::UpdateTableInput,
    ) -> Result<operation::update_table::UpdateTableOutput, BackendError>;

    /// Delete a table.
    async fn delete_table(
        &self,
        input: operation::delete_table::DeleteTableInput,
    ) -> Result<operation::delete_table::DeleteTableOutput, BackendError>;

    /// Read one item by primary key.
    async fn get_item(
        &self,
        input: operation::get_item::GetItemInput,
    ) -> Result<operation::get_item::GetItemOutput, BackendError>;

    /// Create or replace one item.
    async fn put_item(
        &self,
        input: operation::put_item::PutItemInput,
    ) -> Result<operation::put_item::PutItemOutput, BackendError>;

    /// Delete one item by primary key.
    async fn delete_item(
        &self,
        input: operation::delete_item::DeleteItemInput,
    ) -> Result<operation::delete_item::DeleteItemOutput, BackendError>;

    /// Read one page of items sharing a hash key.
    async fn query(
        &self,
        input: operation::query::QueryInput,
    ) -> Result<operation::query::QueryOutput, BackendError>;

    /// Read one page of the whole table.
    async fn scan(
        &self,
        input: operation::scan::ScanInput,
    ) -> Result<operation::scan::ScanOutput, BackendError>;

    /// Write up to 25 put or delete requests.
    async fn batch_write_item(
        &self,
        input: operation::batch_write_item::BatchWriteItemInput,
    ) -> Result<operation::batch_write_item::BatchWriteItemOutput, BackendError>;
}

#[async_trait]
impl Backend for Client {
    async fn create_table(
        &self,
        input: operation::create_table::CreateTableInput,
    ) -> Result<operation::create_table::CreateTableOutput, BackendError> {
        let output = Client::create_table(self)
            .set_table_name(input.table_name)
            .set_attribute_definitions(input.attribute_definitions)
            .set_key_schema(input.key_schema)
            .set_local_secondary_indexes(input.local_secondary_indexes)
            .set_global_secondary_indexes(input.global_secondary_indexes)
            .set_billing_mode(input.billing_mode)
            .set_provisioned_throughput(input.provisioned_throughput)
            .set_stream_specification(input.stream_specification)
            .set_tags(input.tags)
            .send()
            .await?;
        Ok(output)
    }

    async fn describe_table(
        &self,
        input: operation::describe_table::DescribeTableInput,
    ) -> Result<operation::describe_table::DescribeTableOutput, BackendError> {
        let output = Client::describe_table(self)
            .set_table_name(input.table_name)
            .send()
            .await?;
        Ok(output)
    }

    async fn update_table(
        &self,
        input: operation::update_table::UpdateTableInput,
    ) -> Result<operation::update_table::UpdateTableOutput, BackendError> {
        let output = Client::update_table(self)
            .set_table_name(input.table_name)
            .set_provisioned_throughput(input.provisioned_throughput)
            .set_global_secondary_index_updates(input.global_secondary_index_updates)
            .send()
            .await?;
        Ok(output)
    }

    async fn delete_table(
        &self,
        input: operation::delete_table::DeleteTableInput,
    ) -> Result<operation::delete_table::DeleteTableOutput, BackendError> {
        let output = Client::delete_table(self)
            .set_table_name(input.table_name)
            .send()
            .await?;
        Ok(output)
    }

    async fn get_item(
        &self,
        input: operation::get_item::GetItemInput,
    ) -> Result<operation::get_item::GetItemOutput, BackendError> {
        let output = Client::get_item(self)
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_consistent_read(input.consistent_read)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .send()
            .await?;
        Ok(output)
    }

    async fn put_item(
        &self,
        input: operation::put_item::PutItemInput,
    ) -> Result<operation::put_item::PutItemOutput, BackendError> {
        let output = Client::put_item(self)
            .set_table_name(input.table_name)
            .set_item(input.item)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_return_values(input.return_values)
            .send()
            .await?;
        Ok(output)
    }

    async fn delete_item(
        &self,
        input: operation::delete_item::DeleteItemInput,
    ) -> Result<operation::delete_item::DeleteItemOutput, BackendError> {
        let output = Client::delete_item(self)
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_return_values(input.return_values)
            .send()
            .await?;
        Ok(output)
    }

    async fn query(
        &self,
        input: operation::query::QueryInput,
    ) -> Result<operation::query::QueryOutput, BackendError> {
        let output = Client::query(self)
            .set_table_name(input.table_name)
            .set_index_name(input.index_name)
            .set_key_condition_expression(input.key_condition_expression)
            .set_filter_expression(input.filter_expression)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_select(input.select)
            .set_limit(input.limit)
            .set_consistent_read(input.consistent_read)
            .set_scan_index_forward(input.scan_index_forward)
            .set_exclusive_start_key(input.exclusive_start_key)
            .send()
            .await?;
        Ok(output)
    }

    async fn scan(
        &self,
        input: operation::scan::ScanInput,
    ) -> Result<operation::scan::ScanOutput, BackendError> {
        let output = Client::scan(self)
            .set_table_name(input.table_name)
            .set_index_name(input.index_name)
            .set_filter_expression(input.filter_expression)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_select(input.select)
            .set_limit(input.limit)
            .set_consistent_read(input.consistent_read)
            .set_exclusive_start_key(input.exclusive_start_key)
            .set_segment(input.segment)
            .set_total_segments(input.total_segments)
            .send()
            .await?;
        Ok(output)
    }

    async fn batch_write_item(
        &self,
        input: operation::batch_write_item::BatchWriteItemInput,
    ) -> Result<operation::batch_write_item::BatchWriteItemOutput, BackendError> {
        let output = Client::batch_write_item(self)
            .set_request_items(input.request_items)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .set_return_item_collection_metrics(input.return_item_collection_metrics)
            .send()
            .await?;
        Ok(output)
    }
}
