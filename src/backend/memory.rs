//! In-memory [`Backend`] used by the unit tests.
//!
//! It evaluates the subset of the expression language this crate renders: comparisons,
//! `BETWEEN`, `attribute_exists`, `attribute_not_exists`, `AND`, `OR` and parentheses.

use super::Backend;
use crate::{common::value::WireItem, error::BackendError};

use async_trait::async_trait;
use aws_sdk_dynamodb::{operation, types};
use parking_lot::Mutex;
use std::{cmp, collections};

/// Describe a table as the store would right after creating it.
pub(crate) fn describe_created(
    input: &operation::create_table::CreateTableInput,
) -> types::TableDescription {
    let throughput = |throughput: Option<&types::ProvisionedThroughput>| {
        throughput.map(|throughput| {
            types::ProvisionedThroughputDescription::builder()
                .read_capacity_units(throughput.read_capacity_units())
                .write_capacity_units(throughput.write_capacity_units())
                .number_of_decreases_today(0)
                .build()
        })
    };
    let local_indexes: Vec<_> = input
        .local_secondary_indexes()
        .iter()
        .map(|index| {
            types::LocalSecondaryIndexDescription::builder()
                .index_name(index.index_name())
                .set_key_schema(Some(index.key_schema().to_vec()))
                .set_projection(index.projection().cloned())
                .build()
        })
        .collect();
    let global_indexes: Vec<_> = input
        .global_secondary_indexes()
        .iter()
        .map(|index| {
            types::GlobalSecondaryIndexDescription::builder()
                .index_name(index.index_name())
                .set_key_schema(Some(index.key_schema().to_vec()))
                .set_projection(index.projection().cloned())
                .set_provisioned_throughput(throughput(index.provisioned_throughput()))
                .index_status(types::IndexStatus::Active)
                .build()
        })
        .collect();
    types::TableDescription::builder()
        .set_table_name(input.table_name().map(str::to_string))
        .set_attribute_definitions(Some(input.attribute_definitions().to_vec()))
        .set_key_schema(Some(input.key_schema().to_vec()))
        .set_provisioned_throughput(throughput(input.provisioned_throughput()))
        .set_local_secondary_indexes((!local_indexes.is_empty()).then_some(local_indexes))
        .set_global_secondary_indexes((!global_indexes.is_empty()).then_some(global_indexes))
        .table_status(types::TableStatus::Active)
        .item_count(0)
        .build()
}

fn key_names(elements: &[types::KeySchemaElement]) -> (String, Option<String>) {
    let mut hash_key = String::new();
    let mut range_key = None;
    for element in elements {
        match element.key_type() {
            types::KeyType::Hash => hash_key = element.attribute_name().to_string(),
            _ => range_key = Some(element.attribute_name().to_string()),
        }
    }
    (hash_key, range_key)
}

fn compare(left: &types::AttributeValue, right: &types::AttributeValue) -> Option<cmp::Ordering> {
    match (left, right) {
        (types::AttributeValue::N(left), types::AttributeValue::N(right)) => {
            let left: f64 = left.parse().ok()?;
            let right: f64 = right.parse().ok()?;
            left.partial_cmp(&right)
        }
        (types::AttributeValue::S(left), types::AttributeValue::S(right)) => Some(left.cmp(right)),
        (types::AttributeValue::B(left), types::AttributeValue::B(right)) => {
            Some(left.as_ref().cmp(right.as_ref()))
        }
        (left, right) if left == right => Some(cmp::Ordering::Equal),
        _ => None,
    }
}

fn compare_optional(
    left: Option<&types::AttributeValue>,
    right: Option<&types::AttributeValue>,
) -> cmp::Ordering {
    match (left, right) {
        (Some(left), Some(right)) => compare(left, right).unwrap_or(cmp::Ordering::Equal),
        (None, Some(_)) => cmp::Ordering::Less,
        (Some(_), None) => cmp::Ordering::Greater,
        (None, None) => cmp::Ordering::Equal,
    }
}

/// Placeholder maps of one request.
struct Placeholders<'a> {
    names: Option<&'a collections::HashMap<String, String>>,
    values: Option<&'a collections::HashMap<String, types::AttributeValue>>,
}

impl Placeholders<'_> {
    fn name<'t>(&'t self, token: &'t str) -> Result<&'t str, BackendError> {
        if !token.starts_with('#') {
            return Ok(token);
        }
        self.names
            .and_then(|names| names.get(token))
            .map(String::as_str)
            .ok_or_else(|| BackendError::new(format!("unbound attribute name {token}")))
    }

    fn value(&self, token: &str) -> Result<&types::AttributeValue, BackendError> {
        self.values
            .and_then(|values| values.get(token))
            .ok_or_else(|| BackendError::new(format!("unbound attribute value {token}")))
    }
}

/// Recursive-descent evaluator over whitespace-separated tokens.
struct Evaluator<'a> {
    tokens: Vec<&'a str>,
    position: usize,
    placeholders: &'a Placeholders<'a>,
    item: &'a WireItem,
}

impl<'a> Evaluator<'a> {
    fn next(&mut self) -> Result<&'a str, BackendError> {
        let token = self
            .tokens
            .get(self.position)
            .copied()
            .ok_or_else(|| BackendError::new("unexpected end of expression"))?;
        self.position += 1;
        Ok(token)
    }

    fn peek(&self) -> Option<&'a str> {
        self.tokens.get(self.position).copied()
    }

    fn expect(&mut self, expected: &str) -> Result<(), BackendError> {
        let token = self.next()?;
        if token == expected {
            Ok(())
        } else {
            Err(BackendError::new(format!("expected {expected}, got {token}")))
        }
    }

    fn expression(&mut self) -> Result<bool, BackendError> {
        let mut result = self.conjunction()?;
        while self.peek() == Some("OR") {
            self.position += 1;
            let right = self.conjunction()?;
            result = result || right;
        }
        Ok(result)
    }

    fn conjunction(&mut self) -> Result<bool, BackendError> {
        let mut result = self.predicate()?;
        while self.peek() == Some("AND") {
            self.position += 1;
            let right = self.predicate()?;
            result = result && right;
        }
        Ok(result)
    }

    fn predicate(&mut self) -> Result<bool, BackendError> {
        let placeholders = self.placeholders;
        let item = self.item;
        let token = self.next()?;
        match token {
            "(" => {
                let result = self.expression()?;
                self.expect(")")?;
                Ok(result)
            }
            "attribute_exists" | "attribute_not_exists" => {
                self.expect("(")?;
                let name = placeholders.name(self.next()?)?;
                self.expect(")")?;
                let exists = item.contains_key(name);
                Ok(exists == (token == "attribute_exists"))
            }
            name => {
                let attribute = item.get(placeholders.name(name)?);
                let operator = self.next()?;
                let operand = placeholders.value(self.next()?)?;
                let ordering = attribute.and_then(|attribute| compare(attribute, operand));
                let result = match operator {
                    "=" => ordering == Some(cmp::Ordering::Equal),
                    "<>" => ordering != Some(cmp::Ordering::Equal),
                    "<" => ordering == Some(cmp::Ordering::Less),
                    "<=" => matches!(ordering, Some(cmp::Ordering::Less | cmp::Ordering::Equal)),
                    ">" => ordering == Some(cmp::Ordering::Greater),
                    ">=" => matches!(ordering, Some(cmp::Ordering::Greater | cmp::Ordering::Equal)),
                    "BETWEEN" => {
                        self.expect("AND")?;
                        let upper = placeholders.value(self.next()?)?;
                        let upper = attribute.and_then(|attribute| compare(attribute, upper));
                        matches!(ordering, Some(cmp::Ordering::Greater | cmp::Ordering::Equal))
                            && matches!(upper, Some(cmp::Ordering::Less | cmp::Ordering::Equal))
                    }
                    other => {
                        return Err(BackendError::new(format!("unsupported operator {other}")));
                    }
                };
                Ok(result)
            }
        }
    }
}

fn evaluate(
    expression: Option<&str>,
    placeholders: &Placeholders<'_>,
    item: &WireItem,
) -> Result<bool, BackendError> {
    let Some(expression) = expression else {
        return Ok(true);
    };
    let spaced = expression.replace('(', " ( ").replace(')', " ) ");
    let mut evaluator = Evaluator {
        tokens: spaced.split_whitespace().collect(),
        position: 0,
        placeholders,
        item,
    };
    let result = evaluator.expression()?;
    match evaluator.peek() {
        None => Ok(result),
        Some(token) => Err(BackendError::new(format!("trailing token {token}"))),
    }
}

#[derive(Debug)]
struct MemoryTable {
    description: types::TableDescription,
    hash_key: String,
    range_key: Option<String>,
    items: Vec<WireItem>,
}

impl MemoryTable {
    fn key_of(&self, item: &WireItem) -> WireItem {
        std::iter::once(&self.hash_key)
            .chain(&self.range_key)
            .filter_map(|name| Some((name.clone(), item.get(name)?.clone())))
            .collect()
    }

    fn position(&self, key: &WireItem) -> Option<usize> {
        self.items.iter().position(|item| self.key_of(item) == *key)
    }

    fn index_keys(&self, index_name: Option<&str>) -> (String, Option<String>) {
        let Some(index_name) = index_name else {
            return (self.hash_key.clone(), self.range_key.clone());
        };
        let local = self
            .description
            .local_secondary_indexes()
            .iter()
            .find(|index| index.index_name() == Some(index_name))
            .map(|index| index.key_schema());
        let global = self
            .description
            .global_secondary_indexes()
            .iter()
            .find(|index| index.index_name() == Some(index_name))
            .map(|index| index.key_schema());
        match local.or(global) {
            Some(key_schema) => key_names(key_schema),
            None => (self.hash_key.clone(), self.range_key.clone()),
        }
    }

    /// Items in key order: hash key first, then range key.
    fn sorted(&self, hash_key: &str, range_key: Option<&str>, descending: bool) -> Vec<&WireItem> {
        let mut items: Vec<_> = self.items.iter().collect();
        items.sort_by(|left, right| order(left, right, hash_key, range_key, descending));
        items
    }
}

fn order(
    left: &WireItem,
    right: &WireItem,
    hash_key: &str,
    range_key: Option<&str>,
    descending: bool,
) -> cmp::Ordering {
    let ordering = compare_optional(left.get(hash_key), right.get(hash_key)).then_with(|| {
        range_key
            .map(|range_key| compare_optional(left.get(range_key), right.get(range_key)))
            .unwrap_or(cmp::Ordering::Equal)
    });
    if descending { ordering.reverse() } else { ordering }
}

/// A page read from a [`MemoryTable`].
struct Page {
    items: Vec<WireItem>,
    scanned_count: i32,
    last_evaluated_key: Option<WireItem>,
}

#[allow(clippy::too_many_arguments)]
fn read_page(
    table: &MemoryTable,
    index_name: Option<&str>,
    key_condition_expression: Option<&str>,
    filter_expression: Option<&str>,
    placeholders: &Placeholders<'_>,
    limit: Option<i32>,
    page_size: Option<usize>,
    descending: bool,
    exclusive_start_key: Option<&WireItem>,
) -> Result<Page, BackendError> {
    let (hash_key, range_key) = table.index_keys(index_name);
    let mut candidates = Vec::new();
    for item in table.sorted(&hash_key, range_key.as_deref(), descending) {
        if item.contains_key(&hash_key)
            && evaluate(key_condition_expression, placeholders, item)?
        {
            candidates.push(item);
        }
    }
    if let Some(start_key) = exclusive_start_key {
        // The start item may be gone already; resume after its key.
        let start = candidates
            .iter()
            .position(|item| table.key_of(item) == *start_key)
            .map(|position| position + 1)
            .or_else(|| {
                candidates.iter().position(|item| {
                    order(item, start_key, &hash_key, range_key.as_deref(), descending)
                        == cmp::Ordering::Greater
                })
            })
            .unwrap_or(candidates.len());
        candidates = candidates.split_off(start);
    }
    let limit = limit
        .map_or(candidates.len(), |limit| limit.max(0) as usize)
        .min(page_size.unwrap_or(usize::MAX));
    let truncated = candidates.len() > limit;
    candidates.truncate(limit);
    let last_evaluated_key = truncated
        .then(|| candidates.last().map(|item| table.key_of(item)))
        .flatten();
    let mut items = Vec::new();
    for item in &candidates {
        if evaluate(filter_expression, placeholders, item)? {
            items.push((*item).clone());
        }
    }
    Ok(Page {
        items,
        scanned_count: candidates.len() as i32,
        last_evaluated_key,
    })
}

fn project(item: WireItem, projection_expression: Option<&str>, placeholders: &Placeholders<'_>) -> WireItem {
    let Some(projection_expression) = projection_expression else {
        return item;
    };
    let names: Vec<_> = projection_expression
        .split(',')
        .filter_map(|token| placeholders.name(token.trim()).ok())
        .collect();
    item.into_iter()
        .filter(|(name, _)| names.contains(&name.as_str()))
        .collect()
}

#[derive(Debug, Default)]
struct State {
    tables: collections::HashMap<String, MemoryTable>,
    batch_sizes: Vec<usize>,
    failing_batches: collections::HashSet<usize>,
    unprocessed_per_batch: usize,
    describe_calls: usize,
    failing_deletes: Vec<WireItem>,
    failing_scans: collections::HashSet<usize>,
    scan_calls: usize,
    page_size: Option<usize>,
}

impl State {
    fn table(&mut self, table_name: Option<&str>) -> Result<&mut MemoryTable, BackendError> {
        let table_name = table_name.unwrap_or_default();
        self.tables.get_mut(table_name).ok_or_else(|| {
            BackendError::new(format!(
                "ResourceNotFoundException: Requested resource not found: Table: {table_name} not found"
            ))
        })
    }
}

/// Store that keeps every table in process memory.
#[derive(Debug, Default)]
pub(crate) struct MemoryBackend {
    state: Mutex<State>,
}

impl MemoryBackend {
    /// Fail the batch write call with this zero-based index.
    pub(crate) fn fail_batch(&self, call: usize) {
        self.state.lock().failing_batches.insert(call);
    }

    /// Return the last `count` requests of every batch as unprocessed.
    pub(crate) fn leave_unprocessed(&self, count: usize) {
        self.state.lock().unprocessed_per_batch = count;
    }

    /// Number of requests in each batch write call, in call order.
    pub(crate) fn batch_sizes(&self) -> Vec<usize> {
        self.state.lock().batch_sizes.clone()
    }

    /// Fail every delete of the item with this key.
    pub(crate) fn fail_delete(&self, key: WireItem) {
        self.state.lock().failing_deletes.push(key);
    }

    /// Fail the scan call with this zero-based index.
    pub(crate) fn fail_scan(&self, call: usize) {
        self.state.lock().failing_scans.insert(call);
    }

    /// Number of scan calls received.
    pub(crate) fn scan_calls(&self) -> usize {
        self.state.lock().scan_calls
    }

    /// Return at most `size` items per query or scan page, whatever the request limit.
    pub(crate) fn set_page_size(&self, size: usize) {
        self.state.lock().page_size = Some(size);
    }

    /// Number of describe calls served.
    pub(crate) fn describe_calls(&self) -> usize {
        self.state.lock().describe_calls
    }

    /// Force the status of a stored table.
    pub(crate) fn set_status(&self, table_name: &str, status: types::TableStatus) {
        if let Some(table) = self.state.lock().tables.get_mut(table_name) {
            table.description.table_status = Some(status);
        }
    }

    /// Every item of a stored table.
    pub(crate) fn items(&self, table_name: &str) -> Vec<WireItem> {
        self.state
            .lock()
            .tables
            .get(table_name)
            .map(|table| table.items.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn create_table(
        &self,
        input: operation::create_table::CreateTableInput,
    ) -> Result<operation::create_table::CreateTableOutput, BackendError> {
        let description = describe_created(&input);
        let table_name = input.table_name().unwrap_or_default().to_string();
        let mut state = self.state.lock();
        if state.tables.contains_key(&table_name) {
            return Err(BackendError::new(format!(
                "ResourceInUseException: Table already exists: {table_name}"
            )));
        }
        let (hash_key, range_key) = key_names(input.key_schema());
        let table = MemoryTable {
            description: description.clone(),
            hash_key,
            range_key,
            items: Vec::new(),
        };
        state.tables.insert(table_name, table);
        let output = operation::create_table::CreateTableOutput::builder()
            .table_description(description)
            .build();
        Ok(output)
    }

    async fn describe_table(
        &self,
        input: operation::describe_table::DescribeTableInput,
    ) -> Result<operation::describe_table::DescribeTableOutput, BackendError> {
        let mut state = self.state.lock();
        state.describe_calls += 1;
        let table = state.table(input.table_name())?;
        let mut description = table.description.clone();
        description.item_count = Some(table.items.len() as i64);
        let output = operation::describe_table::DescribeTableOutput::builder()
            .table(description)
            .build();
        Ok(output)
    }

    async fn update_table(
        &self,
        input: operation::update_table::UpdateTableInput,
    ) -> Result<operation::update_table::UpdateTableOutput, BackendError> {
        let mut state = self.state.lock();
        let table = state.table(input.table_name())?;
        if let Some(requested) = input.provisioned_throughput() {
            let current = table.description.provisioned_throughput();
            let decreased = current.is_some_and(|current| {
                current.read_capacity_units().unwrap_or_default() > requested.read_capacity_units()
                    || current.write_capacity_units().unwrap_or_default()
                        > requested.write_capacity_units()
            });
            let decreases = current
                .and_then(|current| current.number_of_decreases_today())
                .unwrap_or_default()
                + i64::from(decreased);
            let throughput = types::ProvisionedThroughputDescription::builder()
                .read_capacity_units(requested.read_capacity_units())
                .write_capacity_units(requested.write_capacity_units())
                .number_of_decreases_today(decreases)
                .build();
            table.description.provisioned_throughput = Some(throughput);
        }
        let output = operation::update_table::UpdateTableOutput::builder()
            .table_description(table.description.clone())
            .build();
        Ok(output)
    }

    async fn delete_table(
        &self,
        input: operation::delete_table::DeleteTableInput,
    ) -> Result<operation::delete_table::DeleteTableOutput, BackendError> {
        let mut state = self.state.lock();
        state.table(input.table_name())?;
        let table = state.tables.remove(input.table_name().unwrap_or_default());
        let output = operation::delete_table::DeleteTableOutput::builder()
            .set_table_description(table.map(|table| table.description))
            .build();
        Ok(output)
    }

    async fn get_item(
        &self,
        input: operation::get_item::GetItemInput,
    ) -> Result<operation::get_item::GetItemOutput, BackendError> {
        let mut state = self.state.lock();
        let table = state.table(input.table_name())?;
        let key = input.key().cloned().unwrap_or_default();
        let placeholders = Placeholders {
            names: input.expression_attribute_names(),
            values: None,
        };
        let item = table
            .position(&key)
            .map(|position| table.items[position].clone())
            .map(|item| project(item, input.projection_expression(), &placeholders));
        let output = operation::get_item::GetItemOutput::builder()
            .set_item(item)
            .build();
        Ok(output)
    }

    async fn put_item(
        &self,
        input: operation::put_item::PutItemInput,
    ) -> Result<operation::put_item::PutItemOutput, BackendError> {
        let mut state = self.state.lock();
        let table = state.table(input.table_name())?;
        let item = input.item().cloned().unwrap_or_default();
        let key = table.key_of(&item);
        if key.len() != 1 + usize::from(table.range_key.is_some()) {
            return Err(BackendError::new(
                "ValidationException: One of the required keys was not given a value",
            ));
        }
        let position = table.position(&key);
        let placeholders = Placeholders {
            names: input.expression_attribute_names(),
            values: input.expression_attribute_values(),
        };
        let empty = WireItem::new();
        let existing = position.map_or(&empty, |position| &table.items[position]);
        if !evaluate(input.condition_expression(), &placeholders, existing)? {
            return Err(BackendError::new(
                "ConditionalCheckFailedException: The conditional request failed",
            ));
        }
        match position {
            Some(position) => table.items[position] = item,
            None => table.items.push(item),
        }
        Ok(operation::put_item::PutItemOutput::builder().build())
    }

    async fn delete_item(
        &self,
        input: operation::delete_item::DeleteItemInput,
    ) -> Result<operation::delete_item::DeleteItemOutput, BackendError> {
        let mut state = self.state.lock();
        let key = input.key().cloned().unwrap_or_default();
        if state.failing_deletes.contains(&key) {
            return Err(BackendError::new(
                "ProvisionedThroughputExceededException: delete rejected",
            ));
        }
        let table = state.table(input.table_name())?;
        let attributes = table
            .position(&key)
            .map(|position| table.items.remove(position));
        let output = operation::delete_item::DeleteItemOutput::builder()
            .set_attributes(attributes)
            .build();
        Ok(output)
    }

    async fn query(
        &self,
        input: operation::query::QueryInput,
    ) -> Result<operation::query::QueryOutput, BackendError> {
        let mut state = self.state.lock();
        let page_size = state.page_size;
        let table = state.table(input.table_name())?;
        if input.key_condition_expression().is_none() {
            return Err(BackendError::new(
                "ValidationException: Query requires a KeyConditionExpression",
            ));
        }
        if input.select() == Some(&types::Select::Count) && input.projection_expression().is_some() {
            return Err(BackendError::new(
                "ValidationException: Cannot specify the AttributesToGet when choosing to get only the Count",
            ));
        }
        let placeholders = Placeholders {
            names: input.expression_attribute_names(),
            values: input.expression_attribute_values(),
        };
        let page = read_page(
            table,
            input.index_name(),
            input.key_condition_expression(),
            input.filter_expression(),
            &placeholders,
            input.limit(),
            page_size,
            input.scan_index_forward() == Some(false),
            input.exclusive_start_key(),
        )?;
        let count = page.items.len() as i32;
        let items = (input.select() != Some(&types::Select::Count)).then(|| {
            page.items
                .into_iter()
                .map(|item| project(item, input.projection_expression(), &placeholders))
                .collect()
        });
        let output = operation::query::QueryOutput::builder()
            .set_items(items)
            .count(count)
            .scanned_count(page.scanned_count)
            .set_last_evaluated_key(page.last_evaluated_key)
            .build();
        Ok(output)
    }

    async fn scan(
        &self,
        input: operation::scan::ScanInput,
    ) -> Result<operation::scan::ScanOutput, BackendError> {
        let mut state = self.state.lock();
        let call = state.scan_calls;
        state.scan_calls += 1;
        if state.failing_scans.contains(&call) {
            return Err(BackendError::new(
                "ProvisionedThroughputExceededException: scan rejected",
            ));
        }
        let page_size = state.page_size;
        let table = state.table(input.table_name())?;
        let placeholders = Placeholders {
            names: input.expression_attribute_names(),
            values: input.expression_attribute_values(),
        };
        let page = read_page(
            table,
            input.index_name(),
            None,
            input.filter_expression(),
            &placeholders,
            input.limit(),
            page_size,
            false,
            input.exclusive_start_key(),
        )?;
        let count = page.items.len() as i32;
        let items = (input.select() != Some(&types::Select::Count)).then(|| {
            page.items
                .into_iter()
                .map(|item| project(item, input.projection_expression(), &placeholders))
                .collect()
        });
        let output = operation::scan::ScanOutput::builder()
            .set_items(items)
            .count(count)
            .scanned_count(page.scanned_count)
            .set_last_evaluated_key(page.last_evaluated_key)
            .build();
        Ok(output)
    }

    async fn batch_write_item(
        &self,
        input: operation::batch_write_item::BatchWriteItemInput,
    ) -> Result<operation::batch_write_item::BatchWriteItemOutput, BackendError> {
        let mut state = self.state.lock();
        let call = state.batch_sizes.len();
        let size = input
            .request_items()
            .map(|request_items| request_items.values().map(Vec::len).sum())
            .unwrap_or_default();
        state.batch_sizes.push(size);
        if size > 25 {
            return Err(BackendError::new(
                "ValidationException: Too many items requested for the BatchWriteItem call",
            ));
        }
        if state.failing_batches.contains(&call) {
            return Err(BackendError::new(
                "ProvisionedThroughputExceededException: batch rejected",
            ));
        }
        let leave = state.unprocessed_per_batch;
        let mut unprocessed = collections::HashMap::new();
        for (table_name, requests) in input.request_items.unwrap_or_default() {
            let table = state.table(Some(&table_name))?;
            let processed = requests.len().saturating_sub(leave);
            let mut skipped = Vec::new();
            for (index, request) in requests.into_iter().enumerate() {
                if index >= processed {
                    skipped.push(request);
                    continue;
                }
                if let Some(put_request) = request.put_request() {
                    let item = put_request.item().clone();
                    match table.position(&table.key_of(&item)) {
                        Some(position) => table.items[position] = item,
                        None => table.items.push(item),
                    }
                } else if let Some(delete_request) = request.delete_request() {
                    if let Some(position) = table.position(delete_request.key()) {
                        table.items.remove(position);
                    }
                }
            }
            if !skipped.is_empty() {
                unprocessed.insert(table_name, skipped);
            }
        }
        let output = operation::batch_write_item::BatchWriteItemOutput::builder()
            .set_unprocessed_items((!unprocessed.is_empty()).then_some(unprocessed))
            .build();
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn n(text: &str) -> types::AttributeValue {
        types::AttributeValue::N(text.to_string())
    }

    #[rstest]
    #[case::equals("#a = :one", true)]
    #[case::not_equals("#a = :two", false)]
    #[case::between("#a BETWEEN :one AND :two", true)]
    #[case::and_or("#a = :two AND #a = :two OR #a < :two", true)]
    #[case::grouped("#a = :two AND (#a = :two OR #a < :two)", false)]
    #[case::exists("attribute_exists(#a)", true)]
    #[case::not_exists("attribute_not_exists(#a)", false)]
    #[case::missing_attribute("b > :one", false)]
    fn test_evaluate(#[case] expression: &str, #[case] expected: bool) {
        let names = collections::HashMap::from([("#a".to_string(), "a".to_string())]);
        let values = collections::HashMap::from([
            (":one".to_string(), n("1")),
            (":two".to_string(), n("2")),
        ]);
        let placeholders = Placeholders {
            names: Some(&names),
            values: Some(&values),
        };
        let item = WireItem::from([("a".to_string(), n("1"))]);
        assert_eq!(evaluate(Some(expression), &placeholders, &item).unwrap(), expected);
    }

    #[test]
    fn test_evaluate_unbound_placeholder() {
        let placeholders = Placeholders {
            names: None,
            values: None,
        };
        let item = WireItem::new();
        assert!(evaluate(Some("#a = :a"), &placeholders, &item).is_err());
    }

    #[rstest]
    #[case::numbers(n("10"), n("9"), Some(cmp::Ordering::Greater))]
    #[case::strings(
        types::AttributeValue::S("a".to_string()),
        types::AttributeValue::S("b".to_string()),
        Some(cmp::Ordering::Less)
    )]
    #[case::mixed(n("1"), types::AttributeValue::S("1".to_string()), None)]
    fn test_compare(
        #[case] left: types::AttributeValue,
        #[case] right: types::AttributeValue,
        #[case] expected: Option<cmp::Ordering>,
    ) {
        assert_eq!(compare(&left, &right), expected);
    }
}
