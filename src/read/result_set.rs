use crate::{
    common::value::{self, Item, WireItem},
    error::Error,
};

use aws_sdk_dynamodb::operation;
use serde::de::DeserializeOwned;

/// Rows returned by a read.
///
/// ```rust
/// use dynamodb_store::read::result_set::ResultSet;
/// use aws_sdk_dynamodb::types::AttributeValue;
/// use std::collections::HashMap;
///
/// #[derive(serde::Deserialize)]
/// struct Event {
///     #[serde(rename = "id")]
///     event_id: String,
/// }
///
/// let result_set = ResultSet::new(vec![HashMap::from([(
///     "id".to_string(),
///     AttributeValue::S("a".to_string()),
/// )])]);
/// let events: Vec<Event> = result_set.decode().unwrap();
/// assert_eq!(events[0].event_id, "a");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<WireItem>,
}

impl ResultSet {
    /// Wrap wire rows.
    pub fn new(rows: Vec<WireItem>) -> Self {
        Self { rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The rows in wire form.
    pub fn raw(&self) -> &[WireItem] {
        &self.rows
    }

    /// The rows as dynamic values. Can be called any number of times.
    pub fn to_rows(&self) -> Vec<Item> {
        self.rows.iter().map(value::decode_item).collect()
    }

    /// Decode every row into `T`, one row per element. Field names come from the
    /// record's serde attributes. The first failing row aborts the decode.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        self.rows
            .iter()
            .enumerate()
            .map(|(row, item)| {
                serde_dynamo::from_item(item.clone()).map_err(|source| Error::Decode { row, source })
            })
            .collect()
    }
}

/// A result set plus the counters needed to page through a query or scan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadOutput {
    /// Returned rows; empty for counts.
    pub result_set: ResultSet,
    /// Number of rows that matched the filter.
    pub count: i32,
    /// Number of rows evaluated before the filter.
    pub scanned_count: i32,
    /// Where the next page starts, if there is one.
    pub last_evaluated_key: Option<Item>,
}

impl From<operation::query::QueryOutput> for ReadOutput {
    fn from(output: operation::query::QueryOutput) -> Self {
        Self {
            result_set: ResultSet::new(output.items.unwrap_or_default()),
            count: output.count,
            scanned_count: output.scanned_count,
            last_evaluated_key: output.last_evaluated_key.as_ref().map(value::decode_item),
        }
    }
}

impl From<operation::scan::ScanOutput> for ReadOutput {
    fn from(output: operation::scan::ScanOutput) -> Self {
        Self {
            result_set: ResultSet::new(output.items.unwrap_or_default()),
            count: output.count,
            scanned_count: output.scanned_count,
            last_evaluated_key: output.last_evaluated_key.as_ref().map(value::decode_item),
        }
    }
}
