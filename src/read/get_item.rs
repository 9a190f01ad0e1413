use crate::{
    backend::Backend,
    common::{
        self,
        value::{self, Item, WireItem},
    },
    error::Error,
};

use aws_sdk_dynamodb::operation;

/// Get item operation.
///
/// ```rust,no_run
/// use dynamodb_store::{backend::Backend, common, read, schema::AttributeDefinition};
/// use dynamodb_store::common::value::WireType;
///
/// # async fn example(backend: &dyn Backend) -> Result<(), Box<dyn std::error::Error>> {
/// let get_item = read::get_item::GetItem {
///     keys: common::key::Keys {
///         partition_key: common::key::Key {
///             definition: AttributeDefinition::new("id", WireType::String),
///             value: "1".into(),
///         },
///         sort_key: None,
///     },
///     table_name: "users".to_string(),
///     consistent_read: None,
///     projection: vec![],
/// };
/// let item = get_item.send(backend).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct GetItem {
    /// The primary key of the item to retrieve.
    pub keys: common::key::Keys,
    /// Fully qualified table name.
    pub table_name: String,
    /// `true` for a strongly consistent read.
    pub consistent_read: Option<bool>,
    /// Attributes to return; empty means all.
    pub projection: Vec<String>,
}

impl TryFrom<GetItem> for operation::get_item::GetItemInput {
    type Error = Error;

    fn try_from(get_item: GetItem) -> Result<Self, Self::Error> {
        let keys: WireItem = get_item.keys.try_into()?;
        let mut expression_attribute_names = None;
        let projection_expression = common::ExpressionInput::projection(&get_item.projection)
            .merge_into(&mut expression_attribute_names, &mut None);
        Self::builder()
            .set_key(Some(keys))
            .set_consistent_read(get_item.consistent_read)
            .set_projection_expression(projection_expression)
            .set_expression_attribute_names(expression_attribute_names)
            .table_name(get_item.table_name)
            .build()
            .map_err(Error::build("get item request"))
    }
}

impl GetItem {
    /// Execute the lookup. A missing item is `Ok(None)`.
    pub async fn send(self, backend: &dyn Backend) -> Result<Option<Item>, Error> {
        let table_name = self.table_name.clone();
        let input: operation::get_item::GetItemInput = self.try_into()?;
        let output = backend
            .get_item(input)
            .await
            .map_err(Error::wire("get_item", table_name))?;
        Ok(output.item.as_ref().map(value::decode_item))
    }
}
