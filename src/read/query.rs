use crate::{
    backend::Backend,
    common::condition::ReadKind,
    error::Error,
    read::{self, result_set::ReadOutput},
};

use aws_sdk_dynamodb::operation;

/// Query operation.
///
/// ```rust,no_run
/// use dynamodb_store::{backend::Backend, common::condition::ConditionBuilder, read};
///
/// # async fn example(backend: &dyn Backend) -> Result<(), Box<dyn std::error::Error>> {
/// let query = read::query::Query {
///     multiple_read_args: read::common::MultipleReadArgs {
///         conditions: ConditionBuilder::new().and_eq("id", 5).and_gt("time", 3),
///         table_name: "events".to_string(),
///         ..Default::default()
///     },
/// };
/// let output = query.send(backend).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    /// Conditions, declared attribute types and table name.
    pub multiple_read_args: read::common::MultipleReadArgs,
}

impl TryFrom<Query> for operation::query::QueryInput {
    type Error = Error;

    fn try_from(query: Query) -> Result<Self, Self::Error> {
        let query = query.multiple_read_args.into_input(ReadKind::Query)?;
        let builder = Self::builder()
            .set_key_condition_expression(query.key_condition_expression)
            .set_scan_index_forward(query.scan_index_forward);
        read::common::apply_multiple_read_operation!(builder, query)
            .build()
            .map_err(Error::build("query request"))
    }
}

impl Query {
    /// Execute the query, one page.
    pub async fn send(self, backend: &dyn Backend) -> Result<ReadOutput, Error> {
        let table_name = self.multiple_read_args.table_name.clone();
        let input: operation::query::QueryInput = self.try_into()?;
        let output = backend
            .query(input)
            .await
            .map_err(Error::wire("query", table_name))?;
        Ok(output.into())
    }
}
