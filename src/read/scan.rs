use crate::{
    backend::Backend,
    common::condition::ReadKind,
    error::Error,
    read::{self, result_set::ReadOutput},
};

use aws_sdk_dynamodb::operation;

/// Scan operation. Key conditions of the builder are applied as filters.
///
/// ```rust,no_run
/// use dynamodb_store::{backend::Backend, common::condition::ConditionBuilder, read};
///
/// # async fn example(backend: &dyn Backend) -> Result<(), Box<dyn std::error::Error>> {
/// let scan = read::scan::Scan {
///     multiple_read_args: read::common::MultipleReadArgs {
///         conditions: ConditionBuilder::new().filter_gt("score", 10),
///         table_name: "events".to_string(),
///         ..Default::default()
///     },
/// };
/// let output = scan.send(backend).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scan {
    /// Conditions, declared attribute types and table name.
    pub multiple_read_args: read::common::MultipleReadArgs,
}

impl TryFrom<Scan> for operation::scan::ScanInput {
    type Error = Error;

    fn try_from(scan: Scan) -> Result<Self, Self::Error> {
        let scan = scan.multiple_read_args.into_input(ReadKind::Scan)?;
        read::common::apply_multiple_read_operation!(Self::builder(), scan)
            .build()
            .map_err(Error::build("scan request"))
    }
}

impl Scan {
    /// Execute the scan, one page.
    pub async fn send(self, backend: &dyn Backend) -> Result<ReadOutput, Error> {
        let table_name = self.multiple_read_args.table_name.clone();
        let input: operation::scan::ScanInput = self.try_into()?;
        let output = backend
            .scan(input)
            .await
            .map_err(Error::wire("scan", table_name))?;
        Ok(output.into())
    }
}
