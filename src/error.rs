//! Error types for the data layer.
//!
//! Single-item operations return the underlying [`Error`] directly. Operations that
//! touch many items (spool flushes, force deletes) try every item and collect the
//! failures into an [`AggregateError`].

use crate::common::value::WireType;

use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use std::{error, fmt};

/// Service name used as the prefix of aggregate errors and as the `service` field of
/// log events.
pub const SERVICE_NAME: &str = "dynamodb";

/// Separator placed between the constituent messages of an [`AggregateError`].
const AGGREGATE_SEPARATOR: &str = "; ";

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A request was rejected locally before reaching the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A value could not be converted to or from the wire format.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A table schema is structurally invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// The remote call failed.
    #[error("{operation} on table {table} failed: {source}")]
    Wire {
        /// Wire operation name, e.g. `put_item`.
        operation: &'static str,
        /// Fully qualified table name.
        table: String,
        /// Underlying failure.
        #[source]
        source: BackendError,
    },
    /// An SDK request or model builder rejected its input.
    #[error("failed to build {what}: {source}")]
    Build {
        /// What was being built.
        what: &'static str,
        /// Underlying failure.
        #[source]
        source: aws_sdk_dynamodb::error::BuildError,
    },
    /// A result row could not be decoded into the requested record type.
    #[error("failed to decode row {row}: {source}")]
    Decode {
        /// Zero-based row index.
        row: usize,
        /// Underlying failure.
        #[source]
        source: serde_dynamo::Error,
    },
    /// Throughput can only change while the table is `ACTIVE`.
    #[error("table {table} is {status}, throughput can only change while ACTIVE")]
    NotActive {
        /// Fully qualified table name.
        table: String,
        /// Cached table status.
        status: String,
    },
    /// The store returned some batch entries as unprocessed.
    #[error("{count} item(s) left unprocessed by batch write on table {table}")]
    Unprocessed {
        /// Fully qualified table name.
        table: String,
        /// Number of unprocessed entries.
        count: usize,
    },
    /// Several items failed.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

impl Error {
    pub(crate) fn build(what: &'static str) -> impl FnOnce(aws_sdk_dynamodb::error::BuildError) -> Self {
        move |source| Self::Build { what, source }
    }

    /// Log a failed wire call and wrap its error.
    pub(crate) fn wire(operation: &'static str, table: String) -> impl FnOnce(BackendError) -> Self {
        move |source| {
            tracing::error!(
                service = SERVICE_NAME,
                table = %table,
                operation,
                error = %source,
                "wire call failed"
            );
            Self::Wire {
                operation,
                table,
                source,
            }
        }
    }
}

/// Local validation failures.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A query was rendered without any key condition.
    #[error("query requires at least one key condition")]
    NoCondition,
    /// A condition was added twice for the same attribute and role.
    #[error("duplicate {role} condition on attribute {attribute}")]
    DuplicateCondition {
        /// Attribute name.
        attribute: String,
        /// `key` or `filter`.
        role: &'static str,
    },
    /// Key conditions can only be joined with AND.
    #[error("key condition on attribute {attribute} cannot be joined with OR")]
    OrInKeyCondition {
        /// Attribute name.
        attribute: String,
    },
    /// A write entry lacks a key attribute required by the schema.
    #[error("item for table {table} is missing key attribute {attribute}")]
    MissingKey {
        /// Table name.
        table: String,
        /// Missing attribute name.
        attribute: String,
    },
    /// A key attribute has a different wire type than the schema declares.
    #[error("key attribute {attribute} of table {table} must be {expected}, got {actual}")]
    KeyType {
        /// Table name.
        table: String,
        /// Attribute name.
        attribute: String,
        /// Declared type.
        expected: WireType,
        /// Type found on the item.
        actual: WireType,
    },
    /// A range key value was supplied for a table without a range key.
    #[error("table {table} has no range key")]
    UnexpectedRangeKey {
        /// Table name.
        table: String,
    },
    /// Attribute names end up inside placeholder tokens, so only ASCII letters, digits
    /// and `_` are accepted.
    #[error("attribute name {attribute:?} cannot be used in an expression")]
    InvalidAttributeName {
        /// Attribute name.
        attribute: String,
    },
    /// Two entries of the same batch share a primary key.
    #[error("batch write to table {table} already holds an item with this key")]
    DuplicateKey {
        /// Table name.
        table: String,
    },
    /// Batch writes cannot carry expected-value preconditions.
    #[error("batch write to table {table} cannot carry preconditions")]
    PreconditionInBatch {
        /// Table name.
        table: String,
    },
}

/// Value conversion failures.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Text that is not a decimal number was used as a number.
    #[error("invalid number: {0:?}")]
    InvalidNumber(String),
    /// NaN and infinities have no decimal text.
    #[error("non-finite number: {0}")]
    NonFiniteNumber(f64),
    /// The value cannot be encoded as the declared wire type.
    #[error("cannot encode {actual} value as {declared}")]
    TypeMismatch {
        /// Declared wire type.
        declared: WireType,
        /// Wire type of the value.
        actual: WireType,
    },
    /// Sets must hold at least one member.
    #[error("empty {0} set")]
    EmptySet(WireType),
    /// Set members must be distinct.
    #[error("duplicate member {member:?} in {set} set")]
    DuplicateSetMember {
        /// Wire type of the set.
        set: WireType,
        /// The repeated member, as text.
        member: String,
    },
    /// Unknown wire type tag.
    #[error("unknown attribute type {0:?}")]
    UnknownType(String),
    /// Conversion through serde failed.
    #[error(transparent)]
    Serde(#[from] serde_dynamo::Error),
}

/// Table schema failures.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// Global indexes take a hash key and an optional range key.
    #[error("index {index} must have 1 or 2 key attributes, got {count}")]
    IndexKeyCount {
        /// Index name.
        index: String,
        /// Number of key attributes supplied.
        count: usize,
    },
    /// Local indexes share the hash key, so the table needs a range key too.
    #[error("local index {index} requires the table to have a range key")]
    LocalIndexWithoutRangeKey {
        /// Index name.
        index: String,
    },
    /// A table description lacks its hash key.
    #[error("description of table {table} has no HASH key")]
    MissingHashKey {
        /// Table name.
        table: String,
    },
    /// A key references an attribute with no definition.
    #[error("key attribute {attribute} of {owner} has no attribute definition")]
    UndefinedAttribute {
        /// Table or index name.
        owner: String,
        /// Attribute name.
        attribute: String,
    },
    /// A described attribute has an unsupported type tag.
    #[error("attribute {attribute} has unknown type {kind:?}")]
    UnknownAttributeType {
        /// Attribute name.
        attribute: String,
        /// Type tag received.
        kind: String,
    },
    /// A describe response carried no table.
    #[error("describe response for table {table} carried no description")]
    MissingDescription {
        /// Table name.
        table: String,
    },
}

/// Failure reported by a [`crate::backend::Backend`].
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
}

impl BackendError {
    /// Create an error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl<E, R> From<SdkError<E, R>> for BackendError
where
    E: error::Error + 'static,
    R: fmt::Debug,
{
    fn from(err: SdkError<E, R>) -> Self {
        Self::new(DisplayErrorContext(&err).to_string())
    }
}

/// Multi-error container produced by batch paths.
#[derive(Debug)]
pub struct AggregateError {
    service: &'static str,
    errors: Vec<Error>,
}

impl AggregateError {
    /// Create an empty container for `service`.
    pub fn new(service: &'static str) -> Self {
        Self {
            service,
            errors: Vec::new(),
        }
    }

    /// Record a failure.
    pub fn add(&mut self, err: impl Into<Error>) {
        self.errors.push(err.into());
    }

    /// Whether any failure was recorded.
    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Recorded failures in the order they happened.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// `Ok(())` if nothing failed, otherwise the aggregate.
    pub fn into_result(self) -> Result<()> {
        if self.has_error() {
            Err(Error::Aggregate(self))
        } else {
            Ok(())
        }
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} error(s): ", self.service, self.errors.len())?;
        for (index, err) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str(AGGREGATE_SEPARATOR)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl error::Error for AggregateError {}
