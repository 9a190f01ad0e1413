use crate::error::CodecError;

use aws_sdk_dynamodb::{
    primitives::Blob,
    types::{AttributeValue, ScalarAttributeType},
};
use serde::{Serialize, de::DeserializeOwned};
use std::{collections, fmt, hash::Hash, str::FromStr};

/// An item as dynamic values, keyed by attribute name.
pub type Item = collections::HashMap<String, Value>;

/// An item in wire form, keyed by attribute name.
pub type WireItem = collections::HashMap<String, AttributeValue>;

/// Wire type tags of the store's attribute envelope.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum WireType {
    /// `S`
    String,
    /// `N`
    Number,
    /// `B`
    Binary,
    /// `BOOL`
    Bool,
    /// `NULL`
    Null,
    /// `M`
    Map,
    /// `L`
    List,
    /// `SS`
    StringSet,
    /// `NS`
    NumberSet,
    /// `BS`
    BinarySet,
}

impl WireType {
    /// The wire tag, e.g. `"S"` or `"BOOL"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "S",
            Self::Number => "N",
            Self::Binary => "B",
            Self::Bool => "BOOL",
            Self::Null => "NULL",
            Self::Map => "M",
            Self::List => "L",
            Self::StringSet => "SS",
            Self::NumberSet => "NS",
            Self::BinarySet => "BS",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireType {
    type Err = CodecError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let wire_type = match tag {
            "S" => Self::String,
            "N" => Self::Number,
            "B" => Self::Binary,
            "BOOL" => Self::Bool,
            "NULL" => Self::Null,
            "M" => Self::Map,
            "L" => Self::List,
            "SS" => Self::StringSet,
            "NS" => Self::NumberSet,
            "BS" => Self::BinarySet,
            other => return Err(CodecError::UnknownType(other.to_string())),
        };
        Ok(wire_type)
    }
}

impl From<WireType> for ScalarAttributeType {
    fn from(wire_type: WireType) -> Self {
        ScalarAttributeType::from(wire_type.as_str())
    }
}

impl TryFrom<&ScalarAttributeType> for WireType {
    type Error = CodecError;

    fn try_from(scalar: &ScalarAttributeType) -> Result<Self, Self::Error> {
        scalar.as_str().parse()
    }
}

/// A number kept as decimal text so that no precision is lost on the way through.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Number(String);

impl Number {
    /// Parse decimal text such as `"42"`, `"-0.5"` or `"1e-3"`.
    pub fn new(text: impl Into<String>) -> Result<Self, CodecError> {
        let text = text.into();
        if is_decimal(&text) {
            Ok(Self(text))
        } else {
            Err(CodecError::InvalidNumber(text))
        }
    }

    /// The decimal text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The value as an integer, if it is one.
    pub fn to_i64(&self) -> Option<i64> {
        self.0.parse().ok()
    }

    /// The value as a float, possibly rounded.
    pub fn to_f64(&self) -> Option<f64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! number_from_integer {
    ($($integer:ty),*) => {
        $(
            impl From<$integer> for Number {
                fn from(value: $integer) -> Self {
                    Self(value.to_string())
                }
            }

            impl From<$integer> for Value {
                fn from(value: $integer) -> Self {
                    Self::Number(value.into())
                }
            }
        )*
    };
}

number_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64);

impl TryFrom<f64> for Number {
    type Error = CodecError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.is_finite() {
            Ok(Self(value.to_string()))
        } else {
            Err(CodecError::NonFiniteNumber(value))
        }
    }
}

impl FromStr for Number {
    type Err = CodecError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        Self::new(text)
    }
}

fn is_decimal(text: &str) -> bool {
    let text = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(position) => (&text[..position], Some(&text[position + 1..])),
        None => (text, None),
    };
    let (integer, fraction) = match mantissa.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (mantissa, ""),
    };
    let digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
    if integer.is_empty() && fraction.is_empty() {
        return false;
    }
    if !digits(integer) || !digits(fraction) {
        return false;
    }
    match exponent {
        Some(exponent) => {
            let exponent = exponent.strip_prefix(['-', '+']).unwrap_or(exponent);
            !exponent.is_empty() && digits(exponent)
        }
        None => true,
    }
}

/// The store rejects empty sets and sets with repeated members.
fn check_set<T: Eq + Hash>(
    set: WireType,
    members: &[T],
    describe: impl Fn(&T) -> String,
) -> Result<(), CodecError> {
    if members.is_empty() {
        return Err(CodecError::EmptySet(set));
    }
    let mut seen = collections::HashSet::with_capacity(members.len());
    match members.iter().find(|member| !seen.insert(*member)) {
        Some(member) => Err(CodecError::DuplicateSetMember {
            set,
            member: describe(member),
        }),
        None => Ok(()),
    }
}

/// Dynamic value model.
///
/// ```rust
/// use dynamodb_store::common::value::{Number, Value};
///
/// let id = Value::from(5);
/// let name = Value::from("alice");
/// assert_eq!(id, Value::Number(Number::new("5").unwrap()));
/// assert_eq!(name, Value::String("alice".to_string()));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Text.
    String(String),
    /// Decimal number.
    Number(Number),
    /// Raw bytes.
    Binary(Vec<u8>),
    /// Boolean.
    Bool(bool),
    /// Explicit null.
    Null,
    /// Ordered list of values of any type.
    List(Vec<Value>),
    /// Nested document.
    Map(collections::HashMap<String, Value>),
    /// Set of strings.
    StringSet(Vec<String>),
    /// Set of numbers.
    NumberSet(Vec<Number>),
    /// Set of byte strings.
    BinarySet(Vec<Vec<u8>>),
}

impl Value {
    /// The wire type this value encodes to without a declared type.
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::String(_) => WireType::String,
            Self::Number(_) => WireType::Number,
            Self::Binary(_) => WireType::Binary,
            Self::Bool(_) => WireType::Bool,
            Self::Null => WireType::Null,
            Self::List(_) => WireType::List,
            Self::Map(_) => WireType::Map,
            Self::StringSet(_) => WireType::StringSet,
            Self::NumberSet(_) => WireType::NumberSet,
            Self::BinarySet(_) => WireType::BinarySet,
        }
    }

    /// Encode by the value's own variant. Composites recurse.
    pub fn encode(&self) -> Result<AttributeValue, CodecError> {
        let attribute_value = match self {
            Self::String(text) => AttributeValue::S(text.clone()),
            Self::Number(number) => AttributeValue::N(number.0.clone()),
            Self::Binary(bytes) => AttributeValue::B(Blob::new(bytes.clone())),
            Self::Bool(flag) => AttributeValue::Bool(*flag),
            Self::Null => AttributeValue::Null(true),
            Self::List(values) => {
                let values = values
                    .iter()
                    .map(Self::encode)
                    .collect::<Result<Vec<_>, _>>()?;
                AttributeValue::L(values)
            }
            Self::Map(map) => AttributeValue::M(encode_item(map)?),
            Self::StringSet(texts) => {
                check_set(WireType::StringSet, texts, String::clone)?;
                AttributeValue::Ss(texts.clone())
            }
            Self::NumberSet(numbers) => {
                check_set(WireType::NumberSet, numbers, Number::to_string)?;
                AttributeValue::Ns(numbers.iter().map(|number| number.0.clone()).collect())
            }
            Self::BinarySet(bytes) => {
                check_set(WireType::BinarySet, bytes, |member| format!("{member:?}"))?;
                AttributeValue::Bs(bytes.iter().cloned().map(Blob::new).collect())
            }
        };
        Ok(attribute_value)
    }

    /// Encode as `declared`, used for key and condition operands.
    ///
    /// A string declared as a number must hold decimal text, and a number declared as a
    /// string is sent as its text. Any other mismatch is an error.
    pub fn encode_as(&self, declared: WireType) -> Result<AttributeValue, CodecError> {
        match (declared, self) {
            (WireType::String, Self::Number(number)) => Ok(AttributeValue::S(number.0.clone())),
            (WireType::Number, Self::String(text)) => {
                let number = Number::new(text.as_str())?;
                Ok(AttributeValue::N(number.0))
            }
            (declared, value) if declared == value.wire_type() => value.encode(),
            (declared, value) => Err(CodecError::TypeMismatch {
                declared,
                actual: value.wire_type(),
            }),
        }
    }

    /// Decode a wire attribute. An attribute with no recognised member is `Null`.
    pub fn decode(attribute_value: &AttributeValue) -> Self {
        match attribute_value {
            AttributeValue::S(text) => Self::String(text.clone()),
            AttributeValue::N(text) => Self::Number(Number(text.clone())),
            AttributeValue::Bool(flag) => Self::Bool(*flag),
            AttributeValue::B(blob) => Self::Binary(blob.as_ref().to_vec()),
            AttributeValue::L(values) => Self::List(values.iter().map(Self::decode).collect()),
            AttributeValue::M(map) => Self::Map(decode_item(map)),
            AttributeValue::Ss(texts) => Self::StringSet(texts.clone()),
            AttributeValue::Ns(texts) => {
                Self::NumberSet(texts.iter().cloned().map(Number).collect())
            }
            AttributeValue::Bs(blobs) => {
                Self::BinarySet(blobs.iter().map(|blob| blob.as_ref().to_vec()).collect())
            }
            _ => Self::Null,
        }
    }

    /// Convert any serializable value through `serde_dynamo`.
    pub fn from_serialize<T: Serialize>(value: T) -> Result<Self, CodecError> {
        let attribute_value: AttributeValue = serde_dynamo::to_attribute_value(value)?;
        Ok(Self::decode(&attribute_value))
    }
}

impl TryFrom<&Value> for AttributeValue {
    type Error = CodecError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        value.encode()
    }
}

impl From<&AttributeValue> for Value {
    fn from(attribute_value: &AttributeValue) -> Self {
        Self::decode(attribute_value)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self::String(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self::String(text.to_string())
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Self::Bool(flag)
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        Self::Number(number)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::List(values)
    }
}

impl From<Item> for Value {
    fn from(map: Item) -> Self {
        Self::Map(map)
    }
}

impl TryFrom<f64> for Value {
    type Error = CodecError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Ok(Self::Number(value.try_into()?))
    }
}

/// Encode every attribute of an item.
pub fn encode_item(item: &Item) -> Result<WireItem, CodecError> {
    item.iter()
        .map(|(name, value)| Ok((name.clone(), value.encode()?)))
        .collect()
}

/// Decode every attribute of a wire item.
pub fn decode_item(item: &WireItem) -> Item {
    item.iter()
        .map(|(name, attribute_value)| (name.clone(), Value::decode(attribute_value)))
        .collect()
}

/// Convert a serializable record into an item through `serde_dynamo`.
pub fn to_item<T: Serialize>(record: T) -> Result<Item, CodecError> {
    let item: WireItem = serde_dynamo::to_item(record)?;
    Ok(decode_item(&item))
}

/// Convert an item into a deserializable record through `serde_dynamo`.
pub fn from_item<T: DeserializeOwned>(item: &Item) -> Result<T, CodecError> {
    let item = encode_item(item)?;
    Ok(serde_dynamo::from_item(item)?)
}
