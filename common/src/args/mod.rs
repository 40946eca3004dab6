// Native argument values and the coercer that produces them
// from registry examples.

mod coerce;

pub use coerce::*;

use std::fmt::{Display, Error, Formatter};

use serde::{Serialize, Serializer};

use crate::{
    crypto::Address,
    types::{int_fits_bits, uint_fits_bits, ValueCategory, I256, U256},
};

/// A chain-ready argument value
///
/// Integers are always 256-bit so values above 2^53 survive intact.
/// Equality is structural and exact, which is what state verification
/// relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeValue {
    Uint(U256),
    Int(I256),
    Address(Address),
    Bool(bool),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<NativeValue>),
}

impl NativeValue {
    /// Whether this value can be encoded as `category` without loss
    ///
    /// Integer widths, `bytesN` lengths and fixed array lengths are checked,
    /// array elements recursively. Nothing conforms to a malformed category.
    pub fn conforms_to(&self, category: &ValueCategory) -> bool {
        category.is_well_formed() && self.matches(category)
    }

    fn matches(&self, category: &ValueCategory) -> bool {
        match (category, self) {
            (ValueCategory::Uint(bits), NativeValue::Uint(value)) => uint_fits_bits(value, *bits),
            (ValueCategory::Int(bits), NativeValue::Int(value)) => int_fits_bits(value, *bits),
            (ValueCategory::Address, NativeValue::Address(_)) => true,
            (ValueCategory::Bool, NativeValue::Bool(_)) => true,
            (ValueCategory::FixedBytes(size), NativeValue::FixedBytes(bytes)) => {
                bytes.len() == *size
            }
            (ValueCategory::Bytes, NativeValue::Bytes(_)) => true,
            (ValueCategory::String, NativeValue::String(_)) => true,
            (ValueCategory::Array { element, length }, NativeValue::Array(items)) => {
                length.map_or(true, |length| length == items.len())
                    && items.iter().all(|item| item.matches(element))
            }
            _ => false,
        }
    }

    pub fn as_uint(&self) -> Option<&U256> {
        match self {
            NativeValue::Uint(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<&Address> {
        match self {
            NativeValue::Address(address) => Some(address),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[NativeValue]> {
        match self {
            NativeValue::Array(items) => Some(items),
            _ => None,
        }
    }

    // Name of the variant, used in mismatch messages
    pub fn kind(&self) -> &'static str {
        match self {
            NativeValue::Uint(_) => "uint",
            NativeValue::Int(_) => "int",
            NativeValue::Address(_) => "address",
            NativeValue::Bool(_) => "bool",
            NativeValue::FixedBytes(_) => "fixed bytes",
            NativeValue::Bytes(_) => "bytes",
            NativeValue::String(_) => "string",
            NativeValue::Array(_) => "array",
        }
    }
}

impl From<U256> for NativeValue {
    fn from(value: U256) -> Self {
        NativeValue::Uint(value)
    }
}

impl From<u64> for NativeValue {
    fn from(value: u64) -> Self {
        NativeValue::Uint(U256::from(value))
    }
}

impl From<I256> for NativeValue {
    fn from(value: I256) -> Self {
        NativeValue::Int(value)
    }
}

impl From<Address> for NativeValue {
    fn from(value: Address) -> Self {
        NativeValue::Address(value)
    }
}

impl From<bool> for NativeValue {
    fn from(value: bool) -> Self {
        NativeValue::Bool(value)
    }
}

impl From<&str> for NativeValue {
    fn from(value: &str) -> Self {
        NativeValue::String(value.to_string())
    }
}

impl<T: Into<NativeValue>> From<Vec<T>> for NativeValue {
    fn from(values: Vec<T>) -> Self {
        NativeValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl Display for NativeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            NativeValue::Uint(value) => write!(f, "{}", value),
            NativeValue::Int(value) => write!(f, "{}", value),
            NativeValue::Address(address) => write!(f, "{}", address),
            NativeValue::Bool(value) => write!(f, "{}", value),
            NativeValue::FixedBytes(bytes) | NativeValue::Bytes(bytes) => {
                write!(f, "0x{}", hex::encode(bytes))
            }
            NativeValue::String(value) => write!(f, "{:?}", value),
            NativeValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

// Integers serialize as decimal strings to stay exact in JSON
impl Serialize for NativeValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            NativeValue::Uint(value) => serializer.serialize_str(&value.to_string()),
            NativeValue::Int(value) => serializer.serialize_str(&value.to_string()),
            NativeValue::Address(address) => address.serialize(serializer),
            NativeValue::Bool(value) => serializer.serialize_bool(*value),
            NativeValue::FixedBytes(bytes) | NativeValue::Bytes(bytes) => {
                serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
            }
            NativeValue::String(value) => serializer.serialize_str(value),
            NativeValue::Array(items) => items.serialize(serializer),
        }
    }
}
