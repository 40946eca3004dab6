// Type Mapper
//
// Turns Solidity type descriptors coming from the registry into a closed
// set of value categories. Every later stage (coercion, ABI encoding,
// re-validation) matches on `ValueCategory` exhaustively instead of
// branching on strings.

mod integer;

pub use integer::*;

use std::fmt::{Display, Error, Formatter};

use crate::error::{ModulesError, ModulesResult};

/// Largest `bytesN` width
pub const MAX_FIXED_BYTES: usize = 32;

/// Semantic category of a registry argument
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueCategory {
    /// `uintN`, N in bits
    Uint(usize),
    /// `intN`, N in bits
    Int(usize),
    Address,
    Bool,
    /// `bytesN`, N in bytes
    FixedBytes(usize),
    Bytes,
    String,
    /// `T[]` when `length` is `None`, `T[N]` otherwise
    Array {
        element: Box<ValueCategory>,
        length: Option<usize>,
    },
}

impl ValueCategory {
    pub fn array_of(element: ValueCategory) -> Self {
        ValueCategory::Array {
            element: Box::new(element),
            length: None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ValueCategory::Uint(_) | ValueCategory::Int(_))
    }

    // `bigint[]` in the registry's vocabulary
    pub fn is_integer_array(&self) -> bool {
        match self {
            ValueCategory::Array { element, .. } => element.is_integer(),
            _ => false,
        }
    }

    /// Whether every width and length is one `map_type` could produce
    ///
    /// Categories built by hand can carry widths such as `Uint(512)` or
    /// `FixedBytes(0)`; no value conforms to those.
    pub fn is_well_formed(&self) -> bool {
        match self {
            ValueCategory::Uint(bits) | ValueCategory::Int(bits) => valid_integer_width(*bits),
            ValueCategory::FixedBytes(size) => (1..=MAX_FIXED_BYTES).contains(size),
            ValueCategory::Array { element, length } => {
                *length != Some(0)
                    && !matches!(**element, ValueCategory::Array { .. })
                    && element.is_well_formed()
            }
            ValueCategory::Address
            | ValueCategory::Bool
            | ValueCategory::Bytes
            | ValueCategory::String => true,
        }
    }

    /// Whether the ABI encoding of this category lives in the tail section
    pub fn is_dynamic(&self) -> bool {
        match self {
            ValueCategory::Bytes | ValueCategory::String => true,
            ValueCategory::Array { element, length } => length.is_none() || element.is_dynamic(),
            _ => false,
        }
    }

    /// Canonical Solidity spelling, as used in function signatures
    pub fn solidity_type(&self) -> String {
        match self {
            ValueCategory::Uint(bits) => format!("uint{}", bits),
            ValueCategory::Int(bits) => format!("int{}", bits),
            ValueCategory::Address => "address".to_string(),
            ValueCategory::Bool => "bool".to_string(),
            ValueCategory::FixedBytes(size) => format!("bytes{}", size),
            ValueCategory::Bytes => "bytes".to_string(),
            ValueCategory::String => "string".to_string(),
            ValueCategory::Array { element, length } => match length {
                Some(length) => format!("{}[{}]", element.solidity_type(), length),
                None => format!("{}[]", element.solidity_type()),
            },
        }
    }
}

impl Display for ValueCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", self.solidity_type())
    }
}

/// Map a Solidity type descriptor to its value category
///
/// Recognizes integer widths 8..=256 (bare `uint`/`int` mean 256),
/// `address`, `bool`, `bytes`, `bytes1..=bytes32`, `string` and
/// one-dimensional arrays of those. Nested arrays and tuples are
/// rejected with [`ModulesError::UnsupportedType`].
pub fn map_type(descriptor: &str) -> ModulesResult<ValueCategory> {
    let descriptor = descriptor.trim();
    let unsupported = || ModulesError::UnsupportedType {
        descriptor: descriptor.to_string(),
    };

    if let Some(open) = descriptor.strip_suffix(']').and_then(|d| d.rfind('[')) {
        let element = &descriptor[..open];
        let size = &descriptor[open + 1..descriptor.len() - 1];

        // Only one dimension
        if element.contains('[') || element.contains(']') {
            return Err(unsupported());
        }

        let length = if size.is_empty() {
            None
        } else {
            match parse_width(size) {
                Some(length) if length > 0 => Some(length),
                _ => return Err(unsupported()),
            }
        };

        let element = map_scalar(element).ok_or_else(unsupported)?;
        return Ok(ValueCategory::Array {
            element: Box::new(element),
            length,
        });
    }

    map_scalar(descriptor).ok_or_else(unsupported)
}

fn map_scalar(descriptor: &str) -> Option<ValueCategory> {
    match descriptor {
        "address" => return Some(ValueCategory::Address),
        "bool" => return Some(ValueCategory::Bool),
        "string" => return Some(ValueCategory::String),
        "bytes" => return Some(ValueCategory::Bytes),
        "uint" => return Some(ValueCategory::Uint(MAX_INTEGER_BITS)),
        "int" => return Some(ValueCategory::Int(MAX_INTEGER_BITS)),
        _ => {}
    }

    if let Some(bits) = descriptor.strip_prefix("uint") {
        return integer_width(bits).map(ValueCategory::Uint);
    }
    if let Some(bits) = descriptor.strip_prefix("int") {
        return integer_width(bits).map(ValueCategory::Int);
    }
    if let Some(size) = descriptor.strip_prefix("bytes") {
        return parse_width(size)
            .filter(|size| (1..=MAX_FIXED_BYTES).contains(size))
            .map(ValueCategory::FixedBytes);
    }

    None
}

fn integer_width(bits: &str) -> Option<usize> {
    parse_width(bits).filter(|bits| valid_integer_width(*bits))
}

// Canonical decimal only: no sign, no leading zeros
fn parse_width(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}
