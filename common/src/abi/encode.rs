// Solidity ABI encoding of native values
//
// Values are checked against their categories and mapped onto
// `DynSolValue`; alloy does the `abi.encode` head/tail layout. For
// `abi.encodePacked`, scalars take their natural width and array elements
// take one full word each, as Solidity packs them.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::B256;
use thiserror::Error;

use crate::{args::NativeValue, types::ValueCategory};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("expected {expected} values, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("value {value} does not conform to {category}")]
    TypeMismatch { category: String, value: String },

    #[error("{0} cannot be packed inside an array")]
    UnsupportedPacked(String),
}

/// `abi.encode(values...)` for the given parameter categories
pub fn encode(categories: &[ValueCategory], values: &[NativeValue]) -> Result<Vec<u8>, EncodeError> {
    let params = zip_checked(categories, values)?
        .into_iter()
        .map(|(category, value)| to_sol_value(category, value))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DynSolValue::Tuple(params).abi_encode_params())
}

/// `abi.encodePacked(values...)` for the given parameter categories
pub fn encode_packed(
    categories: &[ValueCategory],
    values: &[NativeValue],
) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    for (category, value) in zip_checked(categories, values)? {
        let sol_value = to_sol_value(category, value)?;
        match (category, sol_value) {
            (ValueCategory::Array { element, .. }, DynSolValue::Array(items))
            | (ValueCategory::Array { element, .. }, DynSolValue::FixedArray(items)) => {
                if element.is_dynamic() {
                    return Err(EncodeError::UnsupportedPacked(element.solidity_type()));
                }
                for item in items {
                    out.extend(item.abi_encode());
                }
            }
            (_, sol_value) => out.extend(sol_value.abi_encode_packed()),
        }
    }
    Ok(out)
}

/// Check `value` against `category` and convert it for alloy's encoder
pub fn to_sol_value(
    category: &ValueCategory,
    value: &NativeValue,
) -> Result<DynSolValue, EncodeError> {
    if !value.conforms_to(category) {
        return Err(mismatch(category, value));
    }
    convert(category, value)
}

// Assumes conformance was checked
fn convert(category: &ValueCategory, value: &NativeValue) -> Result<DynSolValue, EncodeError> {
    let converted = match (category, value) {
        (ValueCategory::Uint(bits), NativeValue::Uint(v)) => DynSolValue::Uint(*v, *bits),
        (ValueCategory::Int(bits), NativeValue::Int(v)) => DynSolValue::Int(*v, *bits),
        (ValueCategory::Address, NativeValue::Address(a)) => DynSolValue::Address(*a),
        (ValueCategory::Bool, NativeValue::Bool(b)) => DynSolValue::Bool(*b),
        (ValueCategory::FixedBytes(size), NativeValue::FixedBytes(bytes)) => {
            DynSolValue::FixedBytes(B256::right_padding_from(bytes), *size)
        }
        (ValueCategory::Bytes, NativeValue::Bytes(bytes)) => DynSolValue::Bytes(bytes.clone()),
        (ValueCategory::String, NativeValue::String(s)) => DynSolValue::String(s.clone()),
        (ValueCategory::Array { element, length }, NativeValue::Array(items)) => {
            let items = items
                .iter()
                .map(|item| convert(element, item))
                .collect::<Result<Vec<_>, _>>()?;
            if length.is_some() {
                DynSolValue::FixedArray(items)
            } else {
                DynSolValue::Array(items)
            }
        }
        _ => return Err(mismatch(category, value)),
    };
    Ok(converted)
}

fn zip_checked<'a>(
    categories: &'a [ValueCategory],
    values: &'a [NativeValue],
) -> Result<Vec<(&'a ValueCategory, &'a NativeValue)>, EncodeError> {
    if categories.len() != values.len() {
        return Err(EncodeError::LengthMismatch {
            expected: categories.len(),
            got: values.len(),
        });
    }
    Ok(categories.iter().zip(values.iter()).collect())
}

fn mismatch(category: &ValueCategory, value: &NativeValue) -> EncodeError {
    EncodeError::TypeMismatch {
        category: category.solidity_type(),
        value: value.to_string(),
    }
}
