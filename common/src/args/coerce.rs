// Argument Coercer
//
// Converts raw JSON examples into values matching their category.
// Integers go through 256-bit parsing; every other category is re-validated
// (address checksum, hex payloads, fixed lengths) rather than passed through.

use log::trace;
use serde_json::Value;

use super::NativeValue;
use crate::{
    crypto::parse_address,
    error::{ModulesError, ModulesResult},
    registry::ArgSpec,
    types::{
        int_fits_bits, map_type, parse_i256, parse_u256, uint_fits_bits, ValueCategory, I256, U256,
    },
};

// Longest rendering of an offending value kept in error messages
const MAX_VALUE_PREVIEW: usize = 96;

/// Coerce a raw JSON value into `category`
pub fn coerce(value: &Value, category: &ValueCategory) -> ModulesResult<NativeValue> {
    if !category.is_well_formed() {
        return Err(ModulesError::UnsupportedType {
            descriptor: category.solidity_type(),
        });
    }
    let fail = |reason: &str| coercion_error(value, category, reason);

    match category {
        ValueCategory::Uint(bits) => {
            let parsed = match value {
                Value::String(s) => parse_u256(s.trim())
                    .ok_or_else(|| fail("not a decimal or 0x-prefixed hex integer"))?,
                Value::Number(n) => match n.as_u64() {
                    Some(n) => U256::from(n),
                    None if n.is_f64() => {
                        return Err(fail("floating point numbers are not accepted"))
                    }
                    None => return Err(fail("negative value for an unsigned type")),
                },
                _ => return Err(fail("expected a numeric string")),
            };
            if !uint_fits_bits(&parsed, *bits) {
                return Err(fail(&format!("value does not fit in {} bits", bits)));
            }
            Ok(NativeValue::Uint(parsed))
        }
        ValueCategory::Int(bits) => {
            let parsed = match value {
                Value::String(s) => parse_i256(s.trim())
                    .ok_or_else(|| fail("not a decimal or 0x-prefixed hex integer"))?,
                Value::Number(n) => match n.as_i64() {
                    Some(n) => I256::try_from(n)
                        .map_err(|_| fail("integer out of range, pass it as a string"))?,
                    None if n.is_f64() => {
                        return Err(fail("floating point numbers are not accepted"))
                    }
                    None => return Err(fail("integer out of range, pass it as a string")),
                },
                _ => return Err(fail("expected a numeric string")),
            };
            if !int_fits_bits(&parsed, *bits) {
                return Err(fail(&format!("value does not fit in {} bits", bits)));
            }
            Ok(NativeValue::Int(parsed))
        }
        ValueCategory::Address => match value {
            Value::String(s) => parse_address(s.trim())
                .map(NativeValue::Address)
                .map_err(|e| fail(&e.to_string())),
            _ => Err(fail("expected an address string")),
        },
        ValueCategory::Bool => match value {
            Value::Bool(b) => Ok(NativeValue::Bool(*b)),
            _ => Err(fail("expected true or false")),
        },
        ValueCategory::FixedBytes(size) => {
            let bytes = decode_hex(value).map_err(|reason| fail(reason))?;
            if bytes.len() != *size {
                return Err(fail(&format!(
                    "expected {} bytes, got {}",
                    size,
                    bytes.len()
                )));
            }
            Ok(NativeValue::FixedBytes(bytes))
        }
        ValueCategory::Bytes => decode_hex(value)
            .map(NativeValue::Bytes)
            .map_err(|reason| fail(reason)),
        ValueCategory::String => match value {
            Value::String(s) => Ok(NativeValue::String(s.clone())),
            _ => Err(fail("expected a string")),
        },
        ValueCategory::Array { element, length } => {
            let items = value
                .as_array()
                .ok_or_else(|| fail("expected an array"))?;
            if let Some(length) = length {
                if items.len() != *length {
                    return Err(fail(&format!(
                        "expected {} elements, got {}",
                        length,
                        items.len()
                    )));
                }
            }
            let mut coerced = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let item = coerce(item, element).map_err(|e| match e {
                    ModulesError::Coercion { reason, .. } => {
                        fail(&format!("element {}: {}", index, reason))
                    }
                    other => other,
                })?;
                coerced.push(item);
            }
            Ok(NativeValue::Array(coerced))
        }
    }
}

/// Map and coerce every example of an argument schema, in order
///
/// Stops at the first argument that cannot be mapped or coerced; the error
/// names the argument position and name.
pub fn coerce_args(specs: &[ArgSpec]) -> ModulesResult<Vec<NativeValue>> {
    let mut values = Vec::with_capacity(specs.len());
    for (index, spec) in specs.iter().enumerate() {
        let category = map_type(&spec.type_descriptor)?;
        let value = coerce(&spec.example, &category).map_err(|e| match e {
            ModulesError::Coercion {
                category,
                value,
                reason,
            } => ModulesError::Coercion {
                category,
                value,
                reason: format!("argument {} ({}): {}", index, spec.name, reason),
            },
            other => other,
        })?;
        if log::log_enabled!(log::Level::Trace) {
            trace!("argument {} ({}) coerced to {}", index, spec.name, value);
        }
        values.push(value);
    }
    Ok(values)
}

/// Map every type descriptor of an argument schema
pub fn categories_of(specs: &[ArgSpec]) -> ModulesResult<Vec<ValueCategory>> {
    specs
        .iter()
        .map(|spec| map_type(&spec.type_descriptor))
        .collect()
}

fn decode_hex(value: &Value) -> Result<Vec<u8>, &'static str> {
    let s = value.as_str().ok_or("expected a 0x-prefixed hex string")?;
    let digits = s
        .trim()
        .strip_prefix("0x")
        .ok_or("expected a 0x-prefixed hex string")?;
    if digits.len() % 2 != 0 {
        return Err("hex string has an odd number of digits");
    }
    hex::decode(digits).map_err(|_| "invalid hex digits")
}

fn coercion_error(value: &Value, category: &ValueCategory, reason: &str) -> ModulesError {
    let mut preview = value.to_string();
    if preview.len() > MAX_VALUE_PREVIEW {
        let mut end = MAX_VALUE_PREVIEW;
        while !preview.is_char_boundary(end) {
            end -= 1;
        }
        preview.truncate(end);
        preview.push_str("...");
    }
    ModulesError::Coercion {
        category: category.solidity_type(),
        value: preview,
        reason: reason.to_string(),
    }
}
