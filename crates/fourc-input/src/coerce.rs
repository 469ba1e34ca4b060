//! # Value Coercion
//!
//! Converts a JSON value into the shape an entry declares, but only where
//! exactly one reading exists.
//!
//! | Declared | Accepted input                                          |
//! |----------|---------------------------------------------------------|
//! | double   | any number (integers widen), numeric strings            |
//! | int      | integers, floats with no fractional part, integer strings |
//! | bool     | booleans, `"true"` / `"false"`                          |
//! | string   | strings, integers, booleans                             |
//! | path     | same as string                                          |
//! | enum     | an allowed value, or an integer/bool spelling one       |
//!
//! Floats are never turned into strings: `0.1` has no single spelling.
//! Mappings and sequences are coerced member by member; members the schema
//! does not declare pass through untouched and are left to validation.

use fourc_core::DocPath;
use fourc_schema::{EntryKind, MetadataEntry, PrimitiveType};
use serde_json::{Map, Number, Value};

use crate::error::AccessError;

/// Coerce `value` to the type declared by `entry`. `path` is used for
/// error reporting only.
///
/// # Errors
///
/// [`AccessError::TypeMismatch`] at the innermost offending path.
pub fn coerce(value: &Value, entry: &MetadataEntry, path: &DocPath) -> Result<Value, AccessError> {
    let mismatch = |reason: String| AccessError::TypeMismatch {
        path: path.to_string(),
        reason,
    };

    if value.is_null() {
        return if entry.is_noneable() {
            Ok(Value::Null)
        } else {
            Err(mismatch(format!("expected {}, found null", entry.type_description())))
        };
    }

    match entry.kind() {
        EntryKind::Primitive(primitive) => coerce_primitive(value, primitive).ok_or_else(|| {
            mismatch(format!(
                "cannot read {} as {}",
                describe(value),
                entry.type_description()
            ))
        }),
        EntryKind::Enum => {
            let text = match value {
                Value::String(s) => Some(s.clone()),
                Value::Bool(b) => Some(b.to_string()),
                Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
                _ => None,
            };
            match text {
                Some(text) if entry.allowed_values().contains(&text) => Ok(Value::String(text)),
                _ => Err(mismatch(format!(
                    "{} is not {}",
                    describe(value),
                    entry.type_description()
                ))),
            }
        }
        EntryKind::Mapping => {
            let Value::Object(members) = value else {
                return Err(mismatch(format!("expected mapping, found {}", describe(value))));
            };
            let mut out = Map::new();
            for (key, member) in members {
                let coerced = match entry.child(key) {
                    Some(child) => coerce(member, child, &path.child(key.as_str()))?,
                    None => member.clone(),
                };
                out.insert(key.clone(), coerced);
            }
            Ok(Value::Object(out))
        }
        EntryKind::Sequence => {
            let Value::Array(items) = value else {
                return Err(mismatch(format!("expected sequence, found {}", describe(value))));
            };
            if let Some(size) = entry.size() {
                if items.len() != size {
                    return Err(mismatch(format!(
                        "expected {}, found {} elements",
                        entry.type_description(),
                        items.len()
                    )));
                }
            }
            let Some(element) = entry.element() else {
                return Ok(value.clone());
            };
            items
                .iter()
                .enumerate()
                .map(|(i, item)| coerce(item, element, &path.index(i)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
    }
}

fn coerce_primitive(value: &Value, primitive: PrimitiveType) -> Option<Value> {
    match (primitive, value) {
        (PrimitiveType::Double, Value::Number(n)) => {
            if n.is_f64() {
                Some(value.clone())
            } else {
                n.as_f64().and_then(Number::from_f64).map(Value::Number)
            }
        }
        (PrimitiveType::Double, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number),
        (PrimitiveType::Int, Value::Number(n)) => {
            if n.is_i64() {
                return Some(value.clone());
            }
            let f = n.as_f64()?;
            let integral = f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64;
            integral.then(|| Value::from(f as i64))
        }
        (PrimitiveType::Int, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::from),
        (PrimitiveType::Bool, Value::Bool(_)) => Some(value.clone()),
        (PrimitiveType::Bool, Value::String(s)) => match s.as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        (PrimitiveType::String | PrimitiveType::Path, Value::String(_)) => Some(value.clone()),
        (PrimitiveType::String | PrimitiveType::Path, Value::Number(n))
            if n.is_i64() || n.is_u64() =>
        {
            Some(Value::String(n.to_string()))
        }
        (PrimitiveType::String | PrimitiveType::Path, Value::Bool(b)) => {
            Some(Value::String(b.to_string()))
        }
        _ => None,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("bool {b}"),
        Value::Number(n) if n.is_f64() => format!("float {n}"),
        Value::Number(n) => format!("int {n}"),
        Value::String(s) => format!("string '{s}'"),
        Value::Array(_) => "sequence".to_string(),
        Value::Object(_) => "mapping".to_string(),
    }
}
