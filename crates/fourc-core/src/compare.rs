//! # Tolerant Value Comparison
//!
//! Recursively compares two JSON views of input data. Numbers are compared
//! with `|a - b| <= atol + rtol * |b|` (the `isclose` rule, with the second
//! argument as reference); everything else must match exactly. Mapping key
//! order is not significant, sequence order is.

use serde_json::Value;
use thiserror::Error;

use crate::path::DocPath;

/// Tolerances for [`compare_values`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Allow an integer to match a float within tolerance.
    pub allow_int_as_float: bool,
    /// Relative tolerance.
    pub rtol: f64,
    /// Absolute tolerance.
    pub atol: f64,
    /// Treat two NaNs as equal.
    pub equal_nan: bool,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            allow_int_as_float: false,
            rtol: 1.0e-5,
            atol: 1.0e-8,
            equal_nan: false,
        }
    }
}

impl Tolerance {
    /// Exact comparison: zero tolerances.
    pub fn exact() -> Self {
        Self {
            rtol: 0.0,
            atol: 0.0,
            ..Self::default()
        }
    }

    fn is_close(&self, a: f64, reference: f64) -> bool {
        if a.is_nan() || reference.is_nan() {
            return self.equal_nan && a.is_nan() && reference.is_nan();
        }
        if a == reference {
            return true;
        }
        (a - reference).abs() <= self.atol + self.rtol * reference.abs()
    }
}

/// First difference found by [`compare_values`].
#[derive(Error, Debug, Clone, PartialEq)]
#[error("values differ at '{path}': {reason}")]
pub struct Mismatch {
    /// Where the difference was found.
    pub path: DocPath,
    /// Human-readable description.
    pub reason: String,
}

/// Compare `value` against `reference` within `tolerance`.
///
/// # Errors
///
/// Returns the first [`Mismatch`] encountered in a depth-first walk.
pub fn compare_values(
    value: &Value,
    reference: &Value,
    tolerance: &Tolerance,
) -> Result<(), Mismatch> {
    compare_at(value, reference, tolerance, &DocPath::root())
}

fn compare_at(
    value: &Value,
    reference: &Value,
    tolerance: &Tolerance,
    path: &DocPath,
) -> Result<(), Mismatch> {
    let mismatch = |reason: String| Mismatch {
        path: path.clone(),
        reason,
    };

    match (value, reference) {
        (Value::Number(a), Value::Number(b)) => {
            let value_int = a.is_i64() || a.is_u64();
            let ref_int = b.is_i64() || b.is_u64();
            if value_int != ref_int && !tolerance.allow_int_as_float {
                return Err(mismatch(format!(
                    "{} is {}, but the reference {} is {}",
                    a,
                    number_kind(value_int),
                    b,
                    number_kind(ref_int)
                )));
            }
            match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) if tolerance.is_close(x, y) => Ok(()),
                _ => Err(mismatch(format!("{a} is not close to {b}"))),
            }
        }
        (Value::Object(a), Value::Object(b)) => {
            let mut missing: Vec<&str> = a
                .keys()
                .filter(|k| !b.contains_key(*k))
                .chain(b.keys().filter(|k| !a.contains_key(*k)))
                .map(String::as_str)
                .collect();
            if !missing.is_empty() {
                missing.sort_unstable();
                return Err(mismatch(format!(
                    "keys not present in both mappings: {}",
                    missing.join(", ")
                )));
            }
            for (key, item) in a {
                if let Some(ref_item) = b.get(key) {
                    compare_at(item, ref_item, tolerance, &path.child(key.clone()))?;
                }
            }
            Ok(())
        }
        (Value::Array(a), Value::Array(b)) => {
            if a.len() != b.len() {
                return Err(mismatch(format!(
                    "sequence lengths differ ({} and {})",
                    a.len(),
                    b.len()
                )));
            }
            for (i, (item, ref_item)) in a.iter().zip(b).enumerate() {
                compare_at(item, ref_item, tolerance, &path.index(i))?;
            }
            Ok(())
        }
        (a, b) if kind(a) != kind(b) => Err(mismatch(format!(
            "value is a {}, but the reference is a {}",
            kind(a),
            kind(b)
        ))),
        (a, b) if a == b => Ok(()),
        (a, b) => Err(mismatch(format!("{a} != {b}"))),
    }
}

fn number_kind(is_int: bool) -> &'static str {
    if is_int {
        "an integer"
    } else {
        "a float"
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
