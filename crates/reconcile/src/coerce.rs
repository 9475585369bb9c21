//! Value coercion library
//!
//! Remote payloads are loosely typed: numbers arrive as JSON numbers or as
//! strings (large-integer scalars), booleans sometimes as `0`/`1`. Every
//! function here is pure and total. Anything that cannot be converted
//! (wrong type, non-finite, out of range) becomes `null`, never a panic.

use serde_json::Value;

/// A pure raw → normalized conversion applied before a value is stored.
pub type Coercion = fn(&Value) -> Value;

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

/// Largest integer an f64 represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

// ============================================================================
// Primitive readers
// ============================================================================

/// Read a finite number from a JSON number or a numeric string.
pub fn as_number(raw: &Value) -> Option<f64> {
    let n = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Round to two decimal places; non-finite input yields `None`.
pub fn round2(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let rounded = (value * 100.0).round() / 100.0;
    rounded.is_finite().then_some(rounded)
}

/// Convert a byte count to gigabytes (GiB), rounded to 2 decimals.
pub fn bytes_to_gigabytes(raw: &Value) -> Option<f64> {
    as_number(raw).and_then(|bytes| round2(bytes / GIB))
}

/// Convert a kilobyte count to gigabytes (GiB), rounded to 2 decimals.
pub fn kilobytes_to_gigabytes(raw: &Value) -> Option<f64> {
    as_number(raw).and_then(|kb| round2(kb / MIB))
}

/// `used / total * 100`, rounded to 2 decimals.
///
/// A zero, negative or non-finite denominator yields `None`.
pub fn calculate_usage_percent(used: f64, total: f64) -> Option<f64> {
    if !used.is_finite() || !total.is_finite() || total <= 0.0 {
        return None;
    }
    round2(used / total * 100.0)
}

/// Usage percent from loosely typed `used` and `total` values.
pub fn usage_percent(used: &Value, total: &Value) -> Option<f64> {
    calculate_usage_percent(as_number(used)?, as_number(total)?)
}

/// Usage percent from loosely typed `used` and `free` values: `used / (used + free)`.
pub fn usage_percent_from_free(used: &Value, free: &Value) -> Option<f64> {
    let used = as_number(used)?;
    let free = as_number(free)?;
    calculate_usage_percent(used, used + free)
}

/// Narrow a large-integer counter (number or decimal string) to an exactly
/// representable number.
pub fn as_big_int(raw: &Value) -> Option<f64> {
    let n = match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i as f64
            } else if let Some(u) = n.as_u64() {
                u as f64
            } else {
                let f = n.as_f64()?;
                if f.fract() != 0.0 {
                    return None;
                }
                f
            }
        }
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i128>() {
                Ok(i) => i as f64,
                Err(_) => {
                    let f = s.parse::<f64>().ok()?;
                    if f.fract() != 0.0 {
                        return None;
                    }
                    f
                }
            }
        }
        _ => return None,
    };
    (n.is_finite() && n.abs() <= MAX_SAFE_INTEGER).then_some(n)
}

/// Read a boolean from a JSON bool, a number (non-zero is true) or a
/// `true`/`false`/`yes`/`no`/`1`/`0` string.
pub fn as_bool(raw: &Value) -> Option<bool> {
    match raw {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Read text from a string, number or boolean.
pub fn as_text(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn from_f64(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::from)
}

// ============================================================================
// Coercions (usable as `Coercion` function pointers)
// ============================================================================

/// Pass the raw value through unchanged.
pub fn identity(raw: &Value) -> Value {
    raw.clone()
}

/// Finite number or null.
pub fn number(raw: &Value) -> Value {
    from_f64(as_number(raw))
}

/// Text or null.
pub fn text(raw: &Value) -> Value {
    as_text(raw).map_or(Value::Null, Value::String)
}

/// Boolean or null.
pub fn boolean(raw: &Value) -> Value {
    as_bool(raw).map_or(Value::Null, Value::Bool)
}

/// Large-integer counter narrowed to a safe number, or null.
pub fn big_int(raw: &Value) -> Value {
    from_f64(as_big_int(raw))
}

/// Percentage rounded to 2 decimals.
pub fn percent(raw: &Value) -> Value {
    from_f64(as_number(raw).and_then(round2))
}

/// Bytes → GB rounded to 2 decimals.
pub fn bytes_to_gb(raw: &Value) -> Value {
    from_f64(bytes_to_gigabytes(raw))
}

/// Kilobytes → GB rounded to 2 decimals.
pub fn kilobytes_to_gb(raw: &Value) -> Value {
    from_f64(kilobytes_to_gigabytes(raw))
}

/// Structured values (objects, arrays) serialized to a JSON string; scalars as text.
pub fn json_text(raw: &Value) -> Value {
    match raw {
        Value::Null => Value::Null,
        Value::Array(_) | Value::Object(_) => Value::String(raw.to_string()),
        other => text(other),
    }
}
