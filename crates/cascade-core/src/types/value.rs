//! Coercion of JSON values into declared scalar types.

use serde_json::{Number, Value};

use super::DataType;
use crate::error::{Error, Result};

type Parser = fn(Value) -> std::result::Result<Value, String>;

/// One parser per scalar data type. Types missing here pass values through.
const PARSERS: &[(DataType, Parser)] = &[
    (DataType::Int, parse_int),
    (DataType::Float, parse_float),
    (DataType::String, parse_string),
    (DataType::Boolean, parse_boolean),
    (DataType::Any, parse_any),
];

/// Coerces `value` into the representation of `data_type`.
///
/// Strings holding numbers or booleans are converted, integral floats are
/// accepted as integers. Non-scalar data types are returned unchanged.
pub fn parse_value(data_type: DataType, value: Value) -> Result<Value> {
    let Some((_, parser)) = PARSERS.iter().find(|(ty, _)| *ty == data_type) else {
        return Ok(value);
    };

    parser(value).map_err(|message| Error::ValueParse { data_type, message })
}

fn parse_int(value: Value) -> std::result::Result<Value, String> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n)),
        Value::Number(n) => n
            .as_f64()
            .and_then(integral)
            .map(Value::from)
            .ok_or_else(|| format!("{n} is not an integer")),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::from(i));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(integral)
                .map(Value::from)
                .ok_or_else(|| format!("'{s}' is not an integer"))
        }
        other => Err(format!("expected an integer, got {}", kind_of(&other))),
    }
}

fn parse_float(value: Value) -> std::result::Result<Value, String> {
    let float = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        other => return Err(format!("expected a float, got {}", kind_of(other))),
    };

    float
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| format!("{value} is not a finite float"))
}

fn parse_string(value: Value) -> std::result::Result<Value, String> {
    match value {
        Value::String(s) => Ok(Value::String(s)),
        Value::Number(n) => Ok(Value::String(n.to_string())),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        other => Err(format!("expected a string, got {}", kind_of(&other))),
    }
}

fn parse_boolean(value: Value) -> std::result::Result<Value, String> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(b)),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(Value::Bool(false)),
            Some(1) => Ok(Value::Bool(true)),
            _ => Err(format!("{n} is not a boolean")),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(format!("'{s}' is not a boolean")),
        },
        other => Err(format!("expected a boolean, got {}", kind_of(&other))),
    }
}

fn parse_any(value: Value) -> std::result::Result<Value, String> {
    Ok(value)
}

/// Returns the float as an integer when no precision is lost.
fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
