//! Explicit conversions between {char, int, float, string} (spec §4.1
//! "Conversions") plus the `as_bool` coercion used by conditionals (§4.5.6).

use wick_common::{Span, WickError, WickResult};

use crate::value::Value;

pub fn as_char(v: &Value, span: Span) -> WickResult<u8> {
    match v {
        Value::Char(c) => Ok(*c),
        Value::Int(i) => Ok(*i as u8),
        Value::Float(f) => Ok(*f as i64 as u8),
        Value::Str(body) => {
            let s = body.borrow();
            let mut chars = s.value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Ok(c as u8),
                _ => Err(WickError::value("string must contain exactly one character to convert to char", span)),
            }
        }
        other => Err(WickError::ty(format!("cannot convert {} to char", other.type_name()), span)),
    }
}

pub fn as_int(v: &Value, span: Span) -> WickResult<i64> {
    match v {
        Value::Char(c) => Ok(*c as i64),
        Value::Int(i) => Ok(*i),
        Value::Float(f) => Ok(*f as i64),
        Value::Str(body) => {
            let s = body.borrow();
            s.value.trim().parse::<i64>().map_err(|_| {
                WickError::value(format!("cannot parse '{}' as int", s.value), span)
            })
        }
        other => Err(WickError::ty(format!("cannot convert {} to int", other.type_name()), span)),
    }
}

pub fn as_float(v: &Value, span: Span) -> WickResult<f64> {
    match v {
        Value::Char(c) => Ok(*c as f64),
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        Value::Str(body) => {
            let s = body.borrow();
            s.value.trim().parse::<f64>().map_err(|_| {
                WickError::value(format!("cannot parse '{}' as float", s.value), span)
            })
        }
        other => Err(WickError::ty(format!("cannot convert {} to float", other.type_name()), span)),
    }
}

/// The canonical textual form (spec §4.1 "Conversions", "numeric→string by
/// canonical textual form"): reuses `Value`'s `Display`, since that impl
/// already implements integers-without-decimal and `%.16g` floats.
pub fn as_str(v: &Value) -> String {
    v.to_string()
}

/// Numeric nonzero ⇒ true (spec §4.5.6).
pub fn as_bool(v: &Value, span: Span) -> WickResult<bool> {
    match v {
        Value::Char(c) => Ok(*c != 0),
        Value::Int(i) => Ok(*i != 0),
        Value::Float(f) => Ok(*f != 0.0),
        other => Err(WickError::ty(format!("{} is not a valid condition (expected a numeric value)", other.type_name()), span)),
    }
}

/// Assigns `rhs` into a slot declared with the given type keyword, applying
/// the coercions spec §4.5.5 names: float→int truncates, any→string uses the
/// canonical textual form, any→{char,int,float} widens/narrows numerically.
pub fn coerce_to_declared_type(keyword: &str, rhs: &Value, span: Span) -> WickResult<Value> {
    match keyword {
        "char" => Ok(Value::Char(as_char(rhs, span)?)),
        "int" => Ok(Value::Int(as_int(rhs, span)?)),
        "float" => Ok(Value::Float(as_float(rhs, span)?)),
        "str" => Ok(Value::new_str(as_str(rhs))),
        "list" => match rhs {
            Value::List(_) => Ok(rhs.deep_copy()),
            other => Err(WickError::ty(format!("cannot assign {} to a list variable", other.type_name()), span)),
        },
        other => unreachable!("not a type keyword: {other}"),
    }
}
