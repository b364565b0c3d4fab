//! Operators over `Value` (spec §4.1 table). Every operator returns a
//! freshly allocated result or a `TypeError`; none mutate their operands.

use wick_common::{Span, WickError, WickResult};

use crate::convert::{as_bool, as_str};
use crate::value::{Rank, Value};

fn promote(lhs: &Value, rhs: &Value, span: Span) -> WickResult<Rank> {
    match (lhs.rank(), rhs.rank()) {
        (Some(a), Some(b)) => Ok(a.max(b)),
        _ => Err(WickError::ty(
            format!("unsupported operand types: {} and {}", lhs.type_name(), rhs.type_name()),
            span,
        )),
    }
}

fn numeric_binop(
    lhs: &Value,
    rhs: &Value,
    span: Span,
    int_op: impl Fn(i64, i64) -> WickResult<i64>,
    float_op: impl Fn(f64, f64) -> WickResult<f64>,
) -> WickResult<Value> {
    use crate::convert::{as_float, as_int};
    match promote(lhs, rhs, span)? {
        Rank::Char | Rank::Int => Ok(Value::Int(int_op(as_int(lhs, span)?, as_int(rhs, span)?)?)),
        Rank::Float => Ok(Value::Float(float_op(as_float(lhs, span)?, as_float(rhs, span)?)?)),
    }
}

pub fn add(lhs: &Value, rhs: &Value, span: Span) -> WickResult<Value> {
    match (lhs, rhs) {
        (Value::List(a), Value::List(b)) => {
            let mut items: Vec<Value> = a.borrow().value.iter().map(Value::deep_copy).collect();
            items.extend(b.borrow().value.iter().map(Value::deep_copy));
            Ok(Value::new_list(items))
        }
        (Value::Str(_), Value::Str(_)) => Ok(Value::new_str(format!("{}{}", as_str(lhs), as_str(rhs)))),
        (Value::Str(_), other) if other.rank().is_some() => Ok(Value::new_str(format!("{}{}", as_str(lhs), as_str(rhs)))),
        (other, Value::Str(_)) if other.rank().is_some() => Ok(Value::new_str(format!("{}{}", as_str(lhs), as_str(rhs)))),
        _ => numeric_binop(lhs, rhs, span, |a, b| Ok(a.wrapping_add(b)), |a, b| Ok(a + b)),
    }
}

pub fn sub(lhs: &Value, rhs: &Value, span: Span) -> WickResult<Value> {
    numeric_binop(lhs, rhs, span, |a, b| Ok(a.wrapping_sub(b)), |a, b| Ok(a - b))
}

pub fn mul(lhs: &Value, rhs: &Value, span: Span) -> WickResult<Value> {
    match (lhs, rhs) {
        (Value::Str(s), Value::Int(n)) | (Value::Int(n), Value::Str(s)) => Ok(Value::new_str(s.borrow().value.repeat((*n).max(0) as usize))),
        (Value::List(l), Value::Int(n)) | (Value::Int(n), Value::List(l)) => {
            let mut items = Vec::new();
            for _ in 0..(*n).max(0) {
                items.extend(l.borrow().value.iter().map(Value::deep_copy));
            }
            Ok(Value::new_list(items))
        }
        _ => numeric_binop(lhs, rhs, span, |a, b| Ok(a.wrapping_mul(b)), |a, b| Ok(a * b)),
    }
}

pub fn div(lhs: &Value, rhs: &Value, span: Span) -> WickResult<Value> {
    numeric_binop(
        lhs,
        rhs,
        span,
        |a, b| {
            if b == 0 {
                Err(WickError::zero_division("integer division by zero", span))
            } else {
                Ok(a / b)
            }
        },
        |a, b| Ok(a / b),
    )
}

/// Modulus follows the sign of the dividend for integers; for floats
/// matches IEEE `fmod` (spec §4.1).
pub fn rem(lhs: &Value, rhs: &Value, span: Span) -> WickResult<Value> {
    numeric_binop(
        lhs,
        rhs,
        span,
        |a, b| {
            if b == 0 {
                Err(WickError::zero_division("integer modulus by zero", span))
            } else {
                Ok(a % b)
            }
        },
        |a, b| Ok(a % b),
    )
}

pub fn neg(v: &Value, span: Span) -> WickResult<Value> {
    use crate::convert::{as_float, as_int};
    match v.rank().ok_or_else(|| WickError::ty(format!("cannot negate {}", v.type_name()), span))? {
        Rank::Char | Rank::Int => Ok(Value::Int(-as_int(v, span)?)),
        Rank::Float => Ok(Value::Float(-as_float(v, span)?)),
    }
}

/// Unary `+` returns a copy (spec §4.1).
pub fn pos(v: &Value, span: Span) -> WickResult<Value> {
    v.rank().ok_or_else(|| WickError::ty(format!("unary '+' does not admit {}", v.type_name()), span))?;
    Ok(v.clone())
}

/// Unary `!`: numeric to int 0/1 (logical not).
pub fn not(v: &Value, span: Span) -> WickResult<Value> {
    Ok(Value::Int(if as_bool(v, span)? { 0 } else { 1 }))
}

/// `==`/`!=`/`<>`: different types are always unequal, never a `TypeError`.
pub fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Char(a), Value::Char(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Char(a), Value::Int(b)) | (Value::Int(b), Value::Char(a)) => i64::from(*a) == *b,
        (Value::Char(a), Value::Float(b)) | (Value::Float(b), Value::Char(a)) => f64::from(*a) == *b,
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
        (Value::Str(a), Value::Str(b)) => a.borrow().value == b.borrow().value,
        (Value::List(a), Value::List(b)) => {
            let (a, b) = (a.borrow(), b.borrow());
            a.value.len() == b.value.len() && a.value.iter().zip(b.value.iter()).all(|(x, y)| values_equal(x, y))
        }
        (Value::None, Value::None) => true,
        _ => false,
    }
}

pub fn eq(lhs: &Value, rhs: &Value, _span: Span) -> WickResult<Value> {
    Ok(Value::Int(values_equal(lhs, rhs) as i64))
}

pub fn ne(lhs: &Value, rhs: &Value, _span: Span) -> WickResult<Value> {
    Ok(Value::Int(!values_equal(lhs, rhs) as i64))
}

fn numeric_cmp(lhs: &Value, rhs: &Value, span: Span) -> WickResult<std::cmp::Ordering> {
    use crate::convert::as_float;
    promote(lhs, rhs, span)?;
    as_float(lhs, span)?.partial_cmp(&as_float(rhs, span)?).ok_or_else(|| WickError::value("NaN is not orderable", span))
}

pub fn lt(lhs: &Value, rhs: &Value, span: Span) -> WickResult<Value> {
    Ok(Value::Int((numeric_cmp(lhs, rhs, span)? == std::cmp::Ordering::Less) as i64))
}

pub fn le(lhs: &Value, rhs: &Value, span: Span) -> WickResult<Value> {
    Ok(Value::Int((numeric_cmp(lhs, rhs, span)? != std::cmp::Ordering::Greater) as i64))
}

pub fn gt(lhs: &Value, rhs: &Value, span: Span) -> WickResult<Value> {
    Ok(Value::Int((numeric_cmp(lhs, rhs, span)? == std::cmp::Ordering::Greater) as i64))
}

pub fn ge(lhs: &Value, rhs: &Value, span: Span) -> WickResult<Value> {
    Ok(Value::Int((numeric_cmp(lhs, rhs, span)? != std::cmp::Ordering::Less) as i64))
}

/// `and`/`or` do not short-circuit in this language (spec §4.5.14, §9 open
/// question resolved in DESIGN.md): callers evaluate both operands before
/// calling these.
pub fn logical_and(lhs: &Value, rhs: &Value, span: Span) -> WickResult<Value> {
    Ok(Value::Int((as_bool(lhs, span)? && as_bool(rhs, span)?) as i64))
}

pub fn logical_or(lhs: &Value, rhs: &Value, span: Span) -> WickResult<Value> {
    Ok(Value::Int((as_bool(lhs, span)? || as_bool(rhs, span)?) as i64))
}

/// `in`: left tested with `==` against each element of the right sequence.
pub fn contains(needle: &Value, haystack: &Value, span: Span) -> WickResult<Value> {
    match haystack {
        Value::List(items) => Ok(Value::Int(items.borrow().value.iter().any(|item| values_equal(needle, item)) as i64)),
        Value::Str(body) => {
            let needle_str = as_str(needle);
            Ok(Value::Int(body.borrow().value.contains(&needle_str) as i64))
        }
        other => Err(WickError::ty(format!("'in' requires a sequence, found {}", other.type_name()), span)),
    }
}

fn normalize_index(raw: i64, len: usize, span: Span) -> WickResult<usize> {
    let len = len as i64;
    let idx = if raw < 0 { raw + len } else { raw };
    if idx < 0 || idx >= len {
        Err(WickError::index(format!("index {raw} out of range for length {len}"), span))
    } else {
        Ok(idx as usize)
    }
}

pub fn index(seq: &Value, i: i64, span: Span) -> WickResult<Value> {
    match seq {
        Value::Str(body) => {
            let bytes = body.borrow().value.as_bytes().to_vec();
            let idx = normalize_index(i, bytes.len(), span)?;
            Ok(Value::Char(bytes[idx]))
        }
        Value::List(items) => {
            let items = items.borrow();
            let idx = normalize_index(i, items.value.len(), span)?;
            Ok(items.value[idx].deep_copy())
        }
        other => Err(WickError::ty(format!("cannot index {}", other.type_name()), span)),
    }
}

fn clamp_slice_bound(raw: i64, len: usize) -> usize {
    let len_i = len as i64;
    let idx = if raw < 0 { raw + len_i } else { raw };
    idx.clamp(0, len_i) as usize
}

pub fn slice(seq: &Value, a: i64, b: i64, span: Span) -> WickResult<Value> {
    match seq {
        Value::Str(body) => {
            let bytes = body.borrow().value.as_bytes().to_vec();
            let start = clamp_slice_bound(a, bytes.len());
            let end = clamp_slice_bound(b, bytes.len());
            if start >= end {
                return Ok(Value::new_str(String::new()));
            }
            Ok(Value::new_str(String::from_utf8_lossy(&bytes[start..end]).into_owned()))
        }
        Value::List(items) => {
            let items = items.borrow();
            let start = clamp_slice_bound(a, items.value.len());
            let end = clamp_slice_bound(b, items.value.len());
            if start >= end {
                return Ok(Value::new_list(Vec::new()));
            }
            Ok(Value::new_list(items.value[start..end].iter().map(Value::deep_copy).collect()))
        }
        other => Err(WickError::ty(format!("cannot slice {}", other.type_name()), span)),
    }
}

/// Mutates a list element in place (spec §9 resolved open question: extends
/// assignment targets to `identifier[expr] = rhs`). Strings stay immutable.
pub fn set_index(seq: &Value, i: i64, value: Value, span: Span) -> WickResult<()> {
    match seq {
        Value::List(items) => {
            let mut items = items.borrow_mut();
            let idx = normalize_index(i, items.value.len(), span)?;
            items.value[idx] = value;
            Ok(())
        }
        other => Err(WickError::ty(format!("cannot assign into an index of {}", other.type_name()), span)),
    }
}

pub fn len(seq: &Value, span: Span) -> WickResult<i64> {
    match seq {
        Value::Str(body) => Ok(body.borrow().value.len() as i64),
        Value::List(items) => Ok(items.borrow().value.len() as i64),
        other => Err(WickError::ty(format!("cannot take len of {}", other.type_name()), span)),
    }
}

/// Used by `for id in expr` (spec §4.5.9) and the `in` operator's iteration.
pub fn item(seq: &Value, i: i64, span: Span) -> WickResult<Value> {
    index(seq, i, span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wick_common::Position;

    fn span() -> Span {
        Span::single(Position::start(), 0)
    }

    #[test]
    fn mixed_numeric_promotes_to_max_rank() {
        let result = add(&Value::Int(3), &Value::Float(2.0), span()).unwrap();
        assert!(matches!(result, Value::Float(x) if x == 5.0));
    }

    #[test]
    fn string_plus_numeric_uses_textual_form() {
        let result = add(&Value::new_str("n=".to_string()), &Value::Int(5), span()).unwrap();
        assert_eq!(result.to_string(), "n=5");
    }

    #[test]
    fn different_types_are_unequal_never_a_type_error() {
        let result = eq(&Value::Int(1), &Value::new_str("1".to_string()), span()).unwrap();
        assert!(matches!(result, Value::Int(0)));
    }

    #[test]
    fn integer_division_by_zero_is_zero_division_error() {
        let err = div(&Value::Int(1), &Value::Int(0), span()).unwrap_err();
        assert!(matches!(err, WickError::ZeroDivisionError { .. }));
    }

    #[test]
    fn negative_index_counts_from_end() {
        let list = Value::new_list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let result = index(&list, -1, span()).unwrap();
        assert!(matches!(result, Value::Int(3)));
    }

    #[test]
    fn slice_clamps_out_of_range_bounds() {
        let list = Value::new_list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let result = slice(&list, 1, 100, span()).unwrap();
        assert_eq!(result.to_string(), "[2, 3]");
    }

    #[test]
    fn list_concat_deep_copies_both_sides() {
        let a = Value::new_list(vec![Value::Int(1)]);
        let b = Value::new_list(vec![Value::Int(2)]);
        let combined = add(&a, &b, span()).unwrap();
        if let Value::List(items) = &combined {
            items.borrow_mut().value[0] = Value::Int(99);
        }
        assert_eq!(a.to_string(), "[1]");
    }
}
