//! The dynamic value system (spec §3, §4.1).
//!
//! `Value`'s heap variants are `Rc<RefCell<_>>` rather than a hand-rolled
//! refcounted cell: `Rc::clone` already is `incref`, and `Drop` already is
//! `decref`-to-zero. Each heap payload is wrapped in a small `*Body` struct
//! carrying a registry id so that `Drop` can deregister it from the optional
//! live-object table (spec §3 "optional debug registry") — this is what
//! lets the registry mirror Rust's own reference counting instead of
//! duplicating it by hand.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use wick_lexer::ReaderPosition;

use crate::registry;

#[derive(Debug)]
pub struct StrBody {
    id: u64,
    pub value: String,
}

impl Drop for StrBody {
    fn drop(&mut self) {
        registry::deregister(self.id);
    }
}

#[derive(Debug)]
pub struct ListBody {
    id: u64,
    pub value: Vec<Value>,
}

impl Drop for ListBody {
    fn drop(&mut self) {
        registry::deregister(self.id);
    }
}

#[derive(Debug)]
pub struct PositionBody {
    id: u64,
    pub value: ReaderPosition,
}

impl Drop for PositionBody {
    fn drop(&mut self) {
        registry::deregister(self.id);
    }
}

/// A value in the language's dynamic type system (spec §3 `Object`). The
/// `list-node` tag from spec §3 has no separate representation here: a node's
/// only job ("single owning reference to any value, never user-visible") is
/// exactly what a `Value` stored directly in `ListBody::value` already is.
#[derive(Debug, Clone)]
pub enum Value {
    Char(u8),
    Int(i64),
    Float(f64),
    Str(Rc<RefCell<StrBody>>),
    List(Rc<RefCell<ListBody>>),
    Position(Rc<PositionBody>),
    None,
}

/// Numeric rank used by binary-operator type coercion (spec §3, §4.1):
/// `char(0) < int(1) < float(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    Char = 0,
    Int = 1,
    Float = 2,
}

impl Value {
    pub fn new_str(value: String) -> Value {
        let id = registry::next_id();
        let body = Rc::new(RefCell::new(StrBody { id, value }));
        registry::register_str(id, Rc::downgrade(&body));
        Value::Str(body)
    }

    pub fn new_list(value: Vec<Value>) -> Value {
        let id = registry::next_id();
        let body = Rc::new(RefCell::new(ListBody { id, value }));
        registry::register_list(id, Rc::downgrade(&body));
        Value::List(body)
    }

    pub fn new_position(value: ReaderPosition) -> Value {
        let id = registry::next_id();
        let body = Rc::new(PositionBody { id, value });
        registry::register_position(id, Rc::downgrade(&body));
        Value::Position(body)
    }

    /// The default value for a declared type with no initializer (spec
    /// §4.5.5): numeric 0, empty string/list.
    pub fn default_for_type_keyword(keyword: &str) -> Value {
        match keyword {
            "char" => Value::Char(0),
            "int" => Value::Int(0),
            "float" => Value::Float(0.0),
            "str" => Value::new_str(String::new()),
            "list" => Value::new_list(Vec::new()),
            other => unreachable!("not a type keyword: {other}"),
        }
    }

    pub fn rank(&self) -> Option<Rank> {
        match self {
            Value::Char(_) => Some(Rank::Char),
            Value::Int(_) => Some(Rank::Int),
            Value::Float(_) => Some(Rank::Float),
            _ => None,
        }
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Str(_) | Value::List(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Char(_) => "char",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Position(_) => "position",
            Value::None => "none",
        }
    }

    /// Every heap payload is rebuilt into a fresh allocation sharing no
    /// mutable interior with `self` (spec §3, §4.1 "Reference counting",
    /// testable property 4 in §8). Scalars are `Copy` so this is a no-op for
    /// them. This is what lets list assignment/argument passing/concat never
    /// need cycle detection (spec §4.1 "Cycles are not supported").
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Char(c) => Value::Char(*c),
            Value::Int(i) => Value::Int(*i),
            Value::Float(f) => Value::Float(*f),
            Value::Str(body) => Value::new_str(body.borrow().value.clone()),
            Value::List(body) => {
                let copied: Vec<Value> = body.borrow().value.iter().map(Value::deep_copy).collect();
                Value::new_list(copied)
            }
            Value::Position(body) => Value::new_position(body.value.clone()),
            Value::None => Value::None,
        }
    }
}

/// General textual form (spec §4.1 "Print"): char glyph, int decimal, float
/// `%.16g`-equivalent, string raw, list `[e1, e2, …]`, none literally `none`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Char(c) => write!(f, "{}", *c as char),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{}", format_float_general(*x)),
            Value::Str(body) => write!(f, "{}", body.borrow().value),
            Value::List(body) => {
                write!(f, "[")?;
                for (i, item) in body.borrow().value.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Position(_) => write!(f, "<position>"),
            Value::None => write!(f, "none"),
        }
    }
}

/// `%.16g`-style general formatting: up to 16 significant digits, trailing
/// zeros trimmed, falling back to scientific notation outside `[1e-4, 1e16)`
/// the way printf's `%g` does.
pub fn format_float_general(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".to_string() } else { "-inf".to_string() };
    }
    if value == 0.0 {
        return "0".to_string();
    }

    const PRECISION: i32 = 16;
    let exponent = value.abs().log10().floor() as i32;

    if exponent < -4 || exponent >= PRECISION {
        let mantissa_digits = (PRECISION - 1).max(0) as usize;
        let formatted = format!("{:.*e}", mantissa_digits, value);
        trim_scientific(&formatted)
    } else {
        let decimals = (PRECISION - 1 - exponent).max(0) as usize;
        let formatted = format!("{:.*}", decimals, value);
        trim_fixed(&formatted)
    }
}

fn trim_fixed(s: &str) -> String {
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0');
        trimmed.trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

fn trim_scientific(s: &str) -> String {
    match s.find('e') {
        Some(pos) => {
            let (mantissa, exp) = s.split_at(pos);
            format!("{}e{}", trim_fixed(mantissa), &exp[1..])
        }
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_copy_of_list_is_independent() {
        let inner = Value::new_list(vec![Value::Int(1), Value::Int(2)]);
        let copy = inner.deep_copy();
        if let (Value::List(a), Value::List(b)) = (&inner, &copy) {
            b.borrow_mut().value[0] = Value::Int(99);
            assert!(matches!(a.borrow().value[0], Value::Int(1)));
        } else {
            unreachable!();
        }
    }

    #[test]
    fn float_general_formatting_trims_trailing_zeros() {
        assert_eq!(format_float_general(5.0), "5");
        assert_eq!(format_float_general(2.5), "2.5");
        assert_eq!(format_float_general(0.0), "0");
    }

    #[test]
    fn display_of_list_matches_spec_format() {
        let list = Value::new_list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(list.to_string(), "[1, 2, 3]");
    }
}
