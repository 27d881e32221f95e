//! 运算符语义：算术、比较、成员测试

use std::cmp::Ordering;

use super::error::{RuntimeError, RuntimeResult};
use super::limits::Budget;
use super::value::{position_eq, Value, NESTING_LIMIT};
use crate::compiler::parser::{BinaryOp, CompareOp, UnaryOp};
use crate::failure::Exception;

/// 数值操作数（bool 提升为 int）
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

fn num(value: &Value) -> Option<Num> {
    match value {
        Value::Int(i) => Some(Num::Int(*i)),
        Value::Bool(b) => Some(Num::Int(*b as i64)),
        Value::Float(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

pub fn binary(op: BinaryOp, left: &Value, right: &Value, budget: &Budget) -> RuntimeResult<Value> {
    if let (Some(a), Some(b)) = (num(left), num(right)) {
        return arithmetic(op, a, b);
    }
    match op {
        BinaryOp::Add => concat(left, right, budget),
        BinaryOp::Mul => match (left, right) {
            (seq, count) | (count, seq) if count.as_int().is_some() && !seq.is_number() => {
                repeat(seq, count.as_int().unwrap_or_default(), budget)
            }
            (Value::Str(_) | Value::List(_) | Value::Tuple(_), other) => {
                Err(RuntimeError::type_error(format!(
                    "can't multiply sequence by non-int of type '{}'",
                    other.type_name()
                )))
            }
            _ => Err(unsupported(op, left, right)),
        },
        _ => Err(unsupported(op, left, right)),
    }
}

fn arithmetic(op: BinaryOp, a: Num, b: Num) -> RuntimeResult<Value> {
    if let (Num::Int(x), Num::Int(y)) = (a, b) {
        return int_arithmetic(op, x, y);
    }
    let x = match a {
        Num::Int(i) => i as f64,
        Num::Float(f) => f,
    };
    let y = match b {
        Num::Int(i) => i as f64,
        Num::Float(f) => f,
    };
    let result = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => {
            if y == 0.0 {
                return Err(RuntimeError::zero_division("float division by zero"));
            }
            x / y
        }
        BinaryOp::FloorDiv => {
            if y == 0.0 {
                return Err(RuntimeError::zero_division("float floor division by zero"));
            }
            (x / y).floor()
        }
        BinaryOp::Mod => {
            if y == 0.0 {
                return Err(RuntimeError::zero_division("float modulo"));
            }
            let r = x % y;
            if r != 0.0 && (r < 0.0) != (y < 0.0) {
                r + y
            } else {
                r
            }
        }
        BinaryOp::Pow => {
            if x == 0.0 && y < 0.0 {
                return Err(RuntimeError::zero_division(
                    "0.0 cannot be raised to a negative power",
                ));
            }
            if x < 0.0 && y.fract() != 0.0 {
                return Err(RuntimeError::value_error("math domain error"));
            }
            x.powf(y)
        }
    };
    if result.is_infinite() && x.is_finite() && y.is_finite() {
        return Err(RuntimeError::new(
            Exception::OverflowError,
            "(34, 'Numerical result out of range')",
        ));
    }
    Ok(Value::Float(result))
}

fn int_arithmetic(op: BinaryOp, x: i64, y: i64) -> RuntimeResult<Value> {
    let result = match op {
        BinaryOp::Add => x.checked_add(y),
        BinaryOp::Sub => x.checked_sub(y),
        BinaryOp::Mul => x.checked_mul(y),
        BinaryOp::Div => {
            if y == 0 {
                return Err(RuntimeError::zero_division("division by zero"));
            }
            return Ok(Value::Float(x as f64 / y as f64));
        }
        BinaryOp::FloorDiv => {
            if y == 0 {
                return Err(RuntimeError::zero_division(
                    "integer division or modulo by zero",
                ));
            }
            x.checked_div(y).map(|q| {
                if x % y != 0 && ((x < 0) != (y < 0)) {
                    q - 1
                } else {
                    q
                }
            })
        }
        BinaryOp::Mod => {
            if y == 0 {
                return Err(RuntimeError::zero_division(
                    "integer division or modulo by zero",
                ));
            }
            x.checked_rem(y).map(|r| {
                if r != 0 && ((r < 0) != (y < 0)) {
                    r + y
                } else {
                    r
                }
            })
        }
        BinaryOp::Pow => {
            if y < 0 {
                if x == 0 {
                    return Err(RuntimeError::zero_division(
                        "0.0 cannot be raised to a negative power",
                    ));
                }
                return Ok(Value::Float((x as f64).powf(y as f64)));
            }
            u32::try_from(y).ok().and_then(|e| x.checked_pow(e))
        }
    };
    result.map(Value::Int).ok_or_else(RuntimeError::overflow)
}

fn concat(left: &Value, right: &Value, budget: &Budget) -> RuntimeResult<Value> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => {
            budget.check_string(a.len() + b.len())?;
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(a);
            joined.push_str(b);
            Ok(Value::str(joined))
        }
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            budget.check_collection(items.len())?;
            Ok(Value::list(items))
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            let mut items: Vec<Value> = a.iter().cloned().collect();
            items.extend(b.iter().cloned());
            budget.check_collection(items.len())?;
            Ok(Value::tuple(items))
        }
        (Value::Str(_) | Value::List(_) | Value::Tuple(_), other) => {
            Err(RuntimeError::type_error(format!(
                "can only concatenate {} (not \"{}\") to {}",
                left.type_name(),
                other.type_name(),
                left.type_name()
            )))
        }
        _ => Err(unsupported(BinaryOp::Add, left, right)),
    }
}

fn repeat(seq: &Value, count: i64, budget: &Budget) -> RuntimeResult<Value> {
    let count = count.max(0) as usize;
    match seq {
        Value::Str(s) => {
            let len = s.len().checked_mul(count).ok_or_else(RuntimeError::overflow)?;
            budget.check_string(len)?;
            Ok(Value::str(s.repeat(count)))
        }
        Value::List(items) => {
            let items = items.borrow();
            let len = items.len().checked_mul(count).ok_or_else(RuntimeError::overflow)?;
            budget.check_collection(len)?;
            Ok(Value::list(items.iter().cloned().cycle().take(len).collect()))
        }
        Value::Tuple(items) => {
            let len = items.len().checked_mul(count).ok_or_else(RuntimeError::overflow)?;
            budget.check_collection(len)?;
            Ok(Value::tuple(items.iter().cloned().cycle().take(len).collect()))
        }
        other => Err(RuntimeError::type_error(format!(
            "unsupported operand type(s) for *: '{}' and 'int'",
            other.type_name()
        ))),
    }
}

pub fn unary(op: UnaryOp, operand: &Value) -> RuntimeResult<Value> {
    match (op, operand) {
        (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Neg, value) if value.as_int().is_some() => value
            .as_int()
            .and_then(i64::checked_neg)
            .map(Value::Int)
            .ok_or_else(RuntimeError::overflow),
        (UnaryOp::Pos, Value::Float(f)) => Ok(Value::Float(*f)),
        (UnaryOp::Pos, value) if value.as_int().is_some() => {
            Ok(Value::Int(value.as_int().unwrap_or_default()))
        }
        (op, value) => {
            let symbol = if op == UnaryOp::Neg { "-" } else { "+" };
            Err(RuntimeError::type_error(format!(
                "bad operand type for unary {symbol}: '{}'",
                value.type_name()
            )))
        }
    }
}

pub fn compare(op: CompareOp, left: &Value, right: &Value) -> RuntimeResult<bool> {
    let ordering = |symbol: &str| compare_values(left, right, symbol);
    Ok(match op {
        CompareOp::Eq => left.py_eq(right)?,
        CompareOp::NotEq => !left.py_eq(right)?,
        CompareOp::Lt => ordering("<")? == Some(Ordering::Less),
        CompareOp::Gt => ordering(">")? == Some(Ordering::Greater),
        CompareOp::LtEq => matches!(ordering("<=")?, Some(Ordering::Less | Ordering::Equal)),
        CompareOp::GtEq => matches!(ordering(">=")?, Some(Ordering::Greater | Ordering::Equal)),
        CompareOp::In => contains(right, left)?,
        CompareOp::NotIn => !contains(right, left)?,
        CompareOp::Is => left.is_identical(right),
        CompareOp::IsNot => !left.is_identical(right),
    })
}

/// 有序比较；`None` 表示无序（NaN）
pub fn compare_values(left: &Value, right: &Value, symbol: &str) -> RuntimeResult<Option<Ordering>> {
    compare_at(left, right, symbol, 0)
}

fn compare_at(left: &Value, right: &Value, symbol: &str, depth: usize) -> RuntimeResult<Option<Ordering>> {
    if depth > NESTING_LIMIT {
        return Err(RuntimeError::new(
            Exception::RecursionError,
            "maximum recursion depth exceeded in comparison",
        ));
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) => {
            compare_sequences(&a.borrow().clone(), &b.borrow().clone(), symbol, depth + 1)
        }
        (Value::Tuple(a), Value::Tuple(b)) => compare_sequences(a, b, symbol, depth + 1),
        (a, b) if a.is_number() && b.is_number() => match (a.as_int(), b.as_int()) {
            (Some(x), Some(y)) => Ok(Some(x.cmp(&y))),
            _ => Ok(a
                .as_float()
                .zip(b.as_float())
                .and_then(|(x, y)| x.partial_cmp(&y))),
        },
        _ => Err(RuntimeError::type_error(format!(
            "'{symbol}' not supported between instances of '{}' and '{}'",
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn compare_sequences(a: &[Value], b: &[Value], symbol: &str, depth: usize) -> RuntimeResult<Option<Ordering>> {
    for (x, y) in a.iter().zip(b) {
        if !x.py_eq(y)? {
            return compare_at(x, y, symbol, depth);
        }
    }
    Ok(Some(a.len().cmp(&b.len())))
}

/// `item in container`
pub fn contains(container: &Value, item: &Value) -> RuntimeResult<bool> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(&**needle)),
            other => Err(RuntimeError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::List(items) => Ok(position_eq(&items.borrow(), item)?.is_some()),
        Value::Tuple(items) => Ok(position_eq(items, item)?.is_some()),
        Value::Dict(dict) => dict.borrow().contains(item),
        Value::Range(range) => Ok(match item {
            Value::Float(f) if f.fract() == 0.0 => range.contains(*f as i64),
            other => other.as_int().is_some_and(|i| range.contains(i)),
        }),
        other => Err(RuntimeError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::limits::CancelToken;
    use bhasha_config::LimitConfig;

    fn budget() -> Budget {
        Budget::new(LimitConfig::default(), CancelToken::new())
    }

    fn eval(op: BinaryOp, a: Value, b: Value) -> RuntimeResult<Value> {
        binary(op, &a, &b, &budget())
    }

    #[test]
    fn test_int_arithmetic() {
        assert!(eval(BinaryOp::Add, Value::Int(2), Value::Int(3)).unwrap().py_eq(&Value::Int(5)).unwrap());
        assert!(eval(BinaryOp::Div, Value::Int(7), Value::Int(2)).unwrap().py_eq(&Value::Float(3.5)).unwrap());
        assert!(eval(BinaryOp::FloorDiv, Value::Int(-7), Value::Int(2)).unwrap().py_eq(&Value::Int(-4)).unwrap());
        assert!(eval(BinaryOp::Mod, Value::Int(-7), Value::Int(3)).unwrap().py_eq(&Value::Int(2)).unwrap());
        assert!(eval(BinaryOp::Pow, Value::Int(2), Value::Int(10)).unwrap().py_eq(&Value::Int(1024)).unwrap());
        assert!(eval(BinaryOp::Pow, Value::Int(2), Value::Int(-1)).unwrap().py_eq(&Value::Float(0.5)).unwrap());
    }

    #[test]
    fn test_division_by_zero_messages() {
        let err = eval(BinaryOp::Div, Value::Int(1), Value::Int(0)).unwrap_err();
        assert_eq!(err.exception, Exception::ZeroDivisionError);
        assert_eq!(err.message, "division by zero");
        let err = eval(BinaryOp::Div, Value::Float(1.0), Value::Int(0)).unwrap_err();
        assert_eq!(err.message, "float division by zero");
        let err = eval(BinaryOp::Mod, Value::Int(1), Value::Int(0)).unwrap_err();
        assert_eq!(err.message, "integer division or modulo by zero");
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = eval(BinaryOp::Mul, Value::Int(i64::MAX), Value::Int(2)).unwrap_err();
        assert_eq!(err.exception, Exception::OverflowError);
    }

    #[test]
    fn test_string_concat_errors() {
        let err = eval(BinaryOp::Add, Value::str("a"), Value::Int(1)).unwrap_err();
        assert_eq!(err.message, "can only concatenate str (not \"int\") to str");
        let err = eval(BinaryOp::Add, Value::Int(1), Value::str("a")).unwrap_err();
        assert_eq!(err.message, "unsupported operand type(s) for +: 'int' and 'str'");
    }

    #[test]
    fn test_sequence_repetition() {
        let v = eval(BinaryOp::Mul, Value::str("ab"), Value::Int(3)).unwrap();
        assert_eq!(v.to_display().unwrap(), "ababab");
        let v = eval(BinaryOp::Mul, Value::Int(2), Value::list(vec![Value::Int(0)])).unwrap();
        assert_eq!(v.repr().unwrap(), "[0, 0]");
        let err = eval(BinaryOp::Mul, Value::str("a"), Value::str("b")).unwrap_err();
        assert!(err.message.contains("non-int of type 'str'"));
    }

    #[test]
    fn test_repetition_respects_limits() {
        let err = eval(BinaryOp::Mul, Value::str("x"), Value::Int(10_000_000)).unwrap_err();
        assert_eq!(err.exception, Exception::MemoryError);
    }

    #[test]
    fn test_comparisons() {
        assert!(compare(CompareOp::Lt, &Value::Int(1), &Value::Float(1.5)).unwrap());
        assert!(compare(CompareOp::Lt, &Value::str("a"), &Value::str("b")).unwrap());
        let a = Value::tuple(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::tuple(vec![Value::Int(1), Value::Int(3)]);
        assert!(compare(CompareOp::Lt, &a, &b).unwrap());
        let err = compare(CompareOp::Lt, &Value::Int(1), &Value::str("a")).unwrap_err();
        assert_eq!(
            err.message,
            "'<' not supported between instances of 'int' and 'str'"
        );
    }

    #[test]
    fn test_self_containing_list_ordering_is_bounded() {
        let a = Value::list(vec![Value::Int(1)]);
        let b = Value::list(vec![Value::Int(1)]);
        if let (Value::List(x), Value::List(y)) = (&a, &b) {
            x.borrow_mut().push(a.clone());
            y.borrow_mut().push(b.clone());
        }
        let err = compare(CompareOp::Lt, &a, &b).unwrap_err();
        assert_eq!(err.exception, Exception::RecursionError);
        let err = contains(&Value::tuple(vec![a.clone()]), &b).unwrap_err();
        assert_eq!(err.exception, Exception::RecursionError);
        if let (Value::List(x), Value::List(y)) = (&a, &b) {
            x.borrow_mut().clear();
            y.borrow_mut().clear();
        }
    }

    #[test]
    fn test_membership() {
        let list = Value::list(vec![Value::Int(1), Value::str("x")]);
        assert!(contains(&list, &Value::str("x")).unwrap());
        assert!(contains(&Value::str("नमस्ते"), &Value::str("नम")).unwrap());
        assert!(contains(&Value::Int(3), &Value::Int(3)).is_err());
    }

    #[test]
    fn test_unary() {
        assert!(unary(UnaryOp::Neg, &Value::Int(3)).unwrap().py_eq(&Value::Int(-3)).unwrap());
        assert!(unary(UnaryOp::Not, &Value::str("")).unwrap().py_eq(&Value::Bool(true)).unwrap());
        let err = unary(UnaryOp::Neg, &Value::str("a")).unwrap_err();
        assert_eq!(err.message, "bad operand type for unary -: 'str'");
    }
}
