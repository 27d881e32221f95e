//! 内建函数
//!
//! 沙箱里只有这些全局可用的内建；没有文件系统、没有模块导入。

pub mod methods;

use std::cmp::Ordering;
use std::rc::Rc;

use super::error::{RuntimeError, RuntimeResult};
use super::interpreter::{Interpreter, Kwargs, ValueIter};
use super::object::{Class, Instance};
use super::operators::{self, compare_values};
use super::value::{repr_str, DictValue, RangeValue, Value};
use crate::compiler::parser::BinaryOp;
use crate::failure::Exception;
use crate::vocab::normalize_numerals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Print,
    Input,
    Len,
    Range,
    Int,
    Float,
    Str,
    Bool,
    List,
    Tuple,
    Dict,
    Abs,
    Min,
    Max,
    Sum,
    Sorted,
    Reversed,
    Enumerate,
    Zip,
    Type,
    Isinstance,
    Round,
    Open,
    Object,
    Repr,
    // 只通过 type() 得到，不按名字绑定
    NoneType,
    Function,
}

/// 按名字可见的内建
const BUILTINS: &[(&str, Builtin)] = &[
    ("print", Builtin::Print),
    ("input", Builtin::Input),
    ("len", Builtin::Len),
    ("range", Builtin::Range),
    ("int", Builtin::Int),
    ("float", Builtin::Float),
    ("str", Builtin::Str),
    ("bool", Builtin::Bool),
    ("list", Builtin::List),
    ("tuple", Builtin::Tuple),
    ("dict", Builtin::Dict),
    ("abs", Builtin::Abs),
    ("min", Builtin::Min),
    ("max", Builtin::Max),
    ("sum", Builtin::Sum),
    ("sorted", Builtin::Sorted),
    ("reversed", Builtin::Reversed),
    ("enumerate", Builtin::Enumerate),
    ("zip", Builtin::Zip),
    ("type", Builtin::Type),
    ("isinstance", Builtin::Isinstance),
    ("round", Builtin::Round),
    ("open", Builtin::Open),
    ("object", Builtin::Object),
    ("repr", Builtin::Repr),
];

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        BUILTINS.iter().find(|(n, _)| *n == name).map(|(_, b)| *b)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::NoneType => "NoneType",
            Builtin::Function => "function",
            other => BUILTINS
                .iter()
                .find(|(_, b)| b == other)
                .map(|(n, _)| *n)
                .unwrap_or("builtin"),
        }
    }

    /// 作为类型对象打印为 `<class '...'>`
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            Builtin::Int
                | Builtin::Float
                | Builtin::Str
                | Builtin::Bool
                | Builtin::List
                | Builtin::Tuple
                | Builtin::Dict
                | Builtin::Range
                | Builtin::Type
                | Builtin::Object
                | Builtin::NoneType
                | Builtin::Function
        )
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        BUILTINS.iter().map(|(n, _)| *n)
    }
}

// ===== 参数检查 =====

pub(crate) fn check_arity(name: &str, args: &[Value], min: usize, max: usize) -> RuntimeResult<()> {
    let given = args.len();
    if (min..=max).contains(&given) {
        return Ok(());
    }
    let message = if min == 1 && max == 1 {
        format!("{name}() takes exactly one argument ({given} given)")
    } else if min == 0 && max == 0 {
        format!("{name}() takes no arguments ({given} given)")
    } else if given < min {
        let s = if min == 1 { "" } else { "s" };
        format!("{name} expected at least {min} argument{s}, got {given}")
    } else {
        let s = if max == 1 { "" } else { "s" };
        format!("{name} expected at most {max} argument{s}, got {given}")
    };
    Err(RuntimeError::type_error(message))
}

pub(crate) fn no_kwargs(name: &str, kwargs: &Kwargs) -> RuntimeResult<()> {
    if kwargs.is_empty() {
        Ok(())
    } else {
        Err(RuntimeError::type_error(format!(
            "{name}() takes no keyword arguments"
        )))
    }
}

pub(crate) fn take_kwarg(kwargs: &mut Kwargs, key: &str) -> Option<Value> {
    let index = kwargs.iter().position(|(k, _)| k == key)?;
    Some(kwargs.remove(index).1)
}

pub(crate) fn reject_unknown(name: &str, kwargs: &Kwargs) -> RuntimeResult<()> {
    match kwargs.first() {
        None => Ok(()),
        Some((key, _)) => Err(RuntimeError::type_error(format!(
            "'{key}' is an invalid keyword argument for {name}()"
        ))),
    }
}

fn int_arg(value: &Value) -> RuntimeResult<i64> {
    value.as_int().ok_or_else(|| {
        RuntimeError::type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            value.type_name()
        ))
    })
}

/// 展开可迭代对象（受集合大小上限约束）
pub(crate) fn collect_items(interp: &Interpreter, value: &Value) -> RuntimeResult<Vec<Value>> {
    if let Value::Range(range) = value {
        interp.budget().check_collection(range.len())?;
    }
    let items: Vec<Value> = ValueIter::new(value)?.collect();
    interp.budget().check_collection(items.len())?;
    Ok(items)
}

/// 按键排序，稳定；`reverse` 不破坏稳定性
pub(crate) fn sort_values(
    interp: &mut Interpreter,
    items: Vec<Value>,
    key: Option<Value>,
    reverse: bool,
) -> RuntimeResult<Vec<Value>> {
    let keys: Vec<Value> = match key {
        Some(key) if !matches!(key, Value::None) => items
            .iter()
            .map(|item| interp.call_value(&key, vec![item.clone()], Vec::new()))
            .collect::<RuntimeResult<_>>()?,
        _ => items.clone(),
    };
    let mut order: Vec<usize> = (0..items.len()).collect();
    let mut error = None;
    order.sort_by(|&a, &b| {
        if error.is_some() {
            return Ordering::Equal;
        }
        match compare_values(&keys[a], &keys[b], "<") {
            Ok(Some(ord)) if reverse => ord.reverse(),
            Ok(Some(ord)) => ord,
            Ok(None) => Ordering::Equal,
            Err(e) => {
                error = Some(e);
                Ordering::Equal
            }
        }
    });
    if let Some(e) = error {
        return Err(e);
    }
    Ok(order.into_iter().map(|i| items[i].clone()).collect())
}

pub fn call_builtin(
    interp: &mut Interpreter,
    builtin: Builtin,
    args: Vec<Value>,
    mut kwargs: Kwargs,
) -> RuntimeResult<Value> {
    let name = builtin.name();
    match builtin {
        Builtin::Print => {
            let sep = text_kwarg(&mut kwargs, "sep", " ")?;
            let end = text_kwarg(&mut kwargs, "end", "\n")?;
            take_kwarg(&mut kwargs, "flush");
            reject_unknown(name, &kwargs)?;
            let mut line = String::new();
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    line.push_str(&sep);
                }
                line.push_str(&interp.display(arg)?);
            }
            line.push_str(&end);
            interp.write(&line)?;
            Ok(Value::None)
        }
        Builtin::Input => {
            no_kwargs(name, &kwargs)?;
            check_arity(name, &args, 0, 1)?;
            if let Some(prompt) = args.first() {
                let prompt = interp.display(prompt)?;
                interp.write(&prompt)?;
            }
            Ok(Value::str(interp.read_line()?))
        }
        Builtin::Len => {
            no_kwargs(name, &kwargs)?;
            check_arity(name, &args, 1, 1)?;
            let len = match &args[0] {
                Value::Str(s) => s.chars().count(),
                Value::List(items) => items.borrow().len(),
                Value::Tuple(items) => items.len(),
                Value::Dict(dict) => dict.borrow().len(),
                Value::Range(range) => range.len(),
                other => {
                    return Err(RuntimeError::type_error(format!(
                        "object of type '{}' has no len()",
                        other.type_name()
                    )))
                }
            };
            Ok(Value::Int(len as i64))
        }
        Builtin::Range => {
            no_kwargs(name, &kwargs)?;
            check_arity(name, &args, 1, 3)?;
            let ints = args.iter().map(int_arg).collect::<RuntimeResult<Vec<_>>>()?;
            let (start, stop, step) = match ints.as_slice() {
                [stop] => (0, *stop, 1),
                [start, stop] => (*start, *stop, 1),
                [start, stop, step] => (*start, *stop, *step),
                _ => unreachable!("arity checked above"),
            };
            if step == 0 {
                return Err(RuntimeError::value_error("range() arg 3 must not be zero"));
            }
            Ok(Value::Range(RangeValue { start, stop, step }))
        }
        Builtin::Int => {
            no_kwargs(name, &kwargs)?;
            check_arity(name, &args, 0, 2)?;
            to_int(&args)
        }
        Builtin::Float => {
            no_kwargs(name, &kwargs)?;
            check_arity(name, &args, 0, 1)?;
            to_float(args.first())
        }
        Builtin::Str => {
            no_kwargs(name, &kwargs)?;
            check_arity(name, &args, 0, 1)?;
            match args.first() {
                Some(value) => Ok(Value::str(interp.display(value)?)),
                None => Ok(Value::str("")),
            }
        }
        Builtin::Repr => {
            no_kwargs(name, &kwargs)?;
            check_arity(name, &args, 1, 1)?;
            Ok(Value::str(interp.repr(&args[0])?))
        }
        Builtin::Bool => {
            no_kwargs(name, &kwargs)?;
            check_arity(name, &args, 0, 1)?;
            Ok(Value::Bool(args.first().is_some_and(Value::is_truthy)))
        }
        Builtin::List | Builtin::Tuple => {
            no_kwargs(name, &kwargs)?;
            check_arity(name, &args, 0, 1)?;
            let items = match args.first() {
                Some(value) => collect_items(interp, value)?,
                None => Vec::new(),
            };
            Ok(if builtin == Builtin::List {
                Value::list(items)
            } else {
                Value::tuple(items)
            })
        }
        Builtin::Dict => {
            check_arity(name, &args, 0, 1)?;
            let mut dict = DictValue::new();
            if let Some(source) = args.first() {
                update_dict(interp, &mut dict, source)?;
            }
            for (key, value) in kwargs {
                dict.insert(Value::str(key), value)?;
            }
            Ok(Value::dict(dict))
        }
        Builtin::Abs => {
            no_kwargs(name, &kwargs)?;
            check_arity(name, &args, 1, 1)?;
            match &args[0] {
                Value::Float(f) => Ok(Value::Float(f.abs())),
                other => match other.as_int() {
                    Some(i) => i.checked_abs().map(Value::Int).ok_or_else(RuntimeError::overflow),
                    None => Err(RuntimeError::type_error(format!(
                        "bad operand type for abs(): '{}'",
                        other.type_name()
                    ))),
                },
            }
        }
        Builtin::Min => extremum(interp, name, args, kwargs, Ordering::Less),
        Builtin::Max => extremum(interp, name, args, kwargs, Ordering::Greater),
        Builtin::Sum => {
            let start = take_kwarg(&mut kwargs, "start");
            reject_unknown(name, &kwargs)?;
            check_arity(name, &args, 1, 2)?;
            let mut total = args.get(1).cloned().or(start).unwrap_or(Value::Int(0));
            if matches!(total, Value::Str(_)) {
                return Err(RuntimeError::type_error(
                    "sum() can't sum strings [use ''.join(seq) instead]",
                ));
            }
            for item in ValueIter::new(&args[0])? {
                interp.tick()?;
                total = operators::binary(BinaryOp::Add, &total, &item, interp.budget())?;
            }
            Ok(total)
        }
        Builtin::Sorted => {
            let key = take_kwarg(&mut kwargs, "key");
            let reverse = take_kwarg(&mut kwargs, "reverse").is_some_and(|v| v.is_truthy());
            reject_unknown(name, &kwargs)?;
            check_arity(name, &args, 1, 1)?;
            let items = collect_items(interp, &args[0])?;
            Ok(Value::list(sort_values(interp, items, key, reverse)?))
        }
        Builtin::Reversed => {
            no_kwargs(name, &kwargs)?;
            check_arity(name, &args, 1, 1)?;
            match &args[0] {
                Value::List(_) | Value::Tuple(_) | Value::Str(_) | Value::Range(_) | Value::Dict(_) => {
                    let mut items = collect_items(interp, &args[0])?;
                    items.reverse();
                    Ok(Value::list(items))
                }
                other => Err(RuntimeError::type_error(format!(
                    "'{}' object is not reversible",
                    other.type_name()
                ))),
            }
        }
        Builtin::Enumerate => {
            let start = take_kwarg(&mut kwargs, "start");
            reject_unknown(name, &kwargs)?;
            check_arity(name, &args, 1, 2)?;
            let start = match args.get(1).cloned().or(start) {
                Some(value) => int_arg(&value)?,
                None => 0,
            };
            let items = collect_items(interp, &args[0])?;
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let index = start.checked_add(i as i64).ok_or_else(RuntimeError::overflow)?;
                out.push(Value::tuple(vec![Value::Int(index), item]));
            }
            Ok(Value::list(out))
        }
        Builtin::Zip => {
            no_kwargs(name, &kwargs)?;
            let columns = args
                .iter()
                .map(|arg| collect_items(interp, arg))
                .collect::<RuntimeResult<Vec<_>>>()?;
            let len = columns.iter().map(Vec::len).min().unwrap_or(0);
            let rows = (0..len)
                .map(|i| Value::tuple(columns.iter().map(|col| col[i].clone()).collect()))
                .collect();
            Ok(Value::list(rows))
        }
        Builtin::Type => {
            no_kwargs(name, &kwargs)?;
            if args.len() != 1 {
                return Err(RuntimeError::type_error("type() takes 1 or 3 arguments"));
            }
            Ok(type_of(&args[0]))
        }
        Builtin::Isinstance => {
            no_kwargs(name, &kwargs)?;
            if args.len() != 2 {
                return Err(RuntimeError::type_error(format!(
                    "isinstance expected 2 arguments, got {}",
                    args.len()
                )));
            }
            Ok(Value::Bool(is_instance(&args[0], &args[1])?))
        }
        Builtin::Round => {
            let ndigits = take_kwarg(&mut kwargs, "ndigits");
            reject_unknown(name, &kwargs)?;
            check_arity(name, &args, 1, 2)?;
            let ndigits = match args.get(1).cloned().or(ndigits) {
                None | Some(Value::None) => None,
                Some(value) => Some(int_arg(&value)?),
            };
            round(&args[0], ndigits)
        }
        Builtin::Open => {
            let file = args
                .first()
                .cloned()
                .or_else(|| take_kwarg(&mut kwargs, "file"))
                .ok_or_else(|| {
                    RuntimeError::type_error("open() missing required argument 'file' (pos 1)")
                })?;
            let shown = match &file {
                Value::Str(s) => repr_str(s),
                other => other.repr()?,
            };
            Err(RuntimeError::new(
                Exception::FileNotFoundError,
                format!("[Errno 2] No such file or directory: {shown}"),
            ))
        }
        Builtin::Object => {
            no_kwargs(name, &kwargs)?;
            check_arity(name, &args, 0, 0)?;
            let class = Rc::new(Class::new("object", None));
            Ok(Value::Instance(Rc::new(Instance::new(class))))
        }
        Builtin::NoneType | Builtin::Function => Err(RuntimeError::type_error(format!(
            "cannot create '{name}' instances"
        ))),
    }
}

fn text_kwarg(kwargs: &mut Kwargs, key: &str, default: &str) -> RuntimeResult<String> {
    match take_kwarg(kwargs, key) {
        None | Some(Value::None) => Ok(default.to_string()),
        Some(Value::Str(s)) => Ok(s.to_string()),
        Some(other) => Err(RuntimeError::type_error(format!(
            "{key} must be None or a string, not {}",
            other.type_name()
        ))),
    }
}

fn to_int(args: &[Value]) -> RuntimeResult<Value> {
    let Some(value) = args.first() else {
        return Ok(Value::Int(0));
    };
    if let Some(base) = args.get(1) {
        let Value::Str(text) = value else {
            return Err(RuntimeError::type_error(
                "int() can't convert non-string with explicit base",
            ));
        };
        let base = int_arg(base)?;
        if !(2..=36).contains(&base) {
            return Err(RuntimeError::value_error("int() base must be >= 2 and <= 36, or 0"));
        }
        return parse_int(text, base as u32);
    }
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(*b as i64)),
        Value::Float(f) => float_to_int(f.trunc()).map(Value::Int),
        Value::Str(text) => parse_int(text, 10),
        other => Err(RuntimeError::type_error(format!(
            "int() argument must be a string, a bytes-like object or a real number, not '{}'",
            other.type_name()
        ))),
    }
}

/// 解析整数文本；接受天城文数字、前后空白与数字间的下划线
fn parse_int(text: &str, base: u32) -> RuntimeResult<Value> {
    let invalid = || {
        RuntimeError::value_error(format!(
            "invalid literal for int() with base {base}: {}",
            repr_str(text)
        ))
    };
    let normalized = normalize_numerals(text);
    let trimmed = normalized.trim();
    let digits = trimmed.trim_start_matches(['+', '-']);
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
        || trimmed.len() - digits.len() > 1
    {
        return Err(invalid());
    }
    let cleaned: String = trimmed.chars().filter(|c| *c != '_').collect();
    match i64::from_str_radix(&cleaned, base) {
        Ok(value) => Ok(Value::Int(value)),
        Err(e) if matches!(e.kind(), std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow) => {
            Err(RuntimeError::overflow())
        }
        Err(_) => Err(invalid()),
    }
}

fn to_float(value: Option<&Value>) -> RuntimeResult<Value> {
    match value {
        None => Ok(Value::Float(0.0)),
        Some(Value::Float(f)) => Ok(Value::Float(*f)),
        Some(Value::Str(text)) => {
            let normalized = normalize_numerals(text);
            let cleaned = normalized.trim();
            cleaned
                .parse::<f64>()
                .ok()
                .filter(|_| !cleaned.is_empty() && !cleaned.contains('_'))
                .map(Value::Float)
                .ok_or_else(|| {
                    RuntimeError::value_error(format!(
                        "could not convert string to float: {}",
                        repr_str(text)
                    ))
                })
        }
        Some(other) => other.as_float().map(Value::Float).ok_or_else(|| {
            RuntimeError::type_error(format!(
                "float() argument must be a string or a real number, not '{}'",
                other.type_name()
            ))
        }),
    }
}

pub(crate) fn update_dict(interp: &mut Interpreter, dict: &mut DictValue, source: &Value) -> RuntimeResult<()> {
    if let Value::Dict(other) = source {
        for (key, value) in other.borrow().items() {
            dict.insert(key, value)?;
        }
        return Ok(());
    }
    for (i, item) in collect_items(interp, source)?.into_iter().enumerate() {
        let pair = match &item {
            Value::List(_) | Value::Tuple(_) | Value::Str(_) => collect_items(interp, &item)?,
            other => {
                return Err(RuntimeError::type_error(format!(
                    "cannot convert dictionary update sequence element #{i} to a sequence (got '{}')",
                    other.type_name()
                )))
            }
        };
        let [key, value]: [Value; 2] = pair.try_into().map_err(|pair: Vec<Value>| {
            RuntimeError::value_error(format!(
                "dictionary update sequence element #{i} has length {}; 2 is required",
                pair.len()
            ))
        })?;
        dict.insert(key, value)?;
    }
    interp.budget().check_collection(dict.len())
}

fn extremum(
    interp: &mut Interpreter,
    name: &str,
    args: Vec<Value>,
    mut kwargs: Kwargs,
    want: Ordering,
) -> RuntimeResult<Value> {
    let key = take_kwarg(&mut kwargs, "key").filter(|k| !matches!(k, Value::None));
    let default = take_kwarg(&mut kwargs, "default");
    reject_unknown(name, &kwargs)?;
    let items = match args.len() {
        0 => {
            return Err(RuntimeError::type_error(format!(
                "{name} expected at least 1 argument, got 0"
            )))
        }
        1 => collect_items(interp, &args[0])?,
        _ => args,
    };
    let symbol = if want == Ordering::Greater { ">" } else { "<" };
    let mut iter = items.into_iter();
    let Some(mut best) = iter.next() else {
        return default
            .ok_or_else(|| RuntimeError::value_error(format!("{name}() arg is an empty sequence")));
    };
    let mut best_key = match &key {
        Some(key) => interp.call_value(key, vec![best.clone()], Vec::new())?,
        None => best.clone(),
    };
    for item in iter {
        let item_key = match &key {
            Some(key) => interp.call_value(key, vec![item.clone()], Vec::new())?,
            None => item.clone(),
        };
        if compare_values(&item_key, &best_key, symbol)? == Some(want) {
            best = item;
            best_key = item_key;
        }
    }
    Ok(best)
}

/// 整数值的浮点数转 i64；超出 i64 范围报 OverflowError
fn float_to_int(f: f64) -> RuntimeResult<i64> {
    if f.is_nan() {
        return Err(RuntimeError::value_error("cannot convert float NaN to integer"));
    }
    if f.is_infinite() {
        return Err(RuntimeError::new(
            Exception::OverflowError,
            "cannot convert float infinity to integer",
        ));
    }
    // i64 的范围是 [-2^63, 2^63)
    if !(-9_223_372_036_854_775_808.0..9_223_372_036_854_775_808.0).contains(&f) {
        return Err(RuntimeError::overflow());
    }
    Ok(f as i64)
}

/// 超过这个位数，任何有限浮点数都已精确表示
const ROUND_DIGITS_MAX: i64 = 323;

fn round(value: &Value, ndigits: Option<i64>) -> RuntimeResult<Value> {
    match (value, ndigits) {
        (Value::Float(f), None) => float_to_int(f.round_ties_even()).map(Value::Int),
        (Value::Float(f), Some(n)) => round_float(*f, n).map(Value::Float),
        (other, ndigits) => match other.as_int() {
            Some(i) => round_int(i, ndigits.unwrap_or(0)).map(Value::Int),
            None => Err(RuntimeError::type_error(format!(
                "type {} doesn't define __round__ method",
                other.type_name()
            ))),
        },
    }
}

/// 按二进制值的精确十进制展开舍入，平局取偶
fn round_float(f: f64, ndigits: i64) -> RuntimeResult<f64> {
    if !f.is_finite() || f == 0.0 || ndigits > ROUND_DIGITS_MAX {
        return Ok(f);
    }
    let rounded = if ndigits >= 0 {
        round_decimal(f, ndigits as usize)
    } else if ndigits < -308 {
        0.0 * f
    } else {
        let factor = 10f64.powi(-ndigits as i32);
        (f / factor).round_ties_even() * factor
    };
    if rounded.is_infinite() {
        return Err(RuntimeError::new(
            Exception::OverflowError,
            "rounded value too large to represent",
        ));
    }
    Ok(rounded)
}

/// 在 `f` 的精确十进制展开上舍入到 `ndigits` 位小数
fn round_decimal(f: f64, ndigits: usize) -> f64 {
    // 有限 f64 的展开最多 1074 位小数，这个精度下格式化没有误差
    let exact = format!("{:.1074}", f.abs());
    let Some((whole, fraction)) = exact.split_once('.') else {
        return f;
    };
    let mut digits: Vec<u8> = whole.bytes().chain(fraction.bytes().take(ndigits)).collect();
    let rest = fraction.as_bytes().get(ndigits..).unwrap_or_default();
    let round_up = match rest.split_first() {
        Some((b'5', tail)) => {
            tail.iter().any(|&d| d != b'0') || digits.last().is_some_and(|d| (d - b'0') % 2 == 1)
        }
        Some((&d, _)) => d > b'5',
        None => false,
    };
    if round_up {
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            if *d == b'9' {
                *d = b'0';
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
        }
    }
    let split = digits.len() - ndigits;
    let mut text: String = digits.iter().map(|&d| d as char).collect();
    text.insert(split, '.');
    text.push('0');
    text.parse::<f64>().map_or(f, |magnitude| magnitude.copysign(f))
}

/// 负位数时舍入到 10 的幂，平局取偶
fn round_int(i: i64, ndigits: i64) -> RuntimeResult<i64> {
    if ndigits >= 0 {
        return Ok(i);
    }
    let Some(pow) = u32::try_from(-ndigits).ok().and_then(|k| 10i128.checked_pow(k)) else {
        return Ok(0);
    };
    let value = i as i128;
    let quotient = value.div_euclid(pow);
    let remainder = value.rem_euclid(pow);
    let bump = match (remainder * 2).cmp(&pow) {
        Ordering::Greater => 1,
        Ordering::Equal => quotient.rem_euclid(2),
        Ordering::Less => 0,
    };
    i64::try_from((quotient + bump) * pow).map_err(|_| RuntimeError::overflow())
}

/// `type(x)` 的结果
pub fn type_of(value: &Value) -> Value {
    let builtin = match value {
        Value::Instance(instance) => return Value::Class(instance.class.clone()),
        Value::Class(_) => Builtin::Type,
        Value::None => Builtin::NoneType,
        Value::Bool(_) => Builtin::Bool,
        Value::Int(_) => Builtin::Int,
        Value::Float(_) => Builtin::Float,
        Value::Str(_) => Builtin::Str,
        Value::List(_) => Builtin::List,
        Value::Tuple(_) => Builtin::Tuple,
        Value::Dict(_) => Builtin::Dict,
        Value::Range(_) => Builtin::Range,
        Value::Builtin(b) if b.is_type() => Builtin::Type,
        Value::Builtin(_)
        | Value::Function(_)
        | Value::BoundMethod(_)
        | Value::NativeMethod(_) => Builtin::Function,
    };
    Value::Builtin(builtin)
}

fn is_instance(value: &Value, spec: &Value) -> RuntimeResult<bool> {
    match spec {
        Value::Tuple(options) => {
            for option in options.iter() {
                if is_instance(value, option)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Value::Class(class) => Ok(match value {
            Value::Instance(instance) => instance.class.is_subclass_of(class),
            _ => false,
        }),
        Value::Builtin(Builtin::Object) => Ok(true),
        Value::Builtin(Builtin::Int) => Ok(matches!(value, Value::Int(_) | Value::Bool(_))),
        Value::Builtin(b) if b.is_type() => Ok(match type_of(value) {
            Value::Builtin(actual) => actual == *b,
            _ => false,
        }),
        _ => Err(RuntimeError::type_error(
            "isinstance() arg 2 must be a type, a tuple of types, or a union",
        )),
    }
}
