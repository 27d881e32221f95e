//! 运行时值

use std::cell::RefCell;
use std::fmt::Write as _;
use std::rc::Rc;

use indexmap::IndexMap;

use super::error::{RuntimeError, RuntimeResult};
use super::object::{BoundMethod, Class, Function, Instance, NativeMethod};
use super::stdlib::Builtin;
use crate::failure::Exception;

/// 比较、哈希与 repr 递归进入容器的最大层数
pub const NESTING_LIMIT: usize = 1000;

fn nesting_exceeded(during: &str) -> RuntimeError {
    RuntimeError::new(
        Exception::RecursionError,
        format!("maximum recursion depth exceeded {during}"),
    )
}

pub type ListRef = Rc<RefCell<Vec<Value>>>;
pub type DictRef = Rc<RefCell<DictValue>>;

#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(ListRef),
    Tuple(Rc<Vec<Value>>),
    Dict(DictRef),
    Range(RangeValue),
    Function(Rc<Function>),
    Builtin(Builtin),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
    BoundMethod(Rc<BoundMethod>),
    NativeMethod(Rc<NativeMethod>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl RangeValue {
    pub fn len(&self) -> usize {
        let span = if self.step > 0 {
            (self.stop as i128 - self.start as i128 + self.step as i128 - 1) / self.step as i128
        } else {
            (self.start as i128 - self.stop as i128 - self.step as i128 - 1) / (-(self.step as i128))
        };
        span.max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<i64> {
        if index >= self.len() {
            return None;
        }
        Some(self.start + self.step * index as i64)
    }

    pub fn contains(&self, value: i64) -> bool {
        let in_bounds = if self.step > 0 {
            value >= self.start && value < self.stop
        } else {
            value <= self.start && value > self.stop
        };
        in_bounds && (value as i128 - self.start as i128) % self.step as i128 == 0
    }
}

/// 字典键：按值相等哈希（`1`、`1.0`、`True` 视为同一个键）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    None,
    Int(i64),
    Float(u64),
    Str(Rc<str>),
    Tuple(Vec<HashKey>),
    Identity(usize),
}

/// 保持插入顺序的字典
#[derive(Debug, Clone, Default)]
pub struct DictValue {
    entries: IndexMap<HashKey, (Value, Value)>,
}

impl DictValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> RuntimeResult<Option<Value>> {
        let hash = key.hash_key()?;
        Ok(self.entries.get(&hash).map(|(_, v)| v.clone()))
    }

    pub fn contains(&self, key: &Value) -> RuntimeResult<bool> {
        Ok(self.entries.contains_key(&key.hash_key()?))
    }

    pub fn insert(&mut self, key: Value, value: Value) -> RuntimeResult<()> {
        let hash = key.hash_key()?;
        match self.entries.get_mut(&hash) {
            // 已存在的键保留原始键对象，只替换值
            Some(slot) => slot.1 = value,
            None => {
                self.entries.insert(hash, (key, value));
            }
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &Value) -> RuntimeResult<Option<Value>> {
        let hash = key.hash_key()?;
        Ok(self.entries.shift_remove(&hash).map(|(_, v)| v))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn keys(&self) -> Vec<Value> {
        self.entries.values().map(|(k, _)| k.clone()).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.entries.values().map(|(_, v)| v.clone()).collect()
    }

    pub fn items(&self) -> Vec<(Value, Value)> {
        self.entries.values().cloned().collect()
    }
}

impl Value {
    pub fn str(text: impl Into<Rc<str>>) -> Value {
        Value::Str(text.into())
    }

    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Rc::new(items))
    }

    pub fn dict(dict: DictValue) -> Value {
        Value::Dict(Rc::new(RefCell::new(dict)))
    }

    /// 类型名，用于错误信息与 `type()`
    pub fn type_name(&self) -> String {
        let name = match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dict",
            Value::Range(_) => "range",
            Value::Function(_) => "function",
            Value::Builtin(b) if b.is_type() => "type",
            Value::Builtin(_) => "builtin_function_or_method",
            Value::Class(_) => "type",
            Value::Instance(instance) => return instance.class.name.clone(),
            Value::BoundMethod(_) => "method",
            Value::NativeMethod(_) => "builtin_function_or_method",
        };
        name.to_string()
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Tuple(items) => !items.is_empty(),
            Value::Dict(dict) => !dict.borrow().is_empty(),
            Value::Range(range) => !range.is_empty(),
            _ => true,
        }
    }

    /// 整数视图（bool 视为整数）
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Bool(b) => Some(*b as i64 as f64),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_) | Value::Bool(_))
    }

    pub fn hash_key(&self) -> RuntimeResult<HashKey> {
        self.hash_key_at(0)
    }

    fn hash_key_at(&self, depth: usize) -> RuntimeResult<HashKey> {
        if depth > NESTING_LIMIT {
            return Err(nesting_exceeded("while hashing"));
        }
        let key = match self {
            Value::None => HashKey::None,
            Value::Bool(b) => HashKey::Int(*b as i64),
            Value::Int(i) => HashKey::Int(*i),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 9.2e18 {
                    HashKey::Int(*f as i64)
                } else {
                    HashKey::Float(f.to_bits())
                }
            }
            Value::Str(s) => HashKey::Str(s.clone()),
            Value::Tuple(items) => HashKey::Tuple(
                items
                    .iter()
                    .map(|item| item.hash_key_at(depth + 1))
                    .collect::<RuntimeResult<Vec<_>>>()?,
            ),
            Value::Range(r) => HashKey::Tuple(vec![
                HashKey::Int(r.start),
                HashKey::Int(r.stop),
                HashKey::Int(r.step),
            ]),
            Value::Function(f) => HashKey::Identity(Rc::as_ptr(f) as *const () as usize),
            Value::Class(c) => HashKey::Identity(Rc::as_ptr(c) as *const () as usize),
            Value::Instance(i) => HashKey::Identity(Rc::as_ptr(i) as *const () as usize),
            Value::Builtin(b) => HashKey::Str(Rc::from(format!("<builtin {}>", b.name()))),
            Value::List(_) | Value::Dict(_) | Value::BoundMethod(_) | Value::NativeMethod(_) => {
                return Err(RuntimeError::type_error(format!(
                    "unhashable type: '{}'",
                    self.type_name()
                )))
            }
        };
        Ok(key)
    }

    /// `==` 语义；互相引用的容器在超过嵌套上限时报 RecursionError
    pub fn py_eq(&self, other: &Value) -> RuntimeResult<bool> {
        self.eq_at(other, 0)
    }

    fn eq_at(&self, other: &Value, depth: usize) -> RuntimeResult<bool> {
        if depth > NESTING_LIMIT {
            return Err(nesting_exceeded("in comparison"));
        }
        let equal = match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                Rc::ptr_eq(a, b) || seq_eq(&a.borrow(), &b.borrow(), depth + 1)?
            }
            (Value::Tuple(a), Value::Tuple(b)) => seq_eq(a, b, depth + 1)?,
            (Value::Dict(a), Value::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return Ok(true);
                }
                let (a, b) = (a.borrow(), b.borrow());
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (key, value) in a.items() {
                    let same = match b.get(&key)? {
                        Some(other) => other.eq_at(&value, depth + 1)?,
                        None => false,
                    };
                    if !same {
                        return Ok(false);
                    }
                }
                true
            }
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => match (a.as_int(), b.as_int()) {
                (Some(x), Some(y)) => x == y,
                _ => a.as_float() == b.as_float(),
            },
            _ => self.is_identical(other),
        };
        Ok(equal)
    }

    /// `is` 语义
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Tuple(a), Value::Tuple(b)) => Rc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => Rc::ptr_eq(a, b),
            (Value::NativeMethod(a), Value::NativeMethod(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `repr()` 文本（不调用用户定义的 `__repr__`）
    pub fn repr(&self) -> RuntimeResult<String> {
        let mut out = String::new();
        self.write_repr(&mut out, &mut Vec::new(), 0)?;
        Ok(out)
    }

    /// `str()` 文本（不调用用户定义的 `__str__`）
    pub fn to_display(&self) -> RuntimeResult<String> {
        match self {
            Value::Str(s) => Ok(s.to_string()),
            other => other.repr(),
        }
    }

    fn write_repr(&self, out: &mut String, seen: &mut Vec<usize>, depth: usize) -> RuntimeResult<()> {
        if depth > NESTING_LIMIT {
            return Err(nesting_exceeded("while getting the repr of an object"));
        }
        match self {
            Value::None => out.push_str("None"),
            Value::Bool(true) => out.push_str("True"),
            Value::Bool(false) => out.push_str("False"),
            Value::Int(i) => {
                let _ = write!(out, "{i}");
            }
            Value::Float(f) => out.push_str(&format_float(*f)),
            Value::Str(s) => out.push_str(&repr_str(s)),
            Value::List(items) => {
                let id = Rc::as_ptr(items) as *const () as usize;
                if seen.contains(&id) {
                    out.push_str("[...]");
                    return Ok(());
                }
                seen.push(id);
                out.push('[');
                write_items(&items.borrow(), out, seen, depth + 1)?;
                out.push(']');
                seen.pop();
            }
            Value::Tuple(items) => {
                out.push('(');
                write_items(items, out, seen, depth + 1)?;
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Value::Dict(dict) => {
                let id = Rc::as_ptr(dict) as *const () as usize;
                if seen.contains(&id) {
                    out.push_str("{...}");
                    return Ok(());
                }
                seen.push(id);
                out.push('{');
                for (i, (k, v)) in dict.borrow().items().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    k.write_repr(out, seen, depth + 1)?;
                    out.push_str(": ");
                    v.write_repr(out, seen, depth + 1)?;
                }
                out.push('}');
                seen.pop();
            }
            Value::Range(r) if r.step == 1 => {
                let _ = write!(out, "range({}, {})", r.start, r.stop);
            }
            Value::Range(r) => {
                let _ = write!(out, "range({}, {}, {})", r.start, r.stop, r.step);
            }
            Value::Function(f) => {
                let _ = write!(out, "<function {}>", f.qualname);
            }
            Value::Builtin(b) if b.is_type() => {
                let _ = write!(out, "<class '{}'>", b.name());
            }
            Value::Builtin(b) => {
                let _ = write!(out, "<built-in function {}>", b.name());
            }
            Value::Class(c) => {
                let _ = write!(out, "<class '__main__.{}'>", c.name);
            }
            Value::Instance(i) => {
                let _ = write!(out, "<__main__.{} object>", i.class.name);
            }
            Value::BoundMethod(m) => {
                let _ = write!(out, "<bound method {}>", m.function.qualname);
            }
            Value::NativeMethod(m) => {
                let _ = write!(
                    out,
                    "<built-in method {} of {} object>",
                    m.name,
                    m.receiver.type_name()
                );
            }
        }
        Ok(())
    }
}

fn write_items(items: &[Value], out: &mut String, seen: &mut Vec<usize>, depth: usize) -> RuntimeResult<()> {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        item.write_repr(out, seen, depth)?;
    }
    Ok(())
}

fn seq_eq(a: &[Value], b: &[Value], depth: usize) -> RuntimeResult<bool> {
    if a.len() != b.len() {
        return Ok(false);
    }
    for (x, y) in a.iter().zip(b) {
        if !x.eq_at(y, depth)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// 第一个与 `item` 相等的元素下标
pub fn position_eq(items: &[Value], item: &Value) -> RuntimeResult<Option<usize>> {
    for (index, candidate) in items.iter().enumerate() {
        if candidate.py_eq(item)? {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// 浮点数的规范文本：最短往返表示，指数范围外使用科学计数法
pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }
    let sci = format!("{f:e}");
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if (-4..16).contains(&exponent) {
        let plain = format!("{f}");
        if plain.contains('.') {
            plain
        } else {
            plain + ".0"
        }
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}

/// 字符串的 repr：优先单引号
pub fn repr_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() => {
                let code = c as u32;
                if code < 0x100 {
                    let _ = write!(out, "\\x{code:02x}");
                } else {
                    let _ = write!(out, "\\u{code:04x}");
                }
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
