//! str / list / dict 的原生方法

use super::{check_arity, collect_items, no_kwargs, reject_unknown, sort_values, take_kwarg, update_dict};
use crate::failure::Exception;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::format::format_value;
use crate::runtime::interpreter::{Interpreter, Kwargs};
use crate::runtime::value::{position_eq, repr_str, Value};

const STR_METHODS: &[&str] = &[
    "upper", "lower", "strip", "lstrip", "rstrip", "split", "join", "replace", "startswith",
    "endswith", "find", "index", "count", "isdigit", "isalpha", "isspace", "title", "capitalize",
    "format",
];

const LIST_METHODS: &[&str] = &[
    "append", "extend", "insert", "pop", "remove", "index", "count", "sort", "reverse", "copy",
    "clear",
];

const DICT_METHODS: &[&str] = &[
    "keys", "values", "items", "get", "pop", "update", "setdefault", "copy", "clear",
];

/// 查找接收者类型上的方法名
pub fn lookup(receiver: &Value, name: &str) -> Option<&'static str> {
    let table = match receiver {
        Value::Str(_) => STR_METHODS,
        Value::List(_) => LIST_METHODS,
        Value::Dict(_) => DICT_METHODS,
        _ => return None,
    };
    table.iter().find(|m| **m == name).copied()
}

pub fn call_method(
    interp: &mut Interpreter,
    receiver: &Value,
    name: &str,
    args: Vec<Value>,
    kwargs: Kwargs,
) -> RuntimeResult<Value> {
    match receiver {
        Value::Str(text) => str_method(interp, text, name, args, kwargs),
        Value::List(_) => list_method(interp, receiver, name, args, kwargs),
        Value::Dict(_) => dict_method(interp, receiver, name, args, kwargs),
        other => Err(RuntimeError::attribute_error(&other.type_name(), name)),
    }
}

fn str_arg<'v>(method: &str, value: &'v Value) -> RuntimeResult<&'v str> {
    match value {
        Value::Str(s) => Ok(&**s),
        other => Err(RuntimeError::type_error(format!(
            "{method}() argument must be str, not {}",
            other.type_name()
        ))),
    }
}

fn optional_chars<'v>(method: &str, args: &'v [Value]) -> RuntimeResult<Option<&'v str>> {
    match args.first() {
        None | Some(Value::None) => Ok(None),
        Some(value) => str_arg(method, value).map(Some),
    }
}

// ===== str =====

fn str_method(
    interp: &mut Interpreter,
    text: &str,
    name: &str,
    args: Vec<Value>,
    mut kwargs: Kwargs,
) -> RuntimeResult<Value> {
    let qualified = format!("str.{name}");
    if name != "format" && name != "split" {
        no_kwargs(&qualified, &kwargs)?;
    }
    let result = match name {
        "upper" => {
            check_arity(&qualified, &args, 0, 0)?;
            Value::str(text.to_uppercase())
        }
        "lower" => {
            check_arity(&qualified, &args, 0, 0)?;
            Value::str(text.to_lowercase())
        }
        "strip" | "lstrip" | "rstrip" => {
            check_arity(&qualified, &args, 0, 1)?;
            let chars: Option<Vec<char>> = optional_chars(name, &args)?.map(|c| c.chars().collect());
            let is_strip = |c: char| match &chars {
                Some(set) => set.contains(&c),
                None => c.is_whitespace(),
            };
            let out = match name {
                "lstrip" => text.trim_start_matches(is_strip),
                "rstrip" => text.trim_end_matches(is_strip),
                _ => text.trim_matches(is_strip),
            };
            Value::str(out)
        }
        "split" => {
            let sep = take_kwarg(&mut kwargs, "sep");
            let maxsplit = take_kwarg(&mut kwargs, "maxsplit");
            reject_unknown(&qualified, &kwargs)?;
            check_arity(&qualified, &args, 0, 2)?;
            let sep = args.first().cloned().or(sep).unwrap_or(Value::None);
            let maxsplit = match args.get(1).cloned().or(maxsplit) {
                Some(value) => value.as_int().ok_or_else(|| {
                    RuntimeError::type_error(format!(
                        "'{}' object cannot be interpreted as an integer",
                        value.type_name()
                    ))
                })?,
                None => -1,
            };
            let parts = match &sep {
                Value::None => split_whitespace(text, maxsplit),
                value => {
                    let sep = str_arg("split", value)?;
                    if sep.is_empty() {
                        return Err(RuntimeError::value_error("empty separator"));
                    }
                    if maxsplit < 0 {
                        text.split(sep).map(str::to_string).collect()
                    } else {
                        text.splitn(maxsplit as usize + 1, sep).map(str::to_string).collect()
                    }
                }
            };
            interp.budget().check_collection(parts.len())?;
            Value::list(parts.into_iter().map(Value::str).collect())
        }
        "join" => {
            check_arity(&qualified, &args, 1, 1)?;
            let items = collect_items(interp, &args[0])?;
            let mut pieces = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item {
                    Value::Str(s) => pieces.push(s.to_string()),
                    other => {
                        return Err(RuntimeError::type_error(format!(
                            "sequence item {i}: expected str instance, {} found",
                            other.type_name()
                        )))
                    }
                }
            }
            let joined = pieces.join(text);
            interp.budget().check_string(joined.len())?;
            Value::str(joined)
        }
        "replace" => {
            check_arity(&qualified, &args, 2, 3)?;
            let old = str_arg(name, &args[0])?;
            let new = str_arg(name, &args[1])?;
            let count = args.get(2).and_then(Value::as_int).unwrap_or(-1);
            let out = if count < 0 {
                text.replace(old, new)
            } else {
                text.replacen(old, new, count as usize)
            };
            interp.budget().check_string(out.len())?;
            Value::str(out)
        }
        "startswith" | "endswith" => {
            check_arity(&qualified, &args, 1, 1)?;
            let candidates: Vec<Value> = match &args[0] {
                Value::Tuple(items) => items.iter().cloned().collect(),
                other => vec![other.clone()],
            };
            let mut found = false;
            for candidate in &candidates {
                let affix = str_arg(name, candidate)?;
                found |= if name == "startswith" {
                    text.starts_with(affix)
                } else {
                    text.ends_with(affix)
                };
            }
            Value::Bool(found)
        }
        "find" | "index" => {
            check_arity(&qualified, &args, 1, 1)?;
            let needle = str_arg(name, &args[0])?;
            match text.find(needle) {
                Some(byte) => Value::Int(text[..byte].chars().count() as i64),
                None if name == "find" => Value::Int(-1),
                None => return Err(RuntimeError::value_error("substring not found")),
            }
        }
        "count" => {
            check_arity(&qualified, &args, 1, 1)?;
            let needle = str_arg(name, &args[0])?;
            let count = if needle.is_empty() {
                text.chars().count() + 1
            } else {
                text.matches(needle).count()
            };
            Value::Int(count as i64)
        }
        "isdigit" => {
            check_arity(&qualified, &args, 0, 0)?;
            Value::Bool(!text.is_empty() && text.chars().all(char::is_numeric))
        }
        "isalpha" => {
            check_arity(&qualified, &args, 0, 0)?;
            Value::Bool(!text.is_empty() && text.chars().all(char::is_alphabetic))
        }
        "isspace" => {
            check_arity(&qualified, &args, 0, 0)?;
            Value::Bool(!text.is_empty() && text.chars().all(char::is_whitespace))
        }
        "title" => {
            check_arity(&qualified, &args, 0, 0)?;
            let mut out = String::with_capacity(text.len());
            let mut boundary = true;
            for c in text.chars() {
                if boundary {
                    out.extend(c.to_uppercase());
                } else {
                    out.extend(c.to_lowercase());
                }
                boundary = !c.is_alphabetic();
            }
            Value::str(out)
        }
        "capitalize" => {
            check_arity(&qualified, &args, 0, 0)?;
            let mut chars = text.chars();
            let out = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            };
            Value::str(out)
        }
        "format" => Value::str(format_template(interp, text, &args, &kwargs)?),
        _ => return Err(RuntimeError::attribute_error("str", name)),
    };
    Ok(result)
}

fn split_whitespace(text: &str, maxsplit: i64) -> Vec<String> {
    if maxsplit < 0 {
        return text.split_whitespace().map(str::to_string).collect();
    }
    let mut parts = Vec::new();
    let mut rest = text.trim_start();
    while !rest.is_empty() {
        if parts.len() as i64 == maxsplit {
            parts.push(rest.to_string());
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                parts.push(rest[..end].to_string());
                rest = rest[end..].trim_start();
            }
            None => {
                parts.push(rest.to_string());
                break;
            }
        }
    }
    parts
}

/// `"{} {name:>5}".format(...)`
fn format_template(
    interp: &mut Interpreter,
    template: &str,
    args: &[Value],
    kwargs: &Kwargs,
) -> RuntimeResult<String> {
    let mut out = String::new();
    let mut chars = template.chars().peekable();
    let mut auto_index = 0usize;
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => {
                return Err(RuntimeError::value_error(
                    "Single '}' encountered in format string",
                ))
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    field.push(c);
                }
                if !closed {
                    return Err(RuntimeError::value_error(
                        "Single '{' encountered in format string",
                    ));
                }
                let (field, spec) = match field.split_once(':') {
                    Some((field, spec)) => (field.to_string(), Some(spec.to_string())),
                    None => (field, None),
                };
                let (field, conversion) = match field.split_once('!') {
                    Some((field, conv)) => (field.to_string(), conv.chars().next()),
                    None => (field, None),
                };
                let value = if field.is_empty() {
                    let value = args.get(auto_index).cloned().ok_or_else(|| {
                        RuntimeError::index_error(format!(
                            "Replacement index {auto_index} out of range for positional args tuple"
                        ))
                    })?;
                    auto_index += 1;
                    value
                } else if let Ok(index) = field.parse::<usize>() {
                    args.get(index).cloned().ok_or_else(|| {
                        RuntimeError::index_error(format!(
                            "Replacement index {index} out of range for positional args tuple"
                        ))
                    })?
                } else {
                    kwargs
                        .iter()
                        .find(|(k, _)| *k == field)
                        .map(|(_, v)| v.clone())
                        .ok_or_else(|| RuntimeError::new(Exception::KeyError, repr_str(&field)))?
                };
                let text = match conversion {
                    Some('r') | Some('a') => interp.repr(&value)?,
                    _ => interp.display(&value)?,
                };
                match spec {
                    Some(spec) if conversion.is_none() => out.push_str(&format_value(&value, &spec, &text)?),
                    Some(spec) => out.push_str(&format_value(&Value::str(text.as_str()), &spec, &text)?),
                    None => out.push_str(&text),
                }
                interp.budget().check_string(out.len())?;
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

// ===== list =====

fn list_method(
    interp: &mut Interpreter,
    receiver: &Value,
    name: &str,
    args: Vec<Value>,
    mut kwargs: Kwargs,
) -> RuntimeResult<Value> {
    let Value::List(list) = receiver else {
        return Err(RuntimeError::attribute_error(&receiver.type_name(), name));
    };
    let qualified = format!("list.{name}");
    if name != "sort" {
        no_kwargs(&qualified, &kwargs)?;
    }
    match name {
        "append" => {
            check_arity(&qualified, &args, 1, 1)?;
            let len = list.borrow().len();
            interp.budget().check_collection(len + 1)?;
            list.borrow_mut().extend(args);
            Ok(Value::None)
        }
        "extend" => {
            check_arity(&qualified, &args, 1, 1)?;
            let items = collect_items(interp, &args[0])?;
            let len = list.borrow().len();
            interp.budget().check_collection(len + items.len())?;
            list.borrow_mut().extend(items);
            Ok(Value::None)
        }
        "insert" => {
            check_arity(&qualified, &args, 2, 2)?;
            let index = args[0].as_int().ok_or_else(|| {
                RuntimeError::type_error(format!(
                    "'{}' object cannot be interpreted as an integer",
                    args[0].type_name()
                ))
            })?;
            let len = list.borrow().len();
            interp.budget().check_collection(len + 1)?;
            let at = if index < 0 {
                (len as i64 + index).max(0) as usize
            } else {
                (index as usize).min(len)
            };
            list.borrow_mut().insert(at, args[1].clone());
            Ok(Value::None)
        }
        "pop" => {
            check_arity(&qualified, &args, 0, 1)?;
            let len = list.borrow().len();
            if len == 0 {
                return Err(RuntimeError::index_error("pop from empty list"));
            }
            let index = match args.first() {
                Some(value) => value.as_int().ok_or_else(|| {
                    RuntimeError::type_error(format!(
                        "'{}' object cannot be interpreted as an integer",
                        value.type_name()
                    ))
                })?,
                None => -1,
            };
            let at = if index < 0 { index + len as i64 } else { index };
            if at < 0 || at >= len as i64 {
                return Err(RuntimeError::index_error("pop index out of range"));
            }
            Ok(list.borrow_mut().remove(at as usize))
        }
        "remove" => {
            check_arity(&qualified, &args, 1, 1)?;
            let position = position_eq(&list.borrow(), &args[0])?;
            match position {
                Some(at) => {
                    list.borrow_mut().remove(at);
                    Ok(Value::None)
                }
                None => Err(RuntimeError::value_error("list.remove(x): x not in list")),
            }
        }
        "index" => {
            check_arity(&qualified, &args, 1, 1)?;
            let position = position_eq(&list.borrow(), &args[0])?;
            match position {
                Some(at) => Ok(Value::Int(at as i64)),
                None => Err(RuntimeError::value_error(format!(
                    "{} is not in list",
                    interp.repr(&args[0])?
                ))),
            }
        }
        "count" => {
            check_arity(&qualified, &args, 1, 1)?;
            let mut count = 0;
            for item in list.borrow().iter() {
                if item.py_eq(&args[0])? {
                    count += 1;
                }
            }
            Ok(Value::Int(count as i64))
        }
        "sort" => {
            if !args.is_empty() {
                return Err(RuntimeError::type_error("sort() takes no positional arguments"));
            }
            let key = take_kwarg(&mut kwargs, "key");
            let reverse = take_kwarg(&mut kwargs, "reverse").is_some_and(|v| v.is_truthy());
            reject_unknown("sort", &kwargs)?;
            let items = list.borrow().clone();
            let sorted = sort_values(interp, items, key, reverse)?;
            *list.borrow_mut() = sorted;
            Ok(Value::None)
        }
        "reverse" => {
            check_arity(&qualified, &args, 0, 0)?;
            list.borrow_mut().reverse();
            Ok(Value::None)
        }
        "copy" => {
            check_arity(&qualified, &args, 0, 0)?;
            let items = list.borrow().clone();
            Ok(Value::list(items))
        }
        "clear" => {
            check_arity(&qualified, &args, 0, 0)?;
            list.borrow_mut().clear();
            Ok(Value::None)
        }
        _ => Err(RuntimeError::attribute_error("list", name)),
    }
}

// ===== dict =====

fn dict_method(
    interp: &mut Interpreter,
    receiver: &Value,
    name: &str,
    args: Vec<Value>,
    kwargs: Kwargs,
) -> RuntimeResult<Value> {
    let Value::Dict(dict) = receiver else {
        return Err(RuntimeError::attribute_error(&receiver.type_name(), name));
    };
    let qualified = format!("dict.{name}");
    if name != "update" {
        no_kwargs(&qualified, &kwargs)?;
    }
    match name {
        "keys" => {
            check_arity(&qualified, &args, 0, 0)?;
            Ok(Value::list(dict.borrow().keys()))
        }
        "values" => {
            check_arity(&qualified, &args, 0, 0)?;
            Ok(Value::list(dict.borrow().values()))
        }
        "items" => {
            check_arity(&qualified, &args, 0, 0)?;
            let items = dict
                .borrow()
                .items()
                .into_iter()
                .map(|(k, v)| Value::tuple(vec![k, v]))
                .collect();
            Ok(Value::list(items))
        }
        "get" => {
            check_arity(&qualified, &args, 1, 2)?;
            let found = dict.borrow().get(&args[0])?;
            Ok(found.or_else(|| args.get(1).cloned()).unwrap_or(Value::None))
        }
        "pop" => {
            check_arity(&qualified, &args, 1, 2)?;
            let removed = dict.borrow_mut().remove(&args[0])?;
            match (removed, args.get(1)) {
                (Some(value), _) => Ok(value),
                (None, Some(default)) => Ok(default.clone()),
                (None, None) => Err(RuntimeError::new(Exception::KeyError, interp.repr(&args[0])?)),
            }
        }
        "update" => {
            check_arity(&qualified, &args, 0, 1)?;
            // 先在副本上合并，避免 d.update(d) 时重复借用
            let mut merged = dict.borrow().clone();
            if let Some(source) = args.first() {
                update_dict(interp, &mut merged, source)?;
            }
            for (key, value) in kwargs {
                merged.insert(Value::str(key), value)?;
            }
            interp.budget().check_collection(merged.len())?;
            *dict.borrow_mut() = merged;
            Ok(Value::None)
        }
        "setdefault" => {
            check_arity(&qualified, &args, 1, 2)?;
            if let Some(existing) = dict.borrow().get(&args[0])? {
                return Ok(existing);
            }
            let default = args.get(1).cloned().unwrap_or(Value::None);
            dict.borrow_mut().insert(args[0].clone(), default.clone())?;
            Ok(default)
        }
        "copy" => {
            check_arity(&qualified, &args, 0, 0)?;
            let copy = dict.borrow().clone();
            Ok(Value::dict(copy))
        }
        "clear" => {
            check_arity(&qualified, &args, 0, 0)?;
            dict.borrow_mut().clear();
            Ok(Value::None)
        }
        _ => Err(RuntimeError::attribute_error("dict", name)),
    }
}
