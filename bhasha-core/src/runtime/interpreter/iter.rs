use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::value::{ListRef, RangeValue, Value};

/// `for` 与内建函数共用的迭代器
pub enum ValueIter {
    Range { range: RangeValue, index: usize },
    /// 按下标读取活动列表，循环中追加的元素也会被访问到
    List { list: ListRef, index: usize },
    Items { items: std::vec::IntoIter<Value> },
}

impl ValueIter {
    pub fn new(value: &Value) -> RuntimeResult<Self> {
        let iter = match value {
            Value::Range(range) => ValueIter::Range {
                range: *range,
                index: 0,
            },
            Value::List(list) => ValueIter::List {
                list: list.clone(),
                index: 0,
            },
            Value::Tuple(items) => ValueIter::Items {
                items: items.to_vec().into_iter(),
            },
            Value::Str(s) => ValueIter::Items {
                items: s
                    .chars()
                    .map(|c| Value::str(c.to_string()))
                    .collect::<Vec<_>>()
                    .into_iter(),
            },
            Value::Dict(dict) => ValueIter::Items {
                items: dict.borrow().keys().into_iter(),
            },
            other => {
                return Err(RuntimeError::type_error(format!(
                    "'{}' object is not iterable",
                    other.type_name()
                )))
            }
        };
        Ok(iter)
    }
}

impl Iterator for ValueIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        match self {
            ValueIter::Range { range, index } => {
                let value = range.get(*index)?;
                *index += 1;
                Some(Value::Int(value))
            }
            ValueIter::List { list, index } => {
                let value = list.borrow().get(*index).cloned()?;
                *index += 1;
                Some(value)
            }
            ValueIter::Items { items } => items.next(),
        }
    }
}
