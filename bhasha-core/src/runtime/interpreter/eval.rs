//! 表达式求值

use std::rc::Rc;

use super::{Interpreter, ValueIter};
use crate::compiler::parser::expr::{Argument, ExprKind, FStringPart, ListComp, Slice};
use crate::compiler::parser::{Expr, LogicalOp};
use crate::failure::Exception;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::format::format_value;
use crate::runtime::object::{BoundMethod, Env, NativeMethod, Scope, ScopeKind};
use crate::runtime::operators;
use crate::runtime::stdlib::methods;
use crate::runtime::value::{DictValue, Value};

impl Interpreter<'_> {
    pub(crate) fn eval(&mut self, expr: &Expr, env: &Env) -> RuntimeResult<Value> {
        match &**expr {
            ExprKind::LiteralInt(int) => Ok(Value::Int(int.value)),
            ExprKind::LiteralFloat(float) => Ok(Value::Float(float.value)),
            ExprKind::LiteralString(s) => Ok(Value::str(s.value.as_str())),
            ExprKind::LiteralBool(b) => Ok(Value::Bool(*b)),
            ExprKind::LiteralNone => Ok(Value::None),
            ExprKind::FString(fstring) => {
                let mut out = String::new();
                for part in &fstring.parts {
                    match part {
                        FStringPart::Literal(text) => out.push_str(text),
                        FStringPart::Interpolation {
                            expr,
                            conversion,
                            spec,
                        } => {
                            let value = self.eval(expr, env)?;
                            let text = match conversion {
                                Some('r') | Some('a') => self.repr(&value)?,
                                _ => self.display(&value)?,
                            };
                            match spec {
                                Some(spec) if conversion.is_none() => {
                                    out.push_str(&format_value(&value, spec, &text)?)
                                }
                                Some(spec) => {
                                    out.push_str(&format_value(&Value::str(text.as_str()), spec, &text)?)
                                }
                                None => out.push_str(&text),
                            }
                        }
                    }
                    self.budget().check_string(out.len())?;
                }
                Ok(Value::str(out))
            }
            ExprKind::LiteralList(list) => {
                let items = self.eval_all(&list.elements, env)?;
                Ok(Value::list(items))
            }
            ExprKind::LiteralTuple(tuple) => {
                let items = self.eval_all(&tuple.elements, env)?;
                Ok(Value::tuple(items))
            }
            ExprKind::LiteralDict(dict) => {
                let mut out = DictValue::new();
                for (key, value) in &dict.entries {
                    let key = self.eval(key, env)?;
                    let value = self.eval(value, env)?;
                    out.insert(key, value)?;
                }
                self.budget().check_collection(out.len())?;
                Ok(Value::dict(out))
            }
            ExprKind::ListComp(comp) => self.eval_list_comp(comp, env),
            ExprKind::VarRef(var) => self.resolve(env, &var.name),
            ExprKind::Binary(bin) => {
                let left = self.eval(&bin.left, env)?;
                let right = self.eval(&bin.right, env)?;
                operators::binary(bin.op, &left, &right, self.budget())
            }
            ExprKind::Unary(un) => {
                let operand = self.eval(&un.operand, env)?;
                operators::unary(un.op, &operand)
            }
            ExprKind::Compare(cmp) => {
                let mut left = self.eval(&cmp.left, env)?;
                for (op, comparator) in cmp.ops.iter().zip(&cmp.comparators) {
                    let right = self.eval(comparator, env)?;
                    if !operators::compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            ExprKind::Logical(logical) => {
                let left = self.eval(&logical.left, env)?;
                let short_circuit = match logical.op {
                    LogicalOp::And => !left.is_truthy(),
                    LogicalOp::Or => left.is_truthy(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval(&logical.right, env)
                }
            }
            ExprKind::Conditional(cond) => {
                if self.eval(&cond.condition, env)?.is_truthy() {
                    self.eval(&cond.then_expr, env)
                } else {
                    self.eval(&cond.else_expr, env)
                }
            }
            ExprKind::FunctionCall(call) => {
                let callee = self.eval(&call.function_expr, env)?;
                let mut args = Vec::new();
                let mut kwargs = Vec::new();
                for argument in &call.arguments {
                    match argument {
                        Argument::Positional(expr) => args.push(self.eval(expr, env)?),
                        Argument::Keyword(name, expr) => {
                            kwargs.push((name.clone(), self.eval(expr, env)?))
                        }
                    }
                }
                self.call_value(&callee, args, kwargs)
            }
            ExprKind::MemberAccess(member) => {
                let object = self.eval(&member.object, env)?;
                self.get_attribute(&object, &member.member)
            }
            ExprKind::IndexAccess(access) => {
                let object = self.eval(&access.object, env)?;
                if let ExprKind::Slice(slice) = &*access.index {
                    return self.eval_slice(&object, slice, env);
                }
                let index = self.eval(&access.index, env)?;
                self.get_item(&object, &index)
            }
            ExprKind::Slice(_) => Err(RuntimeError::new(
                Exception::SyntaxError,
                "slice outside of subscript",
            )),
        }
    }

    fn eval_all(&mut self, exprs: &[Expr], env: &Env) -> RuntimeResult<Vec<Value>> {
        self.budget().check_collection(exprs.len())?;
        exprs.iter().map(|e| self.eval(e, env)).collect()
    }

    fn eval_list_comp(&mut self, comp: &ListComp, env: &Env) -> RuntimeResult<Value> {
        let iterable = self.eval(&comp.iterable, env)?;
        let scope = Scope::child(env, ScopeKind::Comprehension, None);
        let mut out = Vec::new();
        for item in ValueIter::new(&iterable)? {
            self.tick()?;
            self.assign(&comp.target, item, &scope)?;
            let mut keep = true;
            for condition in &comp.conditions {
                if !self.eval(condition, &scope)?.is_truthy() {
                    keep = false;
                    break;
                }
            }
            if keep {
                out.push(self.eval(&comp.element, &scope)?);
                self.budget().check_collection(out.len())?;
            }
        }
        Ok(Value::list(out))
    }

    pub(crate) fn get_attribute(&mut self, object: &Value, name: &str) -> RuntimeResult<Value> {
        match object {
            Value::Instance(instance) => {
                if let Some(value) = instance.fields.borrow().get(name) {
                    return Ok(value.clone());
                }
                match instance.class.lookup(name) {
                    Some(Value::Function(function)) => {
                        Ok(Value::BoundMethod(Rc::new(BoundMethod {
                            receiver: object.clone(),
                            function,
                        })))
                    }
                    Some(value) => Ok(value),
                    None => Err(RuntimeError::attribute_error(&instance.class.name, name)),
                }
            }
            Value::Class(class) => {
                if name == "__name__" {
                    return Ok(Value::str(class.name.as_str()));
                }
                class.lookup(name).ok_or_else(|| {
                    RuntimeError::new(
                        Exception::AttributeError,
                        format!("type object '{}' has no attribute '{name}'", class.name),
                    )
                })
            }
            other => match methods::lookup(other, name) {
                Some(method) => Ok(Value::NativeMethod(Rc::new(NativeMethod {
                    receiver: other.clone(),
                    name: method,
                }))),
                None => Err(RuntimeError::attribute_error(&other.type_name(), name)),
            },
        }
    }

    pub(crate) fn set_attribute(&mut self, object: &Value, name: &str, value: Value) -> RuntimeResult<()> {
        match object {
            Value::Instance(instance) => {
                instance.fields.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            Value::Class(class) => {
                class.attributes.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            other => Err(RuntimeError::attribute_error(&other.type_name(), name)),
        }
    }

    pub(crate) fn get_item(&mut self, object: &Value, index: &Value) -> RuntimeResult<Value> {
        match object {
            Value::List(items) => {
                let items = items.borrow();
                let i = sequence_index(index, items.len(), "list")?;
                Ok(items[i].clone())
            }
            Value::Tuple(items) => {
                let i = sequence_index(index, items.len(), "tuple")?;
                Ok(items[i].clone())
            }
            Value::Str(s) => {
                let Some(raw) = index.as_int() else {
                    return Err(RuntimeError::type_error(format!(
                        "string indices must be integers, not '{}'",
                        index.type_name()
                    )));
                };
                let len = s.chars().count();
                let i = normalize_index(raw, len)
                    .ok_or_else(|| RuntimeError::index_error("string index out of range"))?;
                Ok(Value::str(s.chars().nth(i).map(String::from).unwrap_or_default()))
            }
            Value::Range(range) => {
                let i = sequence_index(index, range.len(), "range object")?;
                Ok(Value::Int(range.get(i).unwrap_or_default()))
            }
            Value::Dict(dict) => {
                let found = dict.borrow().get(index)?;
                match found {
                    Some(value) => Ok(value),
                    None => Err(RuntimeError::new(Exception::KeyError, index.repr()?)),
                }
            }
            other => Err(RuntimeError::type_error(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            ))),
        }
    }

    pub(crate) fn set_item(&mut self, object: &Value, index: &Value, value: Value) -> RuntimeResult<()> {
        match object {
            Value::List(items) => {
                let len = items.borrow().len();
                let i = match index.as_int() {
                    Some(raw) => normalize_index(raw, len).ok_or_else(|| {
                        RuntimeError::index_error("list assignment index out of range")
                    })?,
                    None => {
                        return Err(RuntimeError::type_error(format!(
                            "list indices must be integers or slices, not {}",
                            index.type_name()
                        )))
                    }
                };
                items.borrow_mut()[i] = value;
                Ok(())
            }
            Value::Dict(dict) => {
                let mut dict = dict.borrow_mut();
                dict.insert(index.clone(), value)?;
                self.budget().check_collection(dict.len())
            }
            other => Err(RuntimeError::type_error(format!(
                "'{}' object does not support item assignment",
                other.type_name()
            ))),
        }
    }

    pub(crate) fn eval_slice_bound(&mut self, bound: &Option<Expr>, env: &Env) -> RuntimeResult<Option<i64>> {
        let Some(expr) = bound else {
            return Ok(None);
        };
        match self.eval(expr, env)? {
            Value::None => Ok(None),
            value => value.as_int().map(Some).ok_or_else(|| {
                RuntimeError::type_error(
                    "slice indices must be integers or None or have an __index__ method",
                )
            }),
        }
    }

    fn eval_slice(&mut self, object: &Value, slice: &Slice, env: &Env) -> RuntimeResult<Value> {
        let lower = self.eval_slice_bound(&slice.lower, env)?;
        let upper = self.eval_slice_bound(&slice.upper, env)?;
        let step = self.eval_slice_bound(&slice.step, env)?;
        match object {
            Value::List(items) => {
                let items = items.borrow();
                let picked = slice_indices(items.len(), lower, upper, step)?;
                Ok(Value::list(picked.into_iter().map(|i| items[i].clone()).collect()))
            }
            Value::Tuple(items) => {
                let picked = slice_indices(items.len(), lower, upper, step)?;
                Ok(Value::tuple(picked.into_iter().map(|i| items[i].clone()).collect()))
            }
            Value::Str(s) => {
                let chars: Vec<char> = s.chars().collect();
                let picked = slice_indices(chars.len(), lower, upper, step)?;
                Ok(Value::str(picked.into_iter().map(|i| chars[i]).collect::<String>()))
            }
            Value::Range(range) => {
                let picked = slice_indices(range.len(), lower, upper, step)?;
                Ok(Value::list(
                    picked
                        .into_iter()
                        .filter_map(|i| range.get(i))
                        .map(Value::Int)
                        .collect(),
                ))
            }
            other => Err(RuntimeError::type_error(format!(
                "'{}' object is not subscriptable",
                other.type_name()
            ))),
        }
    }
}

fn normalize_index(raw: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if raw < 0 { raw + len } else { raw };
    (0..len).contains(&i).then_some(i as usize)
}

fn sequence_index(index: &Value, len: usize, what: &str) -> RuntimeResult<usize> {
    let Some(raw) = index.as_int() else {
        return Err(RuntimeError::type_error(format!(
            "{what} indices must be integers or slices, not {}",
            index.type_name()
        )));
    };
    normalize_index(raw, len)
        .ok_or_else(|| RuntimeError::index_error(format!("{what} index out of range")))
}

/// 切片下标序列（负数与越界按规范语言的规则截断）
pub(crate) fn slice_indices(
    len: usize,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> RuntimeResult<Vec<usize>> {
    let len = len as i64;
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(RuntimeError::value_error("slice step cannot be zero"));
    }
    let mut out = Vec::new();
    if step > 0 {
        let clamp = |b: i64| if b < 0 { (b + len).max(0) } else { b.min(len) };
        let start = lower.map(clamp).unwrap_or(0);
        let stop = upper.map(clamp).unwrap_or(len);
        let mut i = start;
        while i < stop {
            out.push(i as usize);
            i += step;
        }
    } else {
        let clamp = |b: i64| if b < 0 { (b + len).max(-1) } else { b.min(len - 1) };
        let start = lower.map(clamp).unwrap_or(len - 1);
        let stop = upper.map(clamp).unwrap_or(-1);
        let mut i = start;
        while i > stop {
            out.push(i as usize);
            i += step;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_indices_forward() {
        assert_eq!(slice_indices(5, Some(1), Some(3), None).unwrap(), vec![1, 2]);
        assert_eq!(slice_indices(5, Some(-2), None, None).unwrap(), vec![3, 4]);
        assert_eq!(slice_indices(5, None, Some(100), Some(2)).unwrap(), vec![0, 2, 4]);
    }

    #[test]
    fn test_slice_indices_backward() {
        assert_eq!(slice_indices(4, None, None, Some(-1)).unwrap(), vec![3, 2, 1, 0]);
        assert_eq!(slice_indices(5, Some(3), Some(0), Some(-2)).unwrap(), vec![3, 1]);
        assert!(slice_indices(0, None, None, Some(-1)).unwrap().is_empty());
    }

    #[test]
    fn test_slice_zero_step() {
        let err = slice_indices(3, None, None, Some(0)).unwrap_err();
        assert_eq!(err.message, "slice step cannot be zero");
    }

    #[test]
    fn test_normalize_index() {
        assert_eq!(normalize_index(-1, 3), Some(2));
        assert_eq!(normalize_index(3, 3), None);
        assert_eq!(normalize_index(-4, 3), None);
    }
}
