//! 调用：用户函数、绑定方法、类实例化、内建

use std::rc::Rc;

use super::{Flow, Interpreter};
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::object::{Class, Function, Instance, Scope, ScopeKind};
use crate::runtime::stdlib::{self, methods};
use crate::runtime::value::Value;

pub type Kwargs = Vec<(String, Value)>;

impl Interpreter<'_> {
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>, kwargs: Kwargs) -> RuntimeResult<Value> {
        match callee {
            Value::Function(function) => self.call_function(function, args, kwargs),
            Value::BoundMethod(method) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(method.receiver.clone());
                full.extend(args);
                self.call_function(&method.function, full, kwargs)
            }
            Value::Builtin(builtin) => stdlib::call_builtin(self, *builtin, args, kwargs),
            Value::NativeMethod(method) => {
                methods::call_method(self, &method.receiver, method.name, args, kwargs)
            }
            Value::Class(class) => self.instantiate(class, args, kwargs),
            other => Err(RuntimeError::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    pub(crate) fn call_function(&mut self, function: &Rc<Function>, args: Vec<Value>, kwargs: Kwargs) -> RuntimeResult<Value> {
        self.tick()?;
        self.depth += 1;
        let result = self
            .budget()
            .check_depth(self.depth)
            .and_then(|_| self.invoke(function, args, kwargs));
        self.depth -= 1;
        result
    }

    fn invoke(&mut self, function: &Rc<Function>, args: Vec<Value>, kwargs: Kwargs) -> RuntimeResult<Value> {
        let bound = bind_arguments(function, args, kwargs)?;
        let scope = Scope::child(
            &function.closure,
            ScopeKind::Function,
            Some(function.locals.clone()),
        );
        {
            let mut scope = scope.borrow_mut();
            for (param, value) in function.def.params.iter().zip(bound) {
                scope.set(&param.name, value);
            }
        }
        let flow = self.exec_block(&function.def.body, &scope);
        // 未被闭包捕获的调用作用域随此处释放
        match flow? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::None),
        }
    }

    fn instantiate(&mut self, class: &Rc<Class>, args: Vec<Value>, kwargs: Kwargs) -> RuntimeResult<Value> {
        let instance = Value::Instance(Rc::new(Instance::new(class.clone())));
        match class.lookup("__init__") {
            Some(Value::Function(init)) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(instance.clone());
                full.extend(args);
                let returned = self.call_function(&init, full, kwargs)?;
                if !matches!(returned, Value::None) {
                    return Err(RuntimeError::type_error(format!(
                        "__init__() should return None, not '{}'",
                        returned.type_name()
                    )));
                }
            }
            _ if !args.is_empty() || !kwargs.is_empty() => {
                return Err(RuntimeError::type_error(format!(
                    "{}() takes no arguments",
                    class.name
                )));
            }
            _ => {}
        }
        Ok(instance)
    }
}

/// 把实参绑定到形参，错误信息沿用规范语言的措辞
fn bind_arguments(function: &Function, args: Vec<Value>, kwargs: Kwargs) -> RuntimeResult<Vec<Value>> {
    let params = &function.def.params;
    let name = &function.qualname;
    let required = function.defaults.iter().filter(|d| d.is_none()).count();

    if args.len() > params.len() {
        let expected = if required == params.len() {
            plural(params.len(), "positional argument")
        } else {
            format!("from {} to {} positional arguments", required, params.len())
        };
        let given = args.len();
        let verb = if given == 1 { "was" } else { "were" };
        return Err(RuntimeError::type_error(format!(
            "{name}() takes {expected} but {given} {verb} given"
        )));
    }

    let mut slots: Vec<Option<Value>> = args.into_iter().map(Some).collect();
    slots.resize(params.len(), None);

    for (key, value) in kwargs {
        let Some(index) = params.iter().position(|p| p.name == key) else {
            return Err(RuntimeError::type_error(format!(
                "{name}() got an unexpected keyword argument '{key}'"
            )));
        };
        if slots[index].is_some() {
            return Err(RuntimeError::type_error(format!(
                "{name}() got multiple values for argument '{key}'"
            )));
        }
        slots[index] = Some(value);
    }

    let mut missing = Vec::new();
    let mut bound = Vec::with_capacity(params.len());
    for ((slot, param), default) in slots.into_iter().zip(params).zip(&function.defaults) {
        match slot.or_else(|| default.clone()) {
            Some(value) => bound.push(value),
            None => missing.push(format!("'{}'", param.name)),
        }
    }
    if !missing.is_empty() {
        return Err(RuntimeError::type_error(format!(
            "{name}() missing {} required positional {}: {}",
            missing.len(),
            if missing.len() == 1 { "argument" } else { "arguments" },
            join_names(&missing)
        )));
    }
    Ok(bound)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// `'a'`、`'a' and 'b'`、`'a', 'b', and 'c'`
fn join_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [one] => one.clone(),
        [a, b] => format!("{a} and {b}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_names() {
        let names: Vec<String> = ["'a'", "'b'", "'c'"].iter().map(|s| s.to_string()).collect();
        assert_eq!(join_names(&names[..1]), "'a'");
        assert_eq!(join_names(&names[..2]), "'a' and 'b'");
        assert_eq!(join_names(&names), "'a', 'b', and 'c'");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "positional argument"), "1 positional argument");
        assert_eq!(plural(0, "positional argument"), "0 positional arguments");
    }
}
