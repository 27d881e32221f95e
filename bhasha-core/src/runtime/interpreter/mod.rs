//! 树遍历解释器

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::error::{RuntimeError, RuntimeResult};
use super::limits::Budget;
use super::object::{lookup, Env, Scope};
use super::sink::{InputLines, OutputSink};
use super::stdlib::Builtin;
use super::value::Value;
use crate::compiler::parser::Program;

mod call;
mod eval;
mod exec;
mod iter;

pub use call::Kwargs;
pub use iter::ValueIter;

/// 语句执行后的控制流
#[derive(Debug)]
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

pub struct Interpreter<'a> {
    globals: Env,
    sink: &'a mut dyn OutputSink,
    input: InputLines,
    budget: Budget,
    depth: usize,
    /// 被函数闭包捕获的作用域，执行结束时清空以打破引用环
    captured: Vec<Weak<RefCell<Scope>>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(sink: &'a mut dyn OutputSink, input: InputLines, budget: Budget) -> Self {
        Self {
            globals: Scope::module(),
            sink,
            input,
            budget,
            depth: 0,
            captured: Vec::new(),
        }
    }

    /// 在全新的全局作用域中运行整个程序
    pub fn run(&mut self, program: &Program) -> RuntimeResult<()> {
        debug!(target: "bhasha::runtime", statements = program.body.len(), "execution started");
        let globals = self.globals.clone();
        let result = self.exec_block(&program.body, &globals).map(|_| ());
        debug!(
            target: "bhasha::runtime",
            steps = self.budget.steps(),
            elapsed_ms = self.budget.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "execution finished"
        );
        result
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    pub(crate) fn budget(&self) -> &Budget {
        &self.budget
    }

    pub(crate) fn write(&mut self, text: &str) -> RuntimeResult<()> {
        self.sink.write_str(text)
    }

    pub(crate) fn read_line(&mut self) -> RuntimeResult<String> {
        self.input.read_line()
    }

    pub(crate) fn tick(&mut self) -> RuntimeResult<()> {
        self.budget.tick()
    }

    pub(crate) fn capture(&mut self, env: &Env) {
        self.captured.push(Rc::downgrade(env));
    }

    /// 名字解析：作用域链，然后是内建
    pub(crate) fn resolve(&self, env: &Env, name: &str) -> RuntimeResult<Value> {
        if let Some(value) = lookup(env, name)? {
            return Ok(value);
        }
        Builtin::lookup(name)
            .map(Value::Builtin)
            .ok_or_else(|| RuntimeError::name_error(name))
    }

    /// `str()`，支持用户定义的 `__str__` / `__repr__`
    pub fn display(&mut self, value: &Value) -> RuntimeResult<String> {
        match value {
            Value::Instance(_) => self.dunder_text(value, "__str__"),
            other => other.to_display(),
        }
    }

    /// `repr()`，支持用户定义的 `__repr__`
    pub fn repr(&mut self, value: &Value) -> RuntimeResult<String> {
        match value {
            Value::Instance(_) => self.dunder_text(value, "__repr__"),
            other => other.repr(),
        }
    }

    fn dunder_text(&mut self, value: &Value, method: &str) -> RuntimeResult<String> {
        let Value::Instance(instance) = value else {
            return value.repr();
        };
        let found = instance
            .class
            .lookup(method)
            .or_else(|| (method == "__str__").then(|| instance.class.lookup("__repr__")).flatten());
        let Some(Value::Function(function)) = found else {
            return value.repr();
        };
        let text = self.call_function(&function, vec![value.clone()], Vec::new())?;
        match text {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(RuntimeError::type_error(format!(
                "{method} returned non-string (type {})",
                other.type_name()
            ))),
        }
    }
}

impl Drop for Interpreter<'_> {
    fn drop(&mut self) {
        for weak in self.captured.drain(..) {
            if let Some(env) = weak.upgrade() {
                env.borrow_mut().clear();
            }
        }
        self.globals.borrow_mut().clear();
    }
}
