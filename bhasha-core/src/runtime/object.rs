//! 函数、类、实例与作用域

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use indexmap::IndexMap;

use super::error::{RuntimeError, RuntimeResult};
use super::value::Value;
use crate::compiler::parser::expr::ExprKind;
use crate::compiler::parser::stmt::{FunctionDef, Stmt, StmtKind};
use crate::compiler::parser::Expr;
use crate::failure::Exception;

pub type Env = Rc<RefCell<Scope>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Function,
    Class,
    Comprehension,
}

/// 名字作用域；函数作用域带有静态确定的局部变量集合
#[derive(Debug)]
pub struct Scope {
    vars: HashMap<String, Value>,
    locals: Option<Rc<HashSet<String>>>,
    parent: Option<Env>,
    kind: ScopeKind,
}

impl Scope {
    pub fn module() -> Env {
        Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            locals: None,
            parent: None,
            kind: ScopeKind::Module,
        }))
    }

    pub fn child(parent: &Env, kind: ScopeKind, locals: Option<Rc<HashSet<String>>>) -> Env {
        Rc::new(RefCell::new(Scope {
            vars: HashMap::new(),
            locals,
            parent: Some(parent.clone()),
            kind,
        }))
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn parent(&self) -> Option<Env> {
        self.parent.clone()
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }

    pub fn vars(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    /// 清空绑定，用于执行结束后打破引用环
    pub fn clear(&mut self) {
        self.vars.clear();
        self.parent = None;
    }
}

/// 沿作用域链查找；`Ok(None)` 表示所有作用域都没有此名字
pub fn lookup(env: &Env, name: &str) -> RuntimeResult<Option<Value>> {
    let mut current = env.clone();
    loop {
        let next = {
            let scope = current.borrow();
            if let Some(value) = scope.vars.get(name) {
                return Ok(Some(value.clone()));
            }
            if scope.locals.as_ref().is_some_and(|l| l.contains(name)) {
                return Err(RuntimeError::new(
                    Exception::UnboundLocalError,
                    format!("cannot access local variable '{name}' where it is not associated with a value"),
                ));
            }
            // 类体作用域对其内部函数不可见，但类体本身可以读外层
            match &scope.parent {
                Some(parent) => parent.clone(),
                None => return Ok(None),
            }
        };
        current = next;
    }
}

/// 用户定义函数
#[derive(Debug)]
pub struct Function {
    pub def: Rc<FunctionDef>,
    /// `Class.method` 形式的限定名，用于错误信息
    pub qualname: String,
    /// 与参数一一对应，定义时求值
    pub defaults: Vec<Option<Value>>,
    pub closure: Env,
    pub locals: Rc<HashSet<String>>,
}

impl Function {
    pub fn new(def: Rc<FunctionDef>, qualname: String, defaults: Vec<Option<Value>>, closure: Env) -> Self {
        let locals = Rc::new(collect_locals(&def));
        Self {
            def,
            qualname,
            defaults,
            closure,
            locals,
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }
}

/// 函数体中被赋值的名字（包括参数），不进入嵌套的 def/class
fn collect_locals(def: &FunctionDef) -> HashSet<String> {
    let mut names: HashSet<String> = def.params.iter().map(|p| p.name.clone()).collect();
    collect_block(&def.body, &mut names);
    names
}

fn collect_block(block: &[Stmt], names: &mut HashSet<String>) {
    for stmt in block {
        match &stmt.kind {
            StmtKind::Assign(assign) => {
                for target in &assign.targets {
                    collect_target(target, names);
                }
            }
            StmtKind::AugAssign(aug) => collect_target(&aug.target, names),
            StmtKind::For(stmt) => {
                collect_target(&stmt.target, names);
                collect_block(&stmt.body, names);
                if let Some(body) = &stmt.else_body {
                    collect_block(body, names);
                }
            }
            StmtKind::While(stmt) => {
                collect_block(&stmt.body, names);
                if let Some(body) = &stmt.else_body {
                    collect_block(body, names);
                }
            }
            StmtKind::If(stmt) => {
                collect_block(&stmt.then_body, names);
                for body in &stmt.elif_bodies {
                    collect_block(body, names);
                }
                if let Some(body) = &stmt.else_body {
                    collect_block(body, names);
                }
            }
            StmtKind::FunctionDef(def) => {
                names.insert(def.name.clone());
            }
            StmtKind::ClassDef(class) => {
                names.insert(class.name.clone());
            }
            _ => {}
        }
    }
}

fn collect_target(target: &Expr, names: &mut HashSet<String>) {
    match &**target {
        ExprKind::VarRef(v) => {
            names.insert(v.name.clone());
        }
        ExprKind::LiteralTuple(t) => t.elements.iter().for_each(|e| collect_target(e, names)),
        ExprKind::LiteralList(l) => l.elements.iter().for_each(|e| collect_target(e, names)),
        _ => {}
    }
}

/// 用户定义类（单继承）
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub base: Option<Rc<Class>>,
    pub attributes: RefCell<IndexMap<String, Value>>,
}

impl Class {
    pub fn new(name: impl Into<String>, base: Option<Rc<Class>>) -> Self {
        Self {
            name: name.into(),
            base,
            attributes: RefCell::new(IndexMap::new()),
        }
    }

    /// 沿继承链查找属性
    pub fn lookup(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.attributes.borrow().get(name) {
            return Some(value.clone());
        }
        self.base.as_ref().and_then(|base| base.lookup(name))
    }

    pub fn is_subclass_of(self: &Rc<Self>, other: &Rc<Class>) -> bool {
        let mut current = Some(self.clone());
        while let Some(class) = current {
            if Rc::ptr_eq(&class, other) {
                return true;
            }
            current = class.base.clone();
        }
        false
    }
}

#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: RefCell<IndexMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: RefCell::new(IndexMap::new()),
        }
    }
}

/// `obj.method` 绑定了接收者的用户方法
#[derive(Debug)]
pub struct BoundMethod {
    pub receiver: Value,
    pub function: Rc<Function>,
}

/// `xs.append` 这类内建类型方法
#[derive(Debug)]
pub struct NativeMethod {
    pub receiver: Value,
    pub name: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;

    #[test]
    fn test_lookup_walks_parents() {
        let globals = Scope::module();
        globals.borrow_mut().set("x", Value::Int(1));
        let child = Scope::child(&globals, ScopeKind::Function, None);
        assert!(lookup(&child, "x").unwrap().unwrap().py_eq(&Value::Int(1)).unwrap());
        assert!(lookup(&child, "y").unwrap().is_none());
    }

    #[test]
    fn test_unbound_local() {
        let globals = Scope::module();
        globals.borrow_mut().set("x", Value::Int(1));
        let locals: HashSet<String> = ["x".to_string()].into_iter().collect();
        let child = Scope::child(&globals, ScopeKind::Function, Some(Rc::new(locals)));
        let err = lookup(&child, "x").unwrap_err();
        assert_eq!(err.exception, Exception::UnboundLocalError);
    }

    #[test]
    fn test_collect_locals_skips_nested_defs() {
        let program = compile(
            "def f(a):\n    b = 1\n    for i, j in x:\n        pass\n    def g():\n        c = 2\n",
        )
        .unwrap();
        let StmtKind::FunctionDef(def) = &program.body[0].kind else {
            panic!("expected def");
        };
        let locals = collect_locals(def);
        for name in ["a", "b", "i", "j", "g"] {
            assert!(locals.contains(name), "missing {name}");
        }
        assert!(!locals.contains("c"));
    }

    #[test]
    fn test_class_lookup_and_subclass() {
        let base = Rc::new(Class::new("Base", None));
        base.attributes.borrow_mut().insert("kind".into(), Value::str("base"));
        let derived = Rc::new(Class::new("Derived", Some(base.clone())));
        assert!(derived.lookup("kind").is_some());
        assert!(derived.is_subclass_of(&base));
        assert!(!base.is_subclass_of(&derived));
    }
}
