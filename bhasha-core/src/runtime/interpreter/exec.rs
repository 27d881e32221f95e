//! 语句执行

use std::rc::Rc;

#[cfg(feature = "trace_execution")]
use tracing::trace;

use super::{Flow, Interpreter, ValueIter};
use crate::compiler::parser::expr::{ExprKind, Slice};
use crate::compiler::parser::stmt::{ClassDef, FunctionDef, IfStmt, Stmt, StmtKind};
use crate::compiler::parser::{BinaryOp, Expr};
use crate::failure::Exception;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::object::{Class, Env, Function, Scope, ScopeKind};
use crate::runtime::operators;
use crate::runtime::stdlib::collect_items;
use crate::runtime::value::Value;

impl Interpreter<'_> {
    pub(crate) fn exec_block(&mut self, block: &[Stmt], env: &Env) -> RuntimeResult<Flow> {
        for stmt in block {
            match self.exec_stmt(stmt, env)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Env) -> RuntimeResult<Flow> {
        #[cfg(feature = "trace_execution")]
        trace!(target: "bhasha::runtime", line = stmt.line, "{}", stmt.kind);

        self.tick()
            .and_then(|_| self.exec_kind(&stmt.kind, env))
            .map_err(|e| e.with_line(stmt.line))
    }

    fn exec_kind(&mut self, kind: &StmtKind, env: &Env) -> RuntimeResult<Flow> {
        match kind {
            StmtKind::Expr(stmt) => {
                self.eval(&stmt.expression, env)?;
            }
            StmtKind::Assign(assign) => {
                let value = self.eval(&assign.value, env)?;
                for target in &assign.targets {
                    self.assign(target, value.clone(), env)?;
                }
            }
            StmtKind::AugAssign(aug) => self.exec_aug_assign(&aug.target, aug.op, &aug.value, env)?,
            StmtKind::Pass => {}
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
            StmtKind::If(stmt) => return self.exec_if(stmt, env),
            StmtKind::While(stmt) => {
                loop {
                    if !self.eval(&stmt.condition, env)?.is_truthy() {
                        if let Some(body) = &stmt.else_body {
                            return self.exec_block(body, env);
                        }
                        break;
                    }
                    match self.exec_block(&stmt.body, env)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                    self.tick()?;
                }
            }
            StmtKind::For(stmt) => {
                let iterable = self.eval(&stmt.iterable, env)?;
                let mut broke = false;
                for item in ValueIter::new(&iterable)? {
                    self.tick()?;
                    self.assign(&stmt.target, item, env)?;
                    match self.exec_block(&stmt.body, env)? {
                        Flow::Break => {
                            broke = true;
                            break;
                        }
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
                if !broke {
                    if let Some(body) = &stmt.else_body {
                        return self.exec_block(body, env);
                    }
                }
            }
            StmtKind::FunctionDef(def) => {
                let function = self.make_function(def, env)?;
                env.borrow_mut().set(&def.name, function);
            }
            StmtKind::Return(ret) => {
                let value = match &ret.value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            StmtKind::ClassDef(def) => {
                let class = self.make_class(def, env)?;
                env.borrow_mut().set(&def.name, class);
            }
            StmtKind::Import(import) => {
                let module = import
                    .module_path
                    .split('.')
                    .find(|part| !part.is_empty())
                    .unwrap_or(import.module_path.as_str());
                return Err(RuntimeError::new(
                    Exception::ModuleNotFoundError,
                    format!("No module named '{module}'"),
                ));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_if(&mut self, stmt: &IfStmt, env: &Env) -> RuntimeResult<Flow> {
        if self.eval(&stmt.if_condition, env)?.is_truthy() {
            return self.exec_block(&stmt.then_body, env);
        }
        for (condition, body) in stmt.elif_conditions.iter().zip(&stmt.elif_bodies) {
            if self.eval(condition, env)?.is_truthy() {
                return self.exec_block(body, env);
            }
        }
        match &stmt.else_body {
            Some(body) => self.exec_block(body, env),
            None => Ok(Flow::Normal),
        }
    }

    fn make_function(&mut self, def: &Rc<FunctionDef>, env: &Env) -> RuntimeResult<Value> {
        let mut defaults = Vec::with_capacity(def.params.len());
        for param in &def.params {
            defaults.push(match &param.default {
                Some(expr) => Some(self.eval(expr, env)?),
                None => None,
            });
        }
        // 方法的闭包跳过类体作用域
        let (closure, qualname) = {
            let scope = env.borrow();
            match (scope.kind(), scope.parent()) {
                (ScopeKind::Class, Some(parent)) => {
                    let class_name = scope
                        .get_local("__qualname__")
                        .and_then(|v| v.to_display().ok())
                        .unwrap_or_default();
                    (parent, format!("{class_name}.{}", def.name))
                }
                _ => (env.clone(), def.name.clone()),
            }
        };
        self.capture(&closure);
        let function = Function::new(def.clone(), qualname, defaults, closure);
        Ok(Value::Function(Rc::new(function)))
    }

    fn make_class(&mut self, def: &Rc<ClassDef>, env: &Env) -> RuntimeResult<Value> {
        let base = match &def.base {
            None => None,
            Some(expr) => match self.eval(expr, env)? {
                Value::Class(class) => Some(class),
                Value::Builtin(builtin) if builtin.name() == "object" => None,
                other => {
                    return Err(RuntimeError::type_error(format!(
                        "cannot inherit from '{}' in this sandbox",
                        other.repr()?
                    )))
                }
            },
        };
        let body_scope = Scope::child(env, ScopeKind::Class, None);
        body_scope
            .borrow_mut()
            .set("__qualname__", Value::str(def.name.as_str()));
        self.exec_block(&def.body, &body_scope)?;

        let class = Class::new(def.name.clone(), base);
        {
            let scope = body_scope.borrow();
            let mut attributes = class.attributes.borrow_mut();
            for (name, value) in scope.vars() {
                if name != "__qualname__" {
                    attributes.insert(name.clone(), value.clone());
                }
            }
            attributes.sort_keys();
        }
        body_scope.borrow_mut().clear();
        Ok(Value::Class(Rc::new(class)))
    }

    /// 赋值到目标表达式
    pub(crate) fn assign(&mut self, target: &Expr, value: Value, env: &Env) -> RuntimeResult<()> {
        match &**target {
            ExprKind::VarRef(var) => {
                env.borrow_mut().set(&var.name, value);
                Ok(())
            }
            ExprKind::MemberAccess(member) => {
                let object = self.eval(&member.object, env)?;
                self.set_attribute(&object, &member.member, value)
            }
            ExprKind::IndexAccess(access) => {
                let object = self.eval(&access.object, env)?;
                if let ExprKind::Slice(slice) = &*access.index {
                    return self.assign_slice(&object, slice, value, env);
                }
                let index = self.eval(&access.index, env)?;
                self.set_item(&object, &index, value)
            }
            ExprKind::LiteralTuple(tuple) => self.unpack(&tuple.elements, value, env),
            ExprKind::LiteralList(list) => self.unpack(&list.elements, value, env),
            _ => Err(RuntimeError::new(
                Exception::SyntaxError,
                format!("cannot assign to {target}"),
            )),
        }
    }

    fn unpack(&mut self, targets: &[Expr], value: Value, env: &Env) -> RuntimeResult<()> {
        // range 先按长度判断，不展开
        if let Value::Range(range) = &value {
            check_unpack_len(targets.len(), range.len())?;
        }
        let items: Vec<Value> = match &value {
            Value::List(_) | Value::Tuple(_) | Value::Str(_) | Value::Dict(_) | Value::Range(_) => {
                collect_items(self, &value)?
            }
            other => {
                return Err(RuntimeError::type_error(format!(
                    "cannot unpack non-iterable {} object",
                    other.type_name()
                )))
            }
        };
        check_unpack_len(targets.len(), items.len())?;
        for (target, item) in targets.iter().zip(items) {
            self.assign(target, item, env)?;
        }
        Ok(())
    }

    fn exec_aug_assign(&mut self, target: &Expr, op: BinaryOp, value: &Expr, env: &Env) -> RuntimeResult<()> {
        // 目标的子表达式只求值一次
        match &**target {
            ExprKind::VarRef(var) => {
                let current = self.resolve(env, &var.name)?;
                let rhs = self.eval(value, env)?;
                let result = self.aug_apply(op, current, rhs)?;
                env.borrow_mut().set(&var.name, result);
                Ok(())
            }
            ExprKind::MemberAccess(member) => {
                let object = self.eval(&member.object, env)?;
                let current = self.get_attribute(&object, &member.member)?;
                let rhs = self.eval(value, env)?;
                let result = self.aug_apply(op, current, rhs)?;
                self.set_attribute(&object, &member.member, result)
            }
            ExprKind::IndexAccess(access) => {
                let object = self.eval(&access.object, env)?;
                let index = self.eval(&access.index, env)?;
                let current = self.get_item(&object, &index)?;
                let rhs = self.eval(value, env)?;
                let result = self.aug_apply(op, current, rhs)?;
                self.set_item(&object, &index, result)
            }
            _ => Err(RuntimeError::new(
                Exception::SyntaxError,
                "illegal expression for augmented assignment",
            )),
        }
    }

    /// `xs += ys` 对列表原地扩展
    fn aug_apply(&mut self, op: BinaryOp, current: Value, rhs: Value) -> RuntimeResult<Value> {
        if let (BinaryOp::Add, Value::List(list)) = (op, &current) {
            let extra = collect_items(self, &rhs)?;
            let new_len = list.borrow().len() + extra.len();
            self.budget().check_collection(new_len)?;
            list.borrow_mut().extend(extra);
            return Ok(current);
        }
        operators::binary(op, &current, &rhs, self.budget())
    }

    fn assign_slice(&mut self, object: &Value, slice: &Slice, value: Value, env: &Env) -> RuntimeResult<()> {
        let Value::List(list) = object else {
            return Err(RuntimeError::type_error(format!(
                "'{}' object does not support item assignment",
                object.type_name()
            )));
        };
        if slice.step.is_some() {
            return Err(RuntimeError::value_error(
                "extended slice assignment is not supported",
            ));
        }
        let len = list.borrow().len() as i64;
        let lower = self.eval_slice_bound(&slice.lower, env)?;
        let upper = self.eval_slice_bound(&slice.upper, env)?;
        let clamp = |bound: Option<i64>, default: i64| -> usize {
            let b = bound.unwrap_or(default);
            let b = if b < 0 { (b + len).max(0) } else { b.min(len) };
            b as usize
        };
        let start = clamp(lower, 0);
        let stop = clamp(upper, len).max(start);
        let replacement = match collect_items(self, &value) {
            Err(err) if err.exception == Exception::TypeError => {
                return Err(RuntimeError::type_error("can only assign an iterable"))
            }
            other => other?,
        };
        let new_len = list.borrow().len() - (stop - start) + replacement.len();
        self.budget().check_collection(new_len)?;
        list.borrow_mut().splice(start..stop, replacement);
        Ok(())
    }
}

fn check_unpack_len(expected: usize, got: usize) -> RuntimeResult<()> {
    if got > expected {
        return Err(RuntimeError::value_error(format!(
            "too many values to unpack (expected {expected})"
        )));
    }
    if got < expected {
        return Err(RuntimeError::value_error(format!(
            "not enough values to unpack (expected {expected}, got {got})"
        )));
    }
    Ok(())
}
