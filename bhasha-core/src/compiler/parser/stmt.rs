use std::fmt;
use std::rc::Rc;

use super::expr::{BinaryOp, Expr};

/// 语句（带源码行号，用于运行时错误定位）
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: usize,
}

impl Stmt {
    pub fn new(kind: StmtKind, line: usize) -> Self {
        Self { kind, line }
    }
}

/// 语句块
pub type Block = Vec<Stmt>;

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    // 表达式语句
    Expr(ExprStmt),
    // 赋值 `a = b = value`
    Assign(AssignStmt),
    // 增量赋值 `a += 1`
    AugAssign(AugAssignStmt),
    Pass,
    Break,
    Continue,
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    FunctionDef(Rc<FunctionDef>),
    Return(ReturnStmt),
    ClassDef(Rc<ClassDef>),
    Import(ImportStmt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expression: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub targets: Vec<Expr>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AugAssignStmt {
    pub target: Expr,
    pub op: BinaryOp,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub if_condition: Expr,
    pub then_body: Block,
    pub elif_conditions: Vec<Expr>,
    pub elif_bodies: Vec<Block>,
    pub else_body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
    pub else_body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub target: Expr,
    pub iterable: Expr,
    pub body: Block,
    pub else_body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub base: Option<Expr>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportStmt {
    pub module_path: String,
    /// `from m import a, b`；为空表示 `import m`
    pub items: Vec<String>,
}

impl fmt::Display for StmtKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StmtKind::Expr(s) => write!(f, "{}", s.expression),
            StmtKind::Assign(a) => {
                for target in &a.targets {
                    write!(f, "{target} = ")?;
                }
                write!(f, "{}", a.value)
            }
            StmtKind::AugAssign(a) => write!(f, "{} {}= {}", a.target, a.op.symbol(), a.value),
            StmtKind::Pass => write!(f, "pass"),
            StmtKind::Break => write!(f, "break"),
            StmtKind::Continue => write!(f, "continue"),
            StmtKind::If(i) => write!(f, "if {}: ...", i.if_condition),
            StmtKind::While(w) => write!(f, "while {}: ...", w.condition),
            StmtKind::For(s) => write!(f, "for {} in {}: ...", s.target, s.iterable),
            StmtKind::FunctionDef(d) => {
                let params: Vec<&str> = d.params.iter().map(|p| p.name.as_str()).collect();
                write!(f, "def {}({}): ...", d.name, params.join(", "))
            }
            StmtKind::Return(r) => match &r.value {
                Some(v) => write!(f, "return {v}"),
                None => write!(f, "return"),
            },
            StmtKind::ClassDef(c) => write!(f, "class {}: ...", c.name),
            StmtKind::Import(i) if i.items.is_empty() => write!(f, "import {}", i.module_path),
            StmtKind::Import(i) => {
                write!(f, "from {} import {}", i.module_path, i.items.join(", "))
            }
        }
    }
}
