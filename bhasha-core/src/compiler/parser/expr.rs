use std::fmt;

// 表达式类型别名
pub type Expr = Box<ExprKind>;

/// 表达式
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    LiteralInt(LiteralInt),
    LiteralFloat(LiteralFloat),
    LiteralString(LiteralString),
    LiteralBool(bool),
    LiteralNone,
    // f"..." 字符串插值
    FString(FStringExpr),
    LiteralList(LiteralList),
    LiteralTuple(LiteralTuple),
    LiteralDict(LiteralDict),
    // [expr for target in iterable if condition]
    ListComp(ListComp),
    VarRef(VarRef),
    Binary(Binary),
    Unary(Unary),
    // 链式比较 a < b <= c
    Compare(Compare),
    // and / or（短路求值）
    Logical(Logical),
    // a if cond else b
    Conditional(Conditional),
    FunctionCall(FunctionCall),
    MemberAccess(MemberAccess),
    IndexAccess(IndexAccess),
    // 仅出现在下标位置
    Slice(Slice),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralInt {
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralFloat {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralString {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FStringPart {
    Literal(String),
    Interpolation {
        expr: Expr,
        /// `!r` / `!s`
        conversion: Option<char>,
        /// 格式说明，如 `.2f`
        spec: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FStringExpr {
    pub parts: Vec<FStringPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralList {
    pub elements: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralTuple {
    pub elements: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralDict {
    pub entries: Vec<(Expr, Expr)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListComp {
    pub element: Expr,
    pub target: Expr,
    pub iterable: Expr,
    pub conditions: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "** or pow()",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    pub left: Expr,
    pub op: BinaryOp,
    pub right: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unary {
    pub op: UnaryOp,
    pub operand: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::LtEq => "<=",
            CompareOp::GtEq => ">=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not in",
            CompareOp::Is => "is",
            CompareOp::IsNot => "is not",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Compare {
    pub left: Expr,
    pub ops: Vec<CompareOp>,
    pub comparators: Vec<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Logical {
    pub left: Expr,
    pub op: LogicalOp,
    pub right: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub condition: Expr,
    pub then_expr: Expr,
    pub else_expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Positional(Expr),
    Keyword(String, Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub function_expr: Expr,
    pub arguments: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccess {
    pub object: Expr,
    pub member: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexAccess {
    pub object: Expr,
    pub index: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub lower: Option<Expr>,
    pub upper: Option<Expr>,
    pub step: Option<Expr>,
}

impl ExprKind {
    /// "cannot assign to ..." 信息中的描述；合法赋值目标返回 `None`
    pub fn assign_target_error(&self) -> Option<&'static str> {
        match self {
            ExprKind::VarRef(_) | ExprKind::MemberAccess(_) | ExprKind::IndexAccess(_) => None,
            ExprKind::LiteralTuple(t) => t
                .elements
                .iter()
                .find_map(|e| e.assign_target_error()),
            ExprKind::LiteralList(l) => l
                .elements
                .iter()
                .find_map(|e| e.assign_target_error()),
            ExprKind::FunctionCall(_) => Some("function call"),
            ExprKind::LiteralInt(_)
            | ExprKind::LiteralFloat(_)
            | ExprKind::LiteralString(_)
            | ExprKind::LiteralBool(_)
            | ExprKind::LiteralNone => Some("literal"),
            ExprKind::FString(_) => Some("f-string expression"),
            ExprKind::Compare(_) => Some("comparison"),
            ExprKind::Conditional(_) => Some("conditional expression"),
            ExprKind::LiteralDict(_) => Some("dict literal"),
            ExprKind::ListComp(_) => Some("list comprehension"),
            _ => Some("expression"),
        }
    }
}

impl fmt::Display for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(items: &[Expr]) -> String {
            items.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ")
        }
        match self {
            ExprKind::LiteralInt(int) => write!(f, "{}", int.value),
            ExprKind::LiteralFloat(float) => write!(f, "{}", float.value),
            ExprKind::LiteralString(s) => write!(f, "{:?}", s.value),
            ExprKind::LiteralBool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            ExprKind::LiteralNone => write!(f, "None"),
            ExprKind::FString(_) => write!(f, "f\"...\""),
            ExprKind::LiteralList(list) => write!(f, "[{}]", join(&list.elements)),
            ExprKind::LiteralTuple(tuple) => write!(f, "({})", join(&tuple.elements)),
            ExprKind::LiteralDict(dict) => {
                let entries = dict
                    .entries
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{entries}}}")
            }
            ExprKind::ListComp(c) => write!(f, "[{} for {} in {}]", c.element, c.target, c.iterable),
            ExprKind::VarRef(v) => write!(f, "{}", v.name),
            ExprKind::Binary(bin) => write!(f, "({} {:?} {})", bin.left, bin.op, bin.right),
            ExprKind::Unary(un) => write!(f, "({:?} {})", un.op, un.operand),
            ExprKind::Compare(cmp) => {
                write!(f, "({}", cmp.left)?;
                for (op, right) in cmp.ops.iter().zip(&cmp.comparators) {
                    write!(f, " {} {}", op.symbol(), right)?;
                }
                write!(f, ")")
            }
            ExprKind::Logical(l) => write!(f, "({} {:?} {})", l.left, l.op, l.right),
            ExprKind::Conditional(c) => {
                write!(f, "({} if {} else {})", c.then_expr, c.condition, c.else_expr)
            }
            ExprKind::FunctionCall(call) => {
                let args = call
                    .arguments
                    .iter()
                    .map(|a| match a {
                        Argument::Positional(e) => e.to_string(),
                        Argument::Keyword(name, e) => format!("{name}={e}"),
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}({})", call.function_expr, args)
            }
            ExprKind::MemberAccess(m) => write!(f, "{}.{}", m.object, m.member),
            ExprKind::IndexAccess(i) => write!(f, "{}[{}]", i.object, i.index),
            ExprKind::Slice(s) => {
                let part = |e: &Option<Expr>| e.as_ref().map(|e| e.to_string()).unwrap_or_default();
                write!(f, "{}:{}", part(&s.lower), part(&s.upper))?;
                if s.step.is_some() {
                    write!(f, ":{}", part(&s.step))?;
                }
                Ok(())
            }
        }
    }
}
