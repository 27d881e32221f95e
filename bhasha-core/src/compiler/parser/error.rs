use crate::failure::{Exception, StructuredFailure};
use crate::kit::lexer::SourcePosition;

/// 语法错误，包含位置信息
#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub kind: ParserErrorKind,
    pub location: ErrorLocation,
}

/// 错误位置信息
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorLocation {
    /// 特定位置
    At(SourcePosition),
    /// 文件末尾
    Eof,
}

/// 语法错误类型
#[derive(Debug, Clone, PartialEq)]
pub enum ParserErrorKind {
    /// 通用语法错误
    InvalidSyntax,
    /// 两个表达式之间疑似缺少逗号
    ForgotComma,
    /// 条件里把 `==` 写成了 `=`
    AssignInCondition,
    /// 期望的 token
    Expected(&'static str),
    /// 多余的缩进
    UnexpectedIndent,
    /// 复合语句后缺少缩进块
    ExpectedIndentedBlock { after: &'static str, line: usize },
    /// 无效的赋值目标
    CannotAssign(&'static str),
    /// 关键字参数后出现位置参数
    PositionalAfterKeyword,
    /// 无默认值参数跟在有默认值参数之后
    NonDefaultAfterDefault,
    /// 重复的参数名
    DuplicateArgument(String),
    /// 函数外的 return
    ReturnOutsideFunction,
    /// 循环外的 break
    BreakOutsideLoop,
    /// 循环外的 continue
    ContinueOutsideLoop,
    /// 整数字面量超出范围
    IntegerTooLarge(String),
    /// f-string 格式错误
    FString(&'static str),
    /// 嵌入表达式中的词法错误
    Embedded(String),
    /// 表达式嵌套过深
    TooDeeplyNested,
}

impl ParserError {
    pub fn at(kind: ParserErrorKind, position: SourcePosition) -> Self {
        Self {
            kind,
            location: ErrorLocation::At(position),
        }
    }

    pub fn at_eof(kind: ParserErrorKind) -> Self {
        Self {
            kind,
            location: ErrorLocation::Eof,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match &self.location {
            ErrorLocation::At(pos) => Some(pos.line),
            ErrorLocation::Eof => None,
        }
    }

    pub fn column(&self) -> Option<usize> {
        match &self.location {
            ErrorLocation::At(pos) => Some(pos.column),
            ErrorLocation::Eof => None,
        }
    }

    /// 规范语言措辞的错误信息
    pub fn message(&self) -> String {
        match &self.kind {
            ParserErrorKind::InvalidSyntax => "invalid syntax".to_string(),
            ParserErrorKind::ForgotComma => "invalid syntax. Perhaps you forgot a comma?".to_string(),
            ParserErrorKind::AssignInCondition => {
                "invalid syntax. Maybe you meant '==' or ':=' instead of '='?".to_string()
            }
            ParserErrorKind::Expected(what) => format!("expected '{what}'"),
            ParserErrorKind::UnexpectedIndent => "unexpected indent".to_string(),
            ParserErrorKind::ExpectedIndentedBlock { after, line } => {
                format!("expected an indented block after {after} on line {line}")
            }
            ParserErrorKind::CannotAssign(what) => format!(
                "cannot assign to {what} here. Maybe you meant '==' instead of '='?"
            ),
            ParserErrorKind::PositionalAfterKeyword => {
                "positional argument follows keyword argument".to_string()
            }
            ParserErrorKind::NonDefaultAfterDefault => {
                "parameter without a default follows parameter with a default".to_string()
            }
            ParserErrorKind::DuplicateArgument(name) => {
                format!("duplicate argument '{name}' in function definition")
            }
            ParserErrorKind::ReturnOutsideFunction => "'return' outside function".to_string(),
            ParserErrorKind::BreakOutsideLoop => "'break' outside loop".to_string(),
            ParserErrorKind::ContinueOutsideLoop => "'continue' not properly in loop".to_string(),
            ParserErrorKind::IntegerTooLarge(text) => {
                format!("integer literal too large: {text}")
            }
            ParserErrorKind::FString(msg) => format!("f-string: {msg}"),
            ParserErrorKind::Embedded(msg) => msg.clone(),
            ParserErrorKind::TooDeeplyNested => {
                "maximum recursion depth exceeded during compilation".to_string()
            }
        }
    }

    pub fn exception(&self) -> Exception {
        match &self.kind {
            ParserErrorKind::UnexpectedIndent | ParserErrorKind::ExpectedIndentedBlock { .. } => {
                Exception::IndentationError
            }
            ParserErrorKind::IntegerTooLarge(_) => Exception::OverflowError,
            ParserErrorKind::TooDeeplyNested => Exception::RecursionError,
            _ => Exception::SyntaxError,
        }
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let location_prefix = match &self.location {
            ErrorLocation::At(pos) => format!("{}:{}", pos.line, pos.column),
            ErrorLocation::Eof => "EOF".to_string(),
        };
        write!(f, "[{location_prefix}] {}", self.message())
    }
}

impl std::error::Error for ParserError {}

impl From<ParserError> for StructuredFailure {
    fn from(err: ParserError) -> Self {
        StructuredFailure::new(err.exception(), err.message(), err.line())
    }
}

/// 解析结果类型
pub type ParseResult<T> = Result<T, ParserError>;
