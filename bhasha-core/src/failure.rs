//! 结构化失败
//!
//! 程序错误是数据：执行器总是返回 [`ExecutionResult`]，失败时携带
//! 一个带封闭 [`ErrorKind`] 标签的 [`StructuredFailure`]。

use std::fmt;

use serde::Serialize;

/// 诊断管线使用的失败分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnresolvedName,
    TypeMismatch,
    DivisionByZero,
    IndexOutOfBounds,
    KeyNotFound,
    UnresolvedAttribute,
    ImportFailure,
    ResourceNotFound,
    MalformedSyntax,
    UnclosedDelimiter,
    IndentationFault,
    InvalidValue,
    ResourceExceeded,
    Cancelled,
    Unclassified,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 15] = [
        ErrorKind::UnresolvedName,
        ErrorKind::TypeMismatch,
        ErrorKind::DivisionByZero,
        ErrorKind::IndexOutOfBounds,
        ErrorKind::KeyNotFound,
        ErrorKind::UnresolvedAttribute,
        ErrorKind::ImportFailure,
        ErrorKind::ResourceNotFound,
        ErrorKind::MalformedSyntax,
        ErrorKind::UnclosedDelimiter,
        ErrorKind::IndentationFault,
        ErrorKind::InvalidValue,
        ErrorKind::ResourceExceeded,
        ErrorKind::Cancelled,
        ErrorKind::Unclassified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnresolvedName => "unresolved_name",
            ErrorKind::TypeMismatch => "type_mismatch",
            ErrorKind::DivisionByZero => "division_by_zero",
            ErrorKind::IndexOutOfBounds => "index_out_of_bounds",
            ErrorKind::KeyNotFound => "key_not_found",
            ErrorKind::UnresolvedAttribute => "unresolved_attribute",
            ErrorKind::ImportFailure => "import_failure",
            ErrorKind::ResourceNotFound => "resource_not_found",
            ErrorKind::MalformedSyntax => "malformed_syntax",
            ErrorKind::UnclosedDelimiter => "unclosed_delimiter",
            ErrorKind::IndentationFault => "indentation_fault",
            ErrorKind::InvalidValue => "invalid_value",
            ErrorKind::ResourceExceeded => "resource_exceeded",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Unclassified => "unclassified",
        }
    }

    /// 程序开始运行前就报出的错误
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            ErrorKind::MalformedSyntax | ErrorKind::UnclosedDelimiter | ErrorKind::IndentationFault
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 规范语言的异常类
///
/// 每个变体恰好对应一个 [`ErrorKind`]。`UnclosedDelimiter` 对外显示为
/// `SyntaxError`，但保留自己的标签。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exception {
    SyntaxError,
    UnclosedDelimiter,
    IndentationError,
    NameError,
    UnboundLocalError,
    TypeError,
    ZeroDivisionError,
    IndexError,
    KeyError,
    AttributeError,
    ImportError,
    ModuleNotFoundError,
    FileNotFoundError,
    ValueError,
    RecursionError,
    MemoryError,
    OverflowError,
    TimeoutError,
    Cancelled,
    EOFError,
    RuntimeError,
}

impl Exception {
    /// 回溯与原始失败行中显示的类名
    pub fn name(&self) -> &'static str {
        match self {
            Exception::SyntaxError | Exception::UnclosedDelimiter => "SyntaxError",
            Exception::IndentationError => "IndentationError",
            Exception::NameError => "NameError",
            Exception::UnboundLocalError => "UnboundLocalError",
            Exception::TypeError => "TypeError",
            Exception::ZeroDivisionError => "ZeroDivisionError",
            Exception::IndexError => "IndexError",
            Exception::KeyError => "KeyError",
            Exception::AttributeError => "AttributeError",
            Exception::ImportError => "ImportError",
            Exception::ModuleNotFoundError => "ModuleNotFoundError",
            Exception::FileNotFoundError => "FileNotFoundError",
            Exception::ValueError => "ValueError",
            Exception::RecursionError => "RecursionError",
            Exception::MemoryError => "MemoryError",
            Exception::OverflowError => "OverflowError",
            Exception::TimeoutError => "TimeoutError",
            Exception::Cancelled => "KeyboardInterrupt",
            Exception::EOFError => "EOFError",
            Exception::RuntimeError => "RuntimeError",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Exception::SyntaxError => ErrorKind::MalformedSyntax,
            Exception::UnclosedDelimiter => ErrorKind::UnclosedDelimiter,
            Exception::IndentationError => ErrorKind::IndentationFault,
            Exception::NameError | Exception::UnboundLocalError => ErrorKind::UnresolvedName,
            Exception::TypeError => ErrorKind::TypeMismatch,
            Exception::ZeroDivisionError => ErrorKind::DivisionByZero,
            Exception::IndexError => ErrorKind::IndexOutOfBounds,
            Exception::KeyError => ErrorKind::KeyNotFound,
            Exception::AttributeError => ErrorKind::UnresolvedAttribute,
            Exception::ImportError | Exception::ModuleNotFoundError => ErrorKind::ImportFailure,
            Exception::FileNotFoundError => ErrorKind::ResourceNotFound,
            Exception::ValueError => ErrorKind::InvalidValue,
            Exception::RecursionError
            | Exception::MemoryError
            | Exception::OverflowError
            | Exception::TimeoutError => ErrorKind::ResourceExceeded,
            Exception::Cancelled => ErrorKind::Cancelled,
            Exception::EOFError | Exception::RuntimeError => ErrorKind::Unclassified,
        }
    }

    /// 按规范名称查找异常类
    pub fn from_name(name: &str) -> Option<Exception> {
        let exc = match name {
            "SyntaxError" => Exception::SyntaxError,
            "IndentationError" => Exception::IndentationError,
            "NameError" => Exception::NameError,
            "UnboundLocalError" => Exception::UnboundLocalError,
            "TypeError" => Exception::TypeError,
            "ZeroDivisionError" => Exception::ZeroDivisionError,
            "IndexError" => Exception::IndexError,
            "KeyError" => Exception::KeyError,
            "AttributeError" => Exception::AttributeError,
            "ImportError" => Exception::ImportError,
            "ModuleNotFoundError" => Exception::ModuleNotFoundError,
            "FileNotFoundError" => Exception::FileNotFoundError,
            "ValueError" => Exception::ValueError,
            "RecursionError" => Exception::RecursionError,
            "MemoryError" => Exception::MemoryError,
            "OverflowError" => Exception::OverflowError,
            "TimeoutError" => Exception::TimeoutError,
            "EOFError" => Exception::EOFError,
            "RuntimeError" => Exception::RuntimeError,
            _ => return None,
        };
        Some(exc)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 语法或运行时错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredFailure {
    pub kind: ErrorKind,
    /// 规范异常类名，如 `NameError`
    pub exception: String,
    /// 原始描述，如 `name 'x' is not defined`
    pub detail: String,
    /// 规范源码中的行号（从 1 开始）
    pub line: Option<usize>,
}

impl StructuredFailure {
    pub fn new(exception: Exception, detail: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            kind: exception.kind(),
            exception: exception.name().to_string(),
            detail: detail.into(),
            line,
        }
    }

    /// `"<Exception>: <detail>"`，用作次要的调试行
    pub fn raw_message(&self) -> String {
        if self.detail.is_empty() {
            self.exception.clone()
        } else {
            format!("{}: {}", self.exception, self.detail)
        }
    }
}

impl fmt::Display for StructuredFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_message())
    }
}

impl std::error::Error for StructuredFailure {}

/// 一次执行的结果
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionResult {
    /// 写入输出槽的全部内容，包括失败之前的输出
    pub captured_output: String,
    pub failure: Option<StructuredFailure>,
}

impl ExecutionResult {
    pub fn completed(captured_output: String) -> Self {
        Self {
            captured_output,
            failure: None,
        }
    }

    pub fn failed(captured_output: String, failure: StructuredFailure) -> Self {
        Self {
            captured_output,
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_kind_has_name() {
        for kind in ErrorKind::ALL {
            assert!(!kind.as_str().is_empty());
        }
        assert_eq!(ErrorKind::DivisionByZero.to_string(), "division_by_zero");
    }

    #[test]
    fn test_exception_kind_mapping() {
        assert_eq!(Exception::NameError.kind(), ErrorKind::UnresolvedName);
        assert_eq!(Exception::ZeroDivisionError.kind(), ErrorKind::DivisionByZero);
        assert_eq!(Exception::UnclosedDelimiter.kind(), ErrorKind::UnclosedDelimiter);
        assert_eq!(Exception::UnclosedDelimiter.name(), "SyntaxError");
        assert_eq!(Exception::RecursionError.kind(), ErrorKind::ResourceExceeded);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Exception::from_name("KeyError"), Some(Exception::KeyError));
        assert_eq!(Exception::from_name("Nope"), None);
    }

    #[test]
    fn test_raw_message() {
        let failure = StructuredFailure::new(Exception::NameError, "name 'x' is not defined", Some(1));
        assert_eq!(failure.raw_message(), "NameError: name 'x' is not defined");
        assert_eq!(failure.to_string(), failure.raw_message());
        assert_eq!(failure.kind, ErrorKind::UnresolvedName);
    }

    #[test]
    fn test_syntax_kinds() {
        assert!(ErrorKind::UnclosedDelimiter.is_syntax());
        assert!(!ErrorKind::TypeMismatch.is_syntax());
    }

    #[test]
    fn test_execution_result() {
        let ok = ExecutionResult::completed("hi\n".into());
        assert!(ok.is_success());
        let failure = StructuredFailure::new(Exception::TypeError, "bad", None);
        let bad = ExecutionResult::failed("partial".into(), failure);
        assert!(!bad.is_success());
        assert_eq!(bad.captured_output, "partial");
    }
}
