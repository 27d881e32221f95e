//! 运行时错误

use std::fmt;

use crate::failure::{Exception, StructuredFailure};

/// 运行期抛出的异常：类别 + 原文描述 + 出错行
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub exception: Exception,
    pub message: String,
    pub line: Option<usize>,
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

impl RuntimeError {
    pub fn new(exception: Exception, message: impl Into<String>) -> Self {
        Self {
            exception,
            message: message.into(),
            line: None,
        }
    }

    /// 记录最内层出错语句的行号；已有行号时保持不变
    pub fn with_line(mut self, line: usize) -> Self {
        if self.line.is_none() {
            self.line = Some(line);
        }
        self
    }

    pub fn name_error(name: &str) -> Self {
        Self::new(Exception::NameError, format!("name '{name}' is not defined"))
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(Exception::TypeError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(Exception::ValueError, message)
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Self::new(Exception::IndexError, message)
    }

    pub fn zero_division(message: impl Into<String>) -> Self {
        Self::new(Exception::ZeroDivisionError, message)
    }

    pub fn attribute_error(type_name: &str, attr: &str) -> Self {
        Self::new(
            Exception::AttributeError,
            format!("'{type_name}' object has no attribute '{attr}'"),
        )
    }

    pub fn overflow() -> Self {
        Self::new(Exception::OverflowError, "integer result too large")
    }

    pub fn memory(what: &str, limit: usize) -> Self {
        Self::new(
            Exception::MemoryError,
            format!("{what} exceeds the sandbox limit of {limit}"),
        )
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "[line {line}] {}: {}", self.exception, self.message),
            None => write!(f, "{}: {}", self.exception, self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<RuntimeError> for StructuredFailure {
    fn from(err: RuntimeError) -> Self {
        StructuredFailure::new(err.exception, err.message, err.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::ErrorKind;

    #[test]
    fn test_innermost_line_wins() {
        let err = RuntimeError::name_error("x").with_line(5).with_line(2);
        assert_eq!(err.line, Some(5));
        assert_eq!(err.to_string(), "[line 5] NameError: name 'x' is not defined");
    }

    #[test]
    fn test_into_structured_failure() {
        let failure: StructuredFailure = RuntimeError::zero_division("division by zero")
            .with_line(3)
            .into();
        assert_eq!(failure.kind, ErrorKind::DivisionByZero);
        assert_eq!(failure.raw_message(), "ZeroDivisionError: division by zero");
        assert_eq!(failure.line, Some(3));
    }
}
