//! Lexer 错误类型

use crate::failure::{Exception, StructuredFailure};
use crate::kit::lexer::SourcePosition;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexerErrorKind {
    /// 非法字符
    InvalidCharacter(char),
    /// 单行字符串未闭合
    UnterminatedString { detected_line: usize },
    /// 三引号字符串未闭合
    UnterminatedTripleString { detected_line: usize },
    /// 括号到文件末尾仍未闭合
    NeverClosed(char),
    /// 多余的右括号
    Unmatched(char),
    /// 左右括号类型不一致
    Mismatched { closing: char, opening: char },
    /// 缩进回退到不存在的层级
    InconsistentDedent,
    /// 数字字面量格式错误
    InvalidNumber,
    /// 十进制整数前导零
    LeadingZeros,
    /// 续行符后还有字符
    BadContinuation,
    /// 括号嵌套过深
    TooDeeplyNested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub kind: LexerErrorKind,
    pub position: SourcePosition,
}

impl LexerError {
    pub fn at(kind: LexerErrorKind, position: SourcePosition) -> Self {
        Self { kind, position }
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }

    /// 规范语言措辞的错误信息
    pub fn message(&self) -> String {
        match &self.kind {
            LexerErrorKind::InvalidCharacter(c) if c.is_ascii() => "invalid syntax".to_string(),
            LexerErrorKind::InvalidCharacter(c) => {
                format!("invalid character '{}' (U+{:04X})", c, *c as u32)
            }
            LexerErrorKind::UnterminatedString { detected_line } => {
                format!("unterminated string literal (detected at line {detected_line})")
            }
            LexerErrorKind::UnterminatedTripleString { detected_line } => {
                format!("unterminated triple-quoted string literal (detected at line {detected_line})")
            }
            LexerErrorKind::NeverClosed(c) => format!("'{c}' was never closed"),
            LexerErrorKind::Unmatched(c) => format!("unmatched '{c}'"),
            LexerErrorKind::Mismatched { closing, opening } => format!(
                "closing parenthesis '{closing}' does not match opening parenthesis '{opening}'"
            ),
            LexerErrorKind::InconsistentDedent => {
                "unindent does not match any outer indentation level".to_string()
            }
            LexerErrorKind::InvalidNumber => "invalid decimal literal".to_string(),
            LexerErrorKind::LeadingZeros => {
                "leading zeros in decimal integer literals are not permitted".to_string()
            }
            LexerErrorKind::BadContinuation => {
                "unexpected character after line continuation character".to_string()
            }
            LexerErrorKind::TooDeeplyNested => "too many nested parentheses".to_string(),
        }
    }

    pub fn exception(&self) -> Exception {
        match &self.kind {
            LexerErrorKind::UnterminatedString { .. }
            | LexerErrorKind::UnterminatedTripleString { .. }
            | LexerErrorKind::NeverClosed(_) => Exception::UnclosedDelimiter,
            LexerErrorKind::InconsistentDedent => Exception::IndentationError,
            _ => Exception::SyntaxError,
        }
    }
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}:{}] {}", self.position.line, self.position.column, self.message())
    }
}

impl std::error::Error for LexerError {}

impl From<LexerError> for StructuredFailure {
    fn from(err: LexerError) -> Self {
        StructuredFailure::new(err.exception(), err.message(), Some(err.line()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::ErrorKind;

    #[test]
    fn test_never_closed_message() {
        let err = LexerError::at(LexerErrorKind::NeverClosed('('), SourcePosition::new(3, 6, 20));
        assert_eq!(err.message(), "'(' was never closed");
        assert_eq!(err.line(), 3);
        assert!(err.to_string().starts_with("[3:6]"));
    }

    #[test]
    fn test_invalid_character_message() {
        let err = LexerError::at(LexerErrorKind::InvalidCharacter('।'), SourcePosition::start());
        assert_eq!(err.message(), "invalid character '।' (U+0964)");
        let ascii = LexerError::at(LexerErrorKind::InvalidCharacter('$'), SourcePosition::start());
        assert_eq!(ascii.message(), "invalid syntax");
    }

    #[test]
    fn test_into_structured_failure() {
        let err = LexerError::at(
            LexerErrorKind::UnterminatedString { detected_line: 2 },
            SourcePosition::new(2, 1, 5),
        );
        let failure: StructuredFailure = err.into();
        assert_eq!(failure.kind, ErrorKind::UnclosedDelimiter);
        assert_eq!(failure.exception, "SyntaxError");
        assert_eq!(failure.line, Some(2));

        let dedent = LexerError::at(LexerErrorKind::InconsistentDedent, SourcePosition::start());
        assert_eq!(StructuredFailure::from(dedent).kind, ErrorKind::IndentationFault);
    }
}
