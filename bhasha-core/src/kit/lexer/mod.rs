//! 词法分析通用工具
//!
//! 位置追踪、字符流与泛型 Token，供规范语言的扫描器使用。

pub mod chars;
pub mod position;
pub mod stream;
pub mod token;

pub use chars::{is_identifier_char, is_identifier_start};
pub use position::{SourcePosition, SourceSpan};
pub use stream::CharStream;
pub use token::Token;
