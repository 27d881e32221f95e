//! 规范语言的前端：词法分析 + 语法分析

pub mod lexer;
pub mod parser;

use crate::failure::StructuredFailure;
use parser::Program;

/// 源码 → 语法树；词法或语法错误统一转为结构化失败
pub fn compile(source: &str) -> Result<Program, StructuredFailure> {
    let tokens = lexer::tokenize(source)?;
    let program = parser::parser::Parser::new(tokens).parse()?;
    Ok(program)
}
