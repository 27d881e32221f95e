//! 通用工具

pub mod lexer;
pub mod ordered;

pub use ordered::{DuplicateKey, OrderedTable};
