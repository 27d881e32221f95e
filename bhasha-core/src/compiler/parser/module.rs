use std::fmt;

use super::stmt::Block;

/// 一次提交的完整程序（单文件）
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Block,
}

impl Program {
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.body {
            writeln!(f, "{}", stmt.kind)?;
        }
        Ok(())
    }
}
