//! 源代码位置追踪
//!
//! - line/column: 人类可读的错误显示（1-based，列按 Unicode 码点计数）
//! - byte_offset: 在原始 `&str` 中切片（0-based）

/// 源代码位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourcePosition {
    /// 行号，1-based
    pub line: usize,
    /// 列号，1-based，Unicode码点计数
    pub column: usize,
    /// 字节偏移，0-based
    pub byte_offset: usize,
}

impl SourcePosition {
    pub fn new(line: usize, column: usize, byte_offset: usize) -> Self {
        Self {
            line,
            column,
            byte_offset,
        }
    }

    /// 文件起始位置
    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            byte_offset: 0,
        }
    }

    /// 前进一个字符
    pub fn advance(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.byte_offset += c.len_utf8();
    }
}

/// 源代码区间（Span）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceSpan {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl SourceSpan {
    /// 单点区间
    pub fn at(pos: SourcePosition) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub fn range(start: SourcePosition, end: SourcePosition) -> Self {
        Self { start, end }
    }

    /// 合并两个区间
    pub fn merge(&self, other: &SourceSpan) -> Self {
        Self {
            start: self.start,
            end: other.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_start() {
        let pos = SourcePosition::start();
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 1);
        assert_eq!(pos.byte_offset, 0);
    }

    #[test]
    fn test_position_advance_newline() {
        let mut pos = SourcePosition::start();
        pos.advance('a');
        pos.advance('\n');
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 1);
        assert_eq!(pos.byte_offset, 2);
    }

    #[test]
    fn test_position_advance_devanagari() {
        let mut pos = SourcePosition::start();
        // 天城文字符：3字节UTF-8，1列
        pos.advance('क');
        assert_eq!(pos.column, 2);
        assert_eq!(pos.byte_offset, 3);
    }

    #[test]
    fn test_span_merge() {
        let a = SourceSpan::at(SourcePosition::new(1, 1, 0));
        let b = SourceSpan::at(SourcePosition::new(2, 4, 10));
        let merged = a.merge(&b);
        assert_eq!(merged.start.line, 1);
        assert_eq!(merged.end.column, 4);
    }
}
