//! 字符流抽象
//!
//! 在完整的源文本上提供字符级预读与消费，同时追踪位置。

use super::position::SourcePosition;

/// 字符流
#[derive(Debug, Clone)]
pub struct CharStream<'a> {
    source: &'a str,
    position: SourcePosition,
}

impl<'a> CharStream<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            position: SourcePosition::start(),
        }
    }

    /// 获取当前位置
    pub fn position(&self) -> SourcePosition {
        self.position
    }

    /// 剩余未消费的文本
    pub fn rest(&self) -> &'a str {
        &self.source[self.position.byte_offset..]
    }

    /// 从 `start` 到当前位置的原始文本
    pub fn slice_from(&self, start: SourcePosition) -> &'a str {
        &self.source[start.byte_offset..self.position.byte_offset]
    }

    /// 预读第n个字符（不消费）
    pub fn peek(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn is_eof(&self) -> bool {
        self.position.byte_offset >= self.source.len()
    }

    /// 消费一个字符
    pub fn advance(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.position.advance(c);
        Some(c)
    }

    /// 如果下一个字符是 `expected` 则消费
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek(0) == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// 剩余文本以 `prefix` 开头
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_and_advance() {
        let mut stream = CharStream::new("ab\nक");
        assert_eq!(stream.peek(0), Some('a'));
        assert_eq!(stream.peek(3), Some('क'));
        assert_eq!(stream.advance(), Some('a'));
        assert_eq!(stream.advance(), Some('b'));
        assert!(stream.eat('\n'));
        assert_eq!(stream.position().line, 2);
        assert_eq!(stream.advance(), Some('क'));
        assert!(stream.is_eof());
        assert_eq!(stream.advance(), None);
    }

    #[test]
    fn test_slice_from() {
        let mut stream = CharStream::new("hello world");
        let start = stream.position();
        for _ in 0..5 {
            stream.advance();
        }
        assert_eq!(stream.slice_from(start), "hello");
        assert!(stream.starts_with(" w"));
    }
}
