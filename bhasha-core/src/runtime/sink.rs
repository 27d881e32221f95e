//! 每次执行独占的输出与输入通道

use std::collections::VecDeque;

use super::error::{RuntimeError, RuntimeResult};
use crate::failure::Exception;

/// 程序的标准输出目标
pub trait OutputSink {
    fn write_str(&mut self, text: &str) -> RuntimeResult<()>;
}

/// 内存缓冲区，带字节上限
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    buffer: String,
    limit: Option<usize>,
}

impl CaptureBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            buffer: String::new(),
            limit: Some(limit),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

impl OutputSink for CaptureBuffer {
    fn write_str(&mut self, text: &str) -> RuntimeResult<()> {
        if let Some(limit) = self.limit {
            if self.buffer.len() + text.len() > limit {
                // 保留截断前能写下的部分
                let room = limit.saturating_sub(self.buffer.len());
                let cut = (0..=room.min(text.len()))
                    .rev()
                    .find(|i| text.is_char_boundary(*i))
                    .unwrap_or(0);
                self.buffer.push_str(&text[..cut]);
                return Err(RuntimeError::memory("program output in bytes", limit));
            }
        }
        self.buffer.push_str(text);
        Ok(())
    }
}

/// `input()` 读取的预置输入行
#[derive(Debug, Default, Clone)]
pub struct InputLines {
    lines: VecDeque<String>,
}

impl InputLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn read_line(&mut self) -> RuntimeResult<String> {
        self.lines
            .pop_front()
            .ok_or_else(|| RuntimeError::new(Exception::EOFError, "EOF when reading a line"))
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_collects_text() {
        let mut sink = CaptureBuffer::new();
        sink.write_str("नमस्ते").unwrap();
        sink.write_str("\n").unwrap();
        assert_eq!(sink.as_str(), "नमस्ते\n");
    }

    #[test]
    fn test_capture_limit_keeps_prefix() {
        let mut sink = CaptureBuffer::with_limit(4);
        sink.write_str("abc").unwrap();
        let err = sink.write_str("def").unwrap_err();
        assert_eq!(err.exception, Exception::MemoryError);
        assert_eq!(sink.as_str(), "abcd");
    }

    #[test]
    fn test_capture_limit_respects_char_boundary() {
        let mut sink = CaptureBuffer::with_limit(4);
        // 'क' 占 3 字节，只能放下一个
        assert!(sink.write_str("कख").is_err());
        assert_eq!(sink.as_str(), "क");
    }

    #[test]
    fn test_input_lines_eof() {
        let mut input = InputLines::new(["5"]);
        assert_eq!(input.read_line().unwrap(), "5");
        let err = input.read_line().unwrap_err();
        assert_eq!(err.exception, Exception::EOFError);
        assert_eq!(err.message, "EOF when reading a line");
    }
}
