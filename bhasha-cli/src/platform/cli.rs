//! CLI 格式化输出
//!
//! 提供命令行友好的失败显示和源码上下文打印。

use std::io::{self, Write};

use bhasha_api::SubmissionResponse;

/// 打印本地化失败并显示源代码上下文
pub fn print_failure_with_source(response: &SubmissionResponse, source: &str) {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    let _ = writeln!(out, "❌ {}", response.output);
    if let Some(raw) = &response.error {
        let _ = writeln!(out, "   ({raw})");
    }
    if let Some(line) = response.line {
        let _ = write_source_context(&mut out, source, line);
    }
}

/// 打印源代码上下文（显示出错行前后几行）
///
/// 出错行用 `>` 标记；行号超出范围时不输出
pub fn write_source_context<W: Write>(
    out: &mut W,
    source: &str,
    error_line: usize,
) -> io::Result<()> {
    const CONTEXT_LINES: usize = 2;

    let lines: Vec<&str> = source.lines().collect();
    if error_line == 0 || error_line > lines.len() {
        return Ok(());
    }

    let start_line = error_line.saturating_sub(CONTEXT_LINES).max(1);
    let end_line = (error_line + CONTEXT_LINES).min(lines.len());
    let width = end_line.to_string().len();

    writeln!(out, "{}|--", "-".repeat(width + 2))?;
    for line_idx in start_line..=end_line {
        let marker = if line_idx == error_line { '>' } else { ' ' };
        writeln!(out, "{marker} {line_idx:>width$} | {}", lines[line_idx - 1])?;
    }
    writeln!(out, "{}|--", "-".repeat(width + 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(source: &str, line: usize) -> String {
        let mut buf = Vec::new();
        write_source_context(&mut buf, source, line).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_marks_error_line() {
        let text = context("a\nb\nc\nd\ne\nf", 3);
        assert!(text.contains("> 3 | c"));
        assert!(text.contains("  1 | a"));
        assert!(text.contains("  5 | e"));
        assert!(!text.contains("| f"));
    }

    #[test]
    fn test_out_of_range_prints_nothing() {
        assert_eq!(context("a", 0), "");
        assert_eq!(context("a", 2), "");
    }
}
