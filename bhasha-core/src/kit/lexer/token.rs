//! Token 结构

use super::position::{SourcePosition, SourceSpan};

#[derive(Debug, Clone, PartialEq)]
pub struct Token<K> {
    pub kind: K,
    pub span: SourceSpan,
    /// 原始文本（标识符、字面量等需要）
    pub text: Option<String>,
}

impl<K> Token<K> {
    /// 创建新 token（不保存文本）
    pub fn new(kind: K, span: SourceSpan) -> Self {
        Self {
            kind,
            span,
            text: None,
        }
    }

    /// 创建新 token（保存文本）
    pub fn with_text(kind: K, span: SourceSpan, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            text: Some(text.into()),
        }
    }

    pub fn start(&self) -> SourcePosition {
        self.span.start
    }

    pub fn end(&self) -> SourcePosition {
        self.span.end
    }

    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}
