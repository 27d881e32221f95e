//! API 类型定义
//!
//! 一次提交的输入输出类型。

use serde::Serialize;

use bhasha_core::ErrorKind;

use crate::diagnostics::Confidence;

/// 一次提交的完整响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResponse {
    /// 程序输出；失败时为本地化的失败文本
    pub output: String,
    /// 转译后的规范源码
    pub translated_code: String,
    /// 逐行讲解
    pub explanation: String,
    pub is_error: bool,
    /// `"<Exception>: <detail>"`，仅供调试
    pub error: Option<String>,
    /// 失败前已经产生的输出
    pub partial_output: Option<String>,
    pub error_kind: Option<ErrorKind>,
    /// 规范源码中的行号（从 1 开始）
    pub line: Option<usize>,
    pub confidence: Option<Confidence>,
}

impl SubmissionResponse {
    /// 用于退出码与前端展示
    pub fn is_success(&self) -> bool {
        !self.is_error
    }
}

/// `translate_error` 的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorTranslation {
    pub error_hindi: String,
    pub original_error: String,
}
