//! API 错误类型
//!
//! 只有基础设施问题（配置、IO、翻译服务）是错误；学习者程序的失败是数据。

use thiserror::Error;

pub use crate::diagnostics::TranslateError;

/// Bhasha API 错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    /// 待翻译文本为空
    #[error("no text provided")]
    EmptyText,

    /// 翻译服务失败
    #[error("translation failed: {0}")]
    Translate(#[from] TranslateError),

    /// 读取文件失败
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 配置文件格式错误
    #[error("invalid config {path}: {message}")]
    Config { path: String, message: String },

    /// 响应无法编码输出
    #[error("cannot encode response: {0}")]
    Encode(String),
}

impl ApiError {
    /// 错误类别（用于日志与 JSON 输出）
    pub fn phase(&self) -> &'static str {
        match self {
            ApiError::EmptyText => "input",
            ApiError::Translate(_) => "translation",
            ApiError::Io { .. } => "io",
            ApiError::Config { .. } => "config",
            ApiError::Encode(_) => "output",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_message() {
        let err = ApiError::EmptyText;
        assert_eq!(err.to_string(), "no text provided");
        assert_eq!(err.phase(), "input");
    }

    #[test]
    fn test_translate_error_converts() {
        let err: ApiError = TranslateError::NotConfigured.into();
        assert_eq!(err.phase(), "translation");
        assert!(err.to_string().starts_with("translation failed"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ApiError::Config {
            path: "bhasha.json".to_string(),
            message: "expected value".to_string(),
        };
        assert_eq!(err.to_string(), "invalid config bhasha.json: expected value");
    }
}
