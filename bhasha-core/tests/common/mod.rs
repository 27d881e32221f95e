//! 测试辅助工具
//!
//! 提供端到端测试的辅助函数
#![allow(dead_code)]

use bhasha_core::{
    normalize_numerals, transpile, ExecutionResult, Executor, LimitConfig, StructuredFailure,
    TranspileMode,
};

/// 执行规范源码
pub fn run_code(code: &str) -> ExecutionResult {
    Executor::default().execute(code)
}

/// 使用给定限制执行
pub fn run_with_limits(code: &str, limits: LimitConfig) -> ExecutionResult {
    Executor::new(limits).execute(code)
}

/// 执行本地词汇源码（数字规范化 + 转译 + 执行）
pub fn run_native(code: &str, mode: TranspileMode) -> ExecutionResult {
    let canonical = transpile(&normalize_numerals(code), mode);
    Executor::default().execute(&canonical)
}

/// 执行并返回输出；失败时 panic 并带上错误信息
pub fn output_of(code: &str) -> String {
    let result = run_code(code);
    if let Some(failure) = &result.failure {
        panic!("expected success, got {failure} (line {:?})\nsource:\n{code}", failure.line);
    }
    result.captured_output
}

/// 执行并返回失败；成功时 panic
pub fn failure_of(code: &str) -> StructuredFailure {
    let result = run_code(code);
    match result.failure {
        Some(failure) => failure,
        None => panic!(
            "expected failure, got output {:?}\nsource:\n{code}",
            result.captured_output
        ),
    }
}
