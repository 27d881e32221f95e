//! 测试辅助工具
//!
//! 提供端到端测试的辅助函数

#![allow(dead_code)]

use bhasha_workspace::{run, RunConfig, SubmissionResponse, TranspileMode};

/// 默认配置下运行一次提交
pub fn submit(source: &str) -> SubmissionResponse {
    run(source, &quiet_config())
}

/// 指定转译模式运行
pub fn submit_with_mode(source: &str, mode: TranspileMode) -> SubmissionResponse {
    let config = RunConfig {
        mode,
        ..quiet_config()
    };
    run(source, &config)
}

/// 不调用外部翻译的配置
pub fn quiet_config() -> RunConfig {
    let mut config = RunConfig::default();
    config.diagnostics.use_translator = false;
    config
}
