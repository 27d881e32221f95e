//! CLI 日志系统初始化
//!
//! 基于 `tracing-subscriber` 实现分阶段日志控制。日志写到 stderr，
//! stdout 只留给程序输出。

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use bhasha_config::Phase;

use crate::config::LogConfig;

/// 日志输出格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// 彩色格式化（开发使用）
    Pretty,
    /// 紧凑格式
    Compact,
    /// JSON 格式（工具集成）
    Json,
}

/// 不属于流水线阶段的目标，始终使用全局级别
const FRONTEND_TARGETS: [&str; 2] = ["bhasha::api", "bhasha::cli"];

/// 根据日志配置构建过滤器
pub fn targets(log_config: &LogConfig) -> Targets {
    let targets = Phase::ALL.iter().fold(
        Targets::new().with_default(log_config.global),
        |targets, phase| targets.with_target(phase.target(), log_config.level_for(*phase)),
    );
    FRONTEND_TARGETS
        .iter()
        .fold(targets, |targets, target| targets.with_target(*target, log_config.global))
}

/// 使用指定格式和日志配置初始化日志系统
///
/// 指定文件时同时以追加方式写入该文件。重复初始化会被忽略。
pub fn init_with_file<P: AsRef<Path>>(
    log_config: &LogConfig,
    format: LogFormat,
    file: Option<P>,
) -> io::Result<()> {
    let targets = targets(log_config);
    let console = create_format_layer(format, io::stderr).with_filter(targets.clone());

    let file_layer = match file {
        Some(path) => {
            let handle = Arc::new(
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?,
            );
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(move || FileWriter(handle.clone()))
                    .with_filter(targets),
            )
        }
        None => None,
    };

    // 已有全局 subscriber 时忽略
    let _ = tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .try_init();
    Ok(())
}

/// 共享同一个文件句柄的 writer
struct FileWriter(Arc<File>);

impl io::Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut &*self.0, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::Write::flush(&mut &*self.0)
    }
}

/// Create formatter layer based on format
fn create_format_layer<W, F>(
    format: LogFormat,
    make_writer: F,
) -> Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>
where
    W: io::Write + Send + Sync + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(false)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_targets_use_phase_levels() {
        let cfg = LogConfig {
            diagnostics: Some(Level::DEBUG),
            ..LogConfig::default()
        };
        let filter = targets(&cfg);
        assert!(filter.would_enable("bhasha::diagnostics", &Level::DEBUG));
        assert!(!filter.would_enable("bhasha::runtime", &Level::DEBUG));
        assert!(filter.would_enable("bhasha::runtime", &Level::WARN));
    }
}
