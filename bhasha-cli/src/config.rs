//! CLI 配置
//!
//! 包含 CLI 特有的配置：日志配置、配置文件读取，以及命令行参数对运行配置的覆盖

use std::path::Path;

use bhasha_api::{ApiError, BhashaConfig, RunConfig, TranspileMode};
use bhasha_config::Phase;
use tracing::Level;

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub transpiler: Option<Level>,
    pub parser: Option<Level>,
    pub runtime: Option<Level>,
    pub diagnostics: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::WARN,
            transpiler: None,
            parser: None,
            runtime: None,
            diagnostics: None,
        }
    }
}

impl LogConfig {
    /// `-v` 的次数决定全局级别
    pub fn from_verbosity(verbose: u8) -> Self {
        let global = match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            global,
            ..Self::default()
        }
    }

    /// Get log level for a pipeline phase
    pub fn level_for(&self, phase: Phase) -> Level {
        let specific = match phase {
            Phase::Numerals | Phase::Transpiler | Phase::Explain => self.transpiler,
            Phase::Lexer | Phase::Parser => self.parser,
            Phase::Runtime => self.runtime,
            Phase::Diagnostics => self.diagnostics,
        };
        specific.unwrap_or(self.global)
    }
}

/// 读取 JSON 配置文件；缺省字段保留默认值
pub fn read_config_file(path: &Path) -> Result<BhashaConfig, ApiError> {
    let content = std::fs::read_to_string(path).map_err(|source| ApiError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| ApiError::Config {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// 命令行覆盖项（优先于配置文件）
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub mode: Option<TranspileMode>,
    pub timeout_ms: Option<u64>,
    pub translator_cmd: Option<String>,
    pub no_translate: bool,
    pub show_canonical: bool,
    pub stdin: Vec<String>,
}

/// 默认值 → 配置文件 → 命令行
pub fn build_run_config(file: Option<BhashaConfig>, overrides: Overrides) -> RunConfig {
    let mut config = file.map(RunConfig::from).unwrap_or_default();
    if let Some(mode) = overrides.mode {
        config.mode = mode;
    }
    if let Some(timeout_ms) = overrides.timeout_ms {
        config.limits.timeout_ms = timeout_ms;
    }
    if let Some(cmd) = overrides.translator_cmd {
        let command: Vec<String> = cmd.split_whitespace().map(str::to_string).collect();
        if !command.is_empty() {
            config.translator.command = Some(command);
        }
    }
    if overrides.no_translate {
        config.diagnostics.use_translator = false;
    }
    config.show_canonical = overrides.show_canonical;
    config.stdin = overrides.stdin;
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_falls_back_to_global() {
        let cfg = LogConfig {
            runtime: Some(Level::TRACE),
            ..LogConfig::from_verbosity(1)
        };
        assert_eq!(cfg.level_for(Phase::Runtime), Level::TRACE);
        assert_eq!(cfg.level_for(Phase::Parser), Level::INFO);
        assert_eq!(cfg.level_for(Phase::Numerals), Level::INFO);
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(LogConfig::from_verbosity(0).global, Level::WARN);
        assert_eq!(LogConfig::from_verbosity(2).global, Level::DEBUG);
        assert_eq!(LogConfig::from_verbosity(9).global, Level::TRACE);
    }

    #[test]
    fn test_overrides_beat_file() {
        let file: BhashaConfig =
            serde_json::from_str(r#"{"mode": "tokenized", "limits": {"timeout_ms": 10}}"#).unwrap();
        let config = build_run_config(
            Some(file),
            Overrides {
                timeout_ms: Some(99),
                translator_cmd: Some("trans -b".to_string()),
                ..Overrides::default()
            },
        );
        assert_eq!(config.mode, TranspileMode::Tokenized);
        assert_eq!(config.limits.timeout_ms, 99);
        assert_eq!(
            config.translator.command,
            Some(vec!["trans".to_string(), "-b".to_string()])
        );
    }

    #[test]
    fn test_read_config_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(read_config_file(&missing), Err(ApiError::Io { .. })));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(read_config_file(&bad), Err(ApiError::Config { .. })));
    }
}
