//! API 层配置
//!
//! 包含执行配置 RunConfig 和全局单例（供 CLI 使用）

use std::time::Duration;

use bhasha_config::{BhashaConfig, DiagnosticsConfig, LimitConfig, TranslatorConfig, TranspileMode};
use once_cell::sync::OnceCell;

use crate::diagnostics::CommandTranslator;

/// Execution configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Execution limits
    pub limits: LimitConfig,
    /// Keyword transpiler mode
    pub mode: TranspileMode,
    /// Failure localization
    pub diagnostics: DiagnosticsConfig,
    /// External translation collaborator
    pub translator: TranslatorConfig,
    /// Whether callers should display the canonical source
    pub show_canonical: bool,
    /// Lines consumed by `input()`
    pub stdin: Vec<String>,
}

impl RunConfig {
    /// 根据配置构造外部翻译命令；未配置或已关闭时为 `None`
    pub fn command_translator(&self) -> Option<CommandTranslator> {
        if !self.diagnostics.use_translator {
            return None;
        }
        let command = self.translator.command.as_deref()?;
        CommandTranslator::new(command, Duration::from_millis(self.translator.timeout_ms))
    }
}

impl From<BhashaConfig> for RunConfig {
    fn from(file: BhashaConfig) -> Self {
        Self {
            limits: file.limits,
            mode: file.mode,
            diagnostics: file.diagnostics,
            translator: file.translator,
            ..Self::default()
        }
    }
}

// Global config singleton for CLI convenience
static GLOBAL_CONFIG: OnceCell<RunConfig> = OnceCell::new();

/// Initialize global configuration
///
/// Returns `false` if it was already initialized; the first value wins.
pub fn init(config: RunConfig) -> bool {
    GLOBAL_CONFIG.set(config).is_ok()
}

/// Get global config reference, if initialized
pub fn config() -> Option<&'static RunConfig> {
    GLOBAL_CONFIG.get()
}

/// Global config, initializing it with defaults on first use
pub fn config_or_default() -> &'static RunConfig {
    GLOBAL_CONFIG.get_or_init(RunConfig::default)
}

/// Check if config is initialized
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_run_config() {
        let cfg = RunConfig::default();
        assert!(!cfg.show_canonical);
        assert!(cfg.stdin.is_empty());
        assert_eq!(cfg.mode, TranspileMode::Substring);
        assert_eq!(cfg.limits.timeout_ms, 2_000);
        assert_eq!(cfg.diagnostics.target_language, "hi");
    }

    #[test]
    fn test_from_file_config() {
        let file = BhashaConfig {
            mode: TranspileMode::Tokenized,
            ..BhashaConfig::default()
        };
        let cfg = RunConfig::from(file);
        assert_eq!(cfg.mode, TranspileMode::Tokenized);
        assert!(!cfg.show_canonical);
    }

    #[test]
    fn test_command_translator_requires_command() {
        let mut cfg = RunConfig::default();
        assert!(cfg.command_translator().is_none());

        cfg.translator.command = Some(vec!["cat".to_string()]);
        let translator = cfg.command_translator().unwrap();
        assert_eq!(translator.timeout(), Duration::from_millis(1_500));

        cfg.diagnostics.use_translator = false;
        assert!(cfg.command_translator().is_none());
    }

    #[test]
    fn test_global_config_first_value_wins() {
        // 全局状态在整个测试进程内共享
        let first = config_or_default().clone();
        assert!(is_initialized());
        let mut other = RunConfig::default();
        other.show_canonical = !first.show_canonical;
        assert!(!init(other));
        assert_eq!(config(), Some(&first));
    }
}
