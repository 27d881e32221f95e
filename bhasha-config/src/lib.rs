//! Bhasha Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all Bhasha crates.
//! Every struct deserializes from a partial JSON object: missing fields
//! keep their defaults.

use serde::Deserialize;

/// Per-execution resource ceilings for the sandboxed executor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LimitConfig {
    /// Wall-clock budget for one execution, in milliseconds
    pub timeout_ms: u64,
    /// Maximum number of interpreter steps (statements, loop iterations, calls)
    pub max_steps: u64,
    /// Maximum nesting of user function calls
    pub max_recursion_depth: usize,
    /// Maximum bytes the program may write to its output sink
    pub max_output_bytes: usize,
    /// Maximum element count of a single list, tuple or dict
    pub max_collection_len: usize,
    /// Maximum length (in bytes) of a single string value
    pub max_string_len: usize,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2_000,
            max_steps: 1_000_000,
            max_recursion_depth: 200,
            max_output_bytes: 64 * 1024,
            max_collection_len: 100_000,
            max_string_len: 1_000_000,
        }
    }
}

/// How native-vocabulary tokens are rewritten into canonical tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranspileMode {
    /// Ordered substring replacement over the whole text
    #[default]
    Substring,
    /// Single left-to-right scan with longest-match at identifier boundaries
    Tokenized,
}

impl TranspileMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranspileMode::Substring => "substring",
            TranspileMode::Tokenized => "tokenized",
        }
    }
}

/// Configuration for failure localization
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Target language tag handed to the translation service
    pub target_language: String,
    /// Whether low-confidence messages may be sent to the translation service
    pub use_translator: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            target_language: "hi".to_string(),
            use_translator: true,
        }
    }
}

/// Configuration for the external translation collaborator
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Upper bound for one translation round trip, in milliseconds
    pub timeout_ms: u64,
    /// External command (program followed by arguments) that reads text on
    /// stdin and writes the translation to stdout. `None` disables translation.
    pub command: Option<Vec<String>>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1_500,
            command: None,
        }
    }
}

/// Top-level configuration file layout
///
/// ```json
/// { "limits": { "timeout_ms": 500 }, "mode": "tokenized",
///   "diagnostics": { "use_translator": false } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BhashaConfig {
    pub limits: LimitConfig,
    pub mode: TranspileMode,
    pub diagnostics: DiagnosticsConfig,
    pub translator: TranslatorConfig,
}

/// Pipeline phase enum for phase-specific configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Numerals,
    Transpiler,
    Explain,
    Lexer,
    Parser,
    Runtime,
    Diagnostics,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Numerals,
        Phase::Transpiler,
        Phase::Explain,
        Phase::Lexer,
        Phase::Parser,
        Phase::Runtime,
        Phase::Diagnostics,
    ];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Numerals => "numerals",
            Phase::Transpiler => "transpiler",
            Phase::Explain => "explain",
            Phase::Lexer => "lexer",
            Phase::Parser => "parser",
            Phase::Runtime => "runtime",
            Phase::Diagnostics => "diagnostics",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("bhasha::{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit_config() {
        let cfg = LimitConfig::default();
        assert_eq!(cfg.timeout_ms, 2_000);
        assert_eq!(cfg.max_recursion_depth, 200);
        assert_eq!(cfg.max_output_bytes, 65_536);
    }

    #[test]
    fn test_partial_limit_config_from_json() {
        let cfg: LimitConfig = serde_json::from_str(r#"{"timeout_ms": 50}"#).unwrap();
        assert_eq!(cfg.timeout_ms, 50);
        assert_eq!(cfg.max_steps, LimitConfig::default().max_steps);
    }

    #[test]
    fn test_transpile_mode_from_json() {
        let mode: TranspileMode = serde_json::from_str(r#""tokenized""#).unwrap();
        assert_eq!(mode, TranspileMode::Tokenized);
        assert_eq!(TranspileMode::default(), TranspileMode::Substring);
    }

    #[test]
    fn test_default_diagnostics_config() {
        let cfg = DiagnosticsConfig::default();
        assert_eq!(cfg.target_language, "hi");
        assert!(cfg.use_translator);
        assert!(TranslatorConfig::default().command.is_none());
    }

    #[test]
    fn test_bhasha_config_overlays_defaults() {
        let cfg: BhashaConfig = serde_json::from_str(
            r#"{"mode": "tokenized", "translator": {"command": ["cat"]}}"#,
        )
        .unwrap();
        assert_eq!(cfg.mode, TranspileMode::Tokenized);
        assert_eq!(cfg.limits, LimitConfig::default());
        assert_eq!(cfg.translator.command, Some(vec!["cat".to_string()]));
        assert_eq!(cfg.translator.timeout_ms, 1_500);
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(Phase::Lexer.as_str(), "lexer");
        assert_eq!(Phase::Runtime.target(), "bhasha::runtime");
        assert_eq!(Phase::ALL.len(), 7);
    }
}
