//! Bhasha API - Submission orchestration layer
//!
//! Provides the unified submission interface:
//! - normalize → transpile → (explain in parallel) → execute → localize
//! - Configuration abstraction (RunConfig)
//! - Diagnostics pipeline and the translation collaborator seam
//!
//! For CLI convenience, this crate provides a global singleton API.
//! For library use, prefer the explicit `run(source, &config)` API.

use std::thread;

use tracing::{debug, info, warn};

use bhasha_core::vocab::{self, FALLBACK_EXPLANATION};
use bhasha_core::{CancelToken, Exception, Executor};

// Re-export config
pub mod config;
pub use config::{
    config as get_config, config_or_default, init as init_config, is_initialized, RunConfig,
};

// Re-export config types from bhasha_config
pub use bhasha_config::{
    BhashaConfig, DiagnosticsConfig, LimitConfig, Phase, TranslatorConfig, TranspileMode,
};

pub mod diagnostics;
pub mod error;
pub mod types;
pub use diagnostics::{
    base_message, CommandTranslator, Confidence, LocalizedMessage, Localizer, NoTranslator, TranslateError,
    TranslationRequest, Translator,
};
pub use error::ApiError;
pub use types::{ErrorTranslation, SubmissionResponse};

// Re-export core types
pub use bhasha_config;
pub use bhasha_core::{ErrorKind, ExecutionResult, StructuredFailure};

/// 执行失败时讲解前的提示行
pub const ERROR_NOTICE: &str = "⚠️ आपके कोड में एक त्रुटि है।";

/// Run one submission with explicit configuration
///
/// This is the recommended API for library users. The translation
/// collaborator is built from `config.translator`.
pub fn run(source: &str, config: &RunConfig) -> SubmissionResponse {
    match config.command_translator() {
        Some(translator) => run_with_translator(source, config, &translator),
        None => run_with_translator(source, config, &NoTranslator),
    }
}

/// Run one submission with a caller-supplied translation collaborator
pub fn run_with_translator(
    source: &str,
    config: &RunConfig,
    translator: &dyn Translator,
) -> SubmissionResponse {
    run_cancellable(source, config, translator, CancelToken::new())
}

/// Run one submission; `cancel` may be triggered from another thread
pub fn run_cancellable(
    source: &str,
    config: &RunConfig,
    translator: &dyn Translator,
    cancel: CancelToken,
) -> SubmissionResponse {
    info!(target: "bhasha::api", bytes = source.len(), mode = config.mode.as_str(), "Starting submission");

    let normalized = vocab::normalize_numerals(source);

    let (canonical, explanation, result) = thread::scope(|scope| {
        let explainer = thread::Builder::new()
            .name("bhasha-explain".to_string())
            .spawn_scoped(scope, || vocab::explain(&normalized));

        let canonical = vocab::transpile(&normalized, config.mode);
        let executor = Executor::new(config.limits.clone())
            .with_cancel(cancel)
            .with_input(config.stdin.iter().cloned());
        let result = executor.execute(&canonical);

        let explanation = match explainer {
            Ok(handle) => handle.join().unwrap_or_else(|_| {
                warn!(target: "bhasha::api", "explanation thread panicked");
                FALLBACK_EXPLANATION.to_string()
            }),
            Err(e) => {
                debug!(target: "bhasha::api", error = %e, "explaining inline");
                vocab::explain(&normalized)
            }
        };
        (canonical, explanation, result)
    });

    let response = respond(canonical, explanation, result, config, translator);
    info!(target: "bhasha::api", is_error = response.is_error, "Submission completed");
    response
}

fn respond(
    canonical: String,
    explanation: String,
    result: ExecutionResult,
    config: &RunConfig,
    translator: &dyn Translator,
) -> SubmissionResponse {
    let ExecutionResult {
        captured_output,
        failure,
    } = result;
    let Some(failure) = failure else {
        return SubmissionResponse {
            output: captured_output,
            translated_code: canonical,
            explanation,
            is_error: false,
            error: None,
            partial_output: None,
            error_kind: None,
            line: None,
            confidence: None,
        };
    };

    let message = localizer(config, translator).localize(&failure);
    SubmissionResponse {
        output: message.final_text,
        translated_code: canonical,
        explanation: format!("{ERROR_NOTICE}\n{explanation}"),
        is_error: true,
        error: Some(failure.raw_message()),
        partial_output: (!captured_output.is_empty()).then_some(captured_output),
        error_kind: Some(failure.kind),
        line: failure.line,
        confidence: Some(message.confidence),
    }
}

fn localizer<'a>(config: &RunConfig, translator: &'a dyn Translator) -> Localizer<'a> {
    let localizer = Localizer::new().with_target_language(config.diagnostics.target_language.clone());
    if config.diagnostics.use_translator {
        localizer.with_translator(translator)
    } else {
        localizer
    }
}

/// Normalize numerals and rewrite keywords
pub fn transpile(source: &str, mode: TranspileMode) -> String {
    vocab::transpile(&vocab::normalize_numerals(source), mode)
}

/// Line-by-line gloss of native-vocabulary source
pub fn explain(source: &str) -> String {
    vocab::explain(&vocab::normalize_numerals(source))
}

/// Localize a single structured failure with the given configuration
pub fn localize_failure(
    failure: &StructuredFailure,
    config: &RunConfig,
    translator: &dyn Translator,
) -> LocalizedMessage {
    localizer(config, translator).localize(failure)
}

/// Translate program output into `target`
pub fn translate_output(
    text: &str,
    target: &str,
    translator: &dyn Translator,
) -> Result<String, ApiError> {
    if text.trim().is_empty() {
        return Err(ApiError::EmptyText);
    }
    let translated = translator.translate(&TranslationRequest::new(text, target))?;
    Ok(translated)
}

/// Localize a raw `"<Exception>: <detail>"` line
pub fn translate_error(
    raw: &str,
    config: &RunConfig,
    translator: &dyn Translator,
) -> Result<ErrorTranslation, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::EmptyText);
    }
    let failure = parse_raw_failure(raw);
    let message = localize_failure(&failure, config, translator);
    Ok(ErrorTranslation {
        error_hindi: message.final_text,
        original_error: raw.to_string(),
    })
}

/// 未知的异常名归入 Unclassified，细节保留整行
fn parse_raw_failure(raw: &str) -> StructuredFailure {
    let (name, detail) = match raw.split_once(':') {
        Some((name, detail)) => (name.trim(), detail.trim()),
        None => (raw, ""),
    };
    match Exception::from_name(name) {
        Some(exception) => StructuredFailure::new(exception, detail, None),
        None => StructuredFailure {
            kind: ErrorKind::Unclassified,
            exception: name.to_string(),
            detail: raw.to_string(),
            line: None,
        },
    }
}

// ==================== Legacy API (using global config) ====================

/// Run a submission using the global config (initialized with defaults if needed)
pub fn quick_run(source: &str) -> SubmissionResponse {
    run(source, config_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> RunConfig {
        RunConfig::default()
    }

    #[test]
    fn test_run_success() {
        let response = run("छापें(\"नमस्ते\")", &quiet());
        assert!(!response.is_error);
        assert_eq!(response.output, "नमस्ते\n");
        assert_eq!(response.translated_code, "print(\"नमस्ते\")");
        assert!(response.error.is_none());
    }

    #[test]
    fn test_run_failure_is_localized() {
        let response = run("छापें(१ / ०)", &quiet());
        assert!(response.is_error);
        assert_eq!(response.error_kind, Some(ErrorKind::DivisionByZero));
        assert_eq!(response.error.as_deref(), Some("ZeroDivisionError: division by zero"));
        assert!(response.output.contains("शून्य से भाग नहीं कर सकते।"));
        assert!(response.explanation.starts_with(ERROR_NOTICE));
    }

    #[test]
    fn test_partial_output_exposed() {
        let response = run("छापें(1)\nछापें(x)", &quiet());
        assert_eq!(response.partial_output.as_deref(), Some("1\n"));
        assert_eq!(response.line, Some(2));
    }

    #[test]
    fn test_translate_output_rejects_empty() {
        let err = translate_output("  ", "en", &NoTranslator).unwrap_err();
        assert!(matches!(err, ApiError::EmptyText));
    }

    #[test]
    fn test_translate_output_delegates() {
        let echo = |r: &TranslationRequest| Ok::<_, TranslateError>(format!("{}:{}", r.target, r.text));
        assert_eq!(translate_output("hi", "en", &echo).unwrap(), "en:hi");
        let err = translate_output("hi", "en", &NoTranslator).unwrap_err();
        assert!(matches!(err, ApiError::Translate(TranslateError::NotConfigured)));
    }

    #[test]
    fn test_translate_error_parses_raw_line() {
        let translation =
            translate_error("NameError: name 'y' is not defined", &quiet(), &NoTranslator).unwrap();
        assert_eq!(translation.original_error, "NameError: name 'y' is not defined");
        assert!(translation.error_hindi.starts_with("नाम त्रुटि"));
    }

    #[test]
    fn test_parse_raw_failure_unknown_name() {
        let failure = parse_raw_failure("Boom happened");
        assert_eq!(failure.kind, ErrorKind::Unclassified);
        assert_eq!(failure.detail, "Boom happened");
    }

    #[test]
    fn test_quick_run() {
        let response = quick_run("छापें(2 + 3)");
        assert_eq!(response.output, "5\n");
    }
}
