//! 失败本地化管线
//!
//! 1. 语法类失败的快速路径（专用句子）
//! 2. 基础消息 + 片段表
//! 3. 基础消息 + 原始细节
//! 4. 仅在第 3 步时调用外部翻译，失败则保留第 3 步的文本

use serde::Serialize;
use tracing::{debug, trace};

use bhasha_core::{ErrorKind, StructuredFailure};

use super::catalog::{self, FragmentTable, SEPARATOR};
use super::translate::{TranslationRequest, Translator};

/// 本地化结果的可信度，决定是否需要外部翻译
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// 语法快速路径
    Tailored,
    /// 命中片段表
    Matched,
    /// 原始细节原样附在后面
    Fallback,
    /// 外部翻译给出的细节
    Translated,
}

impl Confidence {
    pub fn is_localized(&self) -> bool {
        !matches!(self, Confidence::Fallback)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedMessage {
    pub base_message: String,
    pub matched_fragment: Option<String>,
    pub final_text: String,
    pub confidence: Confidence,
}

/// 诊断管线；持有片段表、目标语言与可选的翻译协作者
pub struct Localizer<'a> {
    fragments: &'a FragmentTable,
    translator: Option<&'a dyn Translator>,
    target_language: String,
}

impl<'a> Localizer<'a> {
    pub fn new() -> Self {
        Self {
            fragments: catalog::fragment_table(),
            translator: None,
            target_language: "hi".to_string(),
        }
    }

    pub fn with_fragments(mut self, fragments: &'a FragmentTable) -> Self {
        self.fragments = fragments;
        self
    }

    pub fn with_translator(mut self, translator: &'a dyn Translator) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_target_language(mut self, target: impl Into<String>) -> Self {
        self.target_language = target.into();
        self
    }

    /// 只走本地表（第 1 到 3 步）
    pub fn localize_local(&self, failure: &StructuredFailure) -> LocalizedMessage {
        if failure.kind.is_syntax() {
            if let Some(sentence) = catalog::syntax_sentence(&failure.detail) {
                trace!(target: "bhasha::diagnostics", kind = %failure.kind, "syntax fast path");
                return LocalizedMessage {
                    base_message: catalog::base_message(failure.kind).to_string(),
                    matched_fragment: None,
                    final_text: sentence.to_string(),
                    confidence: Confidence::Tailored,
                };
            }
        }

        let base = catalog::base_message(failure.kind);
        if let Some((fragment, text)) = self.fragments.find(&failure.detail) {
            debug!(target: "bhasha::diagnostics", kind = %failure.kind, fragment, "fragment matched");
            return LocalizedMessage {
                base_message: base.to_string(),
                matched_fragment: Some(fragment.to_string()),
                final_text: join(base, text),
                confidence: Confidence::Matched,
            };
        }

        if failure.kind == ErrorKind::KeyNotFound && !failure.detail.is_empty() {
            // KeyError 的细节只有 key 本身
            let sentence = format!("{} नाम की key मौजूद नहीं है।", failure.detail);
            return LocalizedMessage {
                base_message: base.to_string(),
                matched_fragment: None,
                final_text: join(base, &sentence),
                confidence: Confidence::Matched,
            };
        }

        debug!(target: "bhasha::diagnostics", kind = %failure.kind, "no fragment matched");
        let final_text = if failure.detail.is_empty() {
            base.to_string()
        } else {
            join(base, &failure.detail)
        };
        LocalizedMessage {
            base_message: base.to_string(),
            matched_fragment: None,
            final_text,
            confidence: Confidence::Fallback,
        }
    }

    /// 完整管线；从不失败
    pub fn localize(&self, failure: &StructuredFailure) -> LocalizedMessage {
        let local = self.localize_local(failure);
        if local.confidence.is_localized() || failure.detail.is_empty() {
            return local;
        }
        let Some(translator) = self.translator else {
            return local;
        };
        let request = TranslationRequest::new(failure.detail.clone(), self.target_language.clone());
        match translator.translate(&request) {
            Ok(translated) if !translated.trim().is_empty() => LocalizedMessage {
                final_text: join(&local.base_message, translated.trim()),
                confidence: Confidence::Translated,
                ..local
            },
            Ok(_) => local,
            Err(e) => {
                debug!(target: "bhasha::diagnostics", error = %e, "translation fallback failed");
                local
            }
        }
    }
}

impl Default for Localizer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn join(base: &str, detail: &str) -> String {
    format!("{base}{SEPARATOR}{detail}")
}

/// 用默认表本地化，不调用外部翻译
pub fn localize(failure: &StructuredFailure) -> LocalizedMessage {
    Localizer::new().localize_local(failure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::TranslateError;
    use bhasha_core::Exception;

    fn failure(exception: Exception, detail: &str) -> StructuredFailure {
        StructuredFailure::new(exception, detail, Some(1))
    }

    #[test]
    fn test_division_by_zero_matches_fragment() {
        let message = localize(&failure(Exception::ZeroDivisionError, "division by zero"));
        assert_eq!(message.confidence, Confidence::Matched);
        assert_eq!(message.matched_fragment.as_deref(), Some("division by zero"));
        assert_eq!(
            message.final_text,
            "शून्य भाग त्रुटि: आप 0 से भाग नहीं कर सकते। 👉 शून्य से भाग नहीं कर सकते।"
        );
    }

    #[test]
    fn test_unclosed_paren_fast_path() {
        let message = localize(&failure(Exception::UnclosedDelimiter, "'(' was never closed"));
        assert_eq!(message.confidence, Confidence::Tailored);
        assert!(message.matched_fragment.is_none());
        assert_eq!(
            message.final_text,
            "सिंटैक्स त्रुटि: '(' को बंद नहीं किया गया। कृपया ')' जोड़ें।"
        );
    }

    #[test]
    fn test_syntax_without_cue_uses_fragments() {
        let message = localize(&failure(Exception::SyntaxError, "expected ':'"));
        assert_eq!(message.confidence, Confidence::Fallback);
        assert_eq!(
            message.final_text,
            "सिंटैक्स त्रुटि: कोड लिखावट में गलती है। 👉 expected ':'"
        );
    }

    #[test]
    fn test_name_error_starts_with_base() {
        let message = localize(&failure(Exception::NameError, "name 'x' is not defined"));
        assert!(message
            .final_text
            .starts_with("नाम त्रुटि: आपने ऐसा नाम उपयोग किया है जो परिभाषित नहीं है।"));
        assert!(message.final_text.ends_with("यह नाम परिभाषित नहीं है। पहले इसे घोषित करें।"));
    }

    #[test]
    fn test_key_error_sentence() {
        let message = localize(&failure(Exception::KeyError, "'रंग'"));
        assert_eq!(message.confidence, Confidence::Matched);
        assert!(message.final_text.ends_with("'रंग' नाम की key मौजूद नहीं है।"));
    }

    #[test]
    fn test_every_kind_yields_text() {
        for kind in ErrorKind::ALL {
            let failure = StructuredFailure {
                kind,
                exception: "X".to_string(),
                detail: String::new(),
                line: None,
            };
            assert!(!localize(&failure).final_text.is_empty(), "{kind}");
        }
    }

    #[test]
    fn test_translator_only_on_fallback() {
        let translator = |r: &TranslationRequest| Ok::<_, TranslateError>(format!("[{}]", r.text));
        let localizer = Localizer::new().with_translator(&translator);

        let matched = localizer.localize(&failure(Exception::ZeroDivisionError, "division by zero"));
        assert_eq!(matched.confidence, Confidence::Matched);

        let fallback = localizer.localize(&failure(Exception::TypeError, "bad thing happened"));
        assert_eq!(fallback.confidence, Confidence::Translated);
        assert_eq!(
            fallback.final_text,
            "टाइप त्रुटि: गलत प्रकार के डेटा पर ऑपरेशन किया गया। 👉 [bad thing happened]"
        );
    }

    #[test]
    fn test_translator_failure_degrades() {
        let translator = |_: &TranslationRequest| Err::<String, _>(TranslateError::Timeout { ms: 5 });
        let localizer = Localizer::new().with_translator(&translator);
        let message = localizer.localize(&failure(Exception::TypeError, "bad thing happened"));
        assert_eq!(message.confidence, Confidence::Fallback);
        assert!(message.final_text.ends_with("👉 bad thing happened"));
    }

    #[test]
    fn test_custom_fragment_table() {
        let table = FragmentTable::new([("bad thing", "बुरी बात")]).unwrap();
        let localizer = Localizer::new().with_fragments(&table);
        let message = localizer.localize(&failure(Exception::TypeError, "A Bad Thing"));
        assert_eq!(message.matched_fragment.as_deref(), Some("bad thing"));
        assert!(message.final_text.ends_with("👉 बुरी बात"));
    }
}
