//! 诊断管线：把 StructuredFailure 变成本地化消息

pub mod catalog;
pub mod localize;
pub mod translate;

pub use catalog::{base_message, fragment_table, FragmentTable, SEPARATOR};
pub use localize::{localize, Confidence, LocalizedMessage, Localizer};
pub use translate::{CommandTranslator, NoTranslator, TranslateError, TranslationRequest, Translator};
