//! Bhasha Core - 本地词汇编程教学系统的核心（纯逻辑，无 IO）
//!
//! Contains the numeral normalizer, keyword transpiler, explanation
//! generator, the canonical-language lexer/parser and the sandboxed
//! tree-walking interpreter.
//!
//! Configuration is passed explicitly via parameters, not via global state.

pub mod compiler;
pub mod executor;
pub mod failure;
pub mod kit;
pub mod runtime;
pub mod vocab;

// Re-export common types
pub use executor::Executor;
pub use failure::{ErrorKind, Exception, ExecutionResult, StructuredFailure};
pub use runtime::{CancelToken, CaptureBuffer, OutputSink};
pub use vocab::{explain, normalize_numerals, transpile};

// Re-export config types from bhasha-config
pub use bhasha_config::{LimitConfig, Phase, TranspileMode};
