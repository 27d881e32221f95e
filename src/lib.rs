//! Bhasha - 用母语关键字学习编程
//!
//! Learners write programs with Hindi keywords; the pipeline normalizes
//! Devanagari digits, rewrites keywords into canonical source, explains
//! each line, runs the program in a sandbox and localizes any failure.
//!
//! # Architecture
//!
//! ```text
//! bhasha-config/ - Pure configuration data
//! bhasha-core/   - Vocabulary rewriting, lexer/parser, sandboxed interpreter (no IO)
//! bhasha-api/    - Orchestration, diagnostics, translation seam
//! bhasha-cli/    - `bhasha` binary
//! ```
//!
//! # Quick Start
//!
//! ```
//! use bhasha_workspace::{run, RunConfig};
//!
//! let response = run("छापें(\"नमस्ते\")", &RunConfig::default());
//! assert_eq!(response.output, "नमस्ते\n");
//! ```

pub use bhasha_api::*;

/// 核心层（纯逻辑，无 IO）
pub use bhasha_core as core;
