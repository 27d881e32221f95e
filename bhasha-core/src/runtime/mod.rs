//! 沙箱解释器
//!
//! 树遍历求值；全部输出写入每次执行独立的 [`OutputSink`]，
//! 步数、时间、递归深度与集合大小都受 [`Budget`] 约束。

pub mod error;
pub mod format;
pub mod interpreter;
pub mod limits;
pub mod object;
pub mod operators;
pub mod sink;
pub mod stdlib;
pub mod value;

pub use error::{RuntimeError, RuntimeResult};
pub use interpreter::Interpreter;
pub use limits::{Budget, CancelToken};
pub use sink::{CaptureBuffer, InputLines, OutputSink};
pub use stdlib::Builtin;
pub use value::Value;
