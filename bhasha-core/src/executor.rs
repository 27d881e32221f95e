//! 沙箱执行器
//!
//! 每次执行都有全新的全局作用域与独立的输出缓冲区，
//! 解析或运行期的任何错误都以 [`StructuredFailure`] 返回。

use std::thread;

use tracing::{debug, warn};

use crate::compiler;
use crate::failure::{Exception, ExecutionResult, StructuredFailure};
use crate::runtime::{Budget, CancelToken, CaptureBuffer, InputLines, Interpreter, OutputSink};
use bhasha_config::LimitConfig;

/// 解释器线程的栈大小
const STACK_SIZE: usize = 256 * 1024 * 1024;

/// 递归深度硬上限（与配置取较小值）
const RECURSION_CEILING: usize = 1000;

#[derive(Debug, Clone, Default)]
pub struct Executor {
    limits: LimitConfig,
    cancel: CancelToken,
    input: Vec<String>,
}

impl Executor {
    pub fn new(limits: LimitConfig) -> Self {
        Self {
            limits,
            cancel: CancelToken::new(),
            input: Vec::new(),
        }
    }

    /// 共享外部的取消令牌
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// `input()` 依次读取的输入行
    pub fn with_input<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.input = lines.into_iter().map(Into::into).collect();
        self
    }

    pub fn limits(&self) -> &LimitConfig {
        &self.limits
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// 执行规范源码，捕获全部输出
    pub fn execute(&self, source: &str) -> ExecutionResult {
        let mut sink = CaptureBuffer::with_limit(self.limits.max_output_bytes);
        match self.execute_into(source, &mut sink) {
            Ok(()) => ExecutionResult::completed(sink.into_string()),
            Err(failure) => ExecutionResult::failed(sink.into_string(), failure),
        }
    }

    /// 执行并写入调用方提供的输出通道
    pub fn execute_into(
        &self,
        source: &str,
        sink: &mut (dyn OutputSink + Send),
    ) -> Result<(), StructuredFailure> {
        debug!(target: "bhasha::runtime", bytes = source.len(), "execute");
        thread::scope(|scope| {
            let spawned = thread::Builder::new()
                .name("bhasha-exec".to_string())
                .stack_size(STACK_SIZE)
                .spawn_scoped(scope, move || self.run(source, sink));
            match spawned {
                Ok(handle) => handle.join().unwrap_or_else(|_| {
                    warn!(target: "bhasha::runtime", "interpreter thread panicked");
                    Err(internal_failure())
                }),
                Err(err) => {
                    warn!(target: "bhasha::runtime", error = %err, "failed to spawn interpreter thread");
                    Err(internal_failure())
                }
            }
        })
    }

    fn run(&self, source: &str, sink: &mut dyn OutputSink) -> Result<(), StructuredFailure> {
        let program = compiler::compile(source)?;
        let mut limits = self.limits.clone();
        limits.max_recursion_depth = limits.max_recursion_depth.min(RECURSION_CEILING);
        let budget = Budget::new(limits, self.cancel.clone());
        let input = InputLines::new(self.input.iter().cloned());
        let mut interpreter = Interpreter::new(sink, input, budget);
        let result = interpreter.run(&program);
        if let Err(err) = &result {
            debug!(target: "bhasha::runtime", exception = %err.exception, line = ?err.line, "execution failed");
        }
        result.map_err(StructuredFailure::from)
    }
}

fn internal_failure() -> StructuredFailure {
    StructuredFailure::new(Exception::RuntimeError, "internal interpreter error", None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::ErrorKind;

    fn run(source: &str) -> ExecutionResult {
        Executor::default().execute(source)
    }

    #[test]
    fn test_captures_output() {
        let result = run("print('hello')\nprint(1 + 2)");
        assert!(result.is_success());
        assert_eq!(result.captured_output, "hello\n3\n");
    }

    #[test]
    fn test_parse_failure_is_data() {
        let result = run("print(\"hi\"");
        let failure = result.failure.unwrap();
        assert_eq!(failure.kind, ErrorKind::UnclosedDelimiter);
        assert_eq!(failure.detail, "'(' was never closed");
        assert_eq!(failure.line, Some(1));
    }

    #[test]
    fn test_partial_output_kept() {
        let result = run("print('a')\nprint(x)");
        assert_eq!(result.captured_output, "a\n");
        let failure = result.failure.unwrap();
        assert_eq!(failure.kind, ErrorKind::UnresolvedName);
        assert_eq!(failure.line, Some(2));
    }

    #[test]
    fn test_executions_are_isolated() {
        let executor = Executor::default();
        assert!(executor.execute("x = 5").is_success());
        let second = executor.execute("print(x)");
        assert_eq!(second.failure.unwrap().detail, "name 'x' is not defined");
    }

    #[test]
    fn test_input_lines() {
        let executor = Executor::default().with_input(["राम"]);
        let result = executor.execute("naam = input('नाम: ')\nprint('नमस्ते', naam)");
        assert_eq!(result.captured_output, "नाम: नमस्ते राम\n");
        let result = executor.execute("input()\ninput()");
        assert_eq!(result.failure.unwrap().exception, "EOFError");
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancelToken::new();
        token.cancel();
        let executor = Executor::default().with_cancel(token);
        let result = executor.execute("while True:\n    pass");
        assert_eq!(result.failure.unwrap().kind, ErrorKind::Cancelled);
    }

    #[test]
    fn test_recursion_ceiling() {
        let limits = LimitConfig {
            max_recursion_depth: 1_000_000,
            max_steps: 10_000_000,
            ..LimitConfig::default()
        };
        let result = Executor::new(limits).execute("def f(n):\n    return f(n + 1)\nf(0)");
        let failure = result.failure.unwrap();
        assert_eq!(failure.exception, "RecursionError");
        assert_eq!(failure.kind, ErrorKind::ResourceExceeded);
    }
}
