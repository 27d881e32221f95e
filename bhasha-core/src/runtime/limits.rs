//! 执行预算：步数、墙钟时间、递归深度、输出与集合大小，以及协作式取消

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bhasha_config::LimitConfig;

use super::error::{RuntimeError, RuntimeResult};
use crate::failure::Exception;

/// 每隔多少步检查一次时钟与取消标志
const CLOCK_CHECK_INTERVAL: u64 = 256;

/// 协作式取消令牌，可跨线程共享
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// 单次执行的资源预算
#[derive(Debug)]
pub struct Budget {
    limits: LimitConfig,
    steps: u64,
    started: Instant,
    cancel: CancelToken,
}

impl Budget {
    pub fn new(limits: LimitConfig, cancel: CancelToken) -> Self {
        Self {
            limits,
            steps: 0,
            started: Instant::now(),
            cancel,
        }
    }

    pub fn limits(&self) -> &LimitConfig {
        &self.limits
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// 计一步；超出步数、超时或被取消时返回错误
    pub fn tick(&mut self) -> RuntimeResult<()> {
        self.steps += 1;
        if self.limits.max_steps > 0 && self.steps > self.limits.max_steps {
            return Err(RuntimeError::new(
                Exception::TimeoutError,
                format!(
                    "execution exceeded the step limit of {}",
                    self.limits.max_steps
                ),
            ));
        }
        if self.steps % CLOCK_CHECK_INTERVAL == 0 {
            self.check_clock()?;
        }
        Ok(())
    }

    pub fn check_clock(&self) -> RuntimeResult<()> {
        if self.cancel.is_cancelled() {
            return Err(RuntimeError::new(Exception::Cancelled, "execution cancelled"));
        }
        if self.limits.timeout_ms > 0
            && self.started.elapsed() > Duration::from_millis(self.limits.timeout_ms)
        {
            return Err(RuntimeError::new(
                Exception::TimeoutError,
                format!("execution timed out after {} ms", self.limits.timeout_ms),
            ));
        }
        Ok(())
    }

    pub fn check_depth(&self, depth: usize) -> RuntimeResult<()> {
        if depth > self.limits.max_recursion_depth {
            return Err(RuntimeError::new(
                Exception::RecursionError,
                "maximum recursion depth exceeded",
            ));
        }
        Ok(())
    }

    pub fn check_collection(&self, len: usize) -> RuntimeResult<()> {
        if len > self.limits.max_collection_len {
            return Err(RuntimeError::memory(
                "collection length",
                self.limits.max_collection_len,
            ));
        }
        Ok(())
    }

    pub fn check_string(&self, len: usize) -> RuntimeResult<()> {
        if len > self.limits.max_string_len {
            return Err(RuntimeError::memory("string length", self.limits.max_string_len));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_steps: u64) -> LimitConfig {
        LimitConfig {
            max_steps,
            ..LimitConfig::default()
        }
    }

    #[test]
    fn test_step_limit() {
        let mut budget = Budget::new(limits(3), CancelToken::new());
        for _ in 0..3 {
            assert!(budget.tick().is_ok());
        }
        let err = budget.tick().unwrap_err();
        assert_eq!(err.exception, Exception::TimeoutError);
    }

    #[test]
    fn test_cancel_is_observed() {
        let token = CancelToken::new();
        let budget = Budget::new(LimitConfig::default(), token.clone());
        assert!(budget.check_clock().is_ok());
        token.cancel();
        let err = budget.check_clock().unwrap_err();
        assert_eq!(err.exception, Exception::Cancelled);
    }

    #[test]
    fn test_depth_and_sizes() {
        let budget = Budget::new(LimitConfig::default(), CancelToken::new());
        assert!(budget.check_depth(200).is_ok());
        assert_eq!(
            budget.check_depth(201).unwrap_err().exception,
            Exception::RecursionError
        );
        assert_eq!(
            budget.check_collection(100_001).unwrap_err().exception,
            Exception::MemoryError
        );
        assert!(budget.check_string(10).is_ok());
    }
}
