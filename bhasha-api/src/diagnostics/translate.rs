//! 外部翻译协作者
//!
//! 翻译服务被视为不透明、可能失败且缓慢的文本到文本函数。
//! 诊断管线只通过 [`Translator`] 与它交互，失败一律降级为本地文本。

use std::io::{Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

/// 翻译请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    /// 源语言提示，缺省 `"auto"`
    pub source: String,
    pub target: String,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: "auto".to_string(),
            target: target.into(),
        }
    }
}

/// 翻译失败
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("no translator configured")]
    NotConfigured,

    #[error("failed to start translator: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("translator I/O failed: {0}")]
    Io(#[source] std::io::Error),

    #[error("translator timed out after {ms} ms")]
    Timeout { ms: u64 },

    #[error("translator exited with status {status}")]
    Failed { status: String },

    #[error("translator returned an empty response")]
    EmptyResponse,
}

/// 文本翻译接口
pub trait Translator: Send + Sync {
    fn translate(&self, request: &TranslationRequest) -> Result<String, TranslateError>;
}

impl<F> Translator for F
where
    F: Fn(&TranslationRequest) -> Result<String, TranslateError> + Send + Sync,
{
    fn translate(&self, request: &TranslationRequest) -> Result<String, TranslateError> {
        self(request)
    }
}

/// 不做任何翻译
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranslator;

impl Translator for NoTranslator {
    fn translate(&self, _request: &TranslationRequest) -> Result<String, TranslateError> {
        Err(TranslateError::NotConfigured)
    }
}

/// 等待子进程退出时的轮询间隔
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// 通过外部命令翻译
///
/// 文本写入子进程的 stdin，译文从 stdout 读取。语言通过环境变量
/// `BHASHA_SOURCE_LANG` / `BHASHA_TARGET_LANG` 传入。写入、读取和等待退出
/// 共用同一个截止时间，超时后子进程被杀掉。
#[derive(Debug, Clone)]
pub struct CommandTranslator {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandTranslator {
    /// `command[0]` 是程序，其余是参数；空命令返回 `None`
    pub fn new(command: &[String], timeout: Duration) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn timed_out(&self) -> TranslateError {
        let ms = self.timeout.as_millis() as u64;
        warn!(target: "bhasha::diagnostics", ms, "translator timed out");
        TranslateError::Timeout { ms }
    }
}

/// 持有子进程；未被回收就离开作用域时杀掉并回收
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    fn new(child: Child) -> Self {
        Self {
            child,
            reaped: false,
        }
    }

    /// 到截止时间仍未退出时返回 `None`
    fn wait_until(&mut self, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
        loop {
            if let Some(status) = self.child.try_wait()? {
                self.reaped = true;
                return Ok(Some(status));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(WAIT_POLL_INTERVAL.min(deadline - now));
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

impl Translator for CommandTranslator {
    fn translate(&self, request: &TranslationRequest) -> Result<String, TranslateError> {
        debug!(
            target: "bhasha::diagnostics",
            program = %self.program,
            target_language = %request.target,
            "invoking translator command"
        );
        let deadline = Instant::now() + self.timeout;
        let child = Command::new(&self.program)
            .args(&self.args)
            .env("BHASHA_SOURCE_LANG", &request.source)
            .env("BHASHA_TARGET_LANG", &request.target)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(TranslateError::Spawn)?;
        let mut guard = ChildGuard::new(child);

        // 子进程可能不读 stdin；在后台写入，子进程被杀后写入随之失败
        if let Some(mut stdin) = guard.child.stdin.take() {
            let text = request.text.clone();
            thread::spawn(move || {
                if let Err(e) = stdin.write_all(text.as_bytes()) {
                    debug!(target: "bhasha::diagnostics", error = %e, "translator stdin closed early");
                }
            });
        }

        let Some(mut stdout) = guard.child.stdout.take() else {
            return Err(TranslateError::Io(std::io::Error::other("stdout not captured")));
        };
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buffer = String::new();
            let result = stdout.read_to_string(&mut buffer).map(|_| buffer);
            let _ = tx.send(result);
        });

        let remaining = deadline.saturating_duration_since(Instant::now());
        let output = match rx.recv_timeout(remaining) {
            Ok(result) => result.map_err(TranslateError::Io)?,
            Err(_) => return Err(self.timed_out()),
        };

        let Some(status) = guard.wait_until(deadline).map_err(TranslateError::Io)? else {
            return Err(self.timed_out());
        };
        if !status.success() {
            return Err(TranslateError::Failed {
                status: status.to_string(),
            });
        }
        let translated = output.trim();
        if translated.is_empty() {
            return Err(TranslateError::EmptyResponse);
        }
        Ok(translated.to_string())
    }
}
